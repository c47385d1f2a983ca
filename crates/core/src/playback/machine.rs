//! Media lifecycle as an explicit state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Lifecycle of the media source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No media source.
    Empty,
    /// Source assigned, data not yet available.
    Loading,
    /// Data loaded, not yet started.
    Ready,
    Playing,
    Paused,
    /// The media subsystem reported a failure.
    Errored,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Empty => write!(f, "empty"),
            PlaybackState::Loading => write!(f, "loading"),
            PlaybackState::Ready => write!(f, "ready"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Errored => write!(f, "errored"),
        }
    }
}

/// Notifications from the media collaborator and transport requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// A new source was assigned.
    LoadStarted,
    /// Enough data is available to play.
    Loaded,
    PlayRequested,
    PauseRequested,
    BufferingStarted,
    /// Playback actually resumed after waiting for data.
    BufferingEnded,
    ErrorOccurred(String),
    /// The source was removed.
    Removed,
}

/// Work the caller must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// A play request was queued while loading; start the media now.
    Autoplay,
}

/// A transition that does not apply in the current state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot handle {event:?} while {state}")]
pub struct Rejected {
    pub state: PlaybackState,
    pub event: PlaybackEvent,
}

/// Tracks the media lifecycle. Only `handle` changes state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackMachine {
    state: PlaybackState,
    /// Play was requested before the media finished loading.
    autoplay: bool,
    buffering: bool,
    /// Media data has loaded at least once for the current source.
    media_loaded: bool,
}

impl Default for PlaybackMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackMachine {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Empty,
            autoplay: false,
            buffering: false,
            media_loaded: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_buffering(&self) -> bool {
        self.buffering
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Media data is available for the current source.
    pub fn is_loaded(&self) -> bool {
        self.media_loaded
    }

    pub fn autoplay_pending(&self) -> bool {
        self.autoplay
    }

    /// `Ready` or later with media available.
    pub fn is_operational(&self) -> bool {
        match self.state {
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused => true,
            PlaybackState::Errored => self.media_loaded,
            PlaybackState::Empty | PlaybackState::Loading => false,
        }
    }

    /// Apply `event`. Rejected events leave the machine untouched.
    pub fn handle(&mut self, event: PlaybackEvent) -> Result<Option<Directive>, Rejected> {
        use PlaybackEvent::*;
        use PlaybackState::*;

        let from = self.state;
        let mut directive = None;
        match (&event, from) {
            (LoadStarted, _) => {
                // A new source keeps a pending or active play intent.
                self.autoplay = self.autoplay || from == Playing;
                self.media_loaded = false;
                self.buffering = false;
                self.state = Loading;
            }
            (Loaded, Loading) => {
                self.media_loaded = true;
                if self.autoplay {
                    self.autoplay = false;
                    self.state = Playing;
                    directive = Some(Directive::Autoplay);
                } else {
                    self.state = Ready;
                }
            }
            (Loaded, Errored) => {
                self.media_loaded = true;
                self.state = Ready;
            }
            (PlayRequested, Loading) => self.autoplay = true,
            (PlayRequested, Ready | Paused | Playing) => self.state = Playing,
            (PlayRequested, Errored) if self.media_loaded => self.state = Playing,
            (PauseRequested, Loading) => self.autoplay = false,
            (PauseRequested, Playing | Paused) => self.state = Paused,
            (PauseRequested, Ready) => {}
            (PauseRequested, Errored) if self.media_loaded => self.state = Paused,
            (BufferingStarted, Loading | Ready | Playing | Paused) => self.buffering = true,
            (BufferingEnded, Ready | Playing | Paused) => {
                self.buffering = false;
                self.state = Playing;
            }
            (BufferingEnded, Loading) => self.buffering = false,
            (ErrorOccurred(_), Empty) => return Err(self.reject(event.clone())),
            (ErrorOccurred(_), _) => {
                self.autoplay = false;
                self.buffering = false;
                self.state = Errored;
            }
            (Removed, _) => *self = Self::new(),
            _ => return Err(self.reject(event.clone())),
        }
        debug!("playback {} -> {} on {:?}", from, self.state, event);
        Ok(directive)
    }

    fn reject(&self, event: PlaybackEvent) -> Rejected {
        warn!("ignoring {:?} while {}", event, self.state);
        Rejected {
            state: self.state,
            event,
        }
    }
}
