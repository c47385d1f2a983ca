//! Transport control over an external media element.
//! This module wires media notifications and user transport requests into the
//! session's playback state and clock.

use crate::session::Session;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::{info, trace, warn};

pub mod machine;

pub use machine::{Directive, PlaybackEvent, PlaybackMachine, PlaybackState, Rejected};

/// The media collaborator (a video element or a stand-in for one).
///
/// Only `play` can fail, and it may complete asynchronously.
#[async_trait]
pub trait MediaElement: Send {
    /// Start playback. The media subsystem may reject the request.
    async fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Move the media position to `time_ms`.
    fn seek(&mut self, time_ms: i64);

    /// Current media position, floored to whole milliseconds.
    fn current_time_ms(&self) -> i64;

    /// Media length, once known.
    fn duration_ms(&self) -> Option<i64>;
}

/// Issues transport commands to a media element and records the outcome in
/// an explicitly passed [`Session`].
pub struct Player<M> {
    media: M,
}

impl<M: MediaElement> Player<M> {
    pub fn new(media: M) -> Self {
        Self { media }
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn into_inner(self) -> M {
        self.media
    }

    /// Play when paused, pause when playing.
    ///
    /// Before the media has loaded the request is queued and honoured by
    /// [`Player::on_loaded`]. A rejected play is stored in the session error
    /// field and not retried.
    pub async fn toggle_play(&mut self, session: &mut Session) -> Result<PlaybackState> {
        trace!("toggle_play(state={})", session.playback().state());
        if !session.playback().is_loaded() {
            session.dispatch(PlaybackEvent::PlayRequested)?;
            info!("media not loaded yet, play queued");
            return Ok(session.playback().state());
        }
        if session.playback().is_playing() {
            self.media.pause();
            session.dispatch(PlaybackEvent::PauseRequested)?;
            return Ok(session.playback().state());
        }
        match self.media.play().await {
            Ok(()) => {
                session.dispatch(PlaybackEvent::PlayRequested)?;
                session.clear_error();
                Ok(session.playback().state())
            }
            Err(err) => {
                let message = format!("Error playing video: {err}");
                warn!("{}", message);
                session.dispatch(PlaybackEvent::ErrorOccurred(message.clone()))?;
                Err(anyhow!(message))
            }
        }
    }

    /// The media reported that its data is available.
    pub async fn on_loaded(&mut self, session: &mut Session) -> Result<()> {
        trace!("on_loaded()");
        if session.dispatch(PlaybackEvent::Loaded)? != Some(Directive::Autoplay) {
            return Ok(());
        }
        info!("starting queued playback");
        if let Err(err) = self.media.play().await {
            let message = format!("Error during autoplay: {err}");
            warn!("{}", message);
            session.dispatch(PlaybackEvent::ErrorOccurred(message.clone()))?;
            return Err(anyhow!(message));
        }
        Ok(())
    }

    /// The media reported a fatal error.
    pub fn on_media_error(&mut self, session: &mut Session) {
        trace!("on_media_error()");
        if let Err(rejected) =
            session.dispatch(PlaybackEvent::ErrorOccurred("Failed to play video".into()))
        {
            warn!("{}", rejected);
        }
    }

    /// The media stalled waiting for data.
    pub fn on_waiting(&mut self, session: &mut Session) {
        let _ = session.dispatch(PlaybackEvent::BufferingStarted);
    }

    /// The media is playing again after a stall.
    pub fn on_playing(&mut self, session: &mut Session) {
        let _ = session.dispatch(PlaybackEvent::BufferingEnded);
    }

    /// Clock tick from the media: copy its position into the session.
    pub fn on_time_update(&mut self, session: &mut Session) {
        if session.playback().is_loaded() {
            session.advance_clock(self.media.current_time_ms());
        }
    }

    pub fn skip_forward(&mut self, session: &mut Session) {
        let step = session.config().skip_step_ms;
        let target = self.media.current_time_ms().saturating_add(step);
        self.seek(session, target);
    }

    pub fn skip_backward(&mut self, session: &mut Session) {
        let step = session.config().skip_step_ms;
        let target = self.media.current_time_ms().saturating_sub(step);
        self.seek(session, target);
    }

    /// Move to `time_ms`, clamped to the media bounds. Ignored without media.
    pub fn seek(&mut self, session: &mut Session, time_ms: i64) {
        if !session.playback().is_loaded() {
            trace!("seek ignored, no media loaded");
            return;
        }
        let mut target = time_ms.max(0);
        if let Some(duration) = self.media.duration_ms() {
            target = target.min(duration);
        }
        self.media.seek(target);
        session.advance_clock(target);
    }

    /// Pause and rewind to the start.
    pub fn stop(&mut self, session: &mut Session) {
        if !session.playback().is_loaded() {
            return;
        }
        self.media.pause();
        self.media.seek(0);
        if session.playback().is_playing() {
            let _ = session.dispatch(PlaybackEvent::PauseRequested);
        }
        session.advance_clock(0);
    }
}
