//! A wall-clock stand-in for a video element, used by `subsync play`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use subsync_core::playback::MediaElement;
use tokio::time::Instant;

/// Media whose position advances with real time while playing.
pub struct SimulatedMedia {
    duration_ms: i64,
    /// Position at the last play, pause or seek.
    anchor_ms: i64,
    /// When playback (re)started, if playing.
    started: Option<Instant>,
}

impl SimulatedMedia {
    pub fn new(duration_ms: i64) -> Self {
        Self {
            duration_ms,
            anchor_ms: 0,
            started: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_time_ms() >= self.duration_ms
    }
}

#[async_trait]
impl MediaElement for SimulatedMedia {
    async fn play(&mut self) -> Result<()> {
        if self.duration_ms <= 0 {
            return Err(anyhow!("nothing to play"));
        }
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.anchor_ms = self.current_time_ms();
        self.started = None;
    }

    fn seek(&mut self, time_ms: i64) {
        self.anchor_ms = time_ms.clamp(0, self.duration_ms);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn current_time_ms(&self) -> i64 {
        let elapsed = self
            .started
            .map(|at| i64::try_from(at.elapsed().as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        self.anchor_ms.saturating_add(elapsed).min(self.duration_ms)
    }

    fn duration_ms(&self) -> Option<i64> {
        Some(self.duration_ms)
    }
}
