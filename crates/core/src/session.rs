//! The editing session: one owned aggregate holding the subtitle sequence,
//! its cumulative timing adjustment, the playback clock and media lifecycle.
//!
//! Every mutation goes through [`Session`], which recomputes the current and
//! next subtitle afterwards, so the derived pointers are never stale.

use crate::config::SyncConfig;
use crate::error::{BlockError, ParseError};
use crate::playback::{Directive, PlaybackEvent, PlaybackMachine, PlaybackState, Rejected};
use crate::srt::{self, ParsePolicy, Subtitle, TextEncoding};
use crate::sync::{locate, Cursor, Located};
use crate::timing::TimingAdjuster;
use crate::video;
use serde::Serialize;
use tracing::{debug, info, trace};

/// What a successful [`Session::load_bytes`] found in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub count: usize,
    pub encoding: TextEncoding,
    pub lossy_decode: bool,
    pub policy: ParsePolicy,
    pub skipped: Vec<BlockError>,
}

/// Result of [`Session::shift`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftSummary {
    /// The shift was the zero-delta reset.
    pub reset: bool,
    pub total_adjustment: i64,
    /// Times raised to zero by this shift.
    pub clamped: usize,
}

/// Serializable view of the session for UI collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot<'a> {
    pub subtitles: &'a [Subtitle],
    pub current: Option<&'a Subtitle>,
    pub next: Option<&'a Subtitle>,
    pub current_time: i64,
    pub total_adjustment: i64,
    pub lossy: bool,
    pub playback: PlaybackState,
    pub buffering: bool,
    pub loading: bool,
    pub error: Option<&'a str>,
    pub subtitle_file: Option<&'a str>,
    pub video_file: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SyncConfig,
    subtitles: Vec<Subtitle>,
    total_adjustment: i64,
    current_time: i64,
    cursor: Cursor,
    /// A shift or reset clamped a time since the sequence was loaded.
    lossy: bool,
    subtitle_file: Option<String>,
    video_file: Option<String>,
    playback: PlaybackMachine,
    loading: bool,
    error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl Session {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            subtitles: Vec::new(),
            total_adjustment: 0,
            current_time: 0,
            cursor: Cursor::default(),
            lossy: false,
            subtitle_file: None,
            video_file: None,
            playback: PlaybackMachine::new(),
            loading: false,
            error: None,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn subtitles(&self) -> &[Subtitle] {
        &self.subtitles
    }

    pub fn total_adjustment(&self) -> i64 {
        self.total_adjustment
    }

    pub fn current_time(&self) -> i64 {
        self.current_time
    }

    pub fn located(&self) -> Located<'_> {
        self.cursor.resolve(&self.subtitles)
    }

    pub fn current(&self) -> Option<&Subtitle> {
        self.located().current
    }

    pub fn next(&self) -> Option<&Subtitle> {
        self.located().next
    }

    /// Whether clamping has made the loaded timing unrecoverable.
    pub fn is_lossy(&self) -> bool {
        self.lossy
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn subtitle_file(&self) -> Option<&str> {
        self.subtitle_file.as_deref()
    }

    pub fn video_file(&self) -> Option<&str> {
        self.video_file.as_deref()
    }

    pub fn playback(&self) -> &PlaybackMachine {
        &self.playback
    }

    /// Replace the sequence wholesale and zero the adjustment.
    pub fn load(&mut self, subtitles: Vec<Subtitle>) {
        info!("loaded {} subtitles", subtitles.len());
        self.subtitles = subtitles;
        self.total_adjustment = 0;
        self.lossy = false;
        self.refresh();
    }

    /// Parse uploaded bytes with the configured policy and load the result.
    ///
    /// The last load wins. On a strict parse failure the error is recorded
    /// and the previous sequence is left as it was.
    pub fn load_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<LoadSummary, ParseError> {
        trace!("load_bytes(name={}, len={})", name, bytes.len());
        self.loading = true;
        let parsed = srt::parse_srt(bytes, self.config.parse_policy);
        self.loading = false;
        match parsed {
            Ok(report) => {
                let summary = LoadSummary {
                    count: report.subtitles.len(),
                    encoding: report.encoding,
                    lossy_decode: report.lossy,
                    policy: report.policy,
                    skipped: report.skipped,
                };
                self.subtitle_file = Some(name.to_string());
                self.load(report.subtitles);
                Ok(summary)
            }
            Err(err) => {
                self.error = Some(format!("Error parsing SRT file: {err}"));
                Err(err)
            }
        }
    }

    /// Remove every subtitle with `id`, keeping the order of the rest.
    /// Returns how many were removed.
    pub fn delete_by_id(&mut self, id: u32) -> usize {
        trace!("delete_by_id(id={})", id);
        let before = self.subtitles.len();
        self.subtitles.retain(|sub| sub.id != id);
        let removed = before - self.subtitles.len();
        self.refresh();
        removed
    }

    /// Replace the text of every subtitle with `id`. Times are not touched.
    /// Returns how many were edited.
    pub fn edit_text_by_id(&mut self, id: u32, text: &str) -> usize {
        trace!("edit_text_by_id(id={})", id);
        let mut edited = 0;
        for sub in self.subtitles.iter_mut().filter(|sub| sub.id == id) {
            sub.text = text.to_string();
            edited += 1;
        }
        self.refresh();
        edited
    }

    /// Shift every subtitle by `delta_ms`.
    ///
    /// A zero delta is the reset request: the cumulative adjustment is undone
    /// and zeroed instead of applying an empty shift.
    pub fn shift(&mut self, delta_ms: i64) -> ShiftSummary {
        trace!("shift(delta_ms={})", delta_ms);
        let reset = delta_ms == 0;
        let adjustment = if reset {
            TimingAdjuster::reset_all(&self.subtitles, self.total_adjustment)
        } else {
            TimingAdjuster::shift_all(&self.subtitles, self.total_adjustment, delta_ms)
        };
        self.lossy |= adjustment.is_lossy();
        self.subtitles = adjustment.subtitles;
        self.total_adjustment = adjustment.total_adjustment;
        self.refresh();
        ShiftSummary {
            reset,
            total_adjustment: self.total_adjustment,
            clamped: adjustment.clamped,
        }
    }

    /// Move the playback clock and recompute current/next.
    pub fn advance_clock(&mut self, time_ms: i64) {
        self.current_time = time_ms;
        self.refresh();
    }

    /// Drop all subtitles and the adjustment.
    pub fn clear(&mut self) {
        trace!("clear()");
        self.subtitles.clear();
        self.total_adjustment = 0;
        self.lossy = false;
        self.subtitle_file = None;
        self.refresh();
    }

    /// Export the sequence as UTF-8 SRT bytes.
    pub fn export(&self) -> Vec<u8> {
        srt::format(&self.subtitles).into_bytes()
    }

    /// `<video-basename>.srt`, if there is a video and something to export.
    pub fn export_file_name(&self) -> Option<String> {
        if self.subtitles.is_empty() {
            return None;
        }
        self.video_file.as_deref().map(video::srt_file_name)
    }

    /// Feed a lifecycle event to the playback machine.
    ///
    /// Errors are copied into the session error field; a fresh source or a
    /// completed load clears it.
    pub fn dispatch(&mut self, event: PlaybackEvent) -> Result<Option<Directive>, Rejected> {
        let message = match &event {
            PlaybackEvent::ErrorOccurred(message) => Some(message.clone()),
            _ => None,
        };
        let clears_error = matches!(event, PlaybackEvent::LoadStarted | PlaybackEvent::Loaded);
        let directive = self.playback.handle(event)?;
        if let Some(message) = message {
            self.error = Some(message);
        } else if clears_error {
            self.error = None;
        }
        Ok(directive)
    }

    /// Assign a new video source. Any previous source is replaced.
    pub fn set_video(&mut self, name: &str) {
        info!("video source {}", name);
        self.video_file = Some(name.to_string());
        // LoadStarted is accepted from every state.
        let _ = self.dispatch(PlaybackEvent::LoadStarted);
    }

    /// Forget the video and its playback state. Subtitles stay.
    pub fn remove_video(&mut self) {
        trace!("remove_video()");
        let _ = self.dispatch(PlaybackEvent::Removed);
        self.video_file = None;
        self.error = None;
        self.advance_clock(0);
    }

    /// Record a failure reported by a collaborator.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Back to a freshly created session with the same configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        let located = self.located();
        SessionSnapshot {
            subtitles: &self.subtitles,
            current: located.current,
            next: located.next,
            current_time: self.current_time,
            total_adjustment: self.total_adjustment,
            lossy: self.lossy,
            playback: self.playback.state(),
            buffering: self.playback.is_buffering(),
            loading: self.loading,
            error: self.error.as_deref(),
            subtitle_file: self.subtitle_file.as_deref(),
            video_file: self.video_file.as_deref(),
        }
    }

    fn refresh(&mut self) {
        self.cursor = locate(&self.subtitles, self.current_time);
        debug!(
            "at {} ms current={:?} next={:?}",
            self.current_time, self.cursor.current, self.cursor.next
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello world\n\n2\n00:00:03,000 --> 00:00:04,000\nSecond line\n";

    fn loaded() -> Session {
        let mut session = Session::default();
        session.load_bytes("example.srt", EXAMPLE.as_bytes()).unwrap();
        session
    }

    fn ids(session: &Session) -> (Option<u32>, Option<u32>) {
        (
            session.current().map(|s| s.id),
            session.next().map(|s| s.id),
        )
    }

    #[test]
    fn clock_ticks_update_current_and_next() {
        let mut session = loaded();
        session.advance_clock(1500);
        assert_eq!(ids(&session), (Some(1), Some(2)));
        session.advance_clock(2800);
        assert_eq!(ids(&session), (None, Some(2)));
    }

    #[test]
    fn shift_moves_times_and_recomputes() {
        let mut session = loaded();
        session.advance_clock(1500);
        let summary = session.shift(500);
        assert_eq!(summary.total_adjustment, 500);
        assert!(!summary.reset);
        let first = &session.subtitles()[0];
        assert_eq!(srt::format_time_code(first.start_ms), "00:00:01,500");
        assert_eq!(srt::format_time_code(first.end_ms), "00:00:03,000");
        // The shifted start is exactly 1500 and the interval is closed.
        assert_eq!(ids(&session), (Some(1), Some(2)));
    }

    #[test]
    fn zero_shift_resets_after_several_shifts() {
        let mut session = loaded();
        let original = session.subtitles().to_vec();
        session.shift(700);
        session.shift(-200);
        session.shift(1000);
        assert_eq!(session.total_adjustment(), 1500);
        let summary = session.shift(0);
        assert!(summary.reset);
        assert_eq!(session.total_adjustment(), 0);
        assert_eq!(session.subtitles(), original.as_slice());
        assert!(!session.is_lossy());
    }

    #[test]
    fn clamping_marks_session_lossy() {
        let mut session = loaded();
        let summary = session.shift(-1500);
        assert_eq!(summary.clamped, 1);
        assert!(session.is_lossy());
        session.shift(0);
        assert!(session.is_lossy());
        assert_ne!(session.subtitles()[0].start_ms, 1000);
        session.load(Vec::new());
        assert!(!session.is_lossy());
    }

    #[test]
    fn delete_keeps_order_and_clears_pointers() {
        let mut session = loaded();
        session.advance_clock(3500);
        assert_eq!(session.delete_by_id(2), 1);
        assert_eq!(session.subtitles().len(), 1);
        assert_eq!(session.subtitles()[0].id, 1);
        assert_eq!(ids(&session), (None, None));
        session.advance_clock(4500);
        assert_eq!(ids(&session), (None, None));
        assert_eq!(session.delete_by_id(42), 0);
    }

    #[test]
    fn edit_changes_only_text() {
        let mut session = loaded();
        let before = session.subtitles().to_vec();
        assert_eq!(session.edit_text_by_id(1, "Hi\nthere"), 1);
        let after = session.subtitles();
        assert_eq!(after[0].text, "Hi\nthere");
        assert_eq!((after[0].start_ms, after[0].end_ms), (1000, 2500));
        assert_eq!(after[1], before[1]);
        session.advance_clock(1200);
        assert_eq!(session.current().map(|s| s.text.as_str()), Some("Hi\nthere"));
    }

    #[test]
    fn ids_are_not_renumbered_by_mutations() {
        let mut session = Session::default();
        session.load(vec![
            Subtitle {
                id: 10,
                start_ms: 0,
                end_ms: 1000,
                text: "a".into(),
            },
            Subtitle {
                id: 20,
                start_ms: 2000,
                end_ms: 3000,
                text: "b".into(),
            },
        ]);
        session.delete_by_id(10);
        assert_eq!(session.subtitles()[0].id, 20);
        assert_eq!(
            String::from_utf8(session.export()).unwrap(),
            "1\n00:00:02,000 --> 00:00:03,000\nb"
        );
    }

    #[test]
    fn new_load_replaces_and_zeroes_adjustment() {
        let mut session = loaded();
        session.shift(300);
        session
            .load_bytes("other.srt", b"5\n00:00:10,000 --> 00:00:11,000\nonly")
            .unwrap();
        assert_eq!(session.total_adjustment(), 0);
        assert_eq!(session.subtitles().len(), 1);
        assert_eq!(session.subtitle_file(), Some("other.srt"));
    }

    #[test]
    fn strict_failure_keeps_previous_sequence() {
        let mut session = Session::new(SyncConfig {
            parse_policy: ParsePolicy::Strict,
            ..SyncConfig::default()
        });
        session.load_bytes("a.srt", EXAMPLE.as_bytes()).unwrap();
        let err = session.load_bytes("b.srt", b"1\nnot a time\n").unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
        assert_eq!(session.subtitles().len(), 2);
        assert_eq!(session.subtitle_file(), Some("a.srt"));
        assert!(session.error().unwrap().starts_with("Error parsing SRT file"));
        assert!(!session.is_loading());
    }

    #[test]
    fn lenient_load_reports_skipped_blocks() {
        let mut session = Session::default();
        let summary = session
            .load_bytes("a.srt", b"1\n00:00:00,000 --> 00:00:01,000\nok\n\nbroken\n")
            .unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.policy, ParsePolicy::Lenient);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].block, 2);
    }

    #[test]
    fn clear_empties_everything_subtitle_related() {
        let mut session = loaded();
        session.shift(100);
        session.advance_clock(1500);
        session.clear();
        assert!(session.subtitles().is_empty());
        assert_eq!(session.total_adjustment(), 0);
        assert_eq!(ids(&session), (None, None));
        assert_eq!(session.subtitle_file(), None);
        assert_eq!(session.current_time(), 1500);
    }

    #[test]
    fn export_name_needs_video_and_subtitles() {
        let mut session = Session::default();
        session.set_video("holiday.clip.mp4");
        assert_eq!(session.export_file_name(), None);
        session.load_bytes("x.srt", EXAMPLE.as_bytes()).unwrap();
        assert_eq!(session.export_file_name().as_deref(), Some("holiday.clip.srt"));
    }

    #[test]
    fn dispatch_tracks_errors() {
        let mut session = Session::default();
        session.set_video("a.mp4");
        assert_eq!(session.playback().state(), PlaybackState::Loading);
        session
            .dispatch(PlaybackEvent::ErrorOccurred("Failed to play video".into()))
            .unwrap();
        assert_eq!(session.error(), Some("Failed to play video"));
        session.set_video("b.mp4");
        assert_eq!(session.error(), None);
    }

    #[test]
    fn remove_video_keeps_subtitles() {
        let mut session = loaded();
        session.set_video("a.mp4");
        session.dispatch(PlaybackEvent::Loaded).unwrap();
        session.advance_clock(1500);
        session.remove_video();
        assert_eq!(session.playback().state(), PlaybackState::Empty);
        assert_eq!(session.current_time(), 0);
        assert_eq!(session.video_file(), None);
        assert_eq!(session.subtitles().len(), 2);
        assert_eq!(ids(&session), (None, Some(1)));
    }

    #[test]
    fn snapshot_serializes() {
        let mut session = loaded();
        session.advance_clock(1500);
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["current"]["id"], 1);
        assert_eq!(json["next"]["id"], 2);
        assert_eq!(json["playback"], "empty");
        assert_eq!(json["subtitles"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn reset_keeps_configuration() {
        let config = SyncConfig {
            skip_step_ms: 1000,
            ..SyncConfig::default()
        };
        let mut session = Session::new(config);
        session.load_bytes("x.srt", EXAMPLE.as_bytes()).unwrap();
        session.reset();
        assert!(session.subtitles().is_empty());
        assert_eq!(session.config().skip_step_ms, 1000);
    }
}
