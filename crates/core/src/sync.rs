//! Matching subtitles against the playback clock.

use crate::srt::Subtitle;
use tracing::trace;

/// Positions of the current and next subtitle within a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub current: Option<usize>,
    pub next: Option<usize>,
}

impl Cursor {
    /// Resolve the indices back into `subtitles`.
    pub fn resolve<'a>(&self, subtitles: &'a [Subtitle]) -> Located<'a> {
        Located {
            current: self.current.and_then(|i| subtitles.get(i)),
            next: self.next.and_then(|i| subtitles.get(i)),
        }
    }
}

/// The subtitle on screen at some instant and the one that follows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Located<'a> {
    pub current: Option<&'a Subtitle>,
    pub next: Option<&'a Subtitle>,
}

/// Find the current and next subtitle for `time_ms`.
///
/// `current` is the first subtitle in sequence order whose closed interval
/// `[start_ms, end_ms]` contains `time_ms`. With overlapping entries the
/// earlier position in the sequence wins, not the earlier start time.
///
/// `next` is the subtitle with the smallest `start_ms` strictly after
/// `time_ms`; among equal starts the earlier position wins.
pub fn locate(subtitles: &[Subtitle], time_ms: i64) -> Cursor {
    trace!("locate(count={}, time_ms={})", subtitles.len(), time_ms);
    let current = subtitles.iter().position(|sub| sub.contains(time_ms));
    let next = subtitles
        .iter()
        .enumerate()
        .filter(|(_, sub)| sub.starts_after(time_ms))
        .min_by_key(|(_, sub)| sub.start_ms)
        .map(|(i, _)| i);
    Cursor { current, next }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(id: u32, start_ms: u64, end_ms: u64) -> Subtitle {
        Subtitle {
            id,
            start_ms,
            end_ms,
            text: format!("line {id}"),
        }
    }

    fn ids(subs: &[Subtitle], time_ms: i64) -> (Option<u32>, Option<u32>) {
        let located = locate(subs, time_ms).resolve(subs);
        (located.current.map(|s| s.id), located.next.map(|s| s.id))
    }

    #[test]
    fn inside_and_between_subtitles() {
        let subs = vec![sub(1, 1000, 2500), sub(2, 3000, 4000)];
        assert_eq!(ids(&subs, 1500), (Some(1), Some(2)));
        assert_eq!(ids(&subs, 2800), (None, Some(2)));
        assert_eq!(ids(&subs, 0), (None, Some(1)));
        assert_eq!(ids(&subs, 4001), (None, None));
    }

    #[test]
    fn boundaries_are_inclusive() {
        let subs = vec![sub(1, 1000, 2000), sub(2, 2000, 3000)];
        assert_eq!(ids(&subs, 1000), (Some(1), Some(2)));
        // Both contain 2000; sequence order decides.
        assert_eq!(ids(&subs, 2000), (Some(1), None));
        assert_eq!(ids(&subs, 3000), (Some(2), None));
    }

    #[test]
    fn overlap_prefers_sequence_order_over_start_time() {
        let subs = vec![sub(1, 1500, 5000), sub(2, 1000, 5000)];
        assert_eq!(ids(&subs, 2000).0, Some(1));
    }

    #[test]
    fn next_is_earliest_start_regardless_of_order() {
        let subs = vec![sub(1, 9000, 9500), sub(2, 4000, 4500), sub(3, 6000, 6500)];
        assert_eq!(ids(&subs, 3000), (None, Some(2)));
    }

    #[test]
    fn next_ties_keep_sequence_order() {
        let subs = vec![sub(1, 0, 10), sub(7, 5000, 6000), sub(3, 5000, 5500)];
        assert_eq!(ids(&subs, 100).1, Some(7));
    }

    #[test]
    fn negative_time_sees_everything_as_upcoming() {
        let subs = vec![sub(1, 0, 1000)];
        assert_eq!(ids(&subs, -1), (None, Some(1)));
    }

    #[test]
    fn empty_sequence() {
        assert_eq!(locate(&[], 1000), Cursor::default());
    }
}
