//! Property-based tests for time codes, SRT round trips and timing shifts.

use proptest::prelude::*;
use subsync_core::srt::{format, format_time_code, parse_text, parse_time_code};
use subsync_core::{ParsePolicy, Session, Subtitle};

const DAY_MS: u64 = 24 * 3_600_000;

fn subtitle() -> impl Strategy<Value = Subtitle> {
    (1u32..10_000, 0u64..DAY_MS, 0u64..60_000, "[a-zA-Z0-9 ,.!?]{1,30}(\n[a-zA-Z0-9 ,.!?]{1,30})?")
        .prop_map(|(id, start_ms, len, text)| Subtitle {
            id,
            start_ms,
            end_ms: start_ms + len,
            // Captions never start or end with blank space after parsing.
            text: text.trim().to_string(),
        })
        .prop_filter("caption must not be empty", |s| {
            !s.text.is_empty() && s.text.lines().all(|l| !l.trim().is_empty())
        })
}

// =============================================================================
// Time codes
// =============================================================================

proptest! {
    /// Formatting then parsing a time code gives back the same milliseconds.
    #[test]
    fn time_code_round_trip(ms in 0u64..DAY_MS) {
        prop_assert_eq!(parse_time_code(&format_time_code(ms)).unwrap(), ms);
    }
}

// =============================================================================
// Parse / serialize
// =============================================================================

proptest! {
    /// Serializing, re-parsing and serializing again keeps every
    /// (start, end, text) triple; only ids are renumbered.
    #[test]
    fn serialized_output_reparses_to_same_triples(subs in prop::collection::vec(subtitle(), 1..20)) {
        let text = format(&subs);
        let (parsed, skipped) = parse_text(&text, ParsePolicy::Strict).unwrap();
        prop_assert!(skipped.is_empty());

        let mut expected: Vec<_> = subs.iter().map(|s| (s.start_ms, s.end_ms, s.text.clone())).collect();
        let mut actual: Vec<_> = parsed.iter().map(|s| (s.start_ms, s.end_ms, s.text.clone())).collect();
        expected.sort();
        actual.sort();
        prop_assert_eq!(expected, actual);

        let ids: Vec<u32> = parsed.iter().map(|s| s.id).collect();
        let sequential: Vec<u32> = (1..=parsed.len() as u32).collect();
        prop_assert_eq!(ids, sequential);
        prop_assert_eq!(format(&parsed), text);
    }
}

// =============================================================================
// Timing shifts
// =============================================================================

proptest! {
    /// A shift followed by its opposite restores all times when nothing clamps.
    #[test]
    fn opposite_shifts_cancel(subs in prop::collection::vec(subtitle(), 0..20), delta in -100_000i64..100_000) {
        let mut session = Session::default();
        session.load(subs.clone());
        let min_start = subs.iter().map(|s| s.start_ms as i64).min().unwrap_or(0);
        prop_assume!(min_start + delta >= 0);

        session.shift(delta);
        session.shift(-delta);
        prop_assert_eq!(session.subtitles(), subs.as_slice());
        prop_assert_eq!(session.total_adjustment(), 0);
        prop_assert!(!session.is_lossy());
    }

    /// The zero-delta reset undoes any number of unclamped shifts.
    #[test]
    fn reset_undoes_cumulative_shifts(
        subs in prop::collection::vec(subtitle(), 1..20),
        deltas in prop::collection::vec(0i64..50_000, 1..6),
    ) {
        let mut session = Session::default();
        session.load(subs.clone());
        for delta in &deltas {
            session.shift(*delta);
        }
        prop_assert_eq!(session.total_adjustment(), deltas.iter().sum::<i64>());
        session.shift(0);
        prop_assert_eq!(session.subtitles(), subs.as_slice());
        prop_assert_eq!(session.total_adjustment(), 0);
    }

    /// In a gap, nothing is current and the earliest later start is next.
    #[test]
    fn gaps_have_no_current_subtitle(subs in prop::collection::vec(subtitle(), 1..20), time in 0i64..(DAY_MS as i64)) {
        let mut session = Session::default();
        session.load(subs.clone());
        session.advance_clock(time);
        let inside = subs.iter().any(|s| s.start_ms as i64 <= time && time <= s.end_ms as i64);
        prop_assert_eq!(session.current().is_some(), inside);
        let earliest = subs.iter().filter(|s| s.start_ms as i64 > time).map(|s| s.start_ms).min();
        prop_assert_eq!(session.next().map(|s| s.start_ms), earliest);
    }
}
