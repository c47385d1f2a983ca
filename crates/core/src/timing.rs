//! Bulk subtitle timing adjustment.

use crate::srt::Subtitle;
use tracing::{trace, warn};

/// Outcome of shifting a whole subtitle sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub subtitles: Vec<Subtitle>,
    /// Cumulative offset after this adjustment.
    pub total_adjustment: i64,
    /// Number of start/end times that were raised to zero. Any clamping makes
    /// a later reset unable to restore the loaded timing exactly.
    pub clamped: usize,
}

impl Adjustment {
    pub fn is_lossy(&self) -> bool {
        self.clamped > 0
    }
}

/// Shift subtitle timing (positive = later, negative = earlier).
pub struct TimingAdjuster;

impl TimingAdjuster {
    /// Shift every start and end time by `delta_ms`, clamping at zero, and add
    /// `delta_ms` to `total_adjustment`.
    ///
    /// The total always grows by the requested delta, even for times that
    /// were clamped, so it can drift from the real offset once clamping
    /// happens.
    pub fn shift_all(subtitles: &[Subtitle], total_adjustment: i64, delta_ms: i64) -> Adjustment {
        trace!(
            "shift_all(count={}, total={}, delta={})",
            subtitles.len(),
            total_adjustment,
            delta_ms
        );
        let mut clamped = 0;
        let subtitles = subtitles
            .iter()
            .map(|sub| {
                let (start_ms, start_clamped) = offset(sub.start_ms, delta_ms);
                let (end_ms, end_clamped) = offset(sub.end_ms, delta_ms);
                clamped += usize::from(start_clamped) + usize::from(end_clamped);
                Subtitle {
                    start_ms,
                    end_ms,
                    ..sub.clone()
                }
            })
            .collect();
        if clamped > 0 {
            warn!("{} subtitle times clamped to zero by a {} ms shift", clamped, delta_ms);
        }
        Adjustment {
            subtitles,
            total_adjustment: total_adjustment.saturating_add(delta_ms),
            clamped,
        }
    }

    /// Undo `total_adjustment` by shifting the opposite way and zero the total.
    ///
    /// This rebuilds the original timing from the current one instead of
    /// restoring a snapshot, so anything lost to clamping stays lost.
    pub fn reset_all(subtitles: &[Subtitle], total_adjustment: i64) -> Adjustment {
        trace!("reset_all(count={}, total={})", subtitles.len(), total_adjustment);
        let mut adjustment =
            Self::shift_all(subtitles, total_adjustment, total_adjustment.saturating_neg());
        adjustment.total_adjustment = 0;
        adjustment
    }
}

fn offset(ms: u64, delta_ms: i64) -> (u64, bool) {
    let shifted = i128::from(ms) + i128::from(delta_ms);
    if shifted < 0 {
        (0, true)
    } else {
        (u64::try_from(shifted).unwrap_or(u64::MAX), false)
    }
}
