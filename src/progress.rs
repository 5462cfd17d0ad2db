//! Progress derivation
//!
//! Pure functions turning `(estimated_minutes, elapsed_seconds)` into a
//! display-ready [`ProgressView`]:
//! - percent of the estimate consumed, clamped to 100
//! - remaining time (seconds, and whole minutes for labels)
//! - overage percentage once the estimate is exceeded

use crate::types::ProgressView;

/// Calculator for display progress
pub struct ProgressCalculator;

impl ProgressCalculator {
    /// Derive the progress view for an estimate and elapsed time
    pub fn compute(estimated_minutes: u64, elapsed_seconds: u64) -> ProgressView {
        let total_seconds = estimated_minutes.saturating_mul(60);

        // No estimate: nothing to divide by
        if total_seconds == 0 {
            return ProgressView::default();
        }

        let raw_percent = elapsed_seconds as f64 / total_seconds as f64 * 100.0;
        let percent = raw_percent.min(100.0);

        if elapsed_seconds <= total_seconds {
            let remaining_seconds = total_seconds - elapsed_seconds;
            ProgressView {
                percent,
                remaining_seconds,
                remaining_minutes: Some(round_minutes(remaining_seconds)),
                overage_percent: None,
            }
        } else {
            ProgressView {
                percent,
                remaining_seconds: 0,
                remaining_minutes: None,
                overage_percent: Some(raw_percent.round() as u64),
            }
        }
    }
}

/// Round seconds to the nearest whole minute, halves rounding up
fn round_minutes(seconds: u64) -> u64 {
    (seconds as f64 / 60.0).round().max(0.0) as u64
}

/// Format seconds as `m:ss` (minutes unpadded, seconds zero-padded)
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zero_estimate_guards_division() {
        for elapsed in [0, 1, 500] {
            let view = ProgressCalculator::compute(0, elapsed);
            assert_eq!(view, ProgressView::default());
            assert_eq!(view.percent, 0.0);
        }
    }

    #[test]
    fn test_partial_progress() {
        let view = ProgressCalculator::compute(2, 75);
        assert!((view.percent - 62.5).abs() < 1e-9);
        assert_eq!(view.remaining_seconds, 45);
        // 45s rounds to 1 minute
        assert_eq!(view.remaining_minutes, Some(1));
        assert!(!view.is_overage());
    }

    #[test]
    fn test_exactly_at_estimate() {
        let view = ProgressCalculator::compute(2, 120);
        assert_eq!(
            view,
            ProgressView {
                percent: 100.0,
                remaining_seconds: 0,
                remaining_minutes: Some(0),
                overage_percent: None,
            }
        );
    }

    #[test]
    fn test_overage() {
        let view = ProgressCalculator::compute(2, 150);
        assert_eq!(view.percent, 100.0);
        assert_eq!(view.overage_percent, Some(125));
        assert_eq!(view.remaining_minutes, None);
        assert!(view.is_overage());
    }

    #[test]
    fn test_percent_is_monotonic_and_bounded() {
        let mut last = 0.0;
        for elapsed in 0..=400 {
            let view = ProgressCalculator::compute(3, elapsed);
            assert!((0.0..=100.0).contains(&view.percent));
            assert!(view.percent >= last);
            last = view.percent;
        }
    }

    #[test]
    fn test_remaining_minutes_rounding() {
        // 90 seconds left rounds up to 2 minutes, 89 rounds down to 1
        assert_eq!(ProgressCalculator::compute(2, 30).remaining_minutes, Some(2));
        assert_eq!(ProgressCalculator::compute(2, 31).remaining_minutes, Some(1));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(75), "1:15");
        assert_eq!(format_clock(720), "12:00");
        assert_eq!(format_clock(3725), "62:05");
    }
}
