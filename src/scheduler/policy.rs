//! Review interval policy

use chrono::Duration;

/// Days until the next review, indexed by stage
pub const REVIEW_INTERVALS_DAYS: [i64; 6] = [1, 3, 7, 14, 30, 60];

/// Interval once a skill has graduated; longer than any staged interval
pub const GRADUATED_INTERVAL_DAYS: i64 = 90;

/// Consecutive correct reviews needed to graduate
pub const GRADUATION_THRESHOLD: u32 = 6;

/// Share of the current interval a due skill may go unreviewed before it
/// counts as rusty
pub const RUSTY_GRACE_FRACTION: f64 = 0.5;

/// Interval in days for `stage`, clamped to the last table entry
pub fn interval_days(stage: u32) -> i64 {
    let last = REVIEW_INTERVALS_DAYS.len() - 1;
    REVIEW_INTERVALS_DAYS[(stage as usize).min(last)]
}

/// Interval for `stage`, or the graduated interval
pub fn interval(stage: u32, graduated: bool) -> Duration {
    if graduated {
        Duration::days(GRADUATED_INTERVAL_DAYS)
    } else {
        Duration::days(interval_days(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_non_decreasing() {
        assert!(REVIEW_INTERVALS_DAYS.windows(2).all(|w| w[0] <= w[1]));
        assert!(REVIEW_INTERVALS_DAYS
            .iter()
            .all(|&d| d < GRADUATED_INTERVAL_DAYS));
    }

    #[test]
    fn test_stage_is_clamped() {
        assert_eq!(interval_days(0), 1);
        assert_eq!(interval_days(2), 7);
        assert_eq!(interval_days(5), 60);
        assert_eq!(interval_days(6), 60);
        assert_eq!(interval_days(u32::MAX), 60);
    }

    #[test]
    fn test_graduated_interval() {
        assert_eq!(interval(0, true), Duration::days(90));
        assert_eq!(interval(3, false), Duration::days(14));
    }
}
