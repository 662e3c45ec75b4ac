//! Daily-activity streak calculation.

use chrono::{DateTime, Utc};

/// Compute the updated streak for a newly accepted post at `now`.
///
/// Day deltas are UTC calendar days, not elapsed hours: a post at 23:59
/// followed by one at 00:01 counts as consecutive days.
///
/// - no prior accepted post: streak starts at 1
/// - same day: unchanged
/// - previous day: +1
/// - gap of two or more days, or a negative delta (clock skew): reset to 1
pub fn next_streak(last_post_date: Option<DateTime<Utc>>, streak: u32, now: DateTime<Utc>) -> u32 {
    let Some(last) = last_post_date else {
        return 1;
    };

    let delta = now.date_naive().signed_duration_since(last.date_naive()).num_days();
    match delta {
        0 => streak.max(1),
        1 => streak + 1,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn first_accepted_post_starts_streak() {
        assert_eq!(next_streak(None, 0, at(2026, 3, 10, 12)), 1);
    }

    #[test]
    fn same_day_keeps_streak() {
        let last = at(2026, 3, 10, 1);
        assert_eq!(next_streak(Some(last), 5, at(2026, 3, 10, 23)), 5);
    }

    #[test]
    fn next_day_extends_streak() {
        let last = at(2026, 3, 10, 23);
        assert_eq!(next_streak(Some(last), 5, at(2026, 3, 11, 0)), 6);
    }

    #[test]
    fn calendar_day_boundary_not_elapsed_hours() {
        // 2 hours apart but across midnight UTC: consecutive days.
        let last = at(2026, 3, 10, 23);
        assert_eq!(next_streak(Some(last), 1, at(2026, 3, 11, 1)), 2);
    }

    #[test]
    fn gap_resets_streak() {
        let last = at(2026, 3, 7, 12);
        assert_eq!(next_streak(Some(last), 5, at(2026, 3, 10, 12)), 1);
    }

    #[test]
    fn clock_skew_resets_streak() {
        let last = at(2026, 3, 12, 12);
        assert_eq!(next_streak(Some(last), 5, at(2026, 3, 10, 12)), 1);
    }

    #[test]
    fn same_day_repairs_zero_streak() {
        // A user record seeded with streak 0 still ends up >= 1.
        let last = at(2026, 3, 10, 1);
        assert_eq!(next_streak(Some(last), 0, at(2026, 3, 10, 2)), 1);
    }
}
