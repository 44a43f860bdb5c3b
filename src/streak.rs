//! Consecutive-day streak rule.
//!
//! The rule is strict: a streak survives only if the previous credit was
//! exactly yesterday. There is no grace period.

use chrono::{Days, NaiveDate};

use crate::models::Streak;
use crate::utils::{format_date, parse_date};

/// Credit a qualifying action performed on `today`.
///
/// - already credited today: unchanged
/// - last credited yesterday: count + 1
/// - anything else (gap, no prior record, unreadable or future date): restart at 1
pub fn update_streak(current: &Streak, today: NaiveDate) -> Streak {
    let last = parse_date(&current.last_update).ok();

    if last == Some(today) {
        return current.clone();
    }

    let yesterday = today.checked_sub_days(Days::new(1));
    let count = if last.is_some() && last == yesterday {
        current.count.saturating_add(1)
    } else {
        1
    };

    Streak {
        count,
        last_update: format_date(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn streak(count: u32, last_update: &str) -> Streak {
        Streak {
            count,
            last_update: last_update.to_string(),
        }
    }

    #[test]
    fn first_action_ever_starts_at_one() {
        let updated = update_streak(&Streak::default(), day(2026, 10, 19));
        assert_eq!(updated, streak(1, "2026-10-19"));
    }

    #[test]
    fn same_day_is_idempotent() {
        let today = day(2026, 10, 19);
        for current in [Streak::default(), streak(4, "2026-10-18"), streak(9, "2026-10-01")] {
            let once = update_streak(&current, today);
            let twice = update_streak(&once, today);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn yesterday_extends_the_streak() {
        let updated = update_streak(&streak(6, "2026-10-18"), day(2026, 10, 19));
        assert_eq!(updated, streak(7, "2026-10-19"));
    }

    #[test]
    fn yesterday_across_month_and_year_boundaries() {
        assert_eq!(
            update_streak(&streak(2, "2026-02-28"), day(2026, 3, 1)),
            streak(3, "2026-03-01")
        );
        assert_eq!(
            update_streak(&streak(10, "2025-12-31"), day(2026, 1, 1)),
            streak(11, "2026-01-01")
        );
    }

    #[test]
    fn gap_resets_to_one() {
        let updated = update_streak(&streak(12, "2026-10-16"), day(2026, 10, 19));
        assert_eq!(updated, streak(1, "2026-10-19"));

        // exactly one missed day still resets
        let updated = update_streak(&streak(12, "2026-10-17"), day(2026, 10, 19));
        assert_eq!(updated, streak(1, "2026-10-19"));
    }

    #[test]
    fn unreadable_or_future_dates_reset() {
        let today = day(2026, 10, 19);
        assert_eq!(update_streak(&streak(3, "yesterday"), today), streak(1, "2026-10-19"));
        assert_eq!(update_streak(&streak(3, "2026-10-20"), today), streak(1, "2026-10-19"));
    }

    #[test]
    fn already_credited_today_keeps_count() {
        let current = streak(5, "2026-10-19");
        assert_eq!(update_streak(&current, day(2026, 10, 19)), current);
    }
}
