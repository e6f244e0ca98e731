//! Month-grid occurrence computation: last day, fixed day (with clamping),
//! multiple days, and last-day-skipping-weekends.
//!
//! Single-occurrence families expose an `occurrence(year, month)` function
//! that the shared grid walkers in [`super`] drive. Multi-candidate families
//! (multiple days, semi-monthly) carry their own search because a month can
//! hold several candidates.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveTime};
use chrono_tz::Tz;

use crate::calendar::{self, at_time};
use crate::error::{RecurrenceError, Result};

/// Last calendar day of the month at the configured wall-clock time.
pub(super) fn last_day(tz: Tz, time: NaiveTime, year: i32, month: u32) -> Result<DateTime<Tz>> {
    let day = calendar::days_in_month(year, month);
    Ok(at_time(tz, calendar::date(year, month, day)?, time))
}

/// Last calendar day, walked backward while it lands on a Saturday or Sunday.
pub(super) fn last_day_skip_weekend(
    tz: Tz,
    time: NaiveTime,
    year: i32,
    month: u32,
) -> Result<DateTime<Tz>> {
    let mut date = calendar::date(year, month, calendar::days_in_month(year, month))?;
    while date.weekday().num_days_from_monday() >= 5 {
        date = date.pred_opt().ok_or_else(|| {
            RecurrenceError::InvalidParameter(format!("date underflow before {date}"))
        })?;
    }
    Ok(at_time(tz, date, time))
}

/// Fixed day of month, clamped to the month's actual last day so every
/// month yields a valid date regardless of length.
pub(super) fn on_day(
    tz: Tz,
    time: NaiveTime,
    configured_day: u32,
    year: i32,
    month: u32,
) -> Result<DateTime<Tz>> {
    let day = configured_day.min(calendar::days_in_month(year, month));
    Ok(at_time(tz, calendar::date(year, month, day)?, time))
}

/// Configured days normalized for one month: clamped to the month's last
/// day, deduplicated, ascending.
fn month_candidates(days: &[u32], year: i32, month: u32) -> BTreeSet<u32> {
    let last = calendar::days_in_month(year, month);
    days.iter().map(|&d| d.clamp(1, last)).collect()
}

/// Earliest multiple-days occurrence at or after `after`.
pub(super) fn next_multiple_days(
    tz: Tz,
    time: NaiveTime,
    days: &[u32],
    after: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let (mut year, mut month) = calendar::year_month(after);
    loop {
        for day in month_candidates(days, year, month) {
            let occurrence = at_time(tz, calendar::date(year, month, day)?, time);
            if occurrence >= after {
                return Ok(occurrence);
            }
        }
        (year, month) = calendar::next_month(year, month);
    }
}

/// Latest multiple-days occurrence at or before `reference`.
pub(super) fn prev_multiple_days(
    tz: Tz,
    time: NaiveTime,
    days: &[u32],
    reference: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let (mut year, mut month) = calendar::year_month(reference);
    loop {
        for day in month_candidates(days, year, month).into_iter().rev() {
            let occurrence = at_time(tz, calendar::date(year, month, day)?, time);
            if occurrence <= reference {
                return Ok(occurrence);
            }
        }
        (year, month) = calendar::prev_month(year, month);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    fn tod(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        UTC.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn last_day_handles_leap_february() {
        assert_eq!(
            last_day(UTC, tod(18, 30), 2024, 2).unwrap(),
            utc(2024, 2, 29, 18, 30)
        );
        assert_eq!(
            last_day(UTC, tod(18, 30), 2023, 2).unwrap(),
            utc(2023, 2, 28, 18, 30)
        );
    }

    #[test]
    fn skip_weekend_backs_up_to_friday() {
        // 2024-03-31 is a Sunday; the occurrence moves to Friday the 29th.
        assert_eq!(
            last_day_skip_weekend(UTC, tod(17, 0), 2024, 3).unwrap(),
            utc(2024, 3, 29, 17, 0)
        );
        // 2024-01-31 is a Wednesday; no adjustment.
        assert_eq!(
            last_day_skip_weekend(UTC, tod(17, 0), 2024, 1).unwrap(),
            utc(2024, 1, 31, 17, 0)
        );
    }

    #[test]
    fn on_day_clamps_to_short_months() {
        assert_eq!(
            on_day(UTC, tod(9, 0), 31, 2024, 2).unwrap(),
            utc(2024, 2, 29, 9, 0)
        );
        assert_eq!(
            on_day(UTC, tod(9, 0), 31, 2024, 4).unwrap(),
            utc(2024, 4, 30, 9, 0)
        );
        assert_eq!(
            on_day(UTC, tod(9, 0), 31, 2024, 1).unwrap(),
            utc(2024, 1, 31, 9, 0)
        );
    }

    #[test]
    fn multiple_days_picks_smallest_qualifying_candidate() {
        let days = vec![15, 1];
        let after = utc(2024, 1, 2, 0, 0);
        assert_eq!(
            next_multiple_days(UTC, tod(8, 0), &days, after).unwrap(),
            utc(2024, 1, 15, 8, 0)
        );
    }

    #[test]
    fn multiple_days_rolls_into_next_month() {
        let days = vec![1, 15];
        let after = utc(2024, 1, 20, 0, 0);
        assert_eq!(
            next_multiple_days(UTC, tod(8, 0), &days, after).unwrap(),
            utc(2024, 2, 1, 8, 0)
        );
    }

    #[test]
    fn multiple_days_deduplicates_clamped_candidates() {
        // 30 and 31 both clamp to February 29 and must count once.
        let days = vec![30, 31];
        let after = utc(2024, 2, 1, 0, 0);
        assert_eq!(
            next_multiple_days(UTC, tod(0, 0), &days, after).unwrap(),
            utc(2024, 2, 29, 0, 0)
        );
    }

    #[test]
    fn prev_multiple_days_returns_latest_at_or_before() {
        let days = vec![1, 15];
        let reference = utc(2024, 2, 10, 0, 0);
        assert_eq!(
            prev_multiple_days(UTC, tod(8, 0), &days, reference).unwrap(),
            utc(2024, 2, 1, 8, 0)
        );

        // Before any candidate this month: previous month's latest.
        let reference = utc(2024, 2, 1, 7, 59);
        assert_eq!(
            prev_multiple_days(UTC, tod(8, 0), &days, reference).unwrap(),
            utc(2024, 1, 15, 8, 0)
        );
    }
}
