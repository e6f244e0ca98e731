//! Civil-time helpers over chrono/chrono-tz.
//!
//! All calendar arithmetic the rule families share: localizing a wall-clock
//! time into a timezone (with DST gap/fold policy), month lengths, and
//! month/quarter stepping. Correctness of instant construction and
//! day-of-week arithmetic is delegated to chrono; nothing here re-derives it.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{RecurrenceError, Result};

/// Build a `NaiveTime` from validated hour/minute/second fields.
pub(crate) fn time_of_day(hour: u32, minute: u32, second: u32) -> Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| {
        RecurrenceError::InvalidParameter(format!(
            "invalid time of day {hour:02}:{minute:02}:{second:02}"
        ))
    })
}

/// Build a `NaiveDate`, rejecting fields that name no real date.
pub(crate) fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        RecurrenceError::InvalidParameter(format!("no such date: {year:04}-{month:02}-{day:02}"))
    })
}

/// Map a wall-clock datetime into a timezone.
///
/// DST fold (the repeated hour) resolves to the earlier instant. A DST gap
/// (the skipped hour) rolls the wall clock forward until it exists.
pub(crate) fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    let mut candidate = naive;
    for _ in 0..3 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earlier, _) => return earlier,
            LocalResult::None => candidate += Duration::hours(1),
        }
    }
    // No real timezone skips more than a couple of hours; treat the wall
    // clock as UTC rather than fail the evaluation.
    tz.from_utc_datetime(&naive)
}

/// Localize a date at a given wall-clock time.
pub(crate) fn at_time(tz: Tz, day: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    localize(tz, day.and_time(time))
}

/// Number of days in a month.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

/// Step forward one calendar month.
pub(crate) fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Step backward one calendar month.
pub(crate) fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// First month of the quarter containing `month` (1, 4, 7, or 10).
pub(crate) fn quarter_first_month(month: u32) -> u32 {
    ((month - 1) / 3) * 3 + 1
}

/// Last month of the quarter containing `month` (3, 6, 9, or 12).
pub(crate) fn quarter_last_month(month: u32) -> u32 {
    quarter_first_month(month) + 2
}

/// Step forward one quarter from a quarter's first month.
pub(crate) fn next_quarter(year: i32, quarter_month: u32) -> (i32, u32) {
    if quarter_month >= 10 {
        (year + 1, 1)
    } else {
        (year, quarter_month + 3)
    }
}

/// Step backward one quarter from a quarter's first month.
pub(crate) fn prev_quarter(year: i32, quarter_month: u32) -> (i32, u32) {
    if quarter_month <= 1 {
        (year - 1, 10)
    } else {
        (year, quarter_month - 3)
    }
}

/// The civil year/month an instant falls in, seen from the rule's timezone.
pub(crate) fn year_month(instant: DateTime<Tz>) -> (i32, u32) {
    (instant.year(), instant.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn month_lengths_respect_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn month_stepping_wraps_years() {
        assert_eq!(next_month(2024, 12), (2025, 1));
        assert_eq!(next_month(2024, 5), (2024, 6));
        assert_eq!(prev_month(2024, 1), (2023, 12));
    }

    #[test]
    fn quarter_boundaries() {
        assert_eq!(quarter_first_month(1), 1);
        assert_eq!(quarter_first_month(3), 1);
        assert_eq!(quarter_first_month(4), 4);
        assert_eq!(quarter_first_month(12), 10);
        assert_eq!(quarter_last_month(2), 3);
        assert_eq!(quarter_last_month(11), 12);
        assert_eq!(next_quarter(2024, 10), (2025, 1));
        assert_eq!(prev_quarter(2024, 1), (2023, 10));
    }

    #[test]
    fn localize_rolls_forward_through_dst_gap() {
        // US Eastern skipped 02:00-03:00 on 2024-03-10.
        let gap = date(2024, 3, 10)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(2, 30, 0).unwrap());
        let resolved = localize(chrono_tz::US::Eastern, gap);
        assert_eq!(resolved.hour(), 3);
    }

    #[test]
    fn localize_picks_earlier_instant_in_dst_fold() {
        // US Eastern repeated 01:00-02:00 on 2024-11-03.
        let fold = date(2024, 11, 3)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(1, 30, 0).unwrap());
        let resolved = localize(chrono_tz::US::Eastern, fold);
        // The earlier instant is still in EDT (UTC-4), so 01:30 local is 05:30 UTC.
        assert_eq!(
            resolved.naive_utc(),
            date(2024, 11, 3)
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(5, 30, 0).unwrap())
        );
    }

    #[test]
    fn rejects_impossible_dates_and_times() {
        assert!(date(2023, 2, 29).is_err());
        assert!(time_of_day(24, 0, 0).is_err());
        assert!(time_of_day(18, 30, 0).is_ok());
    }
}
