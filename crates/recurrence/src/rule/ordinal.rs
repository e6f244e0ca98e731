//! Nth-from-start / nth-from-end day scans within a single month.
//!
//! Positive `n` counts qualifying days forward from the month start
//! (1 = first); negative `n` counts backward from the month end (-1 = last).
//! The scan never leaves the month: when `|n|` exceeds the number of
//! qualifying days, it clamps to the last (resp. first) qualifying day.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::calendar;
use crate::error::{RecurrenceError, Result};

/// The `n`-th occurrence of `weekday` within the given month.
pub(crate) fn nth_weekday_of_month(
    year: i32,
    month: u32,
    weekday: Weekday,
    n: i32,
) -> Result<NaiveDate> {
    pick_nth(year, month, n, |day| day.weekday() == weekday)
}

/// The `n`-th business day (Monday through Friday) within the given month.
pub(crate) fn nth_business_day_of_month(year: i32, month: u32, n: i32) -> Result<NaiveDate> {
    pick_nth(year, month, n, is_business_day)
}

/// Business day = any weekday excluding Saturday and Sunday.
pub(crate) fn is_business_day(day: NaiveDate) -> bool {
    day.weekday().num_days_from_monday() < 5
}

fn pick_nth(
    year: i32,
    month: u32,
    n: i32,
    qualifies: impl Fn(NaiveDate) -> bool,
) -> Result<NaiveDate> {
    if n == 0 {
        return Err(RecurrenceError::ZeroOrdinal);
    }

    let mut matches = Vec::with_capacity(23);
    for day in 1..=calendar::days_in_month(year, month) {
        let date = calendar::date(year, month, day)?;
        if qualifies(date) {
            matches.push(date);
        }
    }

    // Every month has at least four of each weekday and twenty business
    // days; clamp |n| into the available range.
    let index = if n > 0 {
        (n as usize).min(matches.len()).saturating_sub(1)
    } else {
        matches.len() - (n.unsigned_abs() as usize).min(matches.len())
    };

    matches.get(index).copied().ok_or_else(|| {
        RecurrenceError::InvalidParameter(format!(
            "{year:04}-{month:02} has no qualifying days"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn second_monday_of_march_2024() {
        // First Monday is 2024-03-04, second is 2024-03-11.
        let found = nth_weekday_of_month(2024, 3, Weekday::Mon, 2).unwrap();
        assert_eq!(found, day(2024, 3, 11));
    }

    #[test]
    fn last_friday_counts_from_month_end() {
        let found = nth_weekday_of_month(2024, 3, Weekday::Fri, -1).unwrap();
        assert_eq!(found, day(2024, 3, 29));

        let second_to_last = nth_weekday_of_month(2024, 3, Weekday::Fri, -2).unwrap();
        assert_eq!(second_to_last, day(2024, 3, 22));
    }

    #[test]
    fn zero_ordinal_is_rejected() {
        assert_eq!(
            nth_weekday_of_month(2024, 3, Weekday::Mon, 0),
            Err(RecurrenceError::ZeroOrdinal)
        );
        assert_eq!(
            nth_business_day_of_month(2024, 3, 0),
            Err(RecurrenceError::ZeroOrdinal)
        );
    }

    #[test]
    fn overlarge_ordinal_clamps_to_month_bounds() {
        // March 2024 has five Fridays; a sixth clamps to the last one.
        let found = nth_weekday_of_month(2024, 3, Weekday::Fri, 6).unwrap();
        assert_eq!(found, day(2024, 3, 29));

        let found = nth_weekday_of_month(2024, 3, Weekday::Fri, -9).unwrap();
        assert_eq!(found, day(2024, 3, 1));
    }

    #[test]
    fn first_business_day_skips_weekends() {
        // 2024-06-01 is a Saturday; first business day is Monday the 3rd.
        let found = nth_business_day_of_month(2024, 6, 1).unwrap();
        assert_eq!(found, day(2024, 6, 3));
    }

    #[test]
    fn last_business_day_of_march_2024() {
        // 2024-03-31 is a Sunday; the last business day is Friday the 29th.
        let found = nth_business_day_of_month(2024, 3, -1).unwrap();
        assert_eq!(found, day(2024, 3, 29));
    }

    #[test]
    fn business_day_predicate() {
        assert!(is_business_day(day(2024, 6, 3))); // Monday
        assert!(!is_business_day(day(2024, 6, 1))); // Saturday
        assert!(!is_business_day(day(2024, 6, 2))); // Sunday
    }
}
