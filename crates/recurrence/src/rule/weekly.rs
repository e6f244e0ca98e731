//! Week-grid occurrences: weekly on a weekday, and biweekly on a weekday
//! locked to a 14-day cycle counted from an anchor date.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;

use crate::calendar::at_time;
use crate::error::Result;

const CYCLE_DAYS: u64 = 14;

fn days_until_weekday(from: Weekday, to: Weekday) -> u64 {
    ((to.num_days_from_monday() + 7 - from.num_days_from_monday()) % 7) as u64
}

/// Earliest weekly occurrence at or after `after`.
///
/// The full time-of-day is compared, so a search at exactly the target
/// instant returns that instant rather than jumping a week ahead.
pub(super) fn next_weekly(
    tz: Tz,
    weekday: Weekday,
    time: NaiveTime,
    after: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let mut ahead = days_until_weekday(after.weekday(), weekday);
    if ahead == 0 && after.time() > time {
        ahead = 7;
    }
    Ok(at_time(tz, after.date_naive() + Days::new(ahead), time))
}

/// Latest weekly occurrence at or before `reference`.
pub(super) fn prev_weekly(
    tz: Tz,
    weekday: Weekday,
    time: NaiveTime,
    reference: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let mut back = days_until_weekday(weekday, reference.weekday());
    if back == 0 && reference.time() < time {
        back = 7;
    }
    Ok(at_time(tz, reference.date_naive() - Days::new(back), time))
}

/// First occurrence of `weekday` on or after the anchor date. The 14-day
/// cycle counts from here.
pub(super) fn first_run(
    tz: Tz,
    weekday: Weekday,
    anchor: NaiveDate,
    time: NaiveTime,
) -> Result<DateTime<Tz>> {
    let ahead = days_until_weekday(anchor.weekday(), weekday);
    Ok(at_time(tz, anchor + Days::new(ahead), time))
}

/// Next biweekly occurrence strictly after `after`.
///
/// A search instant that lands exactly on a cycle point advances a full
/// cycle, so repeated calls always make forward progress. A search before
/// the first run returns the first run.
pub(super) fn next_biweekly(
    tz: Tz,
    weekday: Weekday,
    anchor: NaiveDate,
    time: NaiveTime,
    after: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let first = first_run(tz, weekday, anchor, time)?;
    if after < first {
        return Ok(first);
    }

    let elapsed_days = (after.date_naive() - first.date_naive()).num_days().max(0) as u64;
    let mut date = first.date_naive() + Days::new(elapsed_days / CYCLE_DAYS * CYCLE_DAYS);
    let mut occurrence = at_time(tz, date, time);
    while occurrence <= after {
        date = date + Days::new(CYCLE_DAYS);
        occurrence = at_time(tz, date, time);
    }
    Ok(occurrence)
}

/// Latest biweekly occurrence at or before `reference`, clamped to the
/// first run when the reference predates the whole cycle.
pub(super) fn prev_biweekly(
    tz: Tz,
    weekday: Weekday,
    anchor: NaiveDate,
    time: NaiveTime,
    reference: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let first = first_run(tz, weekday, anchor, time)?;
    if reference <= first {
        return Ok(first);
    }

    let elapsed_days = (reference.date_naive() - first.date_naive()).num_days().max(0) as u64;
    let date = first.date_naive() + Days::new(elapsed_days / CYCLE_DAYS * CYCLE_DAYS);
    let occurrence = at_time(tz, date, time);
    if occurrence > reference {
        let stepped_back = at_time(tz, date - Days::new(CYCLE_DAYS), time);
        return Ok(stepped_back.max(first));
    }
    Ok(occurrence)
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

    // 2024-01-01 is a Monday.
    const ANCHOR: &str = "2024-01-01";

    fn anchor() -> NaiveDate {
        ANCHOR.parse().unwrap()
    }

    #[test]
    fn weekly_same_day_before_target_time_stays_on_day() {
        let after = utc(2024, 1, 1, 7, 0); // Monday 07:00
        let next = next_weekly(UTC, Weekday::Mon, tod(8, 0), after).unwrap();
        assert_eq!(next, utc(2024, 1, 1, 8, 0));
    }

    #[test]
    fn weekly_exactly_at_target_time_returns_that_instant() {
        let after = utc(2024, 1, 1, 8, 0);
        let next = next_weekly(UTC, Weekday::Mon, tod(8, 0), after).unwrap();
        assert_eq!(next, after);
    }

    #[test]
    fn weekly_past_target_time_jumps_a_week() {
        let after = utc(2024, 1, 1, 8, 0) + chrono::Duration::seconds(1);
        let next = next_weekly(UTC, Weekday::Mon, tod(8, 0), after).unwrap();
        assert_eq!(next, utc(2024, 1, 8, 8, 0));
    }

    #[test]
    fn weekly_previous_occurrence() {
        let reference = utc(2024, 1, 10, 12, 0); // Wednesday
        let prev = prev_weekly(UTC, Weekday::Mon, tod(8, 0), reference).unwrap();
        assert_eq!(prev, utc(2024, 1, 8, 8, 0));

        // Same weekday but earlier than the target time: previous week.
        let reference = utc(2024, 1, 8, 7, 0);
        let prev = prev_weekly(UTC, Weekday::Mon, tod(8, 0), reference).unwrap();
        assert_eq!(prev, utc(2024, 1, 1, 8, 0));
    }

    #[test]
    fn biweekly_first_run_aligns_to_weekday_after_anchor() {
        // Anchor Monday, target Wednesday: first run two days later.
        let first = first_run(UTC, Weekday::Wed, anchor(), tod(9, 0)).unwrap();
        assert_eq!(first, utc(2024, 1, 3, 9, 0));
    }

    #[test]
    fn biweekly_off_cycle_week_advances_to_next_cycle() {
        // First occurrence 2024-01-01; searching from the off-cycle Monday
        // 2024-01-08 must land on 2024-01-15, not 2024-01-08.
        let next = next_biweekly(UTC, Weekday::Mon, anchor(), tod(0, 0), utc(2024, 1, 8, 0, 0)).unwrap();
        assert_eq!(next, utc(2024, 1, 15, 0, 0));
    }

    #[test]
    fn biweekly_on_cycle_point_is_strictly_greater() {
        let next = next_biweekly(UTC, Weekday::Mon, anchor(), tod(0, 0), utc(2024, 1, 15, 0, 0)).unwrap();
        assert_eq!(next, utc(2024, 1, 29, 0, 0));
    }

    #[test]
    fn biweekly_before_first_run_returns_first_run() {
        let next = next_biweekly(UTC, Weekday::Mon, anchor(), tod(0, 0), utc(2023, 12, 1, 0, 0)).unwrap();
        assert_eq!(next, utc(2024, 1, 1, 0, 0));

        let prev = prev_biweekly(UTC, Weekday::Mon, anchor(), tod(0, 0), utc(2023, 12, 1, 0, 0)).unwrap();
        assert_eq!(prev, utc(2024, 1, 1, 0, 0));
    }

    #[test]
    fn biweekly_previous_occurrence_stays_on_cycle() {
        let prev = prev_biweekly(UTC, Weekday::Mon, anchor(), tod(0, 0), utc(2024, 1, 20, 0, 0)).unwrap();
        assert_eq!(prev, utc(2024, 1, 15, 0, 0));

        // Inside the off-cycle week the covering occurrence is the cycle start.
        let prev = prev_biweekly(UTC, Weekday::Mon, anchor(), tod(0, 0), utc(2024, 1, 9, 0, 0)).unwrap();
        assert_eq!(prev, utc(2024, 1, 1, 0, 0));
    }
}
