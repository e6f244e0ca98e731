//! Year-grid occurrences: first day of the year and the nth weekday of a
//! fixed month.

use chrono::{DateTime, NaiveTime, Weekday};
use chrono_tz::Tz;

use crate::calendar::{self, at_time};
use crate::error::Result;

use super::ordinal;

/// January 1st of `year` at the configured wall-clock time.
pub(super) fn first_day(tz: Tz, time: NaiveTime, year: i32) -> Result<DateTime<Tz>> {
    Ok(at_time(tz, calendar::date(year, 1, 1)?, time))
}

/// The nth `weekday` of the configured month in `year`.
pub(super) fn nth_weekday(
    tz: Tz,
    time: NaiveTime,
    month: u32,
    weekday: Weekday,
    n: i32,
    year: i32,
) -> Result<DateTime<Tz>> {
    let date = ordinal::nth_weekday_of_month(year, month, weekday, n)?;
    Ok(at_time(tz, date, time))
}
