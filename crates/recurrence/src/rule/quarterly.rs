//! Quarter-grid occurrences: first and last day of the calendar quarter.

use chrono::{DateTime, NaiveTime};
use chrono_tz::Tz;

use crate::calendar::{self, at_time};
use crate::error::Result;

/// First day of the quarter whose first month is `quarter_month`.
pub(super) fn first_day(
    tz: Tz,
    time: NaiveTime,
    year: i32,
    quarter_month: u32,
) -> Result<DateTime<Tz>> {
    Ok(at_time(tz, calendar::date(year, quarter_month, 1)?, time))
}

/// Last day of the quarter whose first month is `quarter_month`.
pub(super) fn last_day(
    tz: Tz,
    time: NaiveTime,
    year: i32,
    quarter_month: u32,
) -> Result<DateTime<Tz>> {
    let month = calendar::quarter_last_month(quarter_month);
    let day = calendar::days_in_month(year, month);
    Ok(at_time(tz, calendar::date(year, month, day)?, time))
}
