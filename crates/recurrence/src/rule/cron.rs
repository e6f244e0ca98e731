//! Thin adapter over the external cron evaluator.
//!
//! Cron-field parsing and "next occurrence" search stay entirely inside the
//! `cron` crate; this module only normalizes expressions, maps errors, and
//! adds the backward ("latest tick at or before") search the evaluator does
//! not provide natively.

use std::str::FromStr;

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use cron::Schedule;
use tracing::warn;

use crate::error::{RecurrenceError, Result};

/// Lookback horizons for the backward search, in days. Widened until a tick
/// is found; 1600 days covers any yearly expression.
const LOOKBACK_DAYS: [i64; 5] = [1, 7, 62, 400, 1600];

/// Normalize a 5-field cron expression to the 6-field form the evaluator
/// expects (`sec min hour day-of-month month day-of-week`) by prepending a
/// zero seconds field. 6-field input passes through unchanged.
fn normalize(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Parse an expression, surfacing evaluator failures as configuration errors.
pub(super) fn parse(expression: &str) -> Result<Schedule> {
    Schedule::from_str(&normalize(expression)).map_err(|e| {
        warn!(cron = %expression, error = %e, "invalid cron expression");
        RecurrenceError::Cron {
            expression: expression.to_string(),
            message: e.to_string(),
        }
    })
}

/// Earliest tick at or after `after`.
pub(super) fn next_tick(expression: &str, after: DateTime<Tz>) -> Result<DateTime<Tz>> {
    let schedule = parse(expression)?;
    // The evaluator searches strictly after its argument; back up one second
    // so a tick landing exactly on `after` still qualifies.
    schedule
        .after(&(after - Duration::seconds(1)))
        .next()
        .ok_or_else(|| RecurrenceError::Cron {
            expression: expression.to_string(),
            message: format!("no occurrence at or after {after}"),
        })
}

/// Tick strictly after `start`; used as the window end of a cron interval.
pub(super) fn tick_after(expression: &str, start: DateTime<Tz>) -> Result<DateTime<Tz>> {
    let schedule = parse(expression)?;
    schedule
        .after(&start)
        .next()
        .ok_or_else(|| RecurrenceError::Cron {
            expression: expression.to_string(),
            message: format!("no occurrence after {start}"),
        })
}

/// Latest tick at or before `reference`, found by scanning forward from a
/// widening lookback window.
pub(super) fn prev_tick(expression: &str, reference: DateTime<Tz>) -> Result<DateTime<Tz>> {
    let schedule = parse(expression)?;
    for days in LOOKBACK_DAYS {
        let from = reference - Duration::days(days);
        let found = schedule
            .after(&from)
            .take_while(|tick| *tick <= reference)
            .last();
        if let Some(tick) = found {
            return Ok(tick);
        }
    }
    Err(RecurrenceError::Cron {
        expression: expression.to_string(),
        message: format!("no occurrence at or before {reference}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    fn utc(mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        UTC.with_ymd_and_hms(2024, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn five_field_expressions_are_normalized() {
        assert_eq!(normalize("*/15 * * * *"), "0 */15 * * * *");
        assert_eq!(normalize("  0 9 15 * *  "), "0 0 9 15 * *");
        assert_eq!(normalize("0 0 9 15 * *"), "0 0 9 15 * *");
    }

    #[test]
    fn invalid_expression_is_a_configuration_error() {
        assert!(matches!(
            parse("not a cron"),
            Err(RecurrenceError::Cron { .. })
        ));
    }

    #[test]
    fn next_tick_is_at_or_after() {
        // 15th of every month at 09:00.
        let next = next_tick("0 9 15 * *", utc(1, 10, 0, 0)).unwrap();
        assert_eq!(next, utc(1, 15, 9, 0));

        // Exactly on a tick: that tick qualifies.
        let next = next_tick("0 9 15 * *", utc(1, 15, 9, 0)).unwrap();
        assert_eq!(next, utc(1, 15, 9, 0));
    }

    #[test]
    fn tick_after_is_strictly_after() {
        let end = tick_after("0 9 15 * *", utc(1, 15, 9, 0)).unwrap();
        assert_eq!(end, utc(2, 15, 9, 0));
    }

    #[test]
    fn prev_tick_scans_backward() {
        let prev = prev_tick("0 9 15 * *", utc(3, 1, 0, 0)).unwrap();
        assert_eq!(prev, utc(2, 15, 9, 0));

        // Exactly on a tick: that tick is the covering one.
        let prev = prev_tick("0 9 15 * *", utc(2, 15, 9, 0)).unwrap();
        assert_eq!(prev, utc(2, 15, 9, 0));
    }

    #[test]
    fn prev_tick_widens_lookback_for_sparse_schedules() {
        // Once a year on June 1st; a January reference needs a 7-month lookback.
        let prev = prev_tick("0 0 1 6 *", utc(1, 10, 0, 0)).unwrap();
        assert_eq!(
            prev,
            UTC.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap()
        );
    }
}
