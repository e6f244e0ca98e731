//! Fixed-cadence families that ignore the calendar grid.
//!
//! `EveryNDays` anchors to a wall-clock time of day: the alignment search
//! advances day by day (so a partially-elapsed cadence re-synchronizes to
//! the daily clock instead of drifting), while the produced window spans the
//! full interval. `EveryNInterval` anchors to a midnight-based minute grid.

use chrono::{DateTime, Days, Duration, NaiveTime};
use chrono_tz::Tz;

use crate::calendar::at_time;
use crate::error::Result;

// ── Every N days ────────────────────────────────────────────────────

/// Earliest daily-clock-aligned instant at or after `after`.
pub(super) fn next_every_n_days(
    tz: Tz,
    time: NaiveTime,
    after: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let aligned = at_time(tz, after.date_naive(), time);
    if aligned < after {
        return Ok(at_time(tz, after.date_naive() + Days::new(1), time));
    }
    Ok(aligned)
}

/// Latest aligned instant at or before `reference`, stepping back one full
/// interval when the reference day's wall-clock time has not yet arrived.
/// Direct arithmetic; no backward loop.
pub(super) fn prev_every_n_days(
    tz: Tz,
    interval_days: u32,
    time: NaiveTime,
    reference: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let aligned = at_time(tz, reference.date_naive(), time);
    if aligned > reference {
        return Ok(at_time(
            tz,
            reference.date_naive() - Days::new(u64::from(interval_days)),
            time,
        ));
    }
    Ok(aligned)
}

/// Window end for an every-N-days run: the start advanced by the whole
/// interval in civil days (the wall-clock time is preserved across DST).
pub(super) fn every_n_days_end(
    tz: Tz,
    interval_days: u32,
    time: NaiveTime,
    start: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    Ok(at_time(
        tz,
        start.date_naive() + Days::new(u64::from(interval_days)),
        time,
    ))
}

// ── Every N interval ────────────────────────────────────────────────

/// Earliest grid point at or after `after` on the midnight-anchored grid of
/// `total_minutes`.
pub(super) fn next_every_n_interval(
    tz: Tz,
    total_minutes: i64,
    after: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let aligned = align_to_grid(tz, total_minutes, after);
    if aligned < after {
        return Ok(aligned + Duration::minutes(total_minutes));
    }
    Ok(aligned)
}

/// Latest grid point at or before `reference`.
pub(super) fn prev_every_n_interval(
    tz: Tz,
    total_minutes: i64,
    reference: DateTime<Tz>,
) -> Result<DateTime<Tz>> {
    let aligned = align_to_grid(tz, total_minutes, reference);
    if aligned > reference {
        return Ok(aligned - Duration::minutes(total_minutes));
    }
    Ok(aligned)
}

/// Floor `instant` onto the grid counted from its own civil midnight.
fn align_to_grid(tz: Tz, total_minutes: i64, instant: DateTime<Tz>) -> DateTime<Tz> {
    let midnight = at_time(tz, instant.date_naive(), NaiveTime::MIN);
    let elapsed = (instant - midnight).num_minutes();
    let steps = elapsed.max(0) / total_minutes;
    midnight + Duration::minutes(steps * total_minutes)
}
