//! Recurrence rule variants and the shared evaluation contract.
//!
//! Each variant is immutable configuration carrying only primitive
//! parameters; evaluation is a pure function of that configuration and the
//! instants passed in. Calendar-anchored families search one period at a
//! time (month, quarter, or year) via the shared grid walkers below, so the
//! forward search terminates after a handful of iterations and day-by-day
//! scanning only ever happens inside a single period.

mod cron;
mod monthly;
mod ordinal;
mod periodic;
mod quarterly;
mod weekly;
mod yearly;


use chrono::{DateTime, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use tracing::debug;

use crate::baseline;
use crate::calendar::{self, at_time};
use crate::error::{RecurrenceError, Result};
use crate::interval::{DataInterval, ScheduleDecision, TimeRestriction};
use crate::params::RuleKind;

/// A recurrence pattern over a calendar or fixed-duration grid.
///
/// All instants exchanged with callers are UTC; each rule evaluates on the
/// civil calendar of its configured timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceRule {
    /// Last calendar day of every month.
    LastDayOfMonth { hour: u32, minute: u32, second: u32, tz: Tz },
    /// Fixed day of every month, clamped to the month's actual last day.
    DayOfMonth { day: u32, hour: u32, minute: u32, second: u32, tz: Tz },
    /// Several fixed days of every month (deduplicated, ascending).
    MultipleDaysOfMonth { days: Vec<u32>, hour: u32, minute: u32, second: u32, tz: Tz },
    /// The nth weekday of every month; `n < 0` counts from the month end.
    NthWeekdayOfMonth { weekday: Weekday, n: i32, hour: u32, minute: u32, second: u32, tz: Tz },
    /// The nth weekday of a fixed month, once a year.
    NthWeekdayOfYear { month: u32, weekday: Weekday, n: i32, hour: u32, minute: u32, second: u32, tz: Tz },
    /// Last calendar day of the month, moved back to Friday when it lands
    /// on a weekend.
    LastDayOfMonthSkipWeekend { hour: u32, minute: u32, second: u32, tz: Tz },
    /// First day of every calendar quarter.
    FirstDayOfQuarter { hour: u32, minute: u32, second: u32, tz: Tz },
    /// Last day of every calendar quarter.
    LastDayOfQuarter { hour: u32, minute: u32, second: u32, tz: Tz },
    /// January 1st, once a year.
    FirstDayOfYear { hour: u32, minute: u32, second: u32, tz: Tz },
    /// Every week on a fixed weekday.
    WeeklyOnWeekday { weekday: Weekday, hour: u32, minute: u32, second: u32, tz: Tz },
    /// Every other week on a fixed weekday; the 14-day cycle counts from the
    /// first occurrence of `weekday` on or after `anchor`.
    BiweeklyOnWeekday { weekday: Weekday, anchor: NaiveDate, hour: u32, minute: u32, second: u32, tz: Tz },
    /// The 15th and the last day of every month.
    SemiMonthly { hour: u32, minute: u32, second: u32, tz: Tz },
    /// The nth business day (Mon-Fri) of every month; `n < 0` counts from
    /// the month end.
    NthBusinessDayOfMonth { n: i32, hour: u32, minute: u32, second: u32, tz: Tz },
    /// Fixed daily cadence anchored to a wall-clock time, independent of
    /// month and week boundaries; the window spans `interval_days`.
    EveryNDays { interval_days: u32, hour: u32, minute: u32, second: u32, tz: Tz },
    /// Fixed-duration cadence on a midnight-anchored minute grid,
    /// independent of calendar fields.
    EveryNInterval { interval_minutes: u32, interval_hours: u32, tz: Tz },
    /// Arbitrary cron expression, delegated to the external cron evaluator.
    Cron { expression: String, tz: Tz },
}

impl RecurrenceRule {
    /// The rule's configured timezone.
    pub fn timezone(&self) -> Tz {
        match self {
            Self::LastDayOfMonth { tz, .. }
            | Self::DayOfMonth { tz, .. }
            | Self::MultipleDaysOfMonth { tz, .. }
            | Self::NthWeekdayOfMonth { tz, .. }
            | Self::NthWeekdayOfYear { tz, .. }
            | Self::LastDayOfMonthSkipWeekend { tz, .. }
            | Self::FirstDayOfQuarter { tz, .. }
            | Self::LastDayOfQuarter { tz, .. }
            | Self::FirstDayOfYear { tz, .. }
            | Self::WeeklyOnWeekday { tz, .. }
            | Self::BiweeklyOnWeekday { tz, .. }
            | Self::SemiMonthly { tz, .. }
            | Self::NthBusinessDayOfMonth { tz, .. }
            | Self::EveryNDays { tz, .. }
            | Self::EveryNInterval { tz, .. }
            | Self::Cron { tz, .. } => *tz,
        }
    }

    /// Tag used by the parameter codec and host-side dispatch.
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::LastDayOfMonth { .. } => RuleKind::LastDayOfMonth,
            Self::DayOfMonth { .. } => RuleKind::DayOfMonth,
            Self::MultipleDaysOfMonth { .. } => RuleKind::MultipleDaysOfMonth,
            Self::NthWeekdayOfMonth { .. } => RuleKind::NthWeekdayOfMonth,
            Self::NthWeekdayOfYear { .. } => RuleKind::NthWeekdayOfYear,
            Self::LastDayOfMonthSkipWeekend { .. } => RuleKind::LastDayOfMonthSkipWeekend,
            Self::FirstDayOfQuarter { .. } => RuleKind::FirstDayOfQuarter,
            Self::LastDayOfQuarter { .. } => RuleKind::LastDayOfQuarter,
            Self::FirstDayOfYear { .. } => RuleKind::FirstDayOfYear,
            Self::WeeklyOnWeekday { .. } => RuleKind::WeeklyOnWeekday,
            Self::BiweeklyOnWeekday { .. } => RuleKind::BiweeklyOnWeekday,
            Self::SemiMonthly { .. } => RuleKind::SemiMonthly,
            Self::NthBusinessDayOfMonth { .. } => RuleKind::NthBusinessDayOfMonth,
            Self::EveryNDays { .. } => RuleKind::EveryNDays,
            Self::EveryNInterval { .. } => RuleKind::EveryNInterval,
            Self::Cron { .. } => RuleKind::Cron,
        }
    }

    /// Check the configuration for errors that would make evaluation
    /// meaningless. Raised at construction via the parameter codec and on
    /// every evaluation entry point, so an invalid rule fails fast either way.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::LastDayOfMonth { hour, minute, second, .. }
            | Self::LastDayOfMonthSkipWeekend { hour, minute, second, .. }
            | Self::FirstDayOfQuarter { hour, minute, second, .. }
            | Self::LastDayOfQuarter { hour, minute, second, .. }
            | Self::FirstDayOfYear { hour, minute, second, .. }
            | Self::SemiMonthly { hour, minute, second, .. }
            | Self::WeeklyOnWeekday { hour, minute, second, .. }
            | Self::BiweeklyOnWeekday { hour, minute, second, .. } => {
                calendar::time_of_day(*hour, *minute, *second).map(|_| ())
            }
            Self::DayOfMonth { day, hour, minute, second, .. } => {
                calendar::time_of_day(*hour, *minute, *second)?;
                if !(1..=31).contains(day) {
                    return Err(RecurrenceError::InvalidParameter(format!(
                        "day of month must be 1-31, got {day}"
                    )));
                }
                Ok(())
            }
            Self::MultipleDaysOfMonth { days, hour, minute, second, .. } => {
                calendar::time_of_day(*hour, *minute, *second)?;
                if days.is_empty() {
                    return Err(RecurrenceError::InvalidParameter(
                        "at least one day of month is required".to_string(),
                    ));
                }
                if let Some(bad) = days.iter().find(|d| !(1..=31).contains(*d)) {
                    return Err(RecurrenceError::InvalidParameter(format!(
                        "day of month must be 1-31, got {bad}"
                    )));
                }
                Ok(())
            }
            Self::NthWeekdayOfMonth { n, hour, minute, second, .. }
            | Self::NthBusinessDayOfMonth { n, hour, minute, second, .. } => {
                calendar::time_of_day(*hour, *minute, *second)?;
                if *n == 0 {
                    return Err(RecurrenceError::ZeroOrdinal);
                }
                Ok(())
            }
            Self::NthWeekdayOfYear { month, n, hour, minute, second, .. } => {
                calendar::time_of_day(*hour, *minute, *second)?;
                if *n == 0 {
                    return Err(RecurrenceError::ZeroOrdinal);
                }
                if !(1..=12).contains(month) {
                    return Err(RecurrenceError::InvalidParameter(format!(
                        "month must be 1-12, got {month}"
                    )));
                }
                Ok(())
            }
            Self::EveryNDays { interval_days, hour, minute, second, .. } => {
                calendar::time_of_day(*hour, *minute, *second)?;
                if *interval_days == 0 {
                    return Err(RecurrenceError::ZeroInterval);
                }
                Ok(())
            }
            Self::EveryNInterval { interval_minutes, interval_hours, .. } => {
                if *interval_minutes == 0 && *interval_hours == 0 {
                    return Err(RecurrenceError::ZeroInterval);
                }
                Ok(())
            }
            Self::Cron { expression, .. } => cron::parse(expression).map(|_| ()),
        }
    }

    /// Earliest occurrence instant at or after `after`.
    ///
    /// `BiweeklyOnWeekday` is the one exception: its cycle arithmetic is
    /// strictly-greater, so a search landing exactly on a cycle point
    /// advances one full cycle.
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.validate()?;
        let local = self.next_local(after.with_timezone(&self.timezone()))?;
        Ok(local.with_timezone(&Utc))
    }

    /// The interval covering `reference`: the window whose occurrence is the
    /// latest occurrence at or before the reference. Used for manual and
    /// backfill triggers; there is no `latest` cutoff on this path.
    pub fn covering_interval(&self, reference: DateTime<Utc>) -> Result<DataInterval> {
        self.validate()?;
        let local = self.prev_local(reference.with_timezone(&self.timezone()))?;
        self.interval_from(local.with_timezone(&Utc))
    }

    /// Locate the next run given the last automated interval and the
    /// restriction policy, evaluated against the wall clock.
    pub fn next_run(
        &self,
        last: Option<&DataInterval>,
        restriction: &TimeRestriction,
    ) -> Result<ScheduleDecision> {
        self.next_run_at(Utc::now(), last, restriction)
    }

    /// [`next_run`](Self::next_run) with an explicit evaluation instant.
    /// Useful for testing and deterministic replay.
    pub fn next_run_at(
        &self,
        now: DateTime<Utc>,
        last: Option<&DataInterval>,
        restriction: &TimeRestriction,
    ) -> Result<ScheduleDecision> {
        let search_from = baseline::search_start(restriction, last, now);
        let start = self.next_occurrence(search_from)?;

        if let Some(latest) = restriction.latest {
            if start > latest {
                debug!(%start, %latest, "next occurrence exceeds the latest bound");
                return Ok(ScheduleDecision::NoFurtherRun);
            }
        }

        Ok(ScheduleDecision::Run(self.interval_from(start)?))
    }

    /// Build the window attributed to a run starting at `start`, per the
    /// rule family's window-length policy.
    pub fn interval_from(&self, start: DateTime<Utc>) -> Result<DataInterval> {
        let end = match self {
            Self::EveryNDays { interval_days, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                periodic::every_n_days_end(*tz, *interval_days, time, start.with_timezone(tz))?
                    .with_timezone(&Utc)
            }
            Self::EveryNInterval { .. } => start + Duration::minutes(self.cadence_minutes()),
            Self::Cron { expression, tz } => {
                cron::tick_after(expression, start.with_timezone(tz))?.with_timezone(&Utc)
            }
            _ => start + Duration::hours(1),
        };
        DataInterval::new(start, end)
    }

    fn cadence_minutes(&self) -> i64 {
        match self {
            Self::EveryNInterval { interval_minutes, interval_hours, .. } => {
                i64::from(*interval_hours) * 60 + i64::from(*interval_minutes)
            }
            _ => 0,
        }
    }

    fn next_local(&self, after: DateTime<Tz>) -> Result<DateTime<Tz>> {
        let (year, month) = calendar::year_month(after);
        match self {
            Self::LastDayOfMonth { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                next_on_grid(after, (year, month), |y, m| monthly::last_day(*tz, time, y, m), calendar::next_month)
            }
            Self::DayOfMonth { day, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                next_on_grid(after, (year, month), |y, m| monthly::on_day(*tz, time, *day, y, m), calendar::next_month)
            }
            Self::MultipleDaysOfMonth { days, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                monthly::next_multiple_days(*tz, time, days, after)
            }
            Self::NthWeekdayOfMonth { weekday, n, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                next_on_grid(
                    after,
                    (year, month),
                    |y, m| Ok(at_time(*tz, ordinal::nth_weekday_of_month(y, m, *weekday, *n)?, time)),
                    calendar::next_month,
                )
            }
            Self::NthWeekdayOfYear { month: rule_month, weekday, n, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                next_on_grid(
                    after,
                    (year, *rule_month),
                    |y, m| yearly::nth_weekday(*tz, time, m, *weekday, *n, y),
                    |y, m| (y + 1, m),
                )
            }
            Self::LastDayOfMonthSkipWeekend { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                next_on_grid(after, (year, month), |y, m| monthly::last_day_skip_weekend(*tz, time, y, m), calendar::next_month)
            }
            Self::FirstDayOfQuarter { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                next_on_grid(
                    after,
                    (year, calendar::quarter_first_month(month)),
                    |y, qm| quarterly::first_day(*tz, time, y, qm),
                    calendar::next_quarter,
                )
            }
            Self::LastDayOfQuarter { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                next_on_grid(
                    after,
                    (year, calendar::quarter_first_month(month)),
                    |y, qm| quarterly::last_day(*tz, time, y, qm),
                    calendar::next_quarter,
                )
            }
            Self::FirstDayOfYear { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                next_on_grid(after, (year, 1), |y, _| yearly::first_day(*tz, time, y), |y, m| (y + 1, m))
            }
            Self::WeeklyOnWeekday { weekday, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                weekly::next_weekly(*tz, *weekday, time, after)
            }
            Self::BiweeklyOnWeekday { weekday, anchor, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                weekly::next_biweekly(*tz, *weekday, *anchor, time, after)
            }
            Self::SemiMonthly { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                // Day 31 clamps to the month's last day.
                monthly::next_multiple_days(*tz, time, &[15, 31], after)
            }
            Self::NthBusinessDayOfMonth { n, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                next_on_grid(
                    after,
                    (year, month),
                    |y, m| Ok(at_time(*tz, ordinal::nth_business_day_of_month(y, m, *n)?, time)),
                    calendar::next_month,
                )
            }
            Self::EveryNDays { hour, minute, second, tz, .. } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                periodic::next_every_n_days(*tz, time, after)
            }
            Self::EveryNInterval { tz, .. } => {
                periodic::next_every_n_interval(*tz, self.cadence_minutes(), after)
            }
            Self::Cron { expression, .. } => cron::next_tick(expression, after),
        }
    }

    fn prev_local(&self, reference: DateTime<Tz>) -> Result<DateTime<Tz>> {
        let (year, month) = calendar::year_month(reference);
        match self {
            Self::LastDayOfMonth { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                prev_on_grid(reference, (year, month), |y, m| monthly::last_day(*tz, time, y, m), calendar::prev_month)
            }
            Self::DayOfMonth { day, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                prev_on_grid(reference, (year, month), |y, m| monthly::on_day(*tz, time, *day, y, m), calendar::prev_month)
            }
            Self::MultipleDaysOfMonth { days, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                monthly::prev_multiple_days(*tz, time, days, reference)
            }
            Self::NthWeekdayOfMonth { weekday, n, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                prev_on_grid(
                    reference,
                    (year, month),
                    |y, m| Ok(at_time(*tz, ordinal::nth_weekday_of_month(y, m, *weekday, *n)?, time)),
                    calendar::prev_month,
                )
            }
            Self::NthWeekdayOfYear { month: rule_month, weekday, n, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                prev_on_grid(
                    reference,
                    (year, *rule_month),
                    |y, m| yearly::nth_weekday(*tz, time, m, *weekday, *n, y),
                    |y, m| (y - 1, m),
                )
            }
            Self::LastDayOfMonthSkipWeekend { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                prev_on_grid(reference, (year, month), |y, m| monthly::last_day_skip_weekend(*tz, time, y, m), calendar::prev_month)
            }
            Self::FirstDayOfQuarter { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                prev_on_grid(
                    reference,
                    (year, calendar::quarter_first_month(month)),
                    |y, qm| quarterly::first_day(*tz, time, y, qm),
                    calendar::prev_quarter,
                )
            }
            Self::LastDayOfQuarter { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                prev_on_grid(
                    reference,
                    (year, calendar::quarter_first_month(month)),
                    |y, qm| quarterly::last_day(*tz, time, y, qm),
                    calendar::prev_quarter,
                )
            }
            Self::FirstDayOfYear { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                prev_on_grid(reference, (year, 1), |y, _| yearly::first_day(*tz, time, y), |y, m| (y - 1, m))
            }
            Self::WeeklyOnWeekday { weekday, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                weekly::prev_weekly(*tz, *weekday, time, reference)
            }
            Self::BiweeklyOnWeekday { weekday, anchor, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                weekly::prev_biweekly(*tz, *weekday, *anchor, time, reference)
            }
            Self::SemiMonthly { hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                monthly::prev_multiple_days(*tz, time, &[15, 31], reference)
            }
            Self::NthBusinessDayOfMonth { n, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                prev_on_grid(
                    reference,
                    (year, month),
                    |y, m| Ok(at_time(*tz, ordinal::nth_business_day_of_month(y, m, *n)?, time)),
                    calendar::prev_month,
                )
            }
            Self::EveryNDays { interval_days, hour, minute, second, tz } => {
                let time = calendar::time_of_day(*hour, *minute, *second)?;
                periodic::prev_every_n_days(*tz, *interval_days, time, reference)
            }
            Self::EveryNInterval { tz, .. } => {
                periodic::prev_every_n_interval(*tz, self.cadence_minutes(), reference)
            }
            Self::Cron { expression, .. } => cron::prev_tick(expression, reference),
        }
    }
}

// ── Grid walkers ────────────────────────────────────────────────────

/// Walk forward one period at a time until the per-period occurrence lands
/// at or after `after`. The cursor starts in the period containing `after`,
/// so the loop terminates within a couple of iterations.
fn next_on_grid<O, S>(
    after: DateTime<Tz>,
    mut cursor: (i32, u32),
    occurrence: O,
    step: S,
) -> Result<DateTime<Tz>>
where
    O: Fn(i32, u32) -> Result<DateTime<Tz>>,
    S: Fn(i32, u32) -> (i32, u32),
{
    loop {
        let found = occurrence(cursor.0, cursor.1)?;
        if found >= after {
            return Ok(found);
        }
        cursor = step(cursor.0, cursor.1);
    }
}

/// The latest per-period occurrence at or before `reference`: the current
/// period's occurrence, or one period back when it has not happened yet.
fn prev_on_grid<O, S>(
    reference: DateTime<Tz>,
    cursor: (i32, u32),
    occurrence: O,
    step_back: S,
) -> Result<DateTime<Tz>>
where
    O: Fn(i32, u32) -> Result<DateTime<Tz>>,
    S: Fn(i32, u32) -> (i32, u32),
{
    let found = occurrence(cursor.0, cursor.1)?;
    if found <= reference {
        return Ok(found);
    }
    let (year, month) = step_back(cursor.0, cursor.1);
    occurrence(year, month)
}
