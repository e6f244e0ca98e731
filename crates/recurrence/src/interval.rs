//! Data intervals, restriction policy, and scheduling decisions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RecurrenceError, Result};

/// The `[start, end)` window attributed to one scheduled run.
///
/// Invariant: `start < end`, enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DataInterval {
    /// Build an interval, rejecting empty or inverted windows.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(RecurrenceError::InvalidParameter(format!(
                "interval start {start} must precede end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window length.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether an instant falls inside the half-open window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Policy bounds constraining which occurrences may be produced automatically.
///
/// Supplied fresh by the host on every call; the core never stores it.
/// If both bounds are set, `earliest <= latest` is assumed valid input and
/// not re-validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRestriction {
    /// Do not produce occurrences before this instant.
    pub earliest: Option<DateTime<Utc>>,
    /// Do not produce occurrences after this instant.
    pub latest: Option<DateTime<Utc>>,
    /// Whether elapsed/missed occurrences should still be produced.
    pub catchup: bool,
}

impl TimeRestriction {
    pub fn new(
        earliest: Option<DateTime<Utc>>,
        latest: Option<DateTime<Utc>>,
        catchup: bool,
    ) -> Self {
        Self {
            earliest,
            latest,
            catchup,
        }
    }
}

/// Outcome of the next-run operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleDecision {
    /// The next run to materialize.
    Run(DataInterval),
    /// The search exhausted the `latest` bound; the rule is complete.
    /// This is a terminal state, not a failure.
    NoFurtherRun,
}

impl ScheduleDecision {
    /// The produced interval, if any.
    pub fn interval(&self) -> Option<&DataInterval> {
        match self {
            ScheduleDecision::Run(interval) => Some(interval),
            ScheduleDecision::NoFurtherRun => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, ScheduleDecision::NoFurtherRun)
    }
}
