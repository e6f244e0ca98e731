//! Recurrence rule evaluation engine for data-interval scheduling.
//!
//! This crate provides:
//! - Sixteen recurrence families (calendar, weekly-cycle, periodic, cron)
//!   behind one [`RecurrenceRule`] enum
//! - Occurrence search in both directions: `next_occurrence` and the
//!   covering interval for manual and backfill triggers
//! - Scheduling decisions against earliest/latest bounds and catch-up
//!   policy via [`RecurrenceRule::next_run`]
//! - A flat JSON parameter codec for persistence and host round-trips
//!
//! All instants exchanged with callers are UTC. Each rule carries an IANA
//! timezone and evaluates occurrences on that civil calendar, so wall-clock
//! times stay stable across DST transitions.

mod baseline;
mod calendar;
mod describe;
pub mod error;
pub mod interval;
pub mod params;
mod rule;

pub use error::{RecurrenceError, Result};
pub use interval::{DataInterval, ScheduleDecision, TimeRestriction};
pub use params::{Params, RuleKind};
pub use rule::RecurrenceRule;
