//! Shared search-baseline resolution.
//!
//! Every rule family starts its next-occurrence search from the same baseline,
//! derived from the restriction policy and the last automated interval. This
//! logic lives here once so the families cannot drift apart.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::interval::{DataInterval, TimeRestriction};

/// Resolve the instant from which the next-occurrence search starts.
///
/// - With no history, the baseline is `restriction.earliest` (or `now`).
/// - With history, the search continues from the last interval's end.
/// - When catch-up is disabled, both are clamped forward to `now` so an idle
///   host never accumulates a backlog of elapsed runs.
pub(crate) fn search_start(
    restriction: &TimeRestriction,
    last: Option<&DataInterval>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let mut baseline = restriction.earliest.unwrap_or(now);
    if !restriction.catchup && baseline < now {
        baseline = now;
    }

    match last {
        None => baseline,
        Some(last) => {
            let mut from = last.end;
            if !restriction.catchup && from < now {
                debug!(last_end = %last.end, "catch-up disabled, clamping search start to now");
                from = now;
            }
            from
        }
    }
}
