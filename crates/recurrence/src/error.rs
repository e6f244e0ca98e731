//! Error types for recurrence evaluation.

/// Errors that can occur while constructing or evaluating a recurrence rule.
///
/// All of these are configuration errors: they are raised synchronously at
/// construction or on the first evaluation, and retrying the same
/// configuration will fail the same way. A legitimately exhausted schedule is
/// not an error; see [`ScheduleDecision::NoFurtherRun`](crate::ScheduleDecision).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecurrenceError {
    /// A fixed-cadence rule was configured with a zero-length interval.
    #[error("interval length must be greater than zero")]
    ZeroInterval,

    /// An ordinal index was zero where ±n counting is required.
    #[error("ordinal index must not be zero (use 1 for first, -1 for last)")]
    ZeroOrdinal,

    /// A parameter is out of range or a calendar field cannot be realized.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A required key was absent from a parameter mapping.
    #[error("missing parameter: '{0}'")]
    MissingParameter(&'static str),

    /// A timezone string is not a known IANA identifier.
    #[error("unknown timezone: '{0}'")]
    Timezone(String),

    /// The external cron evaluator rejected the expression or could not
    /// locate an occurrence. Surfaced unchanged as a configuration error.
    #[error("cron error for '{expression}': {message}")]
    Cron { expression: String, message: String },

    /// A parameter mapping named a rule kind this crate does not know.
    #[error("unknown rule kind: '{0}'")]
    UnknownKind(String),
}

/// Result alias for recurrence operations.
pub type Result<T> = std::result::Result<T, RecurrenceError>;
