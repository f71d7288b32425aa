//! Error types for the court room engine
//!
//! Almost every operation in this crate is a local state transition, so the
//! taxonomy is small. Malformed numeric input is clamped rather than rejected;
//! the variants below cover the cases where there is nothing sensible to
//! clamp to.

use thiserror::Error;

use crate::message::OccurrenceId;

/// Result type alias for court room operations
pub type CourtResult<T> = Result<T, CourtError>;

/// Errors raised by the court room engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourtError {
    /// Every template handed to the pool was malformed (or none were given)
    #[error("Message pool is empty: {skipped} template(s) were skipped as malformed")]
    EmptyPool { skipped: usize },

    /// A template id was requested that the pool does not contain
    #[error("Unknown message template: {0}")]
    UnknownTemplate(String),

    /// A dismissal referenced an occurrence that is not in the active set
    #[error("Message {0} is not active")]
    UnknownOccurrence(OccurrenceId),

    /// Configuration could not be turned into a runnable simulation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CourtError::EmptyPool { skipped: 2 };
        assert!(err.to_string().contains("2 template(s)"));

        let err = CourtError::UnknownOccurrence(OccurrenceId::new(7));
        assert_eq!(err.to_string(), "Message #7 is not active");
    }
}
