//! # Protocol Errors

use thiserror::Error;

use crate::quorum::QuorumError;

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Protocol errors
///
/// Stale or unknown inbound messages are not errors; they are ignored by
/// the state machine. Errors only arise from local operations invoked in the
/// wrong phase or against a view the process is not part of.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Forbidden transition from {from} to {to}")]
    ForbiddenTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Quorum error: {0}")]
    Quorum(#[from] QuorumError),

    #[error("Invalid protocol configuration: {0}")]
    InvalidConfig(String),
}

impl ProtocolError {
    /// Create a forbidden transition error.
    pub fn forbidden_transition(from: &'static str, to: &'static str) -> Self {
        Self::ForbiddenTransition { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ProtocolError::forbidden_transition("IDLE", "IN_CRITICAL_SECTION");
        assert_eq!(
            err.to_string(),
            "Forbidden transition from IDLE to IN_CRITICAL_SECTION"
        );

        let err: ProtocolError = QuorumError::EmptyGroup.into();
        assert!(err.to_string().contains("at least one member"));
    }
}
