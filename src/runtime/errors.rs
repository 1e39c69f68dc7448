//! # Runtime Errors

use thiserror::Error;

use crate::protocol::ProtocolError;
use crate::transport::DeliveryError;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Runtime errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// The worker task is gone
    #[error("Process worker stopped")]
    WorkerStopped,

    /// A request from this process is already outstanding
    #[error("Entry attempt already in progress (round {0})")]
    AttemptInProgress(u64),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Transport error: {0}")]
    Delivery(#[from] DeliveryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(RuntimeError::WorkerStopped.to_string(), "Process worker stopped");
        assert_eq!(
            RuntimeError::AttemptInProgress(3).to_string(),
            "Entry attempt already in progress (round 3)"
        );

        let err: RuntimeError = ProtocolError::forbidden_transition("IDLE", "IDLE").into();
        assert!(err.to_string().starts_with("Protocol error"));
    }
}
