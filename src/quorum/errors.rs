//! # Quorum Errors

use thiserror::Error;

use crate::membership::ProcessId;

/// Result type for quorum computations
pub type QuorumResult<T> = Result<T, QuorumError>;

/// Quorum computation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuorumError {
    #[error("Group must have at least one member")]
    EmptyGroup,

    #[error("Index {index} is outside a group of {size}")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("Process {0} is not a member of the current view")]
    NotAMember(ProcessId),
}
