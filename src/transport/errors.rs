//! # Transport Errors

use thiserror::Error;

use crate::membership::ProcessId;

/// Result type for transport operations
pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// Transport errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeliveryError {
    /// Recipient is not attached to the group
    #[error("Unknown recipient: {0}")]
    UnknownRecipient(ProcessId),

    /// Recipient's inbound stream is closed
    #[error("Recipient disconnected: {0}")]
    Disconnected(ProcessId),

    /// Message could not be encoded
    #[error("Encode failed: {0}")]
    Encode(String),

    /// Membership change rejected
    #[error("Membership error: {0}")]
    Membership(String),

    /// Drop rate outside [0, 1)
    #[error("Invalid drop rate: {0}")]
    InvalidDropRate(f64),

    #[error("Network state lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let id = ProcessId::from_u128(1);
        assert!(DeliveryError::UnknownRecipient(id)
            .to_string()
            .contains(&id.to_string()));
        assert_eq!(
            DeliveryError::InvalidDropRate(1.5).to_string(),
            "Invalid drop rate: 1.5"
        );
    }
}
