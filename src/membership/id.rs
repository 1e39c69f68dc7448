//! Process identifiers

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, comparable identifier of a process in the group.
///
/// Assigned by the group communication layer and stable for the lifetime
/// of a membership view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(Uuid);

impl ProcessId {
    /// Allocate a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build an identifier from a fixed value (deterministic tests, fixtures).
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ProcessId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_value() {
        assert!(ProcessId::from_u128(1) < ProcessId::from_u128(2));
        assert_eq!(ProcessId::from_u128(7), ProcessId::from_u128(7));
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(ProcessId::random(), ProcessId::random());
    }

    #[test]
    fn test_serializes_as_plain_uuid() {
        let id = ProcessId::from_u128(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));

        let back: ProcessId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
