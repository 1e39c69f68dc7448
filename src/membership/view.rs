//! Membership views
//!
//! A view is the agreed, ordered list of group members. The position of a
//! process in the list is its index in the quorum grid.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProcessId;

/// Membership errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("Process {0} appears more than once in the view")]
    DuplicateMember(ProcessId),
}

/// Ordered membership of the group at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MembershipView {
    /// Monotonic view number assigned by the membership layer
    view_id: u64,

    /// Members in agreed order
    members: Vec<ProcessId>,
}

impl MembershipView {
    /// Create a view, rejecting duplicate members.
    pub fn new(view_id: u64, members: Vec<ProcessId>) -> Result<Self, MembershipError> {
        let mut seen = HashSet::with_capacity(members.len());
        for member in &members {
            if !seen.insert(*member) {
                return Err(MembershipError::DuplicateMember(*member));
            }
        }

        Ok(Self { view_id, members })
    }

    /// View number
    pub fn view_id(&self) -> u64 {
        self.view_id
    }

    /// Members in agreed order
    pub fn members(&self) -> &[ProcessId] {
        &self.members
    }

    /// Group size N
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the view has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Position of a member in the view
    pub fn index_of(&self, id: &ProcessId) -> Option<usize> {
        self.members.iter().position(|m| m == id)
    }

    /// Member at a given position
    pub fn member(&self, index: usize) -> Option<ProcessId> {
        self.members.get(index).copied()
    }

    /// Whether the process is part of this view
    pub fn contains(&self, id: &ProcessId) -> bool {
        self.members.contains(id)
    }

    /// Next view with `id` appended.
    pub fn with_member(&self, id: ProcessId) -> Result<Self, MembershipError> {
        let mut members = self.members.clone();
        members.push(id);
        Self::new(self.view_id + 1, members)
    }

    /// Next view with `id` removed (a no-op removal still bumps the view number).
    pub fn without_member(&self, id: &ProcessId) -> Self {
        Self {
            view_id: self.view_id + 1,
            members: self.members.iter().filter(|m| *m != id).copied().collect(),
        }
    }
}
