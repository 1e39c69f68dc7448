//! Vote Ledger
//!
//! Local voting bookkeeping of one process: who holds its vote, and the
//! FIFO queue of peers waiting for it. A requester appears in the queue at
//! most once.

use std::collections::VecDeque;

use crate::membership::ProcessId;

/// The vote as currently lent out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    /// Process holding the vote
    pub holder: ProcessId,

    /// Attempt the vote was granted for
    pub round: u64,
}

/// A request waiting for the vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub requester: ProcessId,
    pub round: u64,
}

/// FIFO backlog of deferred vote requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredQueue {
    entries: VecDeque<PendingRequest>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail unless the requester is already queued.
    ///
    /// A queued requester keeps its position but takes the newer round.
    /// Returns `false` when the requester was already present.
    pub fn push_back(&mut self, request: PendingRequest) -> bool {
        if self.refresh(&request.requester, request.round) {
            return false;
        }
        self.entries.push_back(request);
        true
    }

    /// Move a queued requester to `round` in place. Returns whether it was queued.
    pub fn refresh(&mut self, requester: &ProcessId, round: u64) -> bool {
        match self.entries.iter_mut().find(|entry| entry.requester == *requester) {
            Some(entry) => {
                entry.round = entry.round.max(round);
                true
            }
            None => false,
        }
    }

    /// Remove and return the head.
    pub fn pop_front(&mut self) -> Option<PendingRequest> {
        self.entries.pop_front()
    }

    /// Drop a requester wherever it sits. Returns whether it was present.
    pub fn remove(&mut self, requester: &ProcessId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.requester != *requester);
        self.entries.len() != before
    }

    pub fn contains(&self, requester: &ProcessId) -> bool {
        self.entries.iter().any(|entry| entry.requester == *requester)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queued requesters, head first
    pub fn requesters(&self) -> Vec<ProcessId> {
        self.entries.iter().map(|entry| entry.requester).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingRequest> {
        self.entries.iter()
    }
}

/// Answer to a vote request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDecision {
    /// Vote was free and now belongs to the requester
    Granted(Grant),

    /// Requester already held the vote; grant renewed for its new round
    Regranted(Grant),

    /// Vote is held elsewhere; requester queued
    Deferred,

    /// Vote is held elsewhere and the requester was already queued; its
    /// queued round now matches the request
    AlreadyQueued,
}

/// Effect of releasing the vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Vote passed straight to the queue head
    Transferred(Grant),

    /// Queue empty; vote is free
    Freed,

    /// Sender did not hold the vote; nothing changed
    Ignored,
}

/// Effect of a withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    /// Requester was removed from the deferred queue
    pub dequeued: bool,

    /// Outcome if the requester held the vote
    pub release: Release,
}

/// Per-process vote bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteLedger {
    granted_to: Option<Grant>,
    deferred: DeferredQueue,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current grant, if the vote is lent out
    pub fn granted_to(&self) -> Option<Grant> {
        self.granted_to
    }

    /// Process holding the vote
    pub fn holder(&self) -> Option<ProcessId> {
        self.granted_to.map(|grant| grant.holder)
    }

    pub fn is_free(&self) -> bool {
        self.granted_to.is_none()
    }

    pub fn deferred(&self) -> &DeferredQueue {
        &self.deferred
    }

    /// Handle a vote request.
    pub fn request(&mut self, requester: ProcessId, round: u64) -> VoteDecision {
        match self.granted_to {
            None => {
                let grant = Grant {
                    holder: requester,
                    round,
                };
                self.granted_to = Some(grant);
                VoteDecision::Granted(grant)
            }
            Some(current) if current.holder == requester => {
                let grant = Grant {
                    holder: requester,
                    round,
                };
                self.granted_to = Some(grant);
                VoteDecision::Regranted(grant)
            }
            Some(_) => {
                if self.deferred.push_back(PendingRequest { requester, round }) {
                    VoteDecision::Deferred
                } else {
                    VoteDecision::AlreadyQueued
                }
            }
        }
    }

    /// Handle a release from `from`.
    ///
    /// Only the holder can release; anything else is stale.
    pub fn release(&mut self, from: &ProcessId) -> Release {
        match self.granted_to {
            Some(grant) if grant.holder == *from => {
                self.granted_to = None;
                self.grant_next()
            }
            _ => Release::Ignored,
        }
    }

    /// Forget `from` entirely: leave the queue and give back the vote if held.
    pub fn withdraw(&mut self, from: &ProcessId) -> Withdrawal {
        let dequeued = self.deferred.remove(from);
        let release = self.release(from);
        Withdrawal { dequeued, release }
    }

    fn grant_next(&mut self) -> Release {
        match self.deferred.pop_front() {
            Some(next) => {
                let grant = Grant {
                    holder: next.requester,
                    round: next.round,
                };
                self.granted_to = Some(grant);
                Release::Transferred(grant)
            }
            None => Release::Freed,
        }
    }
}
