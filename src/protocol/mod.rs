//! Request/Grant Protocol
//!
//! The per-process voting state machine. A process moves through
//! IDLE -> REQUESTING -> IN_CRITICAL_SECTION -> IDLE as a requester and,
//! independently of its own phase, answers vote requests from peers:
//!
//! - a free vote is granted immediately to the first requester
//! - a held vote defers later requesters into a FIFO queue
//! - a release from the holder transfers the vote to the queue head
//!
//! The machine performs no I/O. Every operation returns a [`Step`] listing
//! the messages to send and whether the critical section was entered; the
//! runtime worker carries those out. This keeps all state transitions on a
//! single serialized path and makes interleavings reproducible in tests.

mod config;
mod errors;
mod ledger;
mod machine;
mod phase;

pub use config::{ProtocolConfig, VoteThreshold};
pub use errors::{ProtocolError, ProtocolResult};
pub use ledger::{DeferredQueue, Grant, PendingRequest, Release, VoteDecision, VoteLedger, Withdrawal};
pub use machine::{Step, VoteSnapshot, VotingProtocol};
pub use phase::Phase;
