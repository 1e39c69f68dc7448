//! maekawa - quorum-based distributed mutual exclusion
//!
//! A process enters its critical section only after every member of its
//! grid quorum has voted for it. Any two quorums share a member and each
//! member lends its single vote to one requester at a time, so no two
//! processes are ever inside together.
//!
//! Layers, bottom up:
//! - `quorum`: grid quorums over a membership view
//! - `protocol`: vote ledger and the request/grant state machine, free of I/O
//! - `message`, `transport`: wire format and the group messaging contract
//! - `runtime`: one worker task per process that owns the state machine
//! - `scheduler`: periodic entry requests under an eligibility policy
//! - `observability`, `config`, `cli`: logging, audit trail and the binary

pub mod cli;
pub mod config;
pub mod membership;
pub mod message;
pub mod observability;
pub mod protocol;
pub mod quorum;
pub mod runtime;
pub mod scheduler;
pub mod transport;
