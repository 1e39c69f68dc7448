//! Process runtime
//!
//! One worker task per process owns the `VotingProtocol` and applies every
//! transition in turn: inbound frames, view changes, local requests, the end
//! of the critical action and request timeouts all funnel through the same
//! loop. Nothing else touches protocol state.
//!
//! Callers talk to the worker through a cloneable `ProcessHandle`.

mod errors;
mod handle;
mod section;
mod worker;

pub use errors::{RuntimeError, RuntimeResult};
pub use handle::{EntryOutcome, ProcessHandle};
pub use section::{section_fn, CriticalSection, HoldFor, SectionFn};
pub use worker::ProcessBuilder;
