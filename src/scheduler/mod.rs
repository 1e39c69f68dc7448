//! Critical Section Scheduler
//!
//! Drives one process: wakes up every interval (plus jitter), checks the
//! eligibility policy against a snapshot and, when eligible, asks the worker
//! for entry. It never touches protocol state directly.

mod config;
mod driver;

pub use config::{Eligibility, SchedulerConfig};
pub use driver::{RequestScheduler, SchedulerReport};
