//! Critical action run while the process holds mutual exclusion

use std::future::Future;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use crate::membership::ProcessId;

/// Work performed inside the critical section.
///
/// The worker keeps answering other processes while the returned future
/// runs, and leaves the section when it completes.
pub trait CriticalSection: Send + Sync + 'static {
    fn run(&self, process: ProcessId, round: u64) -> BoxFuture<'static, ()>;
}

/// Hold the section for a fixed time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldFor(pub Duration);

impl CriticalSection for HoldFor {
    fn run(&self, _process: ProcessId, _round: u64) -> BoxFuture<'static, ()> {
        tokio::time::sleep(self.0).boxed()
    }
}

/// Closure-backed critical action, see [`section_fn`]
#[derive(Debug, Clone)]
pub struct SectionFn<F>(F);

/// Wrap an async closure as a critical action.
pub fn section_fn<F, Fut>(f: F) -> SectionFn<F>
where
    F: Fn(ProcessId, u64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    SectionFn(f)
}

impl<F, Fut> CriticalSection for SectionFn<F>
where
    F: Fn(ProcessId, u64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn run(&self, process: ProcessId, round: u64) -> BoxFuture<'static, ()> {
        (self.0)(process, round).boxed()
    }
}
