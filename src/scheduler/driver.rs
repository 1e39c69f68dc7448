//! Scheduler loop

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::config::SchedulerConfig;
use crate::membership::ProcessId;
use crate::runtime::{EntryOutcome, ProcessHandle, RuntimeError, RuntimeResult};

/// What a scheduler did before it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerReport {
    /// Ticks on which the process was eligible and requested entry
    pub attempts: u64,
    pub completed: u64,
    pub abandoned: u64,
    /// Ticks skipped by the eligibility policy
    pub skipped: u64,
}

/// Periodic entry requests for one process
pub struct RequestScheduler {
    handle: ProcessHandle,
    config: SchedulerConfig,
    rng: StdRng,
}

impl RequestScheduler {
    pub fn new(handle: ProcessHandle, config: SchedulerConfig) -> Self {
        Self {
            handle,
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed jitter seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn process(&self) -> ProcessId {
        self.handle.id()
    }

    /// Run until `stop` flips to true or its sender is dropped.
    ///
    /// An attempt in flight when the stop arrives is not waited for.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) -> RuntimeResult<SchedulerReport> {
        let mut report = SchedulerReport::default();
        let process = self.handle.id();
        info!(
            process = %process,
            interval_ms = self.config.interval.as_millis() as u64,
            eligibility = %self.config.eligibility,
            "scheduler started"
        );

        let mut delay = self.jittered(self.config.interval);
        loop {
            if *stop.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stop.changed() => break,
            }

            let snapshot = match self.handle.snapshot().await {
                Ok(snapshot) => snapshot,
                Err(RuntimeError::WorkerStopped) => break,
                Err(e) => return Err(e),
            };
            delay = self.jittered(self.config.interval);

            if !self.config.is_eligible(snapshot.index, snapshot.group_size) {
                report.skipped += 1;
                debug!(
                    process = %process,
                    index = snapshot.index,
                    group_size = snapshot.group_size,
                    "not eligible this tick"
                );
                continue;
            }

            report.attempts += 1;
            let outcome = tokio::select! {
                outcome = self.handle.request_entry() => outcome,
                _ = stop.changed() => break,
            };

            match outcome {
                Ok(EntryOutcome::Completed { round }) => {
                    report.completed += 1;
                    debug!(process = %process, round, "attempt completed");
                }
                Ok(EntryOutcome::Abandoned { round }) => {
                    report.abandoned += 1;
                    warn!(process = %process, round, "attempt abandoned; backing off");
                    delay = self.jittered(self.config.retry_backoff);
                }
                Err(RuntimeError::WorkerStopped) => break,
                Err(e) => return Err(e),
            }
        }

        info!(
            process = %process,
            completed = report.completed,
            abandoned = report.abandoned,
            "scheduler stopped"
        );
        Ok(report)
    }

    fn jittered(&mut self, base: Duration) -> Duration {
        let jitter_ms = self.config.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(self.rng.gen_range(0..=jitter_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ProcessBuilder;
    use crate::scheduler::Eligibility;
    use crate::transport::LocalNetwork;

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig::new()
            .with_interval(Duration::from_millis(5))
            .with_min_group_size(1)
            .with_eligibility(Eligibility::Always)
    }

    #[tokio::test]
    async fn test_scheduler_requests_until_stopped() {
        let network = LocalNetwork::new("solo");
        let handle = ProcessBuilder::new(network.join().unwrap()).spawn().unwrap();
        let (stop_tx, stop) = watch::channel(false);

        let task = tokio::spawn(RequestScheduler::new(handle.clone(), fast_config()).run(stop));
        tokio::time::sleep(Duration::from_millis(100)).await;
        stop_tx.send(true).unwrap();

        let report = task.await.unwrap().unwrap();
        assert!(report.completed > 0);
        assert_eq!(report.abandoned, 0);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn test_ineligible_process_never_requests() {
        let network = LocalNetwork::new("solo");
        let handle = ProcessBuilder::new(network.join().unwrap()).spawn().unwrap();
        let (stop_tx, stop) = watch::channel(false);

        // A single member is below the default minimum group size.
        let config = fast_config().with_min_group_size(4);
        let task = tokio::spawn(RequestScheduler::new(handle.clone(), config).run(stop));
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(stop_tx);

        let report = task.await.unwrap().unwrap();
        assert_eq!(report.attempts, 0);
        assert!(report.skipped > 0);
        assert_eq!(handle.snapshot().await.unwrap().round, None);
    }

    #[test]
    fn test_jitter_bounded() {
        let network_free_handle = {
            let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
            ProcessHandle::new(ProcessId::from_u128(1), tx)
        };
        let config = fast_config().with_jitter(Duration::from_millis(10));
        let mut scheduler = RequestScheduler::new(network_free_handle, config).with_seed(3);

        for _ in 0..100 {
            let delay = scheduler.jittered(Duration::from_millis(5));
            assert!(delay >= Duration::from_millis(5));
            assert!(delay <= Duration::from_millis(15));
        }
    }
}
