//! Caller-side handle to a process worker

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::errors::{RuntimeError, RuntimeResult};
use super::worker::Command;
use crate::membership::ProcessId;
use crate::protocol::VoteSnapshot;

/// How an entry attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Entered, ran the critical action and released the votes
    Completed { round: u64 },

    /// Timed out before collecting enough votes and withdrew
    Abandoned { round: u64 },
}

impl EntryOutcome {
    pub fn round(&self) -> u64 {
        match self {
            EntryOutcome::Completed { round } | EntryOutcome::Abandoned { round } => *round,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, EntryOutcome::Completed { .. })
    }
}

/// Handle to a running process
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    id: ProcessId,
    commands: mpsc::UnboundedSender<Command>,
}

impl ProcessHandle {
    pub(crate) fn new(id: ProcessId, commands: mpsc::UnboundedSender<Command>) -> Self {
        Self { id, commands }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Whether the worker is still accepting commands
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Request the critical section and wait until the attempt ends.
    ///
    /// Resolves after the critical action has run and the votes have been
    /// released, or after the request timed out and was withdrawn.
    pub async fn request_entry(&self) -> RuntimeResult<EntryOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RequestEntry { reply })?;
        rx.await.map_err(|_| RuntimeError::WorkerStopped)?
    }

    /// Read the process's voting state.
    pub async fn snapshot(&self) -> RuntimeResult<VoteSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply })?;
        rx.await.map_err(|_| RuntimeError::WorkerStopped)
    }

    /// Stop the worker, returning any held votes first.
    pub async fn shutdown(&self) -> RuntimeResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply })?;
        rx.await.map_err(|_| RuntimeError::WorkerStopped)
    }

    fn send(&self, command: Command) -> RuntimeResult<()> {
        self.commands
            .send(command)
            .map_err(|_| RuntimeError::WorkerStopped)
    }
}
