//! Process worker
//!
//! Event loop serialising every protocol transition for one process.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::errors::{RuntimeError, RuntimeResult};
use super::handle::{EntryOutcome, ProcessHandle};
use super::section::{CriticalSection, HoldFor};
use crate::membership::{MembershipView, ProcessId};
use crate::message::{decode, Decoded, Message};
use crate::observability::{AuditAction, AuditLog, AuditRecord};
use crate::protocol::{Phase, ProtocolConfig, Step, VoteSnapshot, VotingProtocol};
use crate::transport::{Delivery, DeliveryReceiver, Endpoint, Messenger};

/// Requests from a `ProcessHandle`
pub(crate) enum Command {
    RequestEntry {
        reply: oneshot::Sender<RuntimeResult<EntryOutcome>>,
    },
    Snapshot {
        reply: oneshot::Sender<VoteSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::RequestEntry { .. } => "RequestEntry",
            Command::Snapshot { .. } => "Snapshot",
            Command::Shutdown { .. } => "Shutdown",
        };
        f.write_str(name)
    }
}

/// Events raised by tasks the worker spawned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    CriticalSectionDone { round: u64 },
    RequestTimedOut { round: u64 },
}

/// Caller waiting on an attempt
struct Waiter {
    round: u64,
    reply: oneshot::Sender<RuntimeResult<EntryOutcome>>,
}

/// Configures and spawns a process worker.
pub struct ProcessBuilder {
    endpoint: Endpoint,
    config: ProtocolConfig,
    section: Arc<dyn CriticalSection>,
    audit: Option<Arc<dyn AuditLog>>,
}

impl ProcessBuilder {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            config: ProtocolConfig::default(),
            section: Arc::new(HoldFor(Duration::ZERO)),
            audit: None,
        }
    }

    pub fn config(mut self, config: ProtocolConfig) -> Self {
        self.config = config;
        self
    }

    /// Action run while holding the critical section.
    pub fn critical_section(mut self, section: impl CriticalSection) -> Self {
        self.section = Arc::new(section);
        self
    }

    pub fn shared_critical_section(mut self, section: Arc<dyn CriticalSection>) -> Self {
        self.section = section;
        self
    }

    /// Sink receiving one record per entry and exit.
    pub fn audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Start the worker on the current tokio runtime.
    ///
    /// Fails when the process is not part of the endpoint's current view or
    /// the configuration is invalid.
    pub fn spawn(self) -> RuntimeResult<ProcessHandle> {
        let Endpoint {
            messenger,
            inbound,
            mut views,
        } = self.endpoint;

        let id = messenger.local_id();
        let view = views.borrow_and_update().clone();
        let protocol = VotingProtocol::new(id, view, self.config)?;

        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();

        let worker = Worker {
            id,
            protocol,
            messenger,
            inbound,
            views,
            views_open: true,
            commands,
            events,
            events_tx,
            section: self.section,
            audit: self.audit,
            waiter: None,
        };
        tokio::spawn(worker.run());

        Ok(ProcessHandle::new(id, commands_tx))
    }
}

struct Worker {
    id: ProcessId,
    protocol: VotingProtocol,
    messenger: Arc<dyn Messenger>,
    inbound: DeliveryReceiver,
    views: watch::Receiver<MembershipView>,
    views_open: bool,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedReceiver<Event>,
    events_tx: mpsc::UnboundedSender<Event>,
    section: Arc<dyn CriticalSection>,
    audit: Option<Arc<dyn AuditLog>>,
    waiter: Option<Waiter>,
}

impl Worker {
    async fn run(mut self) {
        info!(
            process = %self.id,
            index = self.protocol.quorum().index,
            quorum = self.protocol.quorum().len(),
            "worker started"
        );

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if !self.on_command(command) {
                            break;
                        }
                    }
                    None => {
                        self.stop();
                        break;
                    }
                },
                Some(event) = self.events.recv() => self.on_event(event),
                delivery = self.inbound.recv() => match delivery {
                    Some(delivery) => self.on_delivery(delivery),
                    None => {
                        info!(process = %self.id, "inbound stream closed");
                        break;
                    }
                },
                changed = self.views.changed(), if self.views_open => match changed {
                    Ok(()) => self.on_view_change(),
                    Err(_) => self.views_open = false,
                },
            }
        }

        info!(process = %self.id, "worker stopped");
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Returns false once the worker should exit.
    fn on_command(&mut self, command: Command) -> bool {
        match command {
            Command::RequestEntry { reply } => self.start_attempt(reply),
            Command::Snapshot { reply } => {
                let _ = reply.send(self.protocol.snapshot());
            }
            Command::Shutdown { reply } => {
                self.stop();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn start_attempt(&mut self, reply: oneshot::Sender<RuntimeResult<EntryOutcome>>) {
        if let Some(waiter) = &self.waiter {
            let _ = reply.send(Err(RuntimeError::AttemptInProgress(waiter.round)));
            return;
        }

        let step = match self.protocol.request_entry() {
            Ok(step) => step,
            Err(e) => {
                let _ = reply.send(Err(e.into()));
                return;
            }
        };
        let round = self.protocol.last_round();
        self.waiter = Some(Waiter { round, reply });

        if step.entered.is_none() {
            if let Some(timeout) = self.protocol.config().request_timeout {
                self.arm_timeout(round, timeout);
            }
        }
        self.apply(step);
    }

    fn arm_timeout(&self, round: u64, timeout: Duration) {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = events.send(Event::RequestTimedOut { round });
        });
    }

    /// Return held votes before the worker exits.
    fn stop(&mut self) {
        let result = match self.protocol.phase() {
            Phase::Idle => return,
            Phase::Requesting { .. } => self.protocol.abort_request(),
            Phase::InCriticalSection { round } => {
                self.record(round, AuditAction::Left);
                self.protocol.exit_critical_section()
            }
        };

        match result {
            Ok(step) => {
                for envelope in step.outbound {
                    self.send(envelope.to, &envelope.message);
                }
            }
            Err(e) => warn!(process = %self.id, error = %e, "failed to release votes on shutdown"),
        }
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    fn on_event(&mut self, event: Event) {
        match event {
            Event::CriticalSectionDone { round } => {
                if self.protocol.phase() != (Phase::InCriticalSection { round }) {
                    debug!(process = %self.id, round, "stale critical section completion");
                    return;
                }
                // Logged before the releases go out so the audit trail never
                // shows the next holder entering first.
                self.record(round, AuditAction::Left);
                match self.protocol.exit_critical_section() {
                    Ok(step) => {
                        self.apply(step);
                        self.finish(EntryOutcome::Completed { round });
                    }
                    Err(e) => warn!(process = %self.id, error = %e, "exit failed"),
                }
            }
            Event::RequestTimedOut { round } => {
                if self.protocol.phase() != (Phase::Requesting { round }) {
                    return;
                }
                match self.protocol.abort_request() {
                    Ok(step) => {
                        self.apply(step);
                        self.finish(EntryOutcome::Abandoned { round });
                    }
                    Err(e) => warn!(process = %self.id, error = %e, "abort failed"),
                }
            }
        }
    }

    fn finish(&mut self, outcome: EntryOutcome) {
        match self.waiter.take() {
            Some(waiter) if waiter.round == outcome.round() => {
                let _ = waiter.reply.send(Ok(outcome));
            }
            other => self.waiter = other,
        }
    }

    // =========================================================================
    // NETWORK
    // =========================================================================

    fn on_delivery(&mut self, delivery: Delivery) {
        match decode(&delivery.payload) {
            Decoded::Message(message) => {
                let step = self.protocol.handle(delivery.from, message);
                self.apply(step);
            }
            Decoded::UnknownKind(kind) => {
                debug!(process = %self.id, from = %delivery.from, kind = %kind, "ignoring unknown message kind")
            }
            Decoded::Malformed(reason) => {
                debug!(process = %self.id, from = %delivery.from, reason = %reason, "dropping malformed frame")
            }
        }
    }

    fn on_view_change(&mut self) {
        let view = self.views.borrow_and_update().clone();
        if let Err(e) = self.protocol.install_view(view) {
            warn!(process = %self.id, error = %e, "cannot install membership view");
        }
    }

    fn apply(&mut self, step: Step) {
        for envelope in step.outbound {
            self.send(envelope.to, &envelope.message);
        }
        if let Some(round) = step.entered {
            self.enter(round);
        }
    }

    fn send(&self, to: ProcessId, message: &Message) {
        if let Err(e) = self.messenger.send(to, message) {
            warn!(process = %self.id, to = %to, %message, error = %e, "send failed");
        }
    }

    fn enter(&mut self, round: u64) {
        self.record(round, AuditAction::Entered);

        let section = Arc::clone(&self.section);
        let events = self.events_tx.clone();
        let id = self.id;
        tokio::spawn(async move {
            section.run(id, round).await;
            let _ = events.send(Event::CriticalSectionDone { round });
        });
    }

    fn record(&self, round: u64, action: AuditAction) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.append(&AuditRecord::now(self.id, round, action)) {
                warn!(process = %self.id, error = %e, "audit append failed");
            }
        }
    }
}
