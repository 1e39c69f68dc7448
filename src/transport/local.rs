//! In-process group network
//!
//! Every process gets an unbounded mailbox. A send encodes the message,
//! optionally drops it, and pushes it into the recipient's mailbox while the
//! network lock is held, which keeps per-sender order. Joining or leaving
//! publishes a new view to every endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace};

use super::errors::{DeliveryError, DeliveryResult};
use super::{Delivery, DeliverySender, Endpoint, Messenger};
use crate::membership::{MembershipView, ProcessId};
use crate::message::{encode, Message};

/// Frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub sent: u64,
    pub delivered: u64,
    pub dropped: u64,
}

#[derive(Debug)]
struct NetworkState {
    mailboxes: HashMap<ProcessId, DeliverySender>,
    view: MembershipView,
    drop_rate: f64,
    rng: StdRng,
    stats: NetworkStats,
}

#[derive(Debug)]
struct Shared {
    group: String,
    state: Mutex<NetworkState>,
    views: watch::Sender<MembershipView>,
}

/// In-process group of processes
#[derive(Debug, Clone)]
pub struct LocalNetwork {
    shared: Arc<Shared>,
}

impl LocalNetwork {
    /// Create a reliable network.
    pub fn new(group: impl Into<String>) -> Self {
        Self::build(group.into(), 0.0, StdRng::from_entropy())
    }

    /// Create a network that drops each frame with probability `drop_rate`.
    ///
    /// A seed makes the drop pattern reproducible.
    pub fn lossy(group: impl Into<String>, drop_rate: f64, seed: Option<u64>) -> DeliveryResult<Self> {
        if !(0.0..1.0).contains(&drop_rate) {
            return Err(DeliveryError::InvalidDropRate(drop_rate));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::build(group.into(), drop_rate, rng))
    }

    fn build(group: String, drop_rate: f64, rng: StdRng) -> Self {
        let (views, _) = watch::channel(MembershipView::default());
        Self {
            shared: Arc::new(Shared {
                group,
                state: Mutex::new(NetworkState {
                    mailboxes: HashMap::new(),
                    view: MembershipView::default(),
                    drop_rate,
                    rng,
                    stats: NetworkStats::default(),
                }),
                views,
            }),
        }
    }

    pub fn group_name(&self) -> &str {
        &self.shared.group
    }

    /// Attach a new process under a fresh identity.
    pub fn join(&self) -> DeliveryResult<Endpoint> {
        self.join_as(ProcessId::random())
    }

    /// Attach a process under a chosen identity.
    pub fn join_as(&self, id: ProcessId) -> DeliveryResult<Endpoint> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut state = self.shared.state.lock().map_err(|_| DeliveryError::Poisoned)?;
        let view = state
            .view
            .with_member(id)
            .map_err(|e| DeliveryError::Membership(e.to_string()))?;
        state.mailboxes.insert(id, tx);
        state.view = view.clone();
        // Subscribe before publishing so the new endpoint starts at this view.
        let views = self.shared.views.subscribe();
        self.shared.views.send_replace(view.clone());
        drop(state);

        info!(
            group = %self.shared.group,
            process = %id,
            view_id = view.view_id(),
            size = view.len(),
            "process joined"
        );

        Ok(Endpoint {
            messenger: Arc::new(LocalMessenger {
                id,
                shared: Arc::clone(&self.shared),
            }),
            inbound: rx,
            views,
        })
    }

    /// Detach a process. Its mailbox closes and a new view is published.
    pub fn leave(&self, id: &ProcessId) -> DeliveryResult<MembershipView> {
        let mut state = self.shared.state.lock().map_err(|_| DeliveryError::Poisoned)?;
        if state.mailboxes.remove(id).is_none() {
            return Err(DeliveryError::UnknownRecipient(*id));
        }
        let view = state.view.without_member(id);
        state.view = view.clone();
        self.shared.views.send_replace(view.clone());
        drop(state);

        info!(group = %self.shared.group, process = %id, view_id = view.view_id(), "process left");
        Ok(view)
    }

    /// Current membership view
    pub fn view(&self) -> MembershipView {
        self.shared.views.borrow().clone()
    }

    /// Frame counters since the network was created
    pub fn stats(&self) -> DeliveryResult<NetworkStats> {
        let state = self.shared.state.lock().map_err(|_| DeliveryError::Poisoned)?;
        Ok(state.stats)
    }
}

/// Send side handed to each endpoint
#[derive(Debug)]
struct LocalMessenger {
    id: ProcessId,
    shared: Arc<Shared>,
}

impl Messenger for LocalMessenger {
    fn local_id(&self) -> ProcessId {
        self.id
    }

    fn send(&self, to: ProcessId, message: &Message) -> DeliveryResult<()> {
        let payload = encode(message).map_err(|e| DeliveryError::Encode(e.to_string()))?;

        let mut state = self.shared.state.lock().map_err(|_| DeliveryError::Poisoned)?;
        state.stats.sent += 1;

        if state.drop_rate > 0.0 {
            let roll: f64 = state.rng.gen();
            if roll < state.drop_rate {
                state.stats.dropped += 1;
                debug!(from = %self.id, to = %to, %message, "frame dropped");
                return Ok(());
            }
        }

        let mailbox = state
            .mailboxes
            .get(&to)
            .ok_or(DeliveryError::UnknownRecipient(to))?;
        mailbox
            .send(Delivery {
                from: self.id,
                payload,
            })
            .map_err(|_| DeliveryError::Disconnected(to))?;
        state.stats.delivered += 1;

        trace!(from = %self.id, to = %to, %message, "frame delivered");
        Ok(())
    }
}
