//! Group transport
//!
//! The protocol needs three things from the group communication layer:
//! a point-to-point send tagged with the sender's identity, a stream of
//! inbound frames, and the current membership view. `Messenger` is the send
//! side; `Endpoint` bundles all three for one process.
//!
//! Delivery may be lossy. Frames from one sender to one receiver arrive in
//! send order.
//!
//! `LocalNetwork` is an in-process implementation used by the simulator and
//! the tests.

mod errors;
mod local;

pub use errors::{DeliveryError, DeliveryResult};
pub use local::{LocalNetwork, NetworkStats};

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::membership::{MembershipView, ProcessId};
use crate::message::Message;

/// Inbound frame with the sender's identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub from: ProcessId,
    pub payload: Vec<u8>,
}

/// Inbound frame sender for a process
pub type DeliverySender = mpsc::UnboundedSender<Delivery>;

/// Inbound frame receiver for a process
pub type DeliveryReceiver = mpsc::UnboundedReceiver<Delivery>;

/// Send side of the group transport
pub trait Messenger: Send + Sync + 'static {
    /// Identity stamped on every frame sent through this messenger
    fn local_id(&self) -> ProcessId;

    /// Send one message to one process.
    ///
    /// `Ok` means the frame was handed to the transport, not that it arrived.
    fn send(&self, to: ProcessId, message: &Message) -> DeliveryResult<()>;
}

/// One process's attachment to the group
pub struct Endpoint {
    pub messenger: Arc<dyn Messenger>,
    pub inbound: DeliveryReceiver,
    pub views: watch::Receiver<MembershipView>,
}

impl Endpoint {
    pub fn id(&self) -> ProcessId {
        self.messenger.local_id()
    }

    /// Latest view published by the group
    pub fn current_view(&self) -> MembershipView {
        self.views.borrow().clone()
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.id())
            .field("view_id", &self.views.borrow().view_id())
            .finish()
    }
}
