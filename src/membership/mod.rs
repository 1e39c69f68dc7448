//! Group membership
//!
//! Process identity and the ordered membership view supplied by the group
//! communication layer. A view is replaced wholesale on every change; quorum
//! assignments are recomputed from the new view.

mod id;
mod view;

pub use id::ProcessId;
pub use view::{MembershipError, MembershipView};
