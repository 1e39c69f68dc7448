//! Wire messages
//!
//! Three protocol kinds plus the withdrawal used by the request timeout.
//! The sender is supplied by the transport and never carried in the body.
//!
//! | Kind | Direction | Meaning |
//! |---|---|---|
//! | `RequestEntry` | requester -> quorum | grant me your vote |
//! | `GrantVote` | voter -> requester | you have my vote |
//! | `ReleaseNotify` | holder -> quorum | done, voters may reassign |
//! | `Withdraw` | requester -> quorum | attempt abandoned, forget me |

mod codec;

pub use codec::{decode, encode, CodecError, Decoded};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::membership::ProcessId;

/// Protocol message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Ask for the receiver's vote for attempt `round`
    RequestEntry { round: u64 },

    /// Vote granted for the requester's attempt `round`
    GrantVote { round: u64 },

    /// The sender left the critical section
    ReleaseNotify,

    /// The sender abandoned its pending attempt
    Withdraw,
}

impl Message {
    /// Wire tags understood by this implementation
    pub const KINDS: [&'static str; 4] =
        ["request_entry", "grant_vote", "release_notify", "withdraw"];

    /// Wire tag of this message
    pub fn kind(&self) -> &'static str {
        match self {
            Message::RequestEntry { .. } => "request_entry",
            Message::GrantVote { .. } => "grant_vote",
            Message::ReleaseNotify => "release_notify",
            Message::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::RequestEntry { round } | Message::GrantVote { round } => {
                write!(f, "{}(round={})", self.kind(), round)
            }
            _ => write!(f, "{}", self.kind()),
        }
    }
}

/// Outbound message addressed to one process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub to: ProcessId,
    pub message: Message,
}

impl Envelope {
    pub fn new(to: ProcessId, message: Message) -> Self {
        Self { to, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_known() {
        let messages = [
            Message::RequestEntry { round: 1 },
            Message::GrantVote { round: 1 },
            Message::ReleaseNotify,
            Message::Withdraw,
        ];
        for message in messages {
            assert!(Message::KINDS.contains(&message.kind()));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Message::GrantVote { round: 3 }.to_string(),
            "grant_vote(round=3)"
        );
        assert_eq!(Message::ReleaseNotify.to_string(), "release_notify");
    }
}
