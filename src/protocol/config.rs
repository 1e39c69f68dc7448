//! Protocol Configuration
//!
//! Fixed at process start. The defaults reproduce the baseline behaviour:
//! floor-rounded grid, no request timeout. The vote threshold defaults to
//! the full quorum, the only setting under which mutual exclusion holds.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{ProtocolError, ProtocolResult};
use crate::quorum::GridRounding;

/// Number of votes a requester must collect before entering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteThreshold {
    /// A vote from every member of the quorum, self included
    #[default]
    FullQuorum,

    /// M + 1 votes, capped at the quorum size.
    ///
    /// Smaller than a full grid quorum (2M - 1), so two requesters whose
    /// quorums overlap in only two members can both reach it. Kept for
    /// reproducing the legacy behaviour; it does not guarantee exclusion.
    GridSide,
}

impl VoteThreshold {
    /// Votes required for a quorum of `quorum_size` members on a grid of side `side`.
    pub fn required(&self, quorum_size: usize, side: usize) -> usize {
        match self {
            VoteThreshold::FullQuorum => quorum_size,
            VoteThreshold::GridSide => (side + 1).min(quorum_size),
        }
    }

    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteThreshold::FullQuorum => "full_quorum",
            VoteThreshold::GridSide => "grid_side",
        }
    }
}

impl fmt::Display for VoteThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Protocol configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProtocolConfig {
    /// Grid side rounding
    pub rounding: GridRounding,

    /// Entry threshold
    pub threshold: VoteThreshold,

    /// Abandon a request that has not reached the threshold in this time.
    ///
    /// `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl ProtocolConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set grid rounding.
    pub fn with_rounding(mut self, rounding: GridRounding) -> Self {
        self.rounding = rounding;
        self
    }

    /// Set the entry threshold.
    pub fn with_threshold(mut self, threshold: VoteThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ProtocolError::InvalidConfig(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
