//! Requester Phase
//!
//! - Idle: no outstanding request
//! - Requesting: votes are being collected for one attempt
//! - InCriticalSection: threshold met, critical action running
//!
//! Transitions are explicit and consume the current phase. Any transition
//! not listed below is rejected with `ForbiddenTransition`.

use super::errors::{ProtocolError, ProtocolResult};

/// Requester-side phase of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No attempt in progress.
    #[default]
    Idle,

    /// Collecting votes.
    Requesting {
        /// Attempt number, echoed by voters in their grants
        round: u64,
    },

    /// Holding a full set of votes.
    InCriticalSection {
        /// Attempt that entered
        round: u64,
    },
}

impl Phase {
    /// Create a phase in Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Get the phase name for observability.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Requesting { .. } => "REQUESTING",
            Self::InCriticalSection { .. } => "IN_CRITICAL_SECTION",
        }
    }

    /// Attempt number, if any.
    pub fn round(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Requesting { round } | Self::InCriticalSection { round } => Some(*round),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self, Self::Requesting { .. })
    }

    pub fn is_in_critical_section(&self) -> bool {
        matches!(self, Self::InCriticalSection { .. })
    }

    // =========================================================================
    // ALLOWED TRANSITIONS
    // =========================================================================

    /// Idle → Requesting
    pub fn begin_request(self, round: u64) -> ProtocolResult<Self> {
        match self {
            Self::Idle => Ok(Self::Requesting { round }),
            _ => Err(ProtocolError::forbidden_transition(self.name(), "REQUESTING")),
        }
    }

    /// Requesting → InCriticalSection
    ///
    /// Threshold reached.
    pub fn enter(self) -> ProtocolResult<Self> {
        match self {
            Self::Requesting { round } => Ok(Self::InCriticalSection { round }),
            _ => Err(ProtocolError::forbidden_transition(
                self.name(),
                "IN_CRITICAL_SECTION",
            )),
        }
    }

    /// InCriticalSection → Idle
    pub fn exit(self) -> ProtocolResult<Self> {
        match self {
            Self::InCriticalSection { .. } => Ok(Self::Idle),
            _ => Err(ProtocolError::forbidden_transition(self.name(), "IDLE")),
        }
    }

    /// Requesting → Idle
    ///
    /// Attempt abandoned after a timeout.
    pub fn abandon(self) -> ProtocolResult<Self> {
        match self {
            Self::Requesting { .. } => Ok(Self::Idle),
            _ => Err(ProtocolError::forbidden_transition(self.name(), "IDLE")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let phase = Phase::new();
        assert!(phase.is_idle());

        let phase = phase.begin_request(1).unwrap();
        assert_eq!(phase, Phase::Requesting { round: 1 });

        let phase = phase.enter().unwrap();
        assert_eq!(phase, Phase::InCriticalSection { round: 1 });
        assert_eq!(phase.round(), Some(1));

        let phase = phase.exit().unwrap();
        assert_eq!(phase, Phase::Idle);
        assert_eq!(phase.round(), None);
    }

    #[test]
    fn test_abandon_returns_to_idle() {
        let phase = Phase::Requesting { round: 4 };
        assert_eq!(phase.abandon().unwrap(), Phase::Idle);
    }

    // =========================================================================
    // FORBIDDEN TRANSITIONS
    // =========================================================================

    #[test]
    fn test_no_second_request_while_requesting() {
        let result = Phase::Requesting { round: 1 }.begin_request(2);
        assert_eq!(
            result.unwrap_err(),
            ProtocolError::forbidden_transition("REQUESTING", "REQUESTING")
        );
    }

    #[test]
    fn test_no_request_inside_critical_section() {
        assert!(Phase::InCriticalSection { round: 1 }.begin_request(2).is_err());
    }

    #[test]
    fn test_idle_cannot_enter() {
        assert!(Phase::Idle.enter().is_err());
    }

    #[test]
    fn test_idle_cannot_exit() {
        assert!(Phase::Idle.exit().is_err());
    }

    #[test]
    fn test_cannot_abandon_critical_section() {
        assert!(Phase::InCriticalSection { round: 1 }.abandon().is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(Phase::Idle.name(), "IDLE");
        assert_eq!(Phase::Requesting { round: 1 }.name(), "REQUESTING");
        assert_eq!(
            Phase::InCriticalSection { round: 1 }.name(),
            "IN_CRITICAL_SECTION"
        );
    }
}
