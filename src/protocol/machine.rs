//! Voting state machine
//!
//! Requester side: collect one vote from each quorum member (or the
//! configured threshold), enter, then release every vote on exit.
//!
//! Responder side: lend the local vote to one requester at a time, queue the
//! rest in arrival order, hand the vote to the queue head on release.
//!
//! The local vote is exclusive like any other. A request for it from the
//! process itself is granted immediately when the vote is free and queued
//! behind the current holder otherwise.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::config::ProtocolConfig;
use super::errors::ProtocolResult;
use super::ledger::{Grant, Release, VoteDecision, VoteLedger};
use super::phase::Phase;
use crate::membership::{MembershipView, ProcessId};
use crate::message::{Envelope, Message};
use crate::quorum::QuorumAssignment;

/// Effects of one protocol step
///
/// The caller sends `outbound` in order and, when `entered` is set, runs the
/// critical action for that round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Messages to send, in order
    pub outbound: Vec<Envelope>,

    /// Round whose critical section was entered during this step
    pub entered: Option<u64>,
}

impl Step {
    fn send(&mut self, to: ProcessId, message: Message) {
        self.outbound.push(Envelope::new(to, message));
    }

    /// Whether the step has no effect
    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.entered.is_none()
    }

    /// Messages addressed to one process
    pub fn messages_to(&self, to: &ProcessId) -> Vec<Message> {
        self.outbound
            .iter()
            .filter(|envelope| envelope.to == *to)
            .map(|envelope| envelope.message)
            .collect()
    }
}

/// Read-only view of a process's voting state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteSnapshot {
    pub process: ProcessId,
    pub index: usize,
    pub group_size: usize,
    pub view_id: u64,
    pub phase: &'static str,
    pub round: Option<u64>,
    pub granted_to: Option<ProcessId>,
    pub votes_received: usize,
    pub votes_required: Option<usize>,
    pub deferred: Vec<ProcessId>,
    pub quorum: Vec<ProcessId>,
}

/// One entry attempt
#[derive(Debug, Clone)]
struct Attempt {
    round: u64,
    /// Quorum as of the request; not reconciled with later views
    quorum: QuorumAssignment,
    required: usize,
    votes: BTreeSet<ProcessId>,
}

/// Request/Grant protocol for one process
#[derive(Debug, Clone)]
pub struct VotingProtocol {
    local: ProcessId,
    config: ProtocolConfig,
    view: MembershipView,
    assignment: QuorumAssignment,
    phase: Phase,
    ledger: VoteLedger,
    attempt: Option<Attempt>,
    last_round: u64,
}

impl VotingProtocol {
    /// Create the protocol for `local`, which must be a member of `view`.
    pub fn new(local: ProcessId, view: MembershipView, config: ProtocolConfig) -> ProtocolResult<Self> {
        config.validate()?;
        let assignment = QuorumAssignment::resolve(&view, &local, config.rounding)?;

        Ok(Self {
            local,
            config,
            view,
            assignment,
            phase: Phase::new(),
            ledger: VoteLedger::new(),
            attempt: None,
            last_round: 0,
        })
    }

    pub fn local(&self) -> ProcessId {
        self.local
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn view(&self) -> &MembershipView {
        &self.view
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    /// Round of the most recent attempt, zero before the first
    pub fn last_round(&self) -> u64 {
        self.last_round
    }

    /// Quorum for the next attempt under the current view
    pub fn quorum(&self) -> &QuorumAssignment {
        &self.assignment
    }

    /// Votes collected by the current attempt, zero when idle
    pub fn votes_received(&self) -> usize {
        self.attempt.as_ref().map_or(0, |attempt| attempt.votes.len())
    }

    /// Threshold of the current attempt
    pub fn votes_required(&self) -> Option<usize> {
        self.attempt.as_ref().map(|attempt| attempt.required)
    }

    pub fn snapshot(&self) -> VoteSnapshot {
        VoteSnapshot {
            process: self.local,
            index: self.assignment.index,
            group_size: self.view.len(),
            view_id: self.view.view_id(),
            phase: self.phase.name(),
            round: self.phase.round(),
            granted_to: self.ledger.holder(),
            votes_received: self.votes_received(),
            votes_required: self.votes_required(),
            deferred: self.ledger.deferred().requesters(),
            quorum: self.assignment.members.iter().copied().collect(),
        }
    }

    /// Adopt a new membership view.
    ///
    /// The quorum is recomputed for future attempts only. An attempt already
    /// in flight keeps the quorum it was sent to.
    pub fn install_view(&mut self, view: MembershipView) -> ProtocolResult<()> {
        let assignment = QuorumAssignment::resolve(&view, &self.local, self.config.rounding)?;

        if let Some(attempt) = &self.attempt {
            warn!(
                round = attempt.round,
                view_id = view.view_id(),
                "view changed during an attempt; its votes are not reconciled"
            );
        }
        debug!(
            view_id = view.view_id(),
            size = view.len(),
            index = assignment.index,
            quorum = assignment.len(),
            "installed membership view"
        );

        self.view = view;
        self.assignment = assignment;
        Ok(())
    }

    // =========================================================================
    // REQUESTER SIDE
    // =========================================================================

    /// IDLE → REQUESTING: ask every quorum member for its vote.
    pub fn request_entry(&mut self) -> ProtocolResult<Step> {
        let round = self.last_round + 1;
        self.phase = self.phase.begin_request(round)?;
        self.last_round = round;

        let quorum = self.assignment.clone();
        let required = self.config.threshold.required(quorum.len(), quorum.side);

        let mut step = Step::default();
        for peer in quorum.peers(&self.local) {
            step.send(peer, Message::RequestEntry { round });
        }
        info!(round, quorum = quorum.len(), required, "requesting critical section");

        self.attempt = Some(Attempt {
            round,
            quorum,
            required,
            votes: BTreeSet::new(),
        });
        self.vote_for_self(round, &mut step);

        Ok(step)
    }

    /// IN_CRITICAL_SECTION → IDLE: return every vote.
    ///
    /// Voters that granted receive `ReleaseNotify`; quorum members that never
    /// granted (only possible below a full-quorum threshold) receive
    /// `Withdraw` so they drop the pending request.
    pub fn exit_critical_section(&mut self) -> ProtocolResult<Step> {
        self.phase = self.phase.exit()?;

        let mut step = Step::default();
        if let Some(attempt) = self.attempt.take() {
            for peer in attempt.quorum.peers(&self.local) {
                let message = if attempt.votes.contains(&peer) {
                    Message::ReleaseNotify
                } else {
                    Message::Withdraw
                };
                step.send(peer, message);
            }
            info!(round = attempt.round, "left critical section");
        }
        self.withdraw_self(&mut step);

        Ok(step)
    }

    /// REQUESTING → IDLE: abandon the attempt and withdraw from every voter.
    pub fn abort_request(&mut self) -> ProtocolResult<Step> {
        self.phase = self.phase.abandon()?;

        let mut step = Step::default();
        if let Some(attempt) = self.attempt.take() {
            for peer in attempt.quorum.peers(&self.local) {
                step.send(peer, Message::Withdraw);
            }
            warn!(
                round = attempt.round,
                votes = attempt.votes.len(),
                required = attempt.required,
                "abandoned critical section request"
            );
        }
        self.withdraw_self(&mut step);

        Ok(step)
    }

    // =========================================================================
    // INBOUND MESSAGES
    // =========================================================================

    /// Apply one inbound message. Stale messages leave the state untouched.
    pub fn handle(&mut self, from: ProcessId, message: Message) -> Step {
        let mut step = Step::default();
        match message {
            Message::RequestEntry { round } if from == self.local => {
                self.vote_for_self(round, &mut step)
            }
            Message::RequestEntry { round } => self.on_request(from, round, &mut step),
            Message::GrantVote { round } => self.count_vote(from, round, &mut step),
            Message::ReleaseNotify => self.on_release(from, &mut step),
            Message::Withdraw => self.on_withdraw(from, &mut step),
        }
        step
    }

    fn vote_for_self(&mut self, round: u64, step: &mut Step) {
        if self.phase != (Phase::Requesting { round }) {
            debug!(round, phase = self.phase.name(), "ignoring stale self request");
            return;
        }

        match self.ledger.request(self.local, round) {
            VoteDecision::Granted(_) | VoteDecision::Regranted(_) => {
                self.count_vote(self.local, round, step)
            }
            VoteDecision::Deferred => debug!(
                round,
                holder = ?self.ledger.holder(),
                "own vote is lent out; queued behind holder"
            ),
            VoteDecision::AlreadyQueued => {}
        }
    }

    fn on_request(&mut self, from: ProcessId, round: u64, step: &mut Step) {
        match self.ledger.request(from, round) {
            VoteDecision::Granted(grant) => {
                debug!(peer = %from, round, "granting vote");
                step.send(from, Message::GrantVote { round: grant.round });
            }
            VoteDecision::Regranted(grant) => {
                debug!(peer = %from, round, "holder asked again; renewing grant");
                step.send(from, Message::GrantVote { round: grant.round });
            }
            VoteDecision::Deferred => debug!(
                peer = %from,
                round,
                holder = ?self.ledger.holder(),
                queued = self.ledger.deferred().len(),
                "vote held; request deferred"
            ),
            VoteDecision::AlreadyQueued => trace!(peer = %from, round, "queued request refreshed"),
        }
    }

    fn count_vote(&mut self, voter: ProcessId, round: u64, step: &mut Step) {
        let Some(attempt) = self.attempt.as_mut() else {
            trace!(voter = %voter, round, "grant with no attempt; ignored");
            return;
        };
        if !self.phase.is_requesting() || attempt.round != round {
            debug!(voter = %voter, round, phase = self.phase.name(), "stale grant ignored");
            return;
        }
        if !attempt.quorum.contains(&voter) {
            debug!(voter = %voter, round, "grant from outside the quorum ignored");
            return;
        }

        attempt.votes.insert(voter);
        let votes = attempt.votes.len();
        let required = attempt.required;
        debug!(voter = %voter, round, votes, required, "vote received");

        if votes >= required {
            match self.phase.enter() {
                Ok(next) => {
                    self.phase = next;
                    step.entered = Some(round);
                    info!(round, votes, "entered critical section");
                }
                Err(e) => warn!(error = %e, "threshold met outside REQUESTING"),
            }
        }
    }

    fn on_release(&mut self, from: ProcessId, step: &mut Step) {
        match self.ledger.release(&from) {
            Release::Transferred(grant) => {
                debug!(peer = %from, next = %grant.holder, "vote released; passing to queue head");
                self.deliver_grant(grant, step);
            }
            Release::Freed => debug!(peer = %from, "vote released; now free"),
            Release::Ignored => debug!(peer = %from, "release from non-holder ignored"),
        }
    }

    fn on_withdraw(&mut self, from: ProcessId, step: &mut Step) {
        let withdrawal = self.ledger.withdraw(&from);
        debug!(peer = %from, dequeued = withdrawal.dequeued, "requester withdrew");

        if let Release::Transferred(grant) = withdrawal.release {
            self.deliver_grant(grant, step);
        }
    }

    fn withdraw_self(&mut self, step: &mut Step) {
        let local = self.local;
        self.on_withdraw(local, step);
    }

    fn deliver_grant(&mut self, grant: Grant, step: &mut Step) {
        if grant.holder == self.local {
            self.count_vote(self.local, grant.round, step);
        } else {
            step.send(grant.holder, Message::GrantVote { round: grant.round });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ProtocolError, VoteThreshold};
    use crate::quorum::QuorumError;

    fn group(n: u128) -> (Vec<ProcessId>, MembershipView) {
        let ids: Vec<ProcessId> = (0..n).map(ProcessId::from_u128).collect();
        let view = MembershipView::new(1, ids.clone()).unwrap();
        (ids, view)
    }

    fn protocol(ids: &[ProcessId], view: &MembershipView, index: usize) -> VotingProtocol {
        VotingProtocol::new(ids[index], view.clone(), ProtocolConfig::default()).unwrap()
    }

    // =========================================================================
    // REQUESTER
    // =========================================================================

    #[test]
    fn test_request_counts_self_immediately() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);

        let step = p0.request_entry().unwrap();

        assert_eq!(p0.phase(), Phase::Requesting { round: 1 });
        assert_eq!(p0.votes_received(), 1);
        assert_eq!(p0.ledger().holder(), Some(ids[0]));
        assert!(p0.ledger().deferred().is_empty());
        // quorum(0) on a 2x2 grid = {0, 1, 2}
        assert_eq!(step.outbound.len(), 2);
        assert_eq!(step.messages_to(&ids[1]), vec![Message::RequestEntry { round: 1 }]);
        assert_eq!(step.messages_to(&ids[2]), vec![Message::RequestEntry { round: 1 }]);
        assert_eq!(step.entered, None);
    }

    #[test]
    fn test_single_member_enters_at_once() {
        let (ids, view) = group(1);
        let mut p0 = protocol(&ids, &view, 0);

        let step = p0.request_entry().unwrap();
        assert!(step.outbound.is_empty());
        assert_eq!(step.entered, Some(1));
        assert!(p0.phase().is_in_critical_section());
    }

    #[test]
    fn test_enters_after_full_quorum() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        p0.request_entry().unwrap();

        let step = p0.handle(ids[1], Message::GrantVote { round: 1 });
        assert_eq!(step.entered, None);
        assert_eq!(p0.votes_received(), 2);

        let step = p0.handle(ids[2], Message::GrantVote { round: 1 });
        assert_eq!(step.entered, Some(1));
        assert_eq!(p0.phase(), Phase::InCriticalSection { round: 1 });
    }

    #[test]
    fn test_grid_side_threshold_enters_early() {
        let (ids, view) = group(9);
        let config = ProtocolConfig::new().with_threshold(VoteThreshold::GridSide);
        let mut p0 = VotingProtocol::new(ids[0], view, config).unwrap();
        p0.request_entry().unwrap();
        assert_eq!(p0.votes_required(), Some(4));

        p0.handle(ids[1], Message::GrantVote { round: 1 });
        p0.handle(ids[2], Message::GrantVote { round: 1 });
        let step = p0.handle(ids[3], Message::GrantVote { round: 1 });
        assert_eq!(step.entered, Some(1));
    }

    #[test]
    fn test_second_request_forbidden() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        p0.request_entry().unwrap();

        assert_eq!(
            p0.request_entry().unwrap_err(),
            ProtocolError::forbidden_transition("REQUESTING", "REQUESTING")
        );
    }

    #[test]
    fn test_exit_without_entry_forbidden() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        assert!(p0.exit_critical_section().is_err());
        assert!(p0.abort_request().is_err());
    }

    #[test]
    fn test_exit_releases_quorum_and_resets() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        p0.request_entry().unwrap();
        p0.handle(ids[1], Message::GrantVote { round: 1 });
        p0.handle(ids[2], Message::GrantVote { round: 1 });

        let step = p0.exit_critical_section().unwrap();

        assert_eq!(p0.phase(), Phase::Idle);
        assert_eq!(p0.votes_received(), 0);
        assert!(p0.ledger().is_free());
        assert_eq!(step.messages_to(&ids[1]), vec![Message::ReleaseNotify]);
        assert_eq!(step.messages_to(&ids[2]), vec![Message::ReleaseNotify]);
        assert!(step.messages_to(&ids[3]).is_empty());
    }

    #[test]
    fn test_rounds_increase() {
        let (ids, view) = group(1);
        let mut p0 = protocol(&ids, &view, 0);

        assert_eq!(p0.request_entry().unwrap().entered, Some(1));
        p0.exit_critical_section().unwrap();
        assert_eq!(p0.request_entry().unwrap().entered, Some(2));
    }

    #[test]
    fn test_abort_withdraws_everywhere() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        p0.request_entry().unwrap();
        p0.handle(ids[1], Message::GrantVote { round: 1 });

        let step = p0.abort_request().unwrap();

        assert_eq!(p0.phase(), Phase::Idle);
        assert!(p0.ledger().is_free());
        assert_eq!(step.messages_to(&ids[1]), vec![Message::Withdraw]);
        assert_eq!(step.messages_to(&ids[2]), vec![Message::Withdraw]);
    }

    #[test]
    fn test_grant_for_abandoned_round_ignored() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        p0.request_entry().unwrap();
        p0.abort_request().unwrap();
        p0.request_entry().unwrap();

        p0.handle(ids[1], Message::GrantVote { round: 1 });
        assert_eq!(p0.votes_received(), 1);

        p0.handle(ids[1], Message::GrantVote { round: 2 });
        assert_eq!(p0.votes_received(), 2);
    }

    // =========================================================================
    // LOCAL VOTE
    // =========================================================================

    #[test]
    fn test_lent_local_vote_queues_self() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);

        // p1 holds p0's vote
        let step = p0.handle(ids[1], Message::RequestEntry { round: 1 });
        assert_eq!(step.messages_to(&ids[1]), vec![Message::GrantVote { round: 1 }]);

        p0.request_entry().unwrap();
        assert_eq!(p0.votes_received(), 0);
        assert_eq!(p0.ledger().deferred().requesters(), vec![ids[0]]);

        // p1 releases: the vote comes home and counts
        let step = p0.handle(ids[1], Message::ReleaseNotify);
        assert!(step.outbound.is_empty());
        assert_eq!(p0.votes_received(), 1);
        assert_eq!(p0.ledger().holder(), Some(ids[0]));
    }

    #[test]
    fn test_exit_hands_local_vote_to_waiting_peer() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        p0.request_entry().unwrap();
        p0.handle(ids[2], Message::RequestEntry { round: 1 });
        p0.handle(ids[1], Message::GrantVote { round: 1 });
        p0.handle(ids[2], Message::GrantVote { round: 1 });

        let step = p0.exit_critical_section().unwrap();
        assert_eq!(
            step.messages_to(&ids[2]),
            vec![Message::ReleaseNotify, Message::GrantVote { round: 1 }]
        );
        assert_eq!(p0.ledger().holder(), Some(ids[2]));
    }

    // =========================================================================
    // RESPONDER
    // =========================================================================

    #[test]
    fn test_contention_grants_in_arrival_order() {
        let (ids, view) = group(4);
        let mut p3 = protocol(&ids, &view, 3);

        p3.handle(ids[1], Message::RequestEntry { round: 1 });
        let step = p3.handle(ids[0], Message::RequestEntry { round: 1 });
        assert!(step.outbound.is_empty());
        let step = p3.handle(ids[2], Message::RequestEntry { round: 1 });
        assert!(step.outbound.is_empty());
        assert_eq!(p3.ledger().deferred().requesters(), vec![ids[0], ids[2]]);

        let step = p3.handle(ids[1], Message::ReleaseNotify);
        assert_eq!(step.outbound, vec![Envelope::new(ids[0], Message::GrantVote { round: 1 })]);
        assert_eq!(p3.ledger().holder(), Some(ids[0]));

        let step = p3.handle(ids[0], Message::ReleaseNotify);
        assert_eq!(step.outbound, vec![Envelope::new(ids[2], Message::GrantVote { round: 1 })]);

        let step = p3.handle(ids[2], Message::ReleaseNotify);
        assert!(step.outbound.is_empty());
        assert!(p3.ledger().is_free());
    }

    #[test]
    fn test_withdraw_skips_queued_requester() {
        let (ids, view) = group(4);
        let mut p3 = protocol(&ids, &view, 3);
        p3.handle(ids[1], Message::RequestEntry { round: 1 });
        p3.handle(ids[0], Message::RequestEntry { round: 1 });
        p3.handle(ids[2], Message::RequestEntry { round: 1 });

        assert!(p3.handle(ids[0], Message::Withdraw).outbound.is_empty());

        let step = p3.handle(ids[1], Message::ReleaseNotify);
        assert_eq!(step.outbound, vec![Envelope::new(ids[2], Message::GrantVote { round: 1 })]);
    }

    #[test]
    fn test_retry_after_lost_withdraw_gets_current_round() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        let mut p2 = protocol(&ids, &view, 2);
        p2.handle(ids[1], Message::RequestEntry { round: 1 });

        p0.request_entry().unwrap();
        p2.handle(ids[0], Message::RequestEntry { round: 1 });
        // the Withdraw never reaches p2
        p0.abort_request().unwrap();
        p0.request_entry().unwrap();
        assert_eq!(p0.phase(), Phase::Requesting { round: 2 });

        let step = p2.handle(ids[0], Message::RequestEntry { round: 2 });
        assert!(step.outbound.is_empty());
        assert_eq!(p2.ledger().deferred().requesters(), vec![ids[0]]);

        let step = p2.handle(ids[1], Message::ReleaseNotify);
        assert_eq!(step.outbound, vec![Envelope::new(ids[0], Message::GrantVote { round: 2 })]);
        assert_eq!(p2.ledger().granted_to().map(|grant| grant.round), Some(2));

        p0.handle(ids[2], Message::GrantVote { round: 2 });
        assert_eq!(p0.votes_received(), 2);
        let step = p0.handle(ids[1], Message::GrantVote { round: 2 });
        assert_eq!(step.entered, Some(2));
    }

    // =========================================================================
    // STALE MESSAGES
    // =========================================================================

    #[test]
    fn test_grant_while_idle_changes_nothing() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        let before = p0.snapshot();

        let step = p0.handle(ids[1], Message::GrantVote { round: 1 });
        assert!(step.is_empty());
        assert_eq!(p0.snapshot(), before);
    }

    #[test]
    fn test_duplicate_grant_after_entry_changes_nothing() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        p0.request_entry().unwrap();
        p0.handle(ids[1], Message::GrantVote { round: 1 });
        p0.handle(ids[2], Message::GrantVote { round: 1 });
        let before = p0.snapshot();

        let step = p0.handle(ids[2], Message::GrantVote { round: 1 });
        assert!(step.is_empty());
        assert_eq!(p0.snapshot(), before);
    }

    #[test]
    fn test_release_from_non_holder_changes_nothing() {
        let (ids, view) = group(4);
        let mut p3 = protocol(&ids, &view, 3);
        p3.handle(ids[1], Message::RequestEntry { round: 1 });
        p3.handle(ids[2], Message::RequestEntry { round: 1 });
        let before = p3.snapshot();

        let step = p3.handle(ids[2], Message::ReleaseNotify);
        assert!(step.is_empty());
        assert_eq!(p3.snapshot(), before);
    }

    #[test]
    fn test_grant_from_outside_quorum_ignored() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        p0.request_entry().unwrap();

        p0.handle(ids[3], Message::GrantVote { round: 1 });
        assert_eq!(p0.votes_received(), 1);
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    #[test]
    fn test_non_member_rejected() {
        let (_, view) = group(4);
        let stranger = ProcessId::from_u128(99);

        let result = VotingProtocol::new(stranger, view, ProtocolConfig::default());
        assert_eq!(
            result.unwrap_err(),
            ProtocolError::Quorum(QuorumError::NotAMember(stranger))
        );
    }

    #[test]
    fn test_view_change_recomputes_future_quorum() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        assert_eq!(p0.quorum().len(), 3);

        let (_, bigger) = group(9);
        p0.install_view(bigger).unwrap();
        assert_eq!(p0.quorum().len(), 5);
        assert_eq!(p0.snapshot().group_size, 9);
    }

    #[test]
    fn test_view_change_keeps_in_flight_quorum() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);
        p0.request_entry().unwrap();

        let (_, bigger) = group(9);
        p0.install_view(bigger).unwrap();
        assert_eq!(p0.votes_required(), Some(3));

        p0.handle(ids[1], Message::GrantVote { round: 1 });
        let step = p0.handle(ids[2], Message::GrantVote { round: 1 });
        assert_eq!(step.entered, Some(1));
    }

    #[test]
    fn test_view_without_self_rejected() {
        let (ids, view) = group(4);
        let mut p0 = protocol(&ids, &view, 0);

        let shrunk = view.without_member(&ids[0]);
        assert!(p0.install_view(shrunk).is_err());
        assert_eq!(p0.view(), &view);
    }
}
