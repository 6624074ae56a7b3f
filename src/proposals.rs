use tracing::info;

use crate::errors::{ChainError, ChainResult};
use crate::storage::{GovernanceBatch, Storage};
use crate::types::{
    Address, Ballot, EntityKind, GovernanceAction, GovernanceStatus, Proposal, ProposalStatus,
    VoteChoice,
};

/// Creates, tracks, and terminates proposals. Owns the vote ledger and the
/// proposal-to-action binding; deciding what a decisive tally *means* for
/// the target entity is the controller's job.
pub struct ProposalManager {
    storage: Storage,
}

impl ProposalManager {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Open a proposal for a validated action. The record is staged on the
    /// batch so it commits together with the entity's intermediate status.
    pub fn open(
        &self,
        batch: &mut GovernanceBatch,
        action: GovernanceAction,
        prior_status: Option<GovernanceStatus>,
        eligible: Vec<Address>,
        reason: &str,
    ) -> ChainResult<Proposal> {
        let id = self.storage.next_proposal_id()?;
        let proposal = Proposal {
            id,
            target_kind: action.entity_kind(),
            target_id: action.target().to_string(),
            action,
            reason: reason.to_string(),
            prior_status,
            eligible,
            votes: Vec::new(),
            status: ProposalStatus::Pending,
        };
        batch.put_proposal(proposal.clone());
        info!(
            proposal = proposal.id,
            target = %proposal.target_id,
            action = %proposal.action.action_kind(),
            voters = proposal.eligible.len(),
            "governance proposal opened"
        );
        Ok(proposal)
    }

    pub fn get(&self, id: u64) -> ChainResult<Proposal> {
        self.storage
            .get_proposal(id)?
            .ok_or_else(|| ChainError::NotFound(format!("proposal {id}")))
    }

    /// Record a ballot on a pending proposal. The voter must belong to the
    /// voter set captured at open time and still hold the admin capability;
    /// ballots are immutable once cast.
    pub fn record_vote(
        &self,
        proposal: &mut Proposal,
        voter: &str,
        choice: VoteChoice,
        label: &str,
    ) -> ChainResult<()> {
        if proposal.status != ProposalStatus::Pending {
            return Err(ChainError::IllegalTransition(format!(
                "proposal {} is already {}",
                proposal.id, proposal.status
            )));
        }
        if !proposal.eligible.iter().any(|eligible| eligible == voter) {
            return Err(ChainError::Unauthorized(format!(
                "{voter} is not an eligible voter on proposal {}",
                proposal.id
            )));
        }
        let role = self
            .storage
            .get_role(voter)?
            .ok_or_else(|| ChainError::NotFound(format!("role {voter}")))?;
        if !role.is_active_admin() {
            return Err(ChainError::Unauthorized(format!(
                "{voter} no longer holds the governance-admin capability"
            )));
        }
        if proposal.has_voted(voter) {
            return Err(ChainError::ConstraintViolation(format!(
                "{voter} already voted on proposal {}",
                proposal.id
            )));
        }
        proposal.votes.push(Ballot {
            voter: voter.to_string(),
            choice,
            label: label.to_string(),
        });
        self.storage.put_proposal(proposal)?;
        Ok(())
    }

    pub fn pending(&self) -> ChainResult<Vec<Proposal>> {
        Ok(self
            .storage
            .load_proposals()?
            .into_iter()
            .filter(|proposal| proposal.status == ProposalStatus::Pending)
            .collect())
    }

    /// The single pending proposal occupying an entity, if any.
    pub fn pending_for_target(
        &self,
        kind: EntityKind,
        target: &str,
    ) -> ChainResult<Option<Proposal>> {
        Ok(self
            .pending()?
            .into_iter()
            .find(|proposal| proposal.target_kind == kind && proposal.target_id == target))
    }
}
