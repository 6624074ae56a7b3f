//! Voter eligibility and tally decisiveness.
//!
//! Eligibility is captured once, when a proposal opens; decisiveness is a
//! strict majority of that captured set. A proposal whose still-castable
//! votes can no longer reach either threshold is voided rather than left
//! pending forever.

use std::collections::HashSet;

use crate::types::{ActionKind, Address, GovernanceAction, Proposal, RoleRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tally {
    Pending,
    Approved,
    Rejected,
    Void,
}

/// Governance admins currently holding the active capability. Audit admins
/// are never eligible. A freeze target may not vote on its own removal, so
/// it is excluded from the snapshot; every other self-vote is allowed.
pub fn eligible_voters(roles: &[RoleRecord], action: &GovernanceAction) -> Vec<Address> {
    let excluded = match action.action_kind() {
        ActionKind::Freeze => Some(action.target()),
        _ => None,
    };
    let mut voters: Vec<Address> = roles
        .iter()
        .filter(|role| role.is_active_admin())
        .filter(|role| excluded != Some(role.address.as_str()))
        .map(|role| role.address.clone())
        .collect();
    voters.sort();
    voters
}

/// Evaluate the proposal against the voter set captured at open time.
/// `still_active` is the set of addresses that currently hold the admin
/// capability; captured voters outside it can no longer cast their vote.
pub fn decide(proposal: &Proposal, still_active: &HashSet<Address>) -> Tally {
    let threshold = proposal.threshold();
    let approvals = proposal.approvals();
    let rejections = proposal.rejections();
    if approvals >= threshold {
        return Tally::Approved;
    }
    if rejections >= threshold {
        return Tally::Rejected;
    }
    let castable = proposal
        .eligible
        .iter()
        .filter(|voter| !proposal.has_voted(voter))
        .filter(|voter| still_active.contains(*voter))
        .count();
    if approvals + castable < threshold && rejections + castable < threshold {
        return Tally::Void;
    }
    Tally::Pending
}
