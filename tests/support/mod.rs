#![allow(dead_code)]

use govchain::config::{GenesisValidator, NodeConfig};
use govchain::node::{Node, NodeHandle};
use govchain::types::{
    GovernanceAction, NodeKind, ProposalStatus, RoleKind, VoteChoice,
};
use tempfile::TempDir;

pub const SUPER_ADMIN: &str = "0xsuper";
pub const ADMIN_A: &str = "0xalice";

/// Running control plane backed by a temp directory. Genesis seeds the
/// super-admin, one further governance admin, and four validator slots, so
/// every proposal needs two approvals until the admin set changes.
pub struct TestNode {
    pub handle: NodeHandle,
    _dir: TempDir,
}

pub fn start_node() -> TestNode {
    let dir = TempDir::new().expect("tempdir");
    let mut config = NodeConfig::default();
    config.data_dir = dir.path().to_path_buf();
    config.genesis.super_admin = SUPER_ADMIN.to_string();
    config.genesis.admins = vec![ADMIN_A.to_string()];
    config.genesis.validators = (0..4)
        .map(|slot| GenesisValidator {
            account: format!("0xval{slot}"),
            name: format!("genesis-{slot}"),
            pid: format!("peer-{slot}"),
        })
        .collect();
    let node = Node::new(config).expect("start node");
    TestNode {
        handle: node.handle(),
        _dir: dir,
    }
}

pub fn register_admin_action(address: &str) -> GovernanceAction {
    GovernanceAction::RegisterRole {
        address: address.to_string(),
        kind: RoleKind::GovernanceAdmin,
        bound_node: None,
    }
}

pub fn register_audit_action(address: &str, node: &str) -> GovernanceAction {
    GovernanceAction::RegisterRole {
        address: address.to_string(),
        kind: RoleKind::AuditAdmin,
        bound_node: Some(node.to_string()),
    }
}

pub fn register_nvp_action(account: &str, name: &str) -> GovernanceAction {
    GovernanceAction::RegisterNode {
        account: account.to_string(),
        kind: NodeKind::Nvp,
        pid: None,
        vp_seq: None,
        name: name.to_string(),
        permission: Some("audit-cert".to_string()),
    }
}

pub fn register_vp_action(account: &str, name: &str, pid: &str, vp_seq: u64) -> GovernanceAction {
    GovernanceAction::RegisterNode {
        account: account.to_string(),
        kind: NodeKind::Vp,
        pid: Some(pid.to_string()),
        vp_seq: Some(vp_seq),
        name: name.to_string(),
        permission: None,
    }
}

/// Drive a proposal to a decisive tally with the given admins' votes.
pub fn vote_through(
    handle: &NodeHandle,
    id: u64,
    voters: &[&str],
    choice: VoteChoice,
) -> ProposalStatus {
    let mut status = ProposalStatus::Pending;
    for voter in voters {
        status = handle
            .cast_vote(voter, id, choice, "scenario")
            .expect("cast vote");
        if status != ProposalStatus::Pending {
            break;
        }
    }
    status
}

pub fn approve(handle: &NodeHandle, id: u64) -> ProposalStatus {
    vote_through(handle, id, &[SUPER_ADMIN, ADMIN_A], VoteChoice::Approve)
}

pub fn reject(handle: &NodeHandle, id: u64) -> ProposalStatus {
    vote_through(handle, id, &[SUPER_ADMIN, ADMIN_A], VoteChoice::Reject)
}

/// Register an entity and vote its proposal through to approval.
pub fn register_approved(handle: &NodeHandle, action: GovernanceAction) {
    let id = handle
        .invoke_action(SUPER_ADMIN, action, "fixture")
        .expect("invoke")
        .expect("proposal id");
    assert_eq!(approve(handle, id), ProposalStatus::Approved);
}
