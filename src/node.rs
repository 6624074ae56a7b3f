use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::NodeConfig;
use crate::controller::GovernanceController;
use crate::errors::ChainResult;
use crate::storage::Storage;
use crate::types::{
    GovernanceAction, GovernanceStatus, NodeRecord, Proposal, ProposalStatus, RoleKind, RoleRecord,
    VoteChoice,
};

/// Control-plane service: owns storage and the governance controller and
/// seeds genesis state on first start.
pub struct Node {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    config: NodeConfig,
    controller: GovernanceController,
    /// Mutating calls run one at a time, mirroring the host ledger's serial
    /// transaction execution.
    write_gate: Mutex<()>,
}

#[derive(Clone)]
pub struct NodeHandle {
    inner: Arc<NodeInner>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceSummary {
    pub chain_id: String,
    pub roles: usize,
    pub nodes: usize,
    pub pending_proposals: usize,
}

impl Node {
    pub fn new(config: NodeConfig) -> ChainResult<Self> {
        config.genesis.validate()?;
        config.ensure_directories()?;
        let db_path = config.data_dir.join("db");
        let storage = Storage::open(&db_path)?;
        bootstrap_genesis(&storage, &config)?;
        let controller = GovernanceController::new(storage);
        let inner = Arc::new(NodeInner {
            config,
            controller,
            write_gate: Mutex::new(()),
        });
        Ok(Self { inner })
    }

    pub fn handle(&self) -> NodeHandle {
        NodeHandle {
            inner: self.inner.clone(),
        }
    }
}

impl NodeHandle {
    pub fn invoke_action(
        &self,
        caller: &str,
        action: GovernanceAction,
        reason: &str,
    ) -> ChainResult<Option<u64>> {
        let _gate = self.inner.write_gate.lock();
        self.inner.controller.invoke(caller, action, reason)
    }

    pub fn cast_vote(
        &self,
        voter: &str,
        proposal_id: u64,
        choice: VoteChoice,
        label: &str,
    ) -> ChainResult<ProposalStatus> {
        let _gate = self.inner.write_gate.lock();
        self.inner
            .controller
            .cast_vote(voter, proposal_id, choice, label)
    }

    pub fn get_role(&self, address: &str) -> ChainResult<RoleRecord> {
        self.inner.controller.role(address)
    }

    pub fn get_node(&self, account: &str) -> ChainResult<NodeRecord> {
        self.inner.controller.node(account)
    }

    pub fn get_proposal(&self, id: u64) -> ChainResult<Proposal> {
        self.inner.controller.proposal(id)
    }

    pub fn role_status(&self, address: &str) -> ChainResult<GovernanceStatus> {
        Ok(self.inner.controller.role(address)?.status)
    }

    pub fn node_status(&self, account: &str) -> ChainResult<GovernanceStatus> {
        Ok(self.inner.controller.node(account)?.status)
    }

    pub fn governance_summary(&self) -> ChainResult<GovernanceSummary> {
        Ok(GovernanceSummary {
            chain_id: self.inner.config.genesis.chain_id.clone(),
            roles: self.inner.controller.roles()?.len(),
            nodes: self.inner.controller.nodes()?.len(),
            pending_proposals: self.inner.controller.pending_proposals()?.len(),
        })
    }

    pub fn chain_id(&self) -> &str {
        &self.inner.config.genesis.chain_id
    }
}

/// Seed the super-admin, genesis admins, and the four immutable validator
/// slots on an empty database. Subsequent starts leave state untouched.
fn bootstrap_genesis(storage: &Storage, config: &NodeConfig) -> ChainResult<()> {
    if !storage.load_roles()?.is_empty() {
        return Ok(());
    }
    storage.put_role(&RoleRecord::genesis_admin(
        config.genesis.super_admin.clone(),
    ))?;
    for admin in &config.genesis.admins {
        storage.put_role(&RoleRecord::new(
            admin.clone(),
            RoleKind::GovernanceAdmin,
            GovernanceStatus::Available,
        ))?;
    }
    for (slot, validator) in config.genesis.validators.iter().enumerate() {
        storage.put_node(&NodeRecord::genesis_validator(
            validator.account.clone(),
            validator.name.clone(),
            validator.pid.clone(),
            slot as u64,
        ))?;
    }
    info!(
        chain_id = %config.genesis.chain_id,
        admins = config.genesis.admins.len() + 1,
        validators = config.genesis.validators.len(),
        "genesis governance state seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> NodeConfig {
        let mut config = NodeConfig::default();
        config.data_dir = dir.path().to_path_buf();
        config
    }

    #[test]
    fn first_start_seeds_genesis_state() {
        let dir = TempDir::new().unwrap();
        let node = Node::new(test_config(&dir)).unwrap();
        let handle = node.handle();
        let summary = handle.governance_summary().unwrap();
        assert_eq!(summary.roles, 1);
        assert_eq!(summary.nodes, 4);
        assert_eq!(summary.pending_proposals, 0);
        let genesis = handle.get_node("0x0000000000000000000000000000000000000010").unwrap();
        assert_eq!(genesis.kind, NodeKind::Vp);
        assert_eq!(genesis.vp_seq, Some(0));
        assert!(genesis.genesis);
    }

    #[test]
    fn restart_does_not_reseed() {
        let dir = TempDir::new().unwrap();
        {
            Node::new(test_config(&dir)).unwrap();
        }
        let node = Node::new(test_config(&dir)).unwrap();
        let summary = node.handle().governance_summary().unwrap();
        assert_eq!(summary.roles, 1);
        assert_eq!(summary.nodes, 4);
    }
}
