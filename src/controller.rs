use std::collections::HashSet;

use tracing::{info, warn};

use crate::errors::{ChainError, ChainResult};
use crate::proposals::ProposalManager;
use crate::storage::{GovernanceBatch, Storage};
use crate::transitions::{self, Outcome};
use crate::types::{
    ActionKind, Address, EntityKind, GovernanceAction, GovernanceStatus, NodeKind, NodeRecord,
    Proposal, ProposalStatus, RoleKind, RoleRecord, VoteChoice,
};
use crate::voting::{self, Tally};

/// Orchestrates governance actions: validates caller capability and
/// current-state legality, opens proposals, and applies decisive outcomes
/// together with their cross-entity cascades.
pub struct GovernanceController {
    storage: Storage,
    proposals: ProposalManager,
}

impl GovernanceController {
    pub fn new(storage: Storage) -> Self {
        let proposals = ProposalManager::new(storage.clone());
        Self { storage, proposals }
    }

    /// Submit a governance action. Returns the proposal id for gated
    /// actions, `None` when the action applied immediately.
    pub fn invoke(
        &self,
        caller: &str,
        action: GovernanceAction,
        reason: &str,
    ) -> ChainResult<Option<u64>> {
        self.authorize(caller, &action)?;
        let proposal_id = match action.clone() {
            GovernanceAction::RegisterRole {
                address,
                kind,
                bound_node,
            } => self.register_role(action, &address, kind, bound_node, reason)?,
            GovernanceAction::FreezeRole { address } => {
                self.freeze_role(caller, action, &address, reason)?
            }
            GovernanceAction::ActivateRole { address } => {
                self.activate_role(action, &address, reason)?
            }
            GovernanceAction::LogoutRole { address } => {
                self.logout_role(action, &address, reason)?
            }
            GovernanceAction::BindRole { address, node } => {
                self.bind_role(action, &address, &node, reason)?
            }
            GovernanceAction::RegisterNode {
                account,
                kind,
                pid,
                vp_seq,
                name,
                permission,
            } => self.register_node(action, &account, kind, pid, vp_seq, name, permission, reason)?,
            GovernanceAction::UpdateNode {
                account,
                name,
                permission,
            } => self.update_node(action, &account, name, permission, reason)?,
            GovernanceAction::LogoutNode { account } => {
                self.logout_node(action, &account, reason)?
            }
        };
        self.reevaluate_pending()?;
        Ok(proposal_id)
    }

    /// Cast a vote and, when the tally turns decisive, finalize the
    /// proposal. Returns the proposal status after this vote.
    pub fn cast_vote(
        &self,
        voter: &str,
        proposal_id: u64,
        choice: VoteChoice,
        label: &str,
    ) -> ChainResult<ProposalStatus> {
        let mut proposal = self.proposals.get(proposal_id)?;
        self.proposals
            .record_vote(&mut proposal, voter, choice, label)?;
        let status = match voting::decide(&proposal, &self.active_admins()?) {
            Tally::Pending => ProposalStatus::Pending,
            Tally::Approved => {
                self.finalize(&mut proposal, true)?;
                ProposalStatus::Approved
            }
            Tally::Rejected => {
                self.finalize(&mut proposal, false)?;
                ProposalStatus::Rejected
            }
            Tally::Void => {
                let mut batch = GovernanceBatch::default();
                self.stage_void(&mut batch, &mut proposal, true, None)?;
                self.storage.commit(batch)?;
                ProposalStatus::Void
            }
        };
        info!(
            proposal = proposal_id,
            voter = %voter,
            outcome = %status,
            "governance vote recorded"
        );
        if status == ProposalStatus::Approved {
            self.reevaluate_pending()?;
        }
        Ok(status)
    }

    pub fn role(&self, address: &str) -> ChainResult<RoleRecord> {
        self.storage
            .get_role(address)?
            .ok_or_else(|| ChainError::NotFound(format!("role {address}")))
    }

    pub fn node(&self, account: &str) -> ChainResult<NodeRecord> {
        self.storage
            .get_node(account)?
            .ok_or_else(|| ChainError::NotFound(format!("node {account}")))
    }

    pub fn proposal(&self, id: u64) -> ChainResult<Proposal> {
        self.proposals.get(id)
    }

    pub fn roles(&self) -> ChainResult<Vec<RoleRecord>> {
        self.storage.load_roles()
    }

    pub fn nodes(&self) -> ChainResult<Vec<NodeRecord>> {
        self.storage.load_nodes()
    }

    pub fn pending_proposals(&self) -> ChainResult<Vec<Proposal>> {
        self.proposals.pending()
    }

    fn authorize(&self, caller: &str, action: &GovernanceAction) -> ChainResult<()> {
        let role = self.storage.get_role(caller)?.ok_or_else(|| {
            ChainError::Unauthorized(format!("caller {caller} holds no governance role"))
        })?;
        if role.is_active_admin() {
            return Ok(());
        }
        if let GovernanceAction::UpdateNode { account, .. } = action {
            if role.is_active_audit() && role.bound_node.as_deref() == Some(account.as_str()) {
                let node = self.storage.get_node(account)?.ok_or_else(|| {
                    ChainError::NotFound(format!("node {account}"))
                })?;
                if node.kind == NodeKind::Nvp {
                    return Ok(());
                }
            }
        }
        Err(ChainError::Unauthorized(format!(
            "caller {caller} lacks an active governance-admin capability"
        )))
    }

    fn active_admins(&self) -> ChainResult<HashSet<Address>> {
        Ok(self
            .storage
            .load_roles()?
            .into_iter()
            .filter(|role| role.is_active_admin())
            .map(|role| role.address)
            .collect())
    }

    /// Error for an action the legality table has no entry for: an entity
    /// occupied by a pending proposal conflicts, anything else is illegal.
    fn illegal(
        &self,
        kind: EntityKind,
        target: &str,
        action: ActionKind,
        from: Option<GovernanceStatus>,
    ) -> ChainError {
        match from {
            Some(status) if status.is_intermediate() => ChainError::ConflictInFlight(format!(
                "{kind} {target} has a pending governance action ({status})"
            )),
            Some(status) => ChainError::IllegalTransition(format!(
                "{kind} {target} cannot {action} from {status}"
            )),
            None => ChainError::NotFound(format!("{kind} {target}")),
        }
    }

    fn gated(
        &self,
        kind: EntityKind,
        target: &str,
        action: ActionKind,
        from: Option<GovernanceStatus>,
    ) -> ChainResult<(GovernanceStatus, GovernanceStatus, GovernanceStatus)> {
        match transitions::resolve(kind, action, from) {
            Some(Outcome::Proposal {
                pending,
                approved,
                rejected,
            }) => Ok((pending, approved, rejected)),
            _ => Err(self.illegal(kind, target, action, from)),
        }
    }

    fn open_proposal(
        &self,
        batch: &mut GovernanceBatch,
        action: GovernanceAction,
        prior_status: Option<GovernanceStatus>,
        reason: &str,
    ) -> ChainResult<u64> {
        // The target has already left its stable status by the time the
        // proposal exists, so it never sits in its own voter set.
        let mut roles = self.storage.load_roles()?;
        if action.entity_kind() == EntityKind::Role {
            roles.retain(|role| role.address != action.target());
        }
        let eligible = voting::eligible_voters(&roles, &action);
        let proposal = self
            .proposals
            .open(batch, action, prior_status, eligible, reason)?;
        Ok(proposal.id)
    }

    fn register_role(
        &self,
        action: GovernanceAction,
        address: &str,
        kind: RoleKind,
        bound_node: Option<Address>,
        reason: &str,
    ) -> ChainResult<Option<u64>> {
        let existing = self.storage.get_role(address)?;
        let from = existing.as_ref().map(|role| role.status);
        let (pending, _, _) = match transitions::resolve(EntityKind::Role, ActionKind::Register, from)
        {
            Some(Outcome::Proposal {
                pending,
                approved,
                rejected,
            }) => (pending, approved, rejected),
            _ => {
                return Err(match from {
                    Some(status) if status.is_intermediate() => ChainError::ConflictInFlight(
                        format!("role {address} has a pending governance action ({status})"),
                    ),
                    Some(status) => ChainError::IllegalTransition(format!(
                        "role {address} cannot be re-registered from {status}"
                    )),
                    None => ChainError::Config("register rule missing".into()),
                });
            }
        };

        let mut batch = GovernanceBatch::default();
        match kind {
            RoleKind::GovernanceAdmin => {
                if bound_node.is_some() {
                    return Err(ChainError::ConstraintViolation(
                        "governance admins do not bind nodes".into(),
                    ));
                }
            }
            RoleKind::AuditAdmin => {
                let account = bound_node.as_deref().ok_or_else(|| {
                    ChainError::ConstraintViolation(
                        "audit admin registration requires a bound node".into(),
                    )
                })?;
                let mut node = self
                    .storage
                    .get_node(account)?
                    .ok_or_else(|| ChainError::NotFound(format!("node {account}")))?;
                if node.kind != NodeKind::Nvp {
                    return Err(ChainError::ConstraintViolation(format!(
                        "audit admins bind non-validating nodes, {account} is a validator"
                    )));
                }
                if node.status != GovernanceStatus::Available {
                    return Err(ChainError::IllegalTransition(format!(
                        "node {account} is {}, binding requires available",
                        node.status
                    )));
                }
                node.status = GovernanceStatus::Binding;
                batch.put_node(node);
            }
        }

        let mut role = existing.unwrap_or_else(|| RoleRecord::new(address.to_string(), kind, pending));
        role.kind = kind;
        role.bound_node = bound_node;
        role.status = pending;
        batch.put_role(role);
        let id = self.open_proposal(&mut batch, action, from, reason)?;
        self.storage.commit(batch)?;
        Ok(Some(id))
    }

    fn freeze_role(
        &self,
        caller: &str,
        action: GovernanceAction,
        address: &str,
        reason: &str,
    ) -> ChainResult<Option<u64>> {
        let mut role = self.role(address)?;
        if role.genesis {
            return Err(ChainError::SelfTargetForbidden(format!(
                "genesis admin {address} cannot be frozen"
            )));
        }
        if caller == address {
            return Err(ChainError::SelfTargetForbidden(
                "an admin cannot freeze itself".into(),
            ));
        }
        let (pending, _, _) =
            self.gated(EntityKind::Role, address, ActionKind::Freeze, Some(role.status))?;
        let mut batch = GovernanceBatch::default();
        role.status = pending;
        batch.put_role(role);
        let id = self.open_proposal(&mut batch, action, Some(GovernanceStatus::Available), reason)?;
        self.storage.commit(batch)?;
        Ok(Some(id))
    }

    fn activate_role(
        &self,
        action: GovernanceAction,
        address: &str,
        reason: &str,
    ) -> ChainResult<Option<u64>> {
        let mut role = self.role(address)?;
        if role.genesis {
            return Err(ChainError::SelfTargetForbidden(format!(
                "genesis admin {address} cannot be activated"
            )));
        }
        let from = role.status;
        let (pending, _, _) =
            self.gated(EntityKind::Role, address, ActionKind::Activate, Some(from))?;
        let mut batch = GovernanceBatch::default();
        role.status = pending;
        batch.put_role(role);
        let id = self.open_proposal(&mut batch, action, Some(from), reason)?;
        self.storage.commit(batch)?;
        Ok(Some(id))
    }

    fn logout_role(
        &self,
        action: GovernanceAction,
        address: &str,
        reason: &str,
    ) -> ChainResult<Option<u64>> {
        let mut role = self.role(address)?;
        if role.genesis {
            return Err(ChainError::SelfTargetForbidden(format!(
                "genesis admin {address} cannot be logged out"
            )));
        }
        let from = role.status;
        match transitions::resolve(EntityKind::Role, ActionKind::Logout, Some(from)) {
            Some(Outcome::Immediate { next }) => {
                // Audit admin leaving a bound state: no vote, but the bound
                // node and any in-flight bind proposal must settle with it.
                let mut batch = GovernanceBatch::default();
                if let Some(mut pending) =
                    self.proposals.pending_for_target(EntityKind::Role, address)?
                {
                    self.stage_void(&mut batch, &mut pending, false, None)?;
                }
                if from == GovernanceStatus::Binded {
                    let account = role.bound_node.clone().ok_or_else(|| {
                        ChainError::NotFound(format!("bound node of role {address}"))
                    })?;
                    let mut node = self
                        .storage
                        .get_node(&account)?
                        .ok_or_else(|| ChainError::NotFound(format!("node {account}")))?;
                    if node.status != GovernanceStatus::Forbidden {
                        node.status = GovernanceStatus::Frozen;
                        batch.put_node(node);
                    }
                }
                role.status = next;
                batch.put_role(role);
                self.storage.commit(batch)?;
                info!(role = %address, "audit admin logged out");
                Ok(None)
            }
            Some(Outcome::Proposal { pending, .. }) => {
                let mut batch = GovernanceBatch::default();
                // A logout may be issued over an outstanding freeze or
                // activate proposal; the older proposal voids silently.
                if from.is_intermediate() {
                    if let Some(mut outstanding) =
                        self.proposals.pending_for_target(EntityKind::Role, address)?
                    {
                        self.stage_void(&mut batch, &mut outstanding, false, None)?;
                    }
                }
                role.status = pending;
                batch.put_role(role);
                let id = self.open_proposal(&mut batch, action, Some(from), reason)?;
                self.storage.commit(batch)?;
                Ok(Some(id))
            }
            None => Err(self.illegal(EntityKind::Role, address, ActionKind::Logout, Some(from))),
        }
    }

    fn bind_role(
        &self,
        action: GovernanceAction,
        address: &str,
        candidate: &str,
        reason: &str,
    ) -> ChainResult<Option<u64>> {
        let mut role = self.role(address)?;
        if role.kind != RoleKind::AuditAdmin {
            return Err(ChainError::IllegalTransition(format!(
                "role {address} is not an audit admin"
            )));
        }
        let from = role.status;
        let (pending, _, _) = self.gated(EntityKind::Role, address, ActionKind::Bind, Some(from))?;
        if let Some(current) = role.bound_node.as_deref() {
            let bound = self
                .storage
                .get_node(current)?
                .ok_or_else(|| ChainError::NotFound(format!("node {current}")))?;
            if bound.status != GovernanceStatus::Forbidden {
                return Err(ChainError::IllegalTransition(format!(
                    "role {address} is still bound to {current} ({})",
                    bound.status
                )));
            }
        }
        let mut node = self
            .storage
            .get_node(candidate)?
            .ok_or_else(|| ChainError::NotFound(format!("node {candidate}")))?;
        if node.kind != NodeKind::Nvp {
            return Err(ChainError::ConstraintViolation(format!(
                "audit admins bind non-validating nodes, {candidate} is a validator"
            )));
        }
        if node.status != GovernanceStatus::Available {
            return Err(ChainError::IllegalTransition(format!(
                "node {candidate} is {}, binding requires available",
                node.status
            )));
        }
        let mut batch = GovernanceBatch::default();
        node.status = GovernanceStatus::Binding;
        batch.put_node(node);
        role.status = pending;
        batch.put_role(role);
        let id = self.open_proposal(&mut batch, action, Some(from), reason)?;
        self.storage.commit(batch)?;
        Ok(Some(id))
    }

    #[allow(clippy::too_many_arguments)]
    fn register_node(
        &self,
        action: GovernanceAction,
        account: &str,
        kind: NodeKind,
        pid: Option<String>,
        vp_seq: Option<u64>,
        name: String,
        permission: Option<String>,
        reason: &str,
    ) -> ChainResult<Option<u64>> {
        let existing = self.storage.get_node(account)?;
        let from = existing.as_ref().map(|node| node.status);
        let (pending, _, _) = match transitions::resolve(EntityKind::Node, ActionKind::Register, from)
        {
            Some(Outcome::Proposal { pending, .. }) => (pending, (), ()),
            _ => {
                return Err(match from {
                    Some(status) if status.is_intermediate() => ChainError::ConflictInFlight(
                        format!("node {account} has a pending governance action ({status})"),
                    ),
                    Some(status) => ChainError::IllegalTransition(format!(
                        "node {account} cannot be re-registered from {status}"
                    )),
                    None => ChainError::Config("register rule missing".into()),
                });
            }
        };
        self.ensure_scope_free(kind, account)?;

        let nodes = self.storage.load_nodes()?;
        let peers = || {
            nodes
                .iter()
                .filter(|node| node.account != account && !node.is_retired())
        };
        match kind {
            NodeKind::Vp => {
                let pid = pid.as_deref().ok_or_else(|| {
                    ChainError::ConstraintViolation(
                        "validator registration requires a peer id".into(),
                    )
                })?;
                if pid.is_empty() {
                    return Err(ChainError::ConstraintViolation(
                        "validator peer id must not be empty".into(),
                    ));
                }
                let vp_seq = vp_seq.ok_or_else(|| {
                    ChainError::ConstraintViolation(
                        "validator registration requires a sequence slot".into(),
                    )
                })?;
                if peers().any(|node| node.kind == NodeKind::Vp && node.pid.as_deref() == Some(pid))
                {
                    return Err(ChainError::ConstraintViolation(format!(
                        "peer id {pid} is already assigned"
                    )));
                }
                if peers()
                    .any(|node| node.kind == NodeKind::Vp && node.vp_seq == Some(vp_seq))
                {
                    return Err(ChainError::ConstraintViolation(format!(
                        "sequence slot {vp_seq} is already assigned"
                    )));
                }
                let max_seq = nodes
                    .iter()
                    .filter(|node| node.kind == NodeKind::Vp && node.account != account)
                    .filter_map(|node| node.vp_seq)
                    .max();
                if let Some(max_seq) = max_seq {
                    if vp_seq < max_seq {
                        return Err(ChainError::ConstraintViolation(format!(
                            "sequence slot {vp_seq} regresses below the current maximum {max_seq}"
                        )));
                    }
                }
                if peers().any(|node| node.kind == NodeKind::Vp && node.name == name) {
                    return Err(ChainError::ConstraintViolation(format!(
                        "validator name {name} is already taken"
                    )));
                }
            }
            NodeKind::Nvp => {
                match permission.as_deref() {
                    Some(token) if !token.is_empty() => {}
                    _ => {
                        return Err(ChainError::ConstraintViolation(
                            "audit node registration requires a permission token".into(),
                        ));
                    }
                }
                if peers().any(|node| node.kind == NodeKind::Nvp && node.name == name) {
                    return Err(ChainError::ConstraintViolation(format!(
                        "audit node name {name} is already taken"
                    )));
                }
            }
        }

        let mut batch = GovernanceBatch::default();
        let node = NodeRecord {
            account: account.to_string(),
            kind,
            pid,
            vp_seq,
            name,
            permission,
            status: pending,
            genesis: false,
        };
        batch.put_node(node);
        let id = self.open_proposal(&mut batch, action, from, reason)?;
        self.storage.commit(batch)?;
        Ok(Some(id))
    }

    fn update_node(
        &self,
        action: GovernanceAction,
        account: &str,
        name: Option<String>,
        permission: Option<String>,
        reason: &str,
    ) -> ChainResult<Option<u64>> {
        let mut node = self.node(account)?;
        let from = node.status;
        let (pending, _, _) =
            self.gated(EntityKind::Node, account, ActionKind::Update, Some(from))?;
        self.ensure_scope_free(node.kind, account)?;
        if let Some(name) = name.as_deref() {
            let clash = self.storage.load_nodes()?.into_iter().any(|peer| {
                peer.account != account
                    && peer.kind == node.kind
                    && !peer.is_retired()
                    && peer.name == name
            });
            if clash {
                return Err(ChainError::ConstraintViolation(format!(
                    "node name {name} is already taken"
                )));
            }
        }
        if let Some(token) = permission.as_deref() {
            if node.kind == NodeKind::Vp {
                return Err(ChainError::ConstraintViolation(
                    "validators carry no permission token".into(),
                ));
            }
            if token.is_empty() {
                return Err(ChainError::ConstraintViolation(
                    "permission token must not be empty".into(),
                ));
            }
        }
        let mut batch = GovernanceBatch::default();
        node.status = pending;
        batch.put_node(node);
        let id = self.open_proposal(&mut batch, action, Some(from), reason)?;
        self.storage.commit(batch)?;
        Ok(Some(id))
    }

    fn logout_node(
        &self,
        action: GovernanceAction,
        account: &str,
        reason: &str,
    ) -> ChainResult<Option<u64>> {
        let mut node = self.node(account)?;
        if node.genesis {
            return Err(ChainError::SelfTargetForbidden(format!(
                "genesis validator slot {account} is immutable"
            )));
        }
        let from = node.status;
        let (pending, _, _) =
            self.gated(EntityKind::Node, account, ActionKind::Logout, Some(from))?;
        self.ensure_scope_free(node.kind, account)?;
        let mut batch = GovernanceBatch::default();
        match from {
            GovernanceStatus::Updating => {
                if let Some(mut outstanding) =
                    self.proposals.pending_for_target(EntityKind::Node, account)?
                {
                    self.stage_void(&mut batch, &mut outstanding, false, None)?;
                }
            }
            GovernanceStatus::Binding => {
                // The node is a bind candidate; the in-flight bind (or audit
                // registration) proposal targets the role and voids with it.
                let bind = self.proposals.pending()?.into_iter().find(|proposal| {
                    proposal.target_kind == EntityKind::Role
                        && proposal.action.bind_candidate() == Some(account)
                });
                if let Some(mut bind) = bind {
                    self.stage_void(&mut batch, &mut bind, true, Some(account))?;
                }
            }
            _ => {}
        }
        node.status = pending;
        batch.put_node(node);
        let id = self.open_proposal(&mut batch, action, Some(from), reason)?;
        self.storage.commit(batch)?;
        Ok(Some(id))
    }

    /// Scope-wide single-flight: one pending action per node kind at a time.
    fn ensure_scope_free(&self, kind: NodeKind, target: &str) -> ChainResult<()> {
        for proposal in self.proposals.pending()? {
            if proposal.target_kind != EntityKind::Node || proposal.target_id == target {
                continue;
            }
            let scope = match &proposal.action {
                GovernanceAction::RegisterNode { kind, .. } => Some(*kind),
                _ => self
                    .storage
                    .get_node(&proposal.target_id)?
                    .map(|node| node.kind),
            };
            if scope == Some(kind) {
                return Err(ChainError::ConflictInFlight(format!(
                    "node {} has a governance action in flight in the same scope",
                    proposal.target_id
                )));
            }
        }
        Ok(())
    }

    /// Apply a decisive tally: move the target to its approve/reject status
    /// and run the cross-entity cascades in the same commit.
    fn finalize(&self, proposal: &mut Proposal, approved: bool) -> ChainResult<()> {
        let (_, approved_status, rejected_status) = self.gated(
            proposal.target_kind,
            &proposal.target_id,
            proposal.action.action_kind(),
            proposal.prior_status,
        )?;
        let next = if approved {
            approved_status
        } else {
            rejected_status
        };
        let mut batch = GovernanceBatch::default();
        proposal.status = if approved {
            ProposalStatus::Approved
        } else {
            ProposalStatus::Rejected
        };
        batch.put_proposal(proposal.clone());
        match proposal.target_kind {
            EntityKind::Role => self.finalize_role(&mut batch, proposal, approved, next)?,
            EntityKind::Node => self.finalize_node(&mut batch, proposal, approved, next)?,
        }
        self.storage.commit(batch)?;
        info!(
            proposal = proposal.id,
            target = %proposal.target_id,
            action = %proposal.action.action_kind(),
            outcome = %proposal.status,
            "governance proposal finalized"
        );
        Ok(())
    }

    fn finalize_role(
        &self,
        batch: &mut GovernanceBatch,
        proposal: &Proposal,
        approved: bool,
        next: GovernanceStatus,
    ) -> ChainResult<()> {
        let mut role = self.role(&proposal.target_id)?;
        role.status = next;
        match (&proposal.action, approved) {
            (
                GovernanceAction::RegisterRole {
                    kind: RoleKind::AuditAdmin,
                    bound_node: Some(account),
                    ..
                },
                true,
            )
            | (GovernanceAction::BindRole { node: account, .. }, true) => {
                // A fresh or renewed binding settles both sides at once.
                let mut node = self
                    .storage
                    .get_node(account)?
                    .ok_or_else(|| ChainError::NotFound(format!("node {account}")))?;
                node.status = GovernanceStatus::Binded;
                batch.put_node(node);
                role.bound_node = Some(account.clone());
                role.status = GovernanceStatus::Binded;
            }
            (
                GovernanceAction::RegisterRole {
                    kind: RoleKind::AuditAdmin,
                    bound_node: Some(account),
                    ..
                },
                false,
            )
            | (GovernanceAction::BindRole { node: account, .. }, false) => {
                self.stage_release_candidate(batch, account)?;
            }
            (GovernanceAction::LogoutRole { .. }, true) => {
                if role.kind == RoleKind::AuditAdmin {
                    if let Some(account) = role.bound_node.clone() {
                        let mut node = self
                            .storage
                            .get_node(&account)?
                            .ok_or_else(|| ChainError::NotFound(format!("node {account}")))?;
                        if node.status != GovernanceStatus::Forbidden {
                            node.status = GovernanceStatus::Frozen;
                            batch.put_node(node);
                        }
                    }
                }
            }
            _ => {}
        }
        batch.put_role(role);
        Ok(())
    }

    fn finalize_node(
        &self,
        batch: &mut GovernanceBatch,
        proposal: &Proposal,
        approved: bool,
        next: GovernanceStatus,
    ) -> ChainResult<()> {
        let mut node = self.node(&proposal.target_id)?;
        node.status = next;
        match (&proposal.action, approved) {
            (
                GovernanceAction::UpdateNode {
                    name, permission, ..
                },
                true,
            ) => {
                if let Some(name) = name {
                    node.name = name.clone();
                }
                if let Some(permission) = permission {
                    node.permission = Some(permission.clone());
                }
            }
            (GovernanceAction::LogoutNode { .. }, true) => {
                // The bound audit role freezes with its node; no second vote.
                for mut role in self.storage.load_roles()? {
                    if role.bound_node.as_deref() == Some(proposal.target_id.as_str())
                        && role.status != GovernanceStatus::Forbidden
                    {
                        role.status = GovernanceStatus::Frozen;
                        batch.put_role(role);
                    }
                }
            }
            _ => {}
        }
        batch.put_node(node);
        Ok(())
    }

    /// Mark a proposal void. `restore_target` returns the target to the
    /// stable status underneath its pending one; it is off when the caller
    /// is about to move the target itself. A bind candidate parked in
    /// `Binding` is released unless it is the entity being acted on.
    fn stage_void(
        &self,
        batch: &mut GovernanceBatch,
        proposal: &mut Proposal,
        restore_target: bool,
        skip_candidate: Option<&str>,
    ) -> ChainResult<()> {
        proposal.status = ProposalStatus::Void;
        batch.put_proposal(proposal.clone());
        if restore_target {
            match proposal.target_kind {
                EntityKind::Role => {
                    if let Some(mut role) = self.storage.get_role(&proposal.target_id)? {
                        if role.status.is_intermediate() {
                            role.status = transitions::void_fallback(proposal.prior_status);
                            batch.put_role(role);
                        }
                    }
                }
                EntityKind::Node => {
                    if let Some(mut node) = self.storage.get_node(&proposal.target_id)? {
                        if node.status.is_intermediate() {
                            node.status = transitions::void_fallback(proposal.prior_status);
                            batch.put_node(node);
                        }
                    }
                }
            }
        }
        if let Some(candidate) = proposal.action.bind_candidate() {
            if skip_candidate != Some(candidate) {
                self.stage_release_candidate(batch, candidate)?;
            }
        }
        warn!(
            proposal = proposal.id,
            target = %proposal.target_id,
            "governance proposal voided"
        );
        Ok(())
    }

    fn stage_release_candidate(&self, batch: &mut GovernanceBatch, account: &str) -> ChainResult<()> {
        if let Some(mut node) = self.storage.get_node(account)? {
            if node.status == GovernanceStatus::Binding {
                node.status = GovernanceStatus::Available;
                batch.put_node(node);
            }
        }
        Ok(())
    }

    /// Void every pending proposal whose remaining castable votes can no
    /// longer reach a decisive tally.
    fn reevaluate_pending(&self) -> ChainResult<()> {
        let active = self.active_admins()?;
        for mut proposal in self.proposals.pending()? {
            if voting::decide(&proposal, &active) == Tally::Void {
                let mut batch = GovernanceBatch::default();
                self.stage_void(&mut batch, &mut proposal, true, None)?;
                self.storage.commit(batch)?;
            }
        }
        Ok(())
    }
}
