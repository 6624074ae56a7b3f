use serde::{Deserialize, Serialize};

use super::{ActionKind, Address, EntityKind, GovernanceStatus, NodeKind, RoleKind};

/// A caller-submitted governance action. Carries everything needed to replay
/// the transition when the vote becomes decisive.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceAction {
    RegisterRole {
        address: Address,
        kind: RoleKind,
        bound_node: Option<Address>,
    },
    FreezeRole {
        address: Address,
    },
    ActivateRole {
        address: Address,
    },
    LogoutRole {
        address: Address,
    },
    BindRole {
        address: Address,
        node: Address,
    },
    RegisterNode {
        account: Address,
        kind: NodeKind,
        pid: Option<String>,
        vp_seq: Option<u64>,
        name: String,
        permission: Option<String>,
    },
    UpdateNode {
        account: Address,
        name: Option<String>,
        permission: Option<String>,
    },
    LogoutNode {
        account: Address,
    },
}

impl GovernanceAction {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            GovernanceAction::RegisterRole { .. }
            | GovernanceAction::FreezeRole { .. }
            | GovernanceAction::ActivateRole { .. }
            | GovernanceAction::LogoutRole { .. }
            | GovernanceAction::BindRole { .. } => EntityKind::Role,
            GovernanceAction::RegisterNode { .. }
            | GovernanceAction::UpdateNode { .. }
            | GovernanceAction::LogoutNode { .. } => EntityKind::Node,
        }
    }

    pub fn action_kind(&self) -> ActionKind {
        match self {
            GovernanceAction::RegisterRole { .. } | GovernanceAction::RegisterNode { .. } => {
                ActionKind::Register
            }
            GovernanceAction::FreezeRole { .. } => ActionKind::Freeze,
            GovernanceAction::ActivateRole { .. } => ActionKind::Activate,
            GovernanceAction::LogoutRole { .. } | GovernanceAction::LogoutNode { .. } => {
                ActionKind::Logout
            }
            GovernanceAction::BindRole { .. } => ActionKind::Bind,
            GovernanceAction::UpdateNode { .. } => ActionKind::Update,
        }
    }

    /// Identity key of the entity the action targets.
    pub fn target(&self) -> &str {
        match self {
            GovernanceAction::RegisterRole { address, .. }
            | GovernanceAction::FreezeRole { address }
            | GovernanceAction::ActivateRole { address }
            | GovernanceAction::LogoutRole { address }
            | GovernanceAction::BindRole { address, .. } => address,
            GovernanceAction::RegisterNode { account, .. }
            | GovernanceAction::UpdateNode { account, .. }
            | GovernanceAction::LogoutNode { account } => account,
        }
    }

    /// Node account a role action wants to bind, if any.
    pub fn bind_candidate(&self) -> Option<&str> {
        match self {
            GovernanceAction::RegisterRole {
                bound_node: Some(node),
                ..
            } => Some(node),
            GovernanceAction::BindRole { node, .. } => Some(node),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Approve,
    Reject,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ballot {
    pub voter: Address,
    pub choice: VoteChoice,
    pub label: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
    Void,
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Void => "void",
        };
        write!(f, "{label}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub target_kind: EntityKind,
    pub target_id: Address,
    pub action: GovernanceAction,
    pub reason: String,
    /// Status of the target when the proposal opened; `None` when the target
    /// did not exist yet. Reject and void outcomes resolve against this.
    pub prior_status: Option<GovernanceStatus>,
    /// Voter set captured at open time. The decisiveness threshold never
    /// changes afterwards, even if admins leave the active set.
    pub eligible: Vec<Address>,
    pub votes: Vec<Ballot>,
    pub status: ProposalStatus,
}

impl Proposal {
    /// Strict majority of the voter set captured at open time.
    pub fn threshold(&self) -> usize {
        self.eligible.len() / 2 + 1
    }

    pub fn has_voted(&self, voter: &str) -> bool {
        self.votes.iter().any(|ballot| ballot.voter == voter)
    }

    pub fn approvals(&self) -> usize {
        self.votes
            .iter()
            .filter(|ballot| ballot.choice == VoteChoice::Approve)
            .count()
    }

    pub fn rejections(&self) -> usize {
        self.votes
            .iter()
            .filter(|ballot| ballot.choice == VoteChoice::Reject)
            .count()
    }
}
