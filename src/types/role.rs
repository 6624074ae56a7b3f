use serde::{Deserialize, Serialize};

use super::{Address, GovernanceStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    GovernanceAdmin,
    AuditAdmin,
}

/// Administrative role record. Roles are never deleted; a logged-out role
/// stays queryable with status `Forbidden`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleRecord {
    pub address: Address,
    pub kind: RoleKind,
    /// Weak reference to a node account, present only for audit admins. The
    /// node is resolved through the store; the role does not own it.
    pub bound_node: Option<Address>,
    pub status: GovernanceStatus,
    /// Genesis roles are seeded from configuration and exempt from
    /// freeze/activate/logout.
    pub genesis: bool,
}

impl RoleRecord {
    pub fn new(address: Address, kind: RoleKind, status: GovernanceStatus) -> Self {
        Self {
            address,
            kind,
            bound_node: None,
            status,
            genesis: false,
        }
    }

    pub fn genesis_admin(address: Address) -> Self {
        Self {
            address,
            kind: RoleKind::GovernanceAdmin,
            bound_node: None,
            status: GovernanceStatus::Available,
            genesis: true,
        }
    }

    /// Whether this role currently carries the governance-admin capability.
    pub fn is_active_admin(&self) -> bool {
        self.kind == RoleKind::GovernanceAdmin && self.status == GovernanceStatus::Available
    }

    /// Active statuses for an audit admin; `Binded` is its stable bound state.
    pub fn is_active_audit(&self) -> bool {
        self.kind == RoleKind::AuditAdmin
            && matches!(
                self.status,
                GovernanceStatus::Available | GovernanceStatus::Binded
            )
    }
}
