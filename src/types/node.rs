use serde::{Deserialize, Serialize};

use super::{Address, GovernanceStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Validating, consensus-participating node. Requires a unique peer id
    /// and a unique, monotonically assigned sequence slot.
    Vp,
    /// Non-validating audit node. Requires an externally issued permission
    /// token; may reuse a VP node's pid or sequence slot.
    Nvp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRecord {
    pub account: Address,
    pub kind: NodeKind,
    pub pid: Option<String>,
    pub vp_seq: Option<u64>,
    pub name: String,
    pub permission: Option<String>,
    pub status: GovernanceStatus,
    /// Genesis validator slots are immutable and can never be logged out.
    pub genesis: bool,
}

impl NodeRecord {
    pub fn genesis_validator(account: Address, name: String, pid: String, vp_seq: u64) -> Self {
        Self {
            account,
            kind: NodeKind::Vp,
            pid: Some(pid),
            vp_seq: Some(vp_seq),
            name,
            permission: None,
            status: GovernanceStatus::Available,
            genesis: true,
        }
    }

    /// Forbidden records release their name for reuse but keep occupying
    /// their pid/vp_seq history through the monotonicity rule.
    pub fn is_retired(&self) -> bool {
        self.status == GovernanceStatus::Forbidden
    }
}
