use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status shared by roles and nodes. The label set is common to
/// both entity kinds; which statuses are reachable for a given kind is
/// decided by the transition table, not by the type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovernanceStatus {
    Registing,
    Available,
    Unavailable,
    Freezing,
    Frozen,
    Activating,
    Logouting,
    Forbidden,
    Binding,
    Binded,
    Updating,
}

impl GovernanceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            GovernanceStatus::Registing => "registing",
            GovernanceStatus::Available => "available",
            GovernanceStatus::Unavailable => "unavailable",
            GovernanceStatus::Freezing => "freezing",
            GovernanceStatus::Frozen => "frozen",
            GovernanceStatus::Activating => "activating",
            GovernanceStatus::Logouting => "logouting",
            GovernanceStatus::Forbidden => "forbidden",
            GovernanceStatus::Binding => "binding",
            GovernanceStatus::Binded => "binded",
            GovernanceStatus::Updating => "updating",
        }
    }

    /// An intermediate status marks a pending proposal occupying the entity;
    /// it is what enforces the one-pending-proposal-per-entity rule.
    pub fn is_intermediate(&self) -> bool {
        matches!(
            self,
            GovernanceStatus::Registing
                | GovernanceStatus::Freezing
                | GovernanceStatus::Activating
                | GovernanceStatus::Logouting
                | GovernanceStatus::Binding
                | GovernanceStatus::Updating
        )
    }
}

impl fmt::Display for GovernanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Role,
    Node,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Role => write!(f, "role"),
            EntityKind::Node => write!(f, "node"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Register,
    Freeze,
    Activate,
    Logout,
    Bind,
    Update,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActionKind::Register => "register",
            ActionKind::Freeze => "freeze",
            ActionKind::Activate => "activate",
            ActionKind::Logout => "logout",
            ActionKind::Bind => "bind",
            ActionKind::Update => "update",
        };
        write!(f, "{label}")
    }
}
