//! Declarative legality table for governance transitions.
//!
//! Every `(entity kind, action, current status)` combination is either listed
//! here with its pending/approved/rejected statuses or it is illegal. The
//! controller consults the table before opening a proposal and again when a
//! tally becomes decisive, so approve/reject outcomes are a pure function of
//! the tuple and cannot drift between validation and finalization.

use crate::types::{ActionKind, EntityKind, GovernanceStatus};

use GovernanceStatus::*;

/// Resolution of a legal transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The action is proposal-gated: the entity parks on `pending` until the
    /// vote is decisive, then moves to `approved` or `rejected`.
    Proposal {
        pending: GovernanceStatus,
        approved: GovernanceStatus,
        rejected: GovernanceStatus,
    },
    /// The action applies without a vote.
    Immediate { next: GovernanceStatus },
}

struct Rule {
    entity: EntityKind,
    action: ActionKind,
    /// `None` matches an entity that does not exist yet.
    from: Option<GovernanceStatus>,
    outcome: Outcome,
}

const fn gated(
    pending: GovernanceStatus,
    approved: GovernanceStatus,
    rejected: GovernanceStatus,
) -> Outcome {
    Outcome::Proposal {
        pending,
        approved,
        rejected,
    }
}

/// Role and node legality tables. Registration is permitted from absent,
/// `Unavailable`, and `Frozen` — never from `Forbidden`, which is terminal
/// for re-registration. The role logout row for `Freezing` lands on
/// `Forbidden` on reject as well as on pass; that asymmetry is deliberate
/// and must not be "fixed" into a revert.
const RULES: &[Rule] = &[
    // Roles.
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Register,
        from: None,
        outcome: gated(Registing, Available, Unavailable),
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Register,
        from: Some(Unavailable),
        outcome: gated(Registing, Available, Unavailable),
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Register,
        from: Some(Frozen),
        outcome: gated(Registing, Available, Frozen),
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Freeze,
        from: Some(Available),
        outcome: gated(Freezing, Frozen, Available),
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Activate,
        from: Some(Frozen),
        outcome: gated(Activating, Available, Frozen),
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Logout,
        from: Some(Available),
        outcome: gated(Logouting, Forbidden, Available),
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Logout,
        from: Some(Freezing),
        outcome: gated(Logouting, Forbidden, Forbidden),
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Logout,
        from: Some(Frozen),
        outcome: gated(Logouting, Forbidden, Frozen),
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Logout,
        from: Some(Activating),
        outcome: gated(Logouting, Forbidden, Frozen),
    },
    // Audit admins leave their bound states without a vote.
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Logout,
        from: Some(Binding),
        outcome: Outcome::Immediate { next: Forbidden },
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Logout,
        from: Some(Binded),
        outcome: Outcome::Immediate { next: Forbidden },
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Bind,
        from: Some(Binded),
        outcome: gated(Binding, Binded, Binded),
    },
    Rule {
        entity: EntityKind::Role,
        action: ActionKind::Bind,
        from: Some(Frozen),
        outcome: gated(Binding, Binded, Frozen),
    },
    // Nodes.
    Rule {
        entity: EntityKind::Node,
        action: ActionKind::Register,
        from: None,
        outcome: gated(Registing, Available, Unavailable),
    },
    Rule {
        entity: EntityKind::Node,
        action: ActionKind::Register,
        from: Some(Unavailable),
        outcome: gated(Registing, Available, Unavailable),
    },
    Rule {
        entity: EntityKind::Node,
        action: ActionKind::Register,
        from: Some(Frozen),
        outcome: gated(Registing, Available, Frozen),
    },
    Rule {
        entity: EntityKind::Node,
        action: ActionKind::Update,
        from: Some(Available),
        outcome: gated(Updating, Available, Available),
    },
    Rule {
        entity: EntityKind::Node,
        action: ActionKind::Update,
        from: Some(Binded),
        outcome: gated(Updating, Binded, Binded),
    },
    Rule {
        entity: EntityKind::Node,
        action: ActionKind::Logout,
        from: Some(Available),
        outcome: gated(Logouting, Forbidden, Available),
    },
    Rule {
        entity: EntityKind::Node,
        action: ActionKind::Logout,
        from: Some(Binding),
        outcome: gated(Logouting, Forbidden, Available),
    },
    Rule {
        entity: EntityKind::Node,
        action: ActionKind::Logout,
        from: Some(Binded),
        outcome: gated(Logouting, Forbidden, Available),
    },
    Rule {
        entity: EntityKind::Node,
        action: ActionKind::Logout,
        from: Some(Updating),
        outcome: gated(Logouting, Forbidden, Available),
    },
    Rule {
        entity: EntityKind::Node,
        action: ActionKind::Logout,
        from: Some(Frozen),
        outcome: gated(Logouting, Forbidden, Frozen),
    },
];

/// Look up the outcome for an action against the current status. `None`
/// means the legality table has no entry, i.e. the action must fail.
pub fn resolve(
    entity: EntityKind,
    action: ActionKind,
    from: Option<GovernanceStatus>,
) -> Option<Outcome> {
    RULES
        .iter()
        .find(|rule| rule.entity == entity && rule.action == action && rule.from == from)
        .map(|rule| rule.outcome)
}

/// Stable status an entity returns to when a proposal opened from `from`
/// is voided. Intermediate priors only occur for logouts issued over an
/// outstanding proposal; everything else voids back to where it was.
pub fn void_fallback(from: Option<GovernanceStatus>) -> GovernanceStatus {
    match from {
        None | Some(Registing) => Unavailable,
        Some(Freezing) | Some(Binding) | Some(Updating) => Available,
        Some(Activating) | Some(Logouting) => Frozen,
        Some(status) => status,
    }
}
