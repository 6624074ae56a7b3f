use govchain::errors::ChainError;
use govchain::types::{GovernanceAction, GovernanceStatus, NodeKind, ProposalStatus};

#[path = "support/mod.rs"]
mod support;

use support::{
    approve, register_approved, register_audit_action, register_nvp_action, register_vp_action,
    reject, start_node, SUPER_ADMIN,
};

fn logout_node(account: &str) -> GovernanceAction {
    GovernanceAction::LogoutNode {
        account: account.to_string(),
    }
}

fn update_node(account: &str, name: Option<&str>, permission: Option<&str>) -> GovernanceAction {
    GovernanceAction::UpdateNode {
        account: account.to_string(),
        name: name.map(str::to_string),
        permission: permission.map(str::to_string),
    }
}

#[test]
fn validator_registration_enforces_uniqueness_and_monotonic_slots() {
    let node = start_node();
    let handle = &node.handle;

    // Genesis occupies slots 0..=3; an occupied slot fails before any
    // proposal opens.
    let err = handle
        .invoke_action(
            SUPER_ADMIN,
            register_vp_action("0xval4", "val-four", "peer-4", 2),
            "expansion",
        )
        .unwrap_err();
    assert!(matches!(err, ChainError::ConstraintViolation(_)));
    assert_eq!(handle.governance_summary().unwrap().pending_proposals, 0);

    let err = handle
        .invoke_action(
            SUPER_ADMIN,
            register_vp_action("0xval4", "val-four", "peer-0", 4),
            "expansion",
        )
        .unwrap_err();
    assert!(matches!(err, ChainError::ConstraintViolation(_)));

    let err = handle
        .invoke_action(
            SUPER_ADMIN,
            register_vp_action("0xval4", "genesis-0", "peer-4", 4),
            "expansion",
        )
        .unwrap_err();
    assert!(matches!(err, ChainError::ConstraintViolation(_)));

    // A validator needs a peer id.
    let mut incomplete = register_vp_action("0xval4", "val-four", "peer-4", 4);
    if let GovernanceAction::RegisterNode { pid, .. } = &mut incomplete {
        *pid = None;
    }
    let err = handle
        .invoke_action(SUPER_ADMIN, incomplete, "expansion")
        .unwrap_err();
    assert!(matches!(err, ChainError::ConstraintViolation(_)));

    register_approved(handle, register_vp_action("0xval4", "val-four", "peer-4", 10));
    assert_eq!(
        handle.node_status("0xval4").unwrap(),
        GovernanceStatus::Available
    );

    // Slot 5 is free but below the maximum assigned slot: regression.
    let err = handle
        .invoke_action(
            SUPER_ADMIN,
            register_vp_action("0xval5", "val-five", "peer-5", 5),
            "expansion",
        )
        .unwrap_err();
    assert!(matches!(err, ChainError::ConstraintViolation(_)));
    assert_eq!(handle.governance_summary().unwrap().pending_proposals, 0);

    register_approved(handle, register_vp_action("0xval5", "val-five", "peer-5", 11));
    assert_eq!(
        handle.node_status("0xval5").unwrap(),
        GovernanceStatus::Available
    );
}

#[test]
fn audit_node_registration_may_reuse_validator_identifiers() {
    let node = start_node();
    let handle = &node.handle;

    let mut missing_permission = register_nvp_action("0xnvp1", "audit-one");
    if let GovernanceAction::RegisterNode { permission, .. } = &mut missing_permission {
        *permission = Some(String::new());
    }
    let err = handle
        .invoke_action(SUPER_ADMIN, missing_permission, "audit")
        .unwrap_err();
    assert!(matches!(err, ChainError::ConstraintViolation(_)));

    // An audit node may collide with a validator's pid and slot, and with a
    // validator's name; its own scope still has to stay unique.
    let mut reusing = register_nvp_action("0xnvp1", "genesis-0");
    if let GovernanceAction::RegisterNode { pid, vp_seq, .. } = &mut reusing {
        *pid = Some("peer-0".to_string());
        *vp_seq = Some(0);
    }
    let id = handle
        .invoke_action(SUPER_ADMIN, reusing, "audit")
        .unwrap()
        .unwrap();
    assert_eq!(approve(handle, id), ProposalStatus::Approved);
    assert_eq!(
        handle.get_node("0xnvp1").unwrap().kind,
        NodeKind::Nvp
    );

    let err = handle
        .invoke_action(
            SUPER_ADMIN,
            register_nvp_action("0xnvp2", "genesis-0"),
            "audit",
        )
        .unwrap_err();
    assert!(matches!(err, ChainError::ConstraintViolation(_)));
}

#[test]
fn rejected_node_registration_lands_on_unavailable_and_may_retry() {
    let node = start_node();
    let handle = &node.handle;

    let id = handle
        .invoke_action(SUPER_ADMIN, register_nvp_action("0xnvp1", "audit-one"), "audit")
        .unwrap()
        .unwrap();
    assert_eq!(reject(handle, id), ProposalStatus::Rejected);
    assert_eq!(
        handle.node_status("0xnvp1").unwrap(),
        GovernanceStatus::Unavailable
    );

    register_approved(handle, register_nvp_action("0xnvp1", "audit-one"));
    assert_eq!(
        handle.node_status("0xnvp1").unwrap(),
        GovernanceStatus::Available
    );
}

#[test]
fn node_updates_apply_only_on_approval() {
    let node = start_node();
    let handle = &node.handle;
    register_approved(handle, register_nvp_action("0xnvp1", "audit-one"));

    let id = handle
        .invoke_action(
            SUPER_ADMIN,
            update_node("0xnvp1", Some("audit-renamed"), None),
            "rename",
        )
        .unwrap()
        .unwrap();
    assert_eq!(
        handle.node_status("0xnvp1").unwrap(),
        GovernanceStatus::Updating
    );
    assert_eq!(approve(handle, id), ProposalStatus::Approved);
    let record = handle.get_node("0xnvp1").unwrap();
    assert_eq!(record.name, "audit-renamed");
    assert_eq!(record.status, GovernanceStatus::Available);

    let id = handle
        .invoke_action(
            SUPER_ADMIN,
            update_node("0xnvp1", Some("audit-reverted"), None),
            "rename again",
        )
        .unwrap()
        .unwrap();
    assert_eq!(reject(handle, id), ProposalStatus::Rejected);
    let record = handle.get_node("0xnvp1").unwrap();
    assert_eq!(record.name, "audit-renamed");
    assert_eq!(record.status, GovernanceStatus::Available);
}

#[test]
fn bound_audit_admin_may_update_its_own_node_only() {
    let node = start_node();
    let handle = &node.handle;
    register_approved(handle, register_nvp_action("0xnvp1", "audit-one"));
    register_approved(handle, register_nvp_action("0xnvp2", "audit-two"));
    register_approved(handle, register_audit_action("0xdave", "0xnvp1"));

    // The bound node sits on binded while owned; the update returns there.
    let id = handle
        .invoke_action(
            "0xdave",
            update_node("0xnvp1", None, Some("rotated-cert")),
            "rotate permission",
        )
        .unwrap()
        .unwrap();
    assert_eq!(approve(handle, id), ProposalStatus::Approved);
    let record = handle.get_node("0xnvp1").unwrap();
    assert_eq!(record.permission.as_deref(), Some("rotated-cert"));
    assert_eq!(record.status, GovernanceStatus::Binded);

    let err = handle
        .invoke_action(
            "0xdave",
            update_node("0xnvp2", Some("hijacked"), None),
            "not mine",
        )
        .unwrap_err();
    assert!(matches!(err, ChainError::Unauthorized(_)));

    let err = handle
        .invoke_action("0xdave", update_node("0xval0", Some("hijacked"), None), "not mine")
        .unwrap_err();
    assert!(matches!(err, ChainError::Unauthorized(_)));

    // Validators carry no permission token to update.
    let err = handle
        .invoke_action(
            SUPER_ADMIN,
            update_node("0xval0", None, Some("cert")),
            "misuse",
        )
        .unwrap_err();
    assert!(matches!(err, ChainError::ConstraintViolation(_)));
}

#[test]
fn one_pending_action_per_node_scope() {
    let node = start_node();
    let handle = &node.handle;

    let vp_id = handle
        .invoke_action(
            SUPER_ADMIN,
            register_vp_action("0xval4", "val-four", "peer-4", 4),
            "expansion",
        )
        .unwrap()
        .unwrap();

    let err = handle
        .invoke_action(
            SUPER_ADMIN,
            register_vp_action("0xval5", "val-five", "peer-5", 5),
            "expansion",
        )
        .unwrap_err();
    assert!(matches!(err, ChainError::ConflictInFlight(_)));

    // The audit scope is independent of the validator scope.
    let nvp_id = handle
        .invoke_action(SUPER_ADMIN, register_nvp_action("0xnvp1", "audit-one"), "audit")
        .unwrap()
        .unwrap();
    assert_eq!(approve(handle, nvp_id), ProposalStatus::Approved);

    assert_eq!(approve(handle, vp_id), ProposalStatus::Approved);
    register_approved(handle, register_vp_action("0xval5", "val-five", "peer-5", 5));
}

#[test]
fn genesis_validator_slots_are_immutable() {
    let node = start_node();
    let handle = &node.handle;

    let err = handle
        .invoke_action(SUPER_ADMIN, logout_node("0xval0"), "decommission")
        .unwrap_err();
    assert!(matches!(err, ChainError::SelfTargetForbidden(_)));
    assert_eq!(handle.governance_summary().unwrap().pending_proposals, 0);
    assert_eq!(
        handle.node_status("0xval0").unwrap(),
        GovernanceStatus::Available
    );
}

#[test]
fn logout_over_pending_update_voids_the_update() {
    let node = start_node();
    let handle = &node.handle;
    register_approved(handle, register_nvp_action("0xnvp1", "audit-one"));

    let update_id = handle
        .invoke_action(
            SUPER_ADMIN,
            update_node("0xnvp1", Some("audit-renamed"), None),
            "rename",
        )
        .unwrap()
        .unwrap();
    let logout_id = handle
        .invoke_action(SUPER_ADMIN, logout_node("0xnvp1"), "decommission")
        .unwrap()
        .unwrap();
    assert_eq!(
        handle.get_proposal(update_id).unwrap().status,
        ProposalStatus::Void
    );
    assert_eq!(approve(handle, logout_id), ProposalStatus::Approved);
    let record = handle.get_node("0xnvp1").unwrap();
    assert_eq!(record.status, GovernanceStatus::Forbidden);
    assert_eq!(record.name, "audit-one");
}

#[test]
fn logging_out_a_bind_candidate_voids_the_bind() {
    let node = start_node();
    let handle = &node.handle;
    register_approved(handle, register_nvp_action("0xnvp1", "audit-one"));
    register_approved(handle, register_audit_action("0xdave", "0xnvp1"));
    let id = handle
        .invoke_action(SUPER_ADMIN, logout_node("0xnvp1"), "decommission")
        .unwrap()
        .unwrap();
    assert_eq!(approve(handle, id), ProposalStatus::Approved);
    register_approved(handle, register_nvp_action("0xnvp2", "audit-two"));

    let bind_id = handle
        .invoke_action(
            SUPER_ADMIN,
            GovernanceAction::BindRole {
                address: "0xdave".to_string(),
                node: "0xnvp2".to_string(),
            },
            "rebinding",
        )
        .unwrap()
        .unwrap();
    assert_eq!(
        handle.node_status("0xnvp2").unwrap(),
        GovernanceStatus::Binding
    );

    let logout_id = handle
        .invoke_action(SUPER_ADMIN, logout_node("0xnvp2"), "gone")
        .unwrap()
        .unwrap();
    assert_eq!(
        handle.get_proposal(bind_id).unwrap().status,
        ProposalStatus::Void
    );
    // The role falls back to where the cascade left it; the candidate node
    // finishes its own logout normally.
    assert_eq!(
        handle.role_status("0xdave").unwrap(),
        GovernanceStatus::Frozen
    );
    assert_eq!(approve(handle, logout_id), ProposalStatus::Approved);
    assert_eq!(
        handle.node_status("0xnvp2").unwrap(),
        GovernanceStatus::Forbidden
    );
}

#[test]
fn node_logout_rejection_restores_availability() {
    let node = start_node();
    let handle = &node.handle;
    register_approved(handle, register_nvp_action("0xnvp1", "audit-one"));

    let id = handle
        .invoke_action(SUPER_ADMIN, logout_node("0xnvp1"), "decommission")
        .unwrap()
        .unwrap();
    assert_eq!(
        handle.node_status("0xnvp1").unwrap(),
        GovernanceStatus::Logouting
    );
    assert_eq!(reject(handle, id), ProposalStatus::Rejected);
    assert_eq!(
        handle.node_status("0xnvp1").unwrap(),
        GovernanceStatus::Available
    );
}

#[test]
fn frozen_node_from_role_logout_still_logs_out_to_forbidden() {
    let node = start_node();
    let handle = &node.handle;
    register_approved(handle, register_nvp_action("0xnvp1", "audit-one"));
    register_approved(handle, register_audit_action("0xdave", "0xnvp1"));

    // The audit admin leaves; its node freezes as a cascade.
    handle
        .invoke_action(
            SUPER_ADMIN,
            GovernanceAction::LogoutRole {
                address: "0xdave".to_string(),
            },
            "audit offboarding",
        )
        .unwrap();
    assert_eq!(
        handle.node_status("0xnvp1").unwrap(),
        GovernanceStatus::Frozen
    );

    let id = handle
        .invoke_action(SUPER_ADMIN, logout_node("0xnvp1"), "decommission")
        .unwrap()
        .unwrap();
    assert_eq!(approve(handle, id), ProposalStatus::Approved);
    assert_eq!(
        handle.node_status("0xnvp1").unwrap(),
        GovernanceStatus::Forbidden
    );
}
