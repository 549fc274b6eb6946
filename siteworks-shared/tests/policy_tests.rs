//! Decision-table tests for the authorization policy.
//!
//! One fixture site with an owner, an assigned contractor, an assigned
//! supplier, and an outsider of each role; every predicate is checked
//! against all of them.

use siteworks_shared::auth::policy::{
    audit_view, document_action, issue_action, issue_create, material_create,
    material_update_status, material_view, payment_manage, payment_view, read_scope, site_action,
    site_assignment, site_update_scope, task_action, task_create, Action, Actor, AuthzError,
    DocumentRefs, IssueRefs, MaterialRefs, PaymentRefs, ReadScope, SiteAccess, SiteRelation,
    SiteUpdateScope, TaskRefs,
};
use siteworks_shared::models::user::UserRole;
use uuid::Uuid;

struct Fixture {
    access: SiteAccess,
    owner: Actor,
    contractor: Actor,
    supplier: Actor,
    outside_owner: Actor,
    outside_contractor: Actor,
    outside_supplier: Actor,
}

fn fixture() -> Fixture {
    let company_id = Uuid::new_v4();
    let owner_id = Uuid::new_v4();
    let contractor_id = Uuid::new_v4();
    let supplier_id = Uuid::new_v4();

    Fixture {
        access: SiteAccess {
            site_id: Uuid::new_v4(),
            company_id,
            owner_id,
            contractors: vec![contractor_id],
            suppliers: vec![supplier_id],
        },
        owner: Actor {
            id: owner_id,
            role: UserRole::Owner,
            company_id: Some(company_id),
        },
        contractor: Actor {
            id: contractor_id,
            role: UserRole::Contractor,
            company_id: None,
        },
        supplier: Actor {
            id: supplier_id,
            role: UserRole::Supplier,
            company_id: None,
        },
        outside_owner: Actor {
            id: Uuid::new_v4(),
            role: UserRole::Owner,
            company_id: Some(Uuid::new_v4()),
        },
        outside_contractor: Actor {
            id: Uuid::new_v4(),
            role: UserRole::Contractor,
            company_id: None,
        },
        outside_supplier: Actor {
            id: Uuid::new_v4(),
            role: UserRole::Supplier,
            company_id: None,
        },
    }
}

#[test]
fn relations_resolve_per_fixture() {
    let f = fixture();

    assert_eq!(f.access.relation(&f.owner), SiteRelation::Owner);
    assert_eq!(f.access.relation(&f.contractor), SiteRelation::Contractor);
    assert_eq!(f.access.relation(&f.supplier), SiteRelation::Supplier);
    assert_eq!(f.access.relation(&f.outside_owner), SiteRelation::None);
    assert_eq!(f.access.relation(&f.outside_contractor), SiteRelation::None);
    assert_eq!(f.access.relation(&f.outside_supplier), SiteRelation::None);
}

#[test]
fn site_reads_require_membership() {
    let f = fixture();

    for member in [&f.owner, &f.contractor, &f.supplier] {
        assert!(site_action(member, &f.access, Action::Read).is_ok());
    }
    for outsider in [&f.outside_owner, &f.outside_contractor, &f.outside_supplier] {
        assert!(matches!(
            site_action(outsider, &f.access, Action::Read),
            Err(AuthzError::NotSiteMember(_))
        ));
    }
}

#[test]
fn site_update_scope_splits_by_relation() {
    let f = fixture();

    assert_eq!(
        site_update_scope(&f.owner, &f.access).unwrap(),
        SiteUpdateScope::Full
    );
    assert_eq!(
        site_update_scope(&f.contractor, &f.access).unwrap(),
        SiteUpdateScope::StatusProgress
    );
    assert!(matches!(
        site_update_scope(&f.supplier, &f.access),
        Err(AuthzError::Forbidden(_))
    ));
    assert!(site_update_scope(&f.outside_owner, &f.access).is_err());
}

#[test]
fn sites_are_never_deleted_and_assignment_is_owner_only() {
    let f = fixture();

    // No relation gets Delete, not even the owner.
    assert!(site_action(&f.owner, &f.access, Action::Delete).is_err());
    assert!(site_action(&f.contractor, &f.access, Action::Delete).is_err());
    assert!(site_action(&f.supplier, &f.access, Action::Delete).is_err());

    assert!(site_assignment(&f.owner, &f.access).is_ok());
    assert!(site_assignment(&f.contractor, &f.access).is_err());
    assert!(site_assignment(&f.outside_owner, &f.access).is_err());
}

#[test]
fn task_rules() {
    let f = fixture();
    let refs = TaskRefs {
        assigned_to: f.contractor.id,
        assigned_by: f.owner.id,
    };

    assert!(task_create(&f.owner, &f.access).is_ok());
    assert!(task_create(&f.contractor, &f.access).is_ok());
    assert!(task_create(&f.supplier, &f.access).is_err());
    assert!(task_create(&f.outside_contractor, &f.access).is_err());

    // Participants read; a supplier on the site is not one.
    assert!(task_action(&f.owner, &f.access, &refs, Action::Read).is_ok());
    assert!(task_action(&f.contractor, &f.access, &refs, Action::Read).is_ok());
    assert!(task_action(&f.supplier, &f.access, &refs, Action::Read).is_err());

    // Only the owner and the assignee write.
    assert!(task_action(&f.owner, &f.access, &refs, Action::Write).is_ok());
    assert!(task_action(&f.contractor, &f.access, &refs, Action::Write).is_ok());
    assert!(task_action(&f.supplier, &f.access, &refs, Action::Write).is_err());

    // Deletion stays with the owner.
    assert!(task_action(&f.contractor, &f.access, &refs, Action::Delete).is_err());
    assert!(task_action(&f.owner, &f.access, &refs, Action::Delete).is_ok());
}

#[test]
fn issue_rules() {
    let f = fixture();
    let refs = IssueRefs {
        reported_by: f.supplier.id,
        assigned_to: Some(f.contractor.id),
    };

    for member in [&f.owner, &f.contractor, &f.supplier] {
        assert!(issue_create(member, &f.access).is_ok());
        // Owner, reporter (supplier), and assignee (contractor) all read.
        assert!(issue_action(member, &f.access, &refs, Action::Read).is_ok());
    }
    assert!(issue_create(&f.outside_supplier, &f.access).is_err());

    // Reporter and assignee write; deletion stays with the owner.
    assert!(issue_action(&f.supplier, &f.access, &refs, Action::Write).is_ok());
    assert!(issue_action(&f.contractor, &f.access, &refs, Action::Write).is_ok());
    assert!(issue_action(&f.contractor, &f.access, &refs, Action::Delete).is_err());
    assert!(issue_action(&f.supplier, &f.access, &refs, Action::Delete).is_err());
    assert!(issue_action(&f.owner, &f.access, &refs, Action::Delete).is_ok());
}

#[test]
fn material_rules() {
    let f = fixture();
    let refs = MaterialRefs {
        requested_by: f.contractor.id,
        supplier_id: f.supplier.id,
    };

    // Only contractors on the site raise requests.
    assert!(material_create(&f.contractor, &f.access).is_ok());
    assert!(material_create(&f.owner, &f.access).is_err());
    assert!(material_create(&f.supplier, &f.access).is_err());

    assert!(material_view(&f.owner, &f.access, &refs).is_ok());
    assert!(material_view(&f.contractor, &f.access, &refs).is_ok());
    assert!(material_view(&f.supplier, &f.access, &refs).is_ok());
    assert!(material_view(&f.outside_supplier, &f.access, &refs).is_err());

    // Only the addressed supplier moves the status.
    assert!(material_update_status(&f.supplier, &f.access, &refs).is_ok());
    assert!(material_update_status(&f.owner, &f.access, &refs).is_err());
    assert!(material_update_status(&f.contractor, &f.access, &refs).is_err());
}

#[test]
fn delivery_requires_the_addressed_supplier() {
    let f = fixture();

    // A different supplier assigned to the same site still may not
    // mark delivery on someone else's request.
    let mut access = f.access.clone();
    let other_supplier_id = Uuid::new_v4();
    access.suppliers.push(other_supplier_id);
    let other_supplier = Actor {
        id: other_supplier_id,
        role: UserRole::Supplier,
        company_id: None,
    };

    let refs = MaterialRefs {
        requested_by: f.contractor.id,
        supplier_id: f.supplier.id,
    };
    assert!(matches!(
        material_update_status(&other_supplier, &access, &refs),
        Err(AuthzError::Forbidden(_))
    ));
}

#[test]
fn payment_rules() {
    let f = fixture();
    let refs = PaymentRefs {
        from_user: f.owner.id,
        to_user: f.contractor.id,
    };

    assert!(payment_manage(&f.owner, &f.access).is_ok());
    assert!(payment_manage(&f.contractor, &f.access).is_err());
    assert!(payment_manage(&f.supplier, &f.access).is_err());

    assert!(payment_view(&f.owner, &f.access, &refs).is_ok());
    assert!(payment_view(&f.contractor, &f.access, &refs).is_ok());

    // A supplier on the site who is not a party sees nothing.
    assert!(payment_view(&f.supplier, &f.access, &refs).is_err());
    assert!(payment_view(&f.outside_owner, &f.access, &refs).is_err());
}

#[test]
fn document_rules() {
    let f = fixture();

    let private_doc = DocumentRefs {
        uploaded_by: f.contractor.id,
        is_public: false,
    };
    let public_doc = DocumentRefs {
        uploaded_by: f.contractor.id,
        is_public: true,
    };

    // Uploader always wins.
    assert!(document_action(&f.contractor, Some(&f.access), &private_doc, Action::Delete).is_ok());

    // Owner sees and manages everything on the site.
    assert!(document_action(&f.owner, Some(&f.access), &private_doc, Action::Read).is_ok());
    assert!(document_action(&f.owner, Some(&f.access), &private_doc, Action::Delete).is_ok());

    // Other members only read public documents.
    assert!(document_action(&f.supplier, Some(&f.access), &private_doc, Action::Read).is_err());
    assert!(document_action(&f.supplier, Some(&f.access), &public_doc, Action::Read).is_ok());
    assert!(document_action(&f.supplier, Some(&f.access), &public_doc, Action::Write).is_err());

    // Public documents read for any authenticated user, private ones
    // stay behind membership.
    assert!(
        document_action(&f.outside_contractor, Some(&f.access), &public_doc, Action::Read)
            .is_ok()
    );
    assert!(
        document_action(&f.outside_contractor, Some(&f.access), &private_doc, Action::Read)
            .is_err()
    );
}

#[test]
fn site_material_listing_hides_other_suppliers_requests() {
    let f = fixture();

    // Two suppliers on the same site, requests addressed to each.
    let mut access = f.access.clone();
    let other_supplier_id = Uuid::new_v4();
    access.suppliers.push(other_supplier_id);

    let requests = [
        MaterialRefs {
            requested_by: f.contractor.id,
            supplier_id: f.supplier.id,
        },
        MaterialRefs {
            requested_by: f.contractor.id,
            supplier_id: other_supplier_id,
        },
    ];

    // Filtering a site listing the way the handler does: a supplier
    // keeps only requests addressed to them, the owner keeps all.
    let visible_to_supplier: Vec<_> = requests
        .iter()
        .filter(|refs| material_view(&f.supplier, &access, refs).is_ok())
        .collect();
    assert_eq!(visible_to_supplier.len(), 1);
    assert_eq!(visible_to_supplier[0].supplier_id, f.supplier.id);

    let visible_to_owner = requests
        .iter()
        .filter(|refs| material_view(&f.owner, &access, refs).is_ok())
        .count();
    assert_eq!(visible_to_owner, requests.len());

    let visible_to_contractor = requests
        .iter()
        .filter(|refs| material_view(&f.contractor, &access, refs).is_ok())
        .count();
    assert_eq!(visible_to_contractor, requests.len());
}

#[test]
fn site_task_listing_keeps_participants_only() {
    let f = fixture();

    let other_contractor_id = Uuid::new_v4();
    let mut access = f.access.clone();
    access.contractors.push(other_contractor_id);

    let tasks = [
        TaskRefs {
            assigned_to: f.contractor.id,
            assigned_by: f.owner.id,
        },
        TaskRefs {
            assigned_to: other_contractor_id,
            assigned_by: f.owner.id,
        },
    ];

    let visible_to_contractor: Vec<_> = tasks
        .iter()
        .filter(|refs| task_action(&f.contractor, &access, refs, Action::Read).is_ok())
        .collect();
    assert_eq!(visible_to_contractor.len(), 1);
    assert_eq!(visible_to_contractor[0].assigned_to, f.contractor.id);

    // A supplier on the site sees no tasks at all.
    let visible_to_supplier = tasks
        .iter()
        .filter(|refs| task_action(&f.supplier, &access, refs, Action::Read).is_ok())
        .count();
    assert_eq!(visible_to_supplier, 0);
}

#[test]
fn site_issue_listing_keeps_participants_only() {
    let f = fixture();

    let other_contractor_id = Uuid::new_v4();
    let mut access = f.access.clone();
    access.contractors.push(other_contractor_id);

    let issues = [
        IssueRefs {
            reported_by: f.supplier.id,
            assigned_to: None,
        },
        IssueRefs {
            reported_by: other_contractor_id,
            assigned_to: Some(other_contractor_id),
        },
    ];

    let visible_to_supplier: Vec<_> = issues
        .iter()
        .filter(|refs| issue_action(&f.supplier, &access, refs, Action::Read).is_ok())
        .collect();
    assert_eq!(visible_to_supplier.len(), 1);
    assert_eq!(visible_to_supplier[0].reported_by, f.supplier.id);

    let visible_to_owner = issues
        .iter()
        .filter(|refs| issue_action(&f.owner, &access, refs, Action::Read).is_ok())
        .count();
    assert_eq!(visible_to_owner, issues.len());
}

#[test]
fn site_payment_listing_keeps_parties_only() {
    let f = fixture();

    let payments = [
        PaymentRefs {
            from_user: f.owner.id,
            to_user: f.contractor.id,
        },
        PaymentRefs {
            from_user: f.owner.id,
            to_user: f.supplier.id,
        },
    ];

    let visible_to_contractor: Vec<_> = payments
        .iter()
        .filter(|refs| payment_view(&f.contractor, &f.access, refs).is_ok())
        .collect();
    assert_eq!(visible_to_contractor.len(), 1);
    assert_eq!(visible_to_contractor[0].to_user, f.contractor.id);

    let visible_to_supplier: Vec<_> = payments
        .iter()
        .filter(|refs| payment_view(&f.supplier, &f.access, refs).is_ok())
        .collect();
    assert_eq!(visible_to_supplier.len(), 1);
    assert_eq!(visible_to_supplier[0].to_user, f.supplier.id);

    let visible_to_owner = payments
        .iter()
        .filter(|refs| payment_view(&f.owner, &f.access, refs).is_ok())
        .count();
    assert_eq!(visible_to_owner, payments.len());
}

#[test]
fn activity_log_is_owner_only() {
    let f = fixture();

    assert!(audit_view(&f.owner, &f.access).is_ok());
    assert!(matches!(
        audit_view(&f.contractor, &f.access),
        Err(AuthzError::Forbidden(_))
    ));
    assert!(matches!(
        audit_view(&f.supplier, &f.access),
        Err(AuthzError::Forbidden(_))
    ));
    assert!(matches!(
        audit_view(&f.outside_owner, &f.access),
        Err(AuthzError::NotSiteMember(_))
    ));
}

#[test]
fn read_scopes_per_role() {
    let f = fixture();

    assert_eq!(
        read_scope(&f.owner).unwrap(),
        ReadScope::Company(f.owner.company_id.unwrap())
    );
    assert_eq!(
        read_scope(&f.contractor).unwrap(),
        ReadScope::ContractorOf(f.contractor.id)
    );
    assert_eq!(
        read_scope(&f.supplier).unwrap(),
        ReadScope::SupplierOf(f.supplier.id)
    );
}
