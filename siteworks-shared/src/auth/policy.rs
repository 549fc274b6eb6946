/// Role- and site-scoped authorization policy
///
/// Every permission decision in Siteworks flows through this module.
/// It is deliberately pure: callers load a [`SiteAccess`] snapshot from
/// the database (see `Site::load_access`), build an [`Actor`] from the
/// authenticated request, and evaluate predicates here. Nothing in this
/// module touches the database or any global state, so every decision
/// is testable as a plain function call.
///
/// # Permission Model
///
/// 1. **Site membership**: a user relates to a site as its owner, an
///    assigned contractor, an assigned supplier, or not at all.
/// 2. **Role-based rules**: what each relation may do to each resource
///    kind, with deny as the default.
/// 3. **Record-level rules**: some operations additionally require the
///    actor to be a specific participant on the record (the assignee of
///    a task, the supplier on a material request, and so on).
///
/// Owners act through their company: an owner relates to a site when
/// the site belongs to their company, never merely because they hold
/// the owner role.
///
/// # Example
///
/// ```
/// use siteworks_shared::auth::policy::{Actor, SiteAccess, SiteUpdateScope, site_update_scope};
/// use siteworks_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let owner_id = Uuid::new_v4();
/// let company_id = Uuid::new_v4();
/// let contractor_id = Uuid::new_v4();
///
/// let access = SiteAccess {
///     site_id: Uuid::new_v4(),
///     company_id,
///     owner_id,
///     contractors: vec![contractor_id],
///     suppliers: vec![],
/// };
///
/// let contractor = Actor { id: contractor_id, role: UserRole::Contractor, company_id: None };
/// assert_eq!(
///     site_update_scope(&contractor, &access).unwrap(),
///     SiteUpdateScope::StatusProgress,
/// );
/// ```

use uuid::Uuid;

use crate::models::user::UserRole;

/// Error type for policy decisions
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Actor has no relation to the site
    #[error("Not a member of site {0}")]
    NotSiteMember(Uuid),

    /// Actor is a member but the operation is outside their role
    #[error("Operation not permitted: {0}")]
    Forbidden(&'static str),
}

/// The authenticated principal a decision is made for
///
/// Built from the validated JWT claims plus the user row; carries no
/// references so it can be passed across await points freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,

    /// Company the actor belongs to, if any
    pub company_id: Option<Uuid>,
}

/// Snapshot of who may touch a site
///
/// Loaded once per request for the site in question; all predicates in
/// this module evaluate against it without further queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteAccess {
    pub site_id: Uuid,
    pub company_id: Uuid,
    pub owner_id: Uuid,
    pub contractors: Vec<Uuid>,
    pub suppliers: Vec<Uuid>,
}

/// How an actor relates to a site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteRelation {
    /// The site belongs to the actor's company
    Owner,

    /// Assigned to the site as a contractor
    Contractor,

    /// Assigned to the site as a supplier
    Supplier,

    /// No relation; every predicate denies
    None,
}

impl SiteAccess {
    /// Determines the actor's relation to this site
    ///
    /// The role on the account and the assignment on the site must
    /// agree; a contractor ID appearing in the suppliers list grants
    /// nothing.
    pub fn relation(&self, actor: &Actor) -> SiteRelation {
        match actor.role {
            UserRole::Owner
                if actor.id == self.owner_id || actor.company_id == Some(self.company_id) =>
            {
                SiteRelation::Owner
            }
            UserRole::Contractor if self.contractors.contains(&actor.id) => {
                SiteRelation::Contractor
            }
            UserRole::Supplier if self.suppliers.contains(&actor.id) => SiteRelation::Supplier,
            _ => SiteRelation::None,
        }
    }

    /// True if the actor has any relation to the site
    pub fn is_member(&self, actor: &Actor) -> bool {
        self.relation(actor) != SiteRelation::None
    }
}

/// Generic operation classes for resource predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Delete,
}

/// Which fields a site update may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteUpdateScope {
    /// Owner path: every mutable field
    Full,

    /// Contractor path: status and progress only
    StatusProgress,
}

/// Which rows a list endpoint may return for an actor
///
/// Models translate this into a WHERE clause; routes never build an
/// unscoped listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScope {
    /// Everything under the actor's company
    Company(Uuid),

    /// Rows on sites the user is assigned to as a contractor, plus
    /// rows the user participates in directly
    ContractorOf(Uuid),

    /// Rows addressed to the user as a supplier
    SupplierOf(Uuid),
}

/// Record-level participants of a task
#[derive(Debug, Clone, Copy)]
pub struct TaskRefs {
    pub assigned_to: Uuid,
    pub assigned_by: Uuid,
}

/// Record-level participants of an issue
#[derive(Debug, Clone, Copy)]
pub struct IssueRefs {
    pub reported_by: Uuid,
    pub assigned_to: Option<Uuid>,
}

/// Record-level participants of a material request
#[derive(Debug, Clone, Copy)]
pub struct MaterialRefs {
    pub requested_by: Uuid,
    pub supplier_id: Uuid,
}

/// Record-level participants of a payment
#[derive(Debug, Clone, Copy)]
pub struct PaymentRefs {
    pub from_user: Uuid,
    pub to_user: Uuid,
}

/// Record-level facts about a document
#[derive(Debug, Clone, Copy)]
pub struct DocumentRefs {
    pub uploaded_by: Uuid,
    pub is_public: bool,
}

/// Resolves the listing scope for an actor
///
/// Owners list within their company and nothing else; an owner without
/// a company has nothing to list and is denied.
pub fn read_scope(actor: &Actor) -> Result<ReadScope, AuthzError> {
    match actor.role {
        UserRole::Owner => actor
            .company_id
            .map(ReadScope::Company)
            .ok_or(AuthzError::Forbidden("owner has no company")),
        UserRole::Contractor => Ok(ReadScope::ContractorOf(actor.id)),
        UserRole::Supplier => Ok(ReadScope::SupplierOf(actor.id)),
    }
}

/// Site-level predicate
///
/// - Read: any site member
/// - Write: see [`site_update_scope`] for the field split
/// - Delete: nobody; sites are never deleted
pub fn site_action(actor: &Actor, access: &SiteAccess, action: Action) -> Result<(), AuthzError> {
    match (access.relation(actor), action) {
        (SiteRelation::None, _) => Err(AuthzError::NotSiteMember(access.site_id)),
        (_, Action::Read) => Ok(()),
        (SiteRelation::Owner | SiteRelation::Contractor, Action::Write) => Ok(()),
        _ => Err(AuthzError::Forbidden("site modification")),
    }
}

/// Determines which fields the actor may update on a site
///
/// Suppliers never update sites, even when assigned.
pub fn site_update_scope(actor: &Actor, access: &SiteAccess) -> Result<SiteUpdateScope, AuthzError> {
    match access.relation(actor) {
        SiteRelation::Owner => Ok(SiteUpdateScope::Full),
        SiteRelation::Contractor => Ok(SiteUpdateScope::StatusProgress),
        SiteRelation::Supplier => Err(AuthzError::Forbidden("suppliers cannot update sites")),
        SiteRelation::None => Err(AuthzError::NotSiteMember(access.site_id)),
    }
}

/// Only the site's owner manages assignments
pub fn site_assignment(actor: &Actor, access: &SiteAccess) -> Result<(), AuthzError> {
    match access.relation(actor) {
        SiteRelation::Owner => Ok(()),
        SiteRelation::None => Err(AuthzError::NotSiteMember(access.site_id)),
        _ => Err(AuthzError::Forbidden("only the owner assigns users to a site")),
    }
}

/// Only owners and contractors on the site create tasks
pub fn task_create(actor: &Actor, access: &SiteAccess) -> Result<(), AuthzError> {
    match access.relation(actor) {
        SiteRelation::Owner | SiteRelation::Contractor => Ok(()),
        SiteRelation::Supplier => Err(AuthzError::Forbidden("suppliers cannot create tasks")),
        SiteRelation::None => Err(AuthzError::NotSiteMember(access.site_id)),
    }
}

/// Task predicate
///
/// - Read/Write: owner, the assignee, or whoever assigned the task
///   (read only, for the assigner)
/// - Delete: owner only
pub fn task_action(
    actor: &Actor,
    access: &SiteAccess,
    refs: &TaskRefs,
    action: Action,
) -> Result<(), AuthzError> {
    let relation = access.relation(actor);
    if relation == SiteRelation::None {
        return Err(AuthzError::NotSiteMember(access.site_id));
    }

    match action {
        Action::Read => {
            if relation == SiteRelation::Owner
                || actor.id == refs.assigned_to
                || actor.id == refs.assigned_by
            {
                Ok(())
            } else {
                Err(AuthzError::Forbidden("not a participant of this task"))
            }
        }
        Action::Write => {
            if relation == SiteRelation::Owner || actor.id == refs.assigned_to {
                Ok(())
            } else {
                Err(AuthzError::Forbidden("only the owner or assignee updates a task"))
            }
        }
        Action::Delete => {
            if relation == SiteRelation::Owner {
                Ok(())
            } else {
                Err(AuthzError::Forbidden("only the owner deletes a task"))
            }
        }
    }
}

/// Any site member may report an issue
pub fn issue_create(actor: &Actor, access: &SiteAccess) -> Result<(), AuthzError> {
    if access.is_member(actor) {
        Ok(())
    } else {
        Err(AuthzError::NotSiteMember(access.site_id))
    }
}

/// Issue predicate
///
/// - Read/Write: owner, the reporter, or the assignee
/// - Delete: owner only
pub fn issue_action(
    actor: &Actor,
    access: &SiteAccess,
    refs: &IssueRefs,
    action: Action,
) -> Result<(), AuthzError> {
    let relation = access.relation(actor);
    if relation == SiteRelation::None {
        return Err(AuthzError::NotSiteMember(access.site_id));
    }

    match action {
        Action::Read | Action::Write => {
            if relation == SiteRelation::Owner
                || actor.id == refs.reported_by
                || refs.assigned_to == Some(actor.id)
            {
                Ok(())
            } else {
                Err(AuthzError::Forbidden("not a participant of this issue"))
            }
        }
        Action::Delete => {
            if relation == SiteRelation::Owner {
                Ok(())
            } else {
                Err(AuthzError::Forbidden("only the owner deletes an issue"))
            }
        }
    }
}

/// Contractors assigned to the site raise material requests
pub fn material_create(actor: &Actor, access: &SiteAccess) -> Result<(), AuthzError> {
    match access.relation(actor) {
        SiteRelation::Contractor => Ok(()),
        SiteRelation::None => Err(AuthzError::NotSiteMember(access.site_id)),
        _ => Err(AuthzError::Forbidden(
            "only contractors raise material requests",
        )),
    }
}

/// Reading a material request: owner, the requester, or the supplier
pub fn material_view(
    actor: &Actor,
    access: &SiteAccess,
    refs: &MaterialRefs,
) -> Result<(), AuthzError> {
    match access.relation(actor) {
        SiteRelation::None => Err(AuthzError::NotSiteMember(access.site_id)),
        SiteRelation::Owner => Ok(()),
        _ if actor.id == refs.requested_by || actor.id == refs.supplier_id => Ok(()),
        _ => Err(AuthzError::Forbidden("not a participant of this request")),
    }
}

/// Only the supplier the request is addressed to moves its status
///
/// A supplier who is assigned to the site but not named on the request
/// is denied.
pub fn material_update_status(
    actor: &Actor,
    access: &SiteAccess,
    refs: &MaterialRefs,
) -> Result<(), AuthzError> {
    if !access.is_member(actor) {
        return Err(AuthzError::NotSiteMember(access.site_id));
    }

    if actor.role == UserRole::Supplier && actor.id == refs.supplier_id {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(
            "only the addressed supplier updates this request",
        ))
    }
}

/// Only the owner records or decides payments on a site
pub fn payment_manage(actor: &Actor, access: &SiteAccess) -> Result<(), AuthzError> {
    match access.relation(actor) {
        SiteRelation::Owner => Ok(()),
        SiteRelation::None => Err(AuthzError::NotSiteMember(access.site_id)),
        _ => Err(AuthzError::Forbidden("only the owner manages payments")),
    }
}

/// Reading a payment: owner, or either party to it
pub fn payment_view(
    actor: &Actor,
    access: &SiteAccess,
    refs: &PaymentRefs,
) -> Result<(), AuthzError> {
    match access.relation(actor) {
        SiteRelation::None => Err(AuthzError::NotSiteMember(access.site_id)),
        SiteRelation::Owner => Ok(()),
        _ if actor.id == refs.from_user || actor.id == refs.to_user => Ok(()),
        _ => Err(AuthzError::Forbidden("not a party to this payment")),
    }
}

/// Only the owner reads a site's activity log
///
/// The log carries payment and delivery details that other members see
/// only through their own records.
pub fn audit_view(actor: &Actor, access: &SiteAccess) -> Result<(), AuthzError> {
    match access.relation(actor) {
        SiteRelation::Owner => Ok(()),
        SiteRelation::None => Err(AuthzError::NotSiteMember(access.site_id)),
        _ => Err(AuthzError::Forbidden("only the owner reads the activity log")),
    }
}

/// Any site member may upload a document to the site
pub fn document_create(actor: &Actor, access: &SiteAccess) -> Result<(), AuthzError> {
    if access.is_member(actor) {
        Ok(())
    } else {
        Err(AuthzError::NotSiteMember(access.site_id))
    }
}

/// Document predicate
///
/// `access` is `None` for documents uploaded without a site.
///
/// - Read: uploader; any authenticated user when `is_public`; site
///   owner; contractors assigned to the site
/// - Write/Delete: uploader or site owner
pub fn document_action(
    actor: &Actor,
    access: Option<&SiteAccess>,
    refs: &DocumentRefs,
    action: Action,
) -> Result<(), AuthzError> {
    if actor.id == refs.uploaded_by {
        return Ok(());
    }

    // Public documents are readable by anyone who is logged in.
    if refs.is_public && action == Action::Read {
        return Ok(());
    }

    let Some(access) = access else {
        return Err(AuthzError::Forbidden("document is private to its uploader"));
    };

    match (access.relation(actor), action) {
        (SiteRelation::None, _) => Err(AuthzError::NotSiteMember(access.site_id)),
        (SiteRelation::Owner, _) => Ok(()),
        (SiteRelation::Contractor, Action::Read) => Ok(()),
        _ => Err(AuthzError::Forbidden("not permitted on this document")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> (Actor, SiteAccess) {
        let owner_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();
        let actor = Actor {
            id: owner_id,
            role: UserRole::Owner,
            company_id: Some(company_id),
        };
        let access = SiteAccess {
            site_id: Uuid::new_v4(),
            company_id,
            owner_id,
            contractors: vec![],
            suppliers: vec![],
        };
        (actor, access)
    }

    #[test]
    fn test_relation_requires_role_and_assignment_to_agree() {
        let (_, mut access) = owner();
        let user_id = Uuid::new_v4();

        // A contractor listed under suppliers gets nothing.
        access.suppliers.push(user_id);
        let contractor = Actor {
            id: user_id,
            role: UserRole::Contractor,
            company_id: None,
        };
        assert_eq!(access.relation(&contractor), SiteRelation::None);

        access.contractors.push(user_id);
        assert_eq!(access.relation(&contractor), SiteRelation::Contractor);
    }

    #[test]
    fn test_owner_relation_is_company_scoped() {
        let (actor, access) = owner();
        assert_eq!(access.relation(&actor), SiteRelation::Owner);

        // Another owner, another company: no relation.
        let stranger = Actor {
            id: Uuid::new_v4(),
            role: UserRole::Owner,
            company_id: Some(Uuid::new_v4()),
        };
        assert_eq!(access.relation(&stranger), SiteRelation::None);
    }

    #[test]
    fn test_site_update_scope() {
        let (owner_actor, mut access) = owner();
        assert_eq!(
            site_update_scope(&owner_actor, &access).unwrap(),
            SiteUpdateScope::Full
        );

        let contractor_id = Uuid::new_v4();
        access.contractors.push(contractor_id);
        let contractor = Actor {
            id: contractor_id,
            role: UserRole::Contractor,
            company_id: None,
        };
        assert_eq!(
            site_update_scope(&contractor, &access).unwrap(),
            SiteUpdateScope::StatusProgress
        );

        let supplier_id = Uuid::new_v4();
        access.suppliers.push(supplier_id);
        let supplier = Actor {
            id: supplier_id,
            role: UserRole::Supplier,
            company_id: None,
        };
        assert!(site_update_scope(&supplier, &access).is_err());
    }

    #[test]
    fn test_read_scope() {
        let (owner_actor, _) = owner();
        assert!(matches!(
            read_scope(&owner_actor).unwrap(),
            ReadScope::Company(_)
        ));

        let companyless = Actor {
            id: Uuid::new_v4(),
            role: UserRole::Owner,
            company_id: None,
        };
        assert!(read_scope(&companyless).is_err());

        let contractor = Actor {
            id: Uuid::new_v4(),
            role: UserRole::Contractor,
            company_id: None,
        };
        assert_eq!(
            read_scope(&contractor).unwrap(),
            ReadScope::ContractorOf(contractor.id)
        );
    }

    #[test]
    fn test_non_member_denied_everywhere() {
        let (_, access) = owner();
        let outsider = Actor {
            id: Uuid::new_v4(),
            role: UserRole::Contractor,
            company_id: None,
        };
        let refs = TaskRefs {
            assigned_to: outsider.id,
            assigned_by: Uuid::new_v4(),
        };

        // Being a record participant does not bypass site membership.
        assert!(matches!(
            task_action(&outsider, &access, &refs, Action::Write),
            Err(AuthzError::NotSiteMember(_))
        ));
        assert!(site_action(&outsider, &access, Action::Read).is_err());
        assert!(issue_create(&outsider, &access).is_err());
        assert!(material_create(&outsider, &access).is_err());
        assert!(payment_manage(&outsider, &access).is_err());
    }

    #[test]
    fn test_material_delivery_is_supplier_only() {
        let (owner_actor, mut access) = owner();
        let supplier_id = Uuid::new_v4();
        access.suppliers.push(supplier_id);

        let refs = MaterialRefs {
            requested_by: Uuid::new_v4(),
            supplier_id,
        };

        let supplier = Actor {
            id: supplier_id,
            role: UserRole::Supplier,
            company_id: None,
        };
        assert!(material_update_status(&supplier, &access, &refs).is_ok());

        // Not even the owner moves the status.
        assert!(material_update_status(&owner_actor, &access, &refs).is_err());
    }

    #[test]
    fn test_private_document_without_site() {
        let uploader = Uuid::new_v4();
        let refs = DocumentRefs {
            uploaded_by: uploader,
            is_public: false,
        };

        let other = Actor {
            id: Uuid::new_v4(),
            role: UserRole::Owner,
            company_id: Some(Uuid::new_v4()),
        };
        assert!(document_action(&other, None, &refs, Action::Read).is_err());

        // Flipping it public opens reads to any authenticated user.
        let public = DocumentRefs {
            uploaded_by: uploader,
            is_public: true,
        };
        assert!(document_action(&other, None, &public, Action::Read).is_ok());
        assert!(document_action(&other, None, &public, Action::Write).is_err());

        let owner_of_doc = Actor {
            id: uploader,
            role: UserRole::Contractor,
            company_id: None,
        };
        assert!(document_action(&owner_of_doc, None, &refs, Action::Delete).is_ok());
    }
}
