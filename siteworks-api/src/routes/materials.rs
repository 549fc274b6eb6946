/// Material request endpoints
///
/// # Endpoints
///
/// - `GET /api/materials` - List requests visible to the caller
/// - `POST /api/materials` - Raise a request (contractor on the site)
/// - `POST /api/materials/:id/status` - Move a request's status
///   (the supplier the request is addressed to)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use siteworks_shared::{
    auth::{
        middleware::AuthContext,
        policy::{self, Action, MaterialRefs, ReadScope},
    },
    models::{
        audit::{AuditEntry, AuditKind},
        material::{CreateMaterialRequest, MaterialItem, MaterialRequest, MaterialStatus},
        priority::RequestPriority,
        site::Site,
    },
    notify,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Query parameters for the request listing
#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    /// Restrict to one site (membership checked)
    pub site_id: Option<Uuid>,

    /// Optional status filter
    pub status: Option<MaterialStatus>,
}

/// Raise request body; the requester is always the caller
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequestBody {
    pub site_id: Uuid,
    pub supplier_id: Uuid,

    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<MaterialItem>,

    #[serde(default)]
    pub priority: RequestPriority,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub total_amount: Option<f64>,
    pub notes: Option<String>,
}

/// Status change body
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: MaterialStatus,

    /// Reason shown to the requester when rejecting
    pub rejection_reason: Option<String>,
}

/// Lists material requests visible to the caller
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListRequestsQuery>,
) -> ApiResult<Json<Vec<MaterialRequest>>> {
    let actor = state.actor(&auth).await?;

    if let Some(site_id) = query.site_id {
        let access = Site::load_access(&state.db, site_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;
        policy::site_action(&actor, &access, Action::Read)?;

        // Drop entries the caller could not fetch individually; a
        // supplier on the site sees only requests addressed to them.
        let mut requests = MaterialRequest::list_by_site(&state.db, site_id, query.status).await?;
        requests.retain(|request| {
            let refs = MaterialRefs {
                requested_by: request.requested_by,
                supplier_id: request.supplier_id,
            };
            policy::material_view(&actor, &access, &refs).is_ok()
        });
        return Ok(Json(requests));
    }

    let requests = match policy::read_scope(&actor)? {
        ReadScope::Company(company_id) => {
            MaterialRequest::list_for_company(&state.db, company_id, query.status).await?
        }
        ReadScope::ContractorOf(user_id) => {
            MaterialRequest::list_requested_by(&state.db, user_id, query.status).await?
        }
        ReadScope::SupplierOf(user_id) => {
            MaterialRequest::list_for_supplier(&state.db, user_id, query.status).await?
        }
    };

    Ok(Json(requests))
}

/// Raises a material request and notifies the supplier
///
/// The addressed supplier must be assigned to the site; a request to an
/// unrelated supplier is rejected before anything is written.
pub async fn create_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateRequestBody>,
) -> ApiResult<(StatusCode, Json<MaterialRequest>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let actor = state.actor(&auth).await?;
    let access = Site::load_access(&state.db, req.site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::material_create(&actor, &access)?;

    if !access.suppliers.contains(&req.supplier_id) {
        return Err(ApiError::BadRequest(
            "Supplier is not assigned to this site".to_string(),
        ));
    }

    let request = MaterialRequest::create(
        &state.db,
        CreateMaterialRequest {
            site_id: req.site_id,
            requested_by: actor.id,
            supplier_id: req.supplier_id,
            items: serde_json::to_value(&req.items)
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
            priority: req.priority,
            expected_delivery_date: req.expected_delivery_date,
            total_amount: req.total_amount,
            notes: req.notes,
        },
    )
    .await?;

    AuditEntry::record(
        &state.db,
        request.site_id,
        AuditKind::MaterialRequest,
        actor.id,
        json!({ "requestId": request.id, "supplierId": request.supplier_id }),
    )
    .await?;

    notify::material_requested(
        &state.db,
        request.site_id,
        request.id,
        request.supplier_id,
        request.requested_by,
    )
    .await;

    Ok((StatusCode::CREATED, Json(request)))
}

/// Moves a request through its lifecycle
///
/// Only the supplier the request is addressed to may call this, even
/// when other suppliers are assigned to the same site. Approving stamps
/// `approved_at`; delivering stamps `actual_delivery_date`.
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusBody>,
) -> ApiResult<Json<MaterialRequest>> {
    let request = MaterialRequest::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Material request not found".to_string()))?;

    let actor = state.actor(&auth).await?;
    let access = Site::load_access(&state.db, request.site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    let refs = MaterialRefs {
        requested_by: request.requested_by,
        supplier_id: request.supplier_id,
    };
    policy::material_update_status(&actor, &access, &refs)?;

    if !request.status.can_transition_to(body.status) {
        return Err(ApiError::BadRequest(format!(
            "Cannot move a {:?} request to {:?}",
            request.status, body.status
        )));
    }

    let updated = match body.status {
        MaterialStatus::Approved => MaterialRequest::approve(&state.db, id, actor.id).await?,
        MaterialStatus::Rejected => {
            MaterialRequest::reject(&state.db, id, actor.id, body.rejection_reason.as_deref())
                .await?
        }
        MaterialStatus::Delivered => MaterialRequest::mark_delivered(&state.db, id).await?,
        MaterialStatus::Cancelled => MaterialRequest::cancel(&state.db, id).await?,
        MaterialStatus::Pending => {
            return Err(ApiError::BadRequest(
                "Requests cannot move back to PENDING".to_string(),
            ))
        }
    };

    // None here means the row moved out from under us.
    let updated = updated.ok_or_else(|| {
        ApiError::Conflict("Request status changed concurrently".to_string())
    })?;

    let audit_kind = if body.status == MaterialStatus::Delivered {
        AuditKind::DeliveryUpdate
    } else {
        AuditKind::StatusUpdate
    };
    AuditEntry::record(
        &state.db,
        updated.site_id,
        audit_kind,
        actor.id,
        json!({ "requestId": updated.id, "status": updated.status }),
    )
    .await?;

    match body.status {
        MaterialStatus::Approved | MaterialStatus::Rejected => {
            notify::material_decided(
                &state.db,
                updated.site_id,
                updated.id,
                updated.requested_by,
                actor.id,
                body.status == MaterialStatus::Approved,
            )
            .await;
        }
        _ => {}
    }

    Ok(Json(updated))
}
