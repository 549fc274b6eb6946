/// Payment endpoints
///
/// # Endpoints
///
/// - `GET /api/payments` - List payments visible to the caller
/// - `POST /api/payments` - Record a payment (site owner only)
/// - `GET /api/payments/summary/:site_id` - Per-status totals for a site

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use siteworks_shared::{
    auth::{
        middleware::AuthContext,
        policy::{self, Action, PaymentRefs, ReadScope},
    },
    models::{
        audit::{AuditEntry, AuditKind},
        payment::{CreatePayment, Payment, PaymentKind, PaymentStatus, PaymentSummary},
        site::Site,
    },
    notify,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Query parameters for the payment listing
#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    /// Restrict to one site (membership checked)
    pub site_id: Option<Uuid>,

    /// Optional status filter
    pub status: Option<PaymentStatus>,
}

/// Record payment body; the payer is always the caller
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub site_id: Uuid,

    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,

    pub to_user: Uuid,
    pub kind: PaymentKind,
    pub reference: Option<String>,
    pub note: Option<String>,
}

/// Lists payments visible to the caller
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListPaymentsQuery>,
) -> ApiResult<Json<Vec<Payment>>> {
    let actor = state.actor(&auth).await?;

    if let Some(site_id) = query.site_id {
        let access = Site::load_access(&state.db, site_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;
        policy::site_action(&actor, &access, Action::Read)?;

        // Drop entries the caller could not fetch individually; members
        // only see payments they are a party to.
        let mut payments = Payment::list_by_site(&state.db, site_id, query.status).await?;
        payments.retain(|payment| {
            let refs = PaymentRefs {
                from_user: payment.from_user,
                to_user: payment.to_user,
            };
            policy::payment_view(&actor, &access, &refs).is_ok()
        });
        return Ok(Json(payments));
    }

    let payments = match policy::read_scope(&actor)? {
        ReadScope::Company(company_id) => {
            Payment::list_for_company(&state.db, company_id, query.status).await?
        }
        ReadScope::ContractorOf(user_id) | ReadScope::SupplierOf(user_id) => {
            Payment::list_involving(&state.db, user_id, query.status).await?
        }
    };

    Ok(Json(payments))
}

/// Records a payment and notifies the payee (site owner only)
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePaymentRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let actor = state.actor(&auth).await?;
    let access = Site::load_access(&state.db, req.site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::payment_manage(&actor, &access)?;

    let payment = Payment::create(
        &state.db,
        CreatePayment {
            site_id: req.site_id,
            amount: req.amount,
            from_user: actor.id,
            to_user: req.to_user,
            kind: req.kind,
            reference: req.reference,
            note: req.note,
        },
    )
    .await?;

    AuditEntry::record(
        &state.db,
        payment.site_id,
        AuditKind::Payment,
        actor.id,
        json!({ "paymentId": payment.id, "amount": payment.amount, "toUser": payment.to_user }),
    )
    .await?;

    notify::payment_recorded(
        &state.db,
        payment.site_id,
        payment.id,
        payment.to_user,
        payment.from_user,
        payment.amount,
    )
    .await;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// Per-status totals for one site (site owner only)
pub async fn payment_summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(site_id): Path<Uuid>,
) -> ApiResult<Json<PaymentSummary>> {
    let actor = state.actor(&auth).await?;
    let access = Site::load_access(&state.db, site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;

    policy::payment_manage(&actor, &access)?;

    let summary = Payment::summary_for_site(&state.db, site_id).await?;

    Ok(Json(summary))
}
