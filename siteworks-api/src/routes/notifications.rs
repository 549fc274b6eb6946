/// Notification endpoints
///
/// # Endpoints
///
/// - `GET /api/notifications` - List the caller's inbox
/// - `POST /api/notifications/:id/read` - Mark one as read
/// - `POST /api/notifications/read-all` - Mark the whole inbox as read
/// - `POST /api/notifications/send` - Send a notification to a user

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
    auth::middleware::AuthContext,
    models::{
        notification::{CreateNotification, Notification, NotificationKind},
        priority::RequestPriority,
        user::User,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for the inbox listing
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,

    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Inbox listing with the unread badge count
#[derive(Debug, Serialize)]
pub struct InboxResponse {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

/// Send notification body
#[derive(Debug, Deserialize, Validate)]
pub struct SendNotificationRequest {
    pub recipient_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

/// Lists the caller's inbox, newest first, skipping expired entries
///
/// Expired rows are purged opportunistically on each listing; there is
/// no background sweeper.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<Json<InboxResponse>> {
    let purged = Notification::purge_expired(&state.db).await?;
    if purged > 0 {
        tracing::debug!(purged, "Removed expired notifications");
    }

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let notifications = Notification::list_for_recipient(
        &state.db,
        auth.user_id,
        query.unread_only,
        limit,
        offset,
    )
    .await?;
    let unread_count = Notification::unread_count(&state.db, auth.user_id).await?;

    Ok(Json(InboxResponse {
        notifications,
        unread_count,
    }))
}

/// Marks one notification as read; recipients only
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Notification>> {
    let notification = Notification::mark_read(&state.db, id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    Ok(Json(notification))
}

/// Marks every notification in the caller's inbox as read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    let updated = Notification::mark_all_read(&state.db, auth.user_id).await?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}

/// Sends a general notification to a user
///
/// Push delivery to the recipient's registered device tokens is logged
/// but not yet wired to a push provider.
pub async fn send_notification(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SendNotificationRequest>,
) -> ApiResult<(StatusCode, Json<Notification>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let recipient = User::find_by_id(&state.db, req.recipient_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipient not found".to_string()))?;

    let notification = Notification::create(
        &state.db,
        CreateNotification {
            recipient_id: recipient.id,
            sender_id: Some(auth.user_id),
            site_id: None,
            title: req.title,
            message: req.message,
            kind: NotificationKind::General,
            priority: RequestPriority::Medium,
            data: None,
            action_url: None,
            expires_at: None,
        },
    )
    .await?;

    if !recipient.push_tokens.is_empty() {
        tracing::info!(
            recipient = %recipient.id,
            tokens = recipient.push_tokens.len(),
            "Push delivery queued"
        );
    }

    Ok((StatusCode::CREATED, Json(notification)))
}
