/// Best-effort notification side-channel
///
/// Domain operations call these helpers after they commit. A failure to
/// deliver a notification is logged and swallowed; it never fails the
/// operation that triggered it.

use serde_json::json;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::models::notification::{CreateNotification, Notification, NotificationKind};
use crate::models::priority::RequestPriority;

async fn deliver(pool: &PgPool, data: CreateNotification) {
    let kind = data.kind;
    if let Err(e) = Notification::create(pool, data).await {
        warn!(?kind, "Failed to deliver notification: {}", e);
    }
}

/// Tells the assignee they have a new task
pub async fn task_assigned(
    pool: &PgPool,
    site_id: Uuid,
    task_title: &str,
    assigned_to: Uuid,
    assigned_by: Uuid,
) {
    deliver(
        pool,
        CreateNotification {
            recipient_id: assigned_to,
            sender_id: Some(assigned_by),
            site_id: Some(site_id),
            title: "New task assigned".to_string(),
            message: format!("You have been assigned: {}", task_title),
            kind: NotificationKind::TaskAssignment,
            priority: RequestPriority::Medium,
            data: Some(json!({ "siteId": site_id })),
            action_url: None,
            expires_at: None,
        },
    )
    .await;
}

/// Tells the site owner a new issue was reported
pub async fn issue_reported(
    pool: &PgPool,
    site_id: Uuid,
    issue_title: &str,
    reported_by: Uuid,
    owner_id: Uuid,
) {
    // Owners reporting on their own site don't need to hear about it.
    if reported_by == owner_id {
        return;
    }

    deliver(
        pool,
        CreateNotification {
            recipient_id: owner_id,
            sender_id: Some(reported_by),
            site_id: Some(site_id),
            title: "New issue reported".to_string(),
            message: format!("Issue reported on your site: {}", issue_title),
            kind: NotificationKind::IssueReport,
            priority: RequestPriority::High,
            data: Some(json!({ "siteId": site_id })),
            action_url: None,
            expires_at: None,
        },
    )
    .await;
}

/// Tells a user an issue was assigned to them
pub async fn issue_assigned(
    pool: &PgPool,
    site_id: Uuid,
    issue_title: &str,
    assigned_to: Uuid,
    assigned_by: Uuid,
) {
    if assigned_to == assigned_by {
        return;
    }

    deliver(
        pool,
        CreateNotification {
            recipient_id: assigned_to,
            sender_id: Some(assigned_by),
            site_id: Some(site_id),
            title: "Issue assigned to you".to_string(),
            message: format!("You have been assigned issue: {}", issue_title),
            kind: NotificationKind::IssueReport,
            priority: RequestPriority::High,
            data: Some(json!({ "siteId": site_id })),
            action_url: None,
            expires_at: None,
        },
    )
    .await;
}

/// Tells a supplier a material request is waiting for them
pub async fn material_requested(
    pool: &PgPool,
    site_id: Uuid,
    request_id: Uuid,
    supplier_id: Uuid,
    requested_by: Uuid,
) {
    deliver(
        pool,
        CreateNotification {
            recipient_id: supplier_id,
            sender_id: Some(requested_by),
            site_id: Some(site_id),
            title: "New material request".to_string(),
            message: "A material request has been addressed to you".to_string(),
            kind: NotificationKind::MaterialRequest,
            priority: RequestPriority::Medium,
            data: Some(json!({ "siteId": site_id, "requestId": request_id })),
            action_url: None,
            expires_at: None,
        },
    )
    .await;
}

/// Tells the requester their material request was decided
pub async fn material_decided(
    pool: &PgPool,
    site_id: Uuid,
    request_id: Uuid,
    requested_by: Uuid,
    decided_by: Uuid,
    approved: bool,
) {
    let (title, message) = if approved {
        ("Material request approved", "Your material request was approved")
    } else {
        ("Material request rejected", "Your material request was rejected")
    };

    deliver(
        pool,
        CreateNotification {
            recipient_id: requested_by,
            sender_id: Some(decided_by),
            site_id: Some(site_id),
            title: title.to_string(),
            message: message.to_string(),
            kind: NotificationKind::MaterialRequest,
            priority: RequestPriority::Medium,
            data: Some(json!({ "siteId": site_id, "requestId": request_id })),
            action_url: None,
            expires_at: None,
        },
    )
    .await;
}

/// Tells the payee a payment was recorded for them
pub async fn payment_recorded(
    pool: &PgPool,
    site_id: Uuid,
    payment_id: Uuid,
    to_user: Uuid,
    from_user: Uuid,
    amount: f64,
) {
    deliver(
        pool,
        CreateNotification {
            recipient_id: to_user,
            sender_id: Some(from_user),
            site_id: Some(site_id),
            title: "Payment recorded".to_string(),
            message: format!("A payment of {:.2} was recorded for you", amount),
            kind: NotificationKind::Payment,
            priority: RequestPriority::Medium,
            data: Some(json!({ "siteId": site_id, "paymentId": payment_id })),
            action_url: None,
            expires_at: None,
        },
    )
    .await;
}
