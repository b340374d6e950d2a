use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::info;
use utoipa::ToSchema;

/// Echo response of `POST /notifications`. There is no delivery channel
/// behind this endpoint; clients learn about new messages by polling.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationAck {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    responses((status = 200, description = "Endpoint liveness probe"))
)]
pub async fn notification_status() -> &'static str {
    "Notification endpoint active"
}

#[utoipa::path(
    post,
    path = "/notifications",
    tag = "notifications",
    responses(
        (status = 200, description = "Notification logged", body = NotificationAck),
        (status = 400, description = "Malformed JSON body")
    )
)]
pub async fn post_notification(Json(payload): Json<JsonValue>) -> Json<NotificationAck> {
    info!("New notification: {payload}");
    Json(NotificationAck {
        success: true,
        message: "Notification sent".to_string(),
        timestamp: Utc::now(),
    })
}
