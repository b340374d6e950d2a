use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;
use utoipa::ToSchema;

use crate::models::common::{bad_request, internal_error, Ack, ErrorResponse};
use crate::models::message::{
    CreateMessage, MessageEnvelope, MessageQuery, MessageStatus, MessagesPage, StatsEnvelope,
};
use crate::services::messages as store;
use crate::services::notify;
use crate::AppState;

/// Body of `PATCH /messages/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PatchMessage {
    pub action: String,
    pub status: Option<MessageStatus>,
}

/// Body of `PATCH /messages/batch`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchPatch {
    pub message_ids: Option<Vec<String>>,
    pub action: String,
    pub status: Option<MessageStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchResult {
    pub success: bool,
    /// Rows actually written; ids not present in the store are skipped.
    pub updated: u64,
}

#[utoipa::path(
    get,
    path = "/messages",
    tag = "messages",
    params(
        ("page" = Option<u32>, Query, description = "1-based page number, default 1"),
        ("limit" = Option<u32>, Query, description = "Page size, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status (UNREAD, READ, ARCHIVED, IN_PROGRESS, COMPLETED, URGENT)"),
        ("type" = Option<String>, Query, description = "Filter by message type (REQUEST, CONTACT, REVIEW, SYSTEM)"),
        ("priority" = Option<String>, Query, description = "Filter by priority (LOW, NORMAL, HIGH, URGENT)"),
        ("search" = Option<String>, Query, description = "Case-insensitive substring match over sender name, sender phone, subject and content")
    ),
    responses(
        (status = 200, description = "Paginated inbox listing", body = MessagesPage),
        (status = 500, description = "Storage failure", body = crate::models::common::ApiError)
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<MessagesPage>, ErrorResponse> {
    let (messages, pagination) = store::get_messages(&state.db, &query)
        .await
        .map_err(internal_error)?;
    Ok(Json(MessagesPage {
        success: true,
        messages,
        pagination,
    }))
}

#[utoipa::path(
    post,
    path = "/messages",
    tag = "messages",
    request_body = CreateMessage,
    responses(
        (status = 200, description = "Message created", body = MessageEnvelope),
        (status = 400, description = "Missing or invalid fields", body = crate::models::common::ApiError),
        (status = 500, description = "Storage failure", body = crate::models::common::ApiError)
    )
)]
pub async fn create_message(
    State(state): State<AppState>,
    Json(payload): Json<JsonValue>,
) -> Result<Json<MessageEnvelope>, ErrorResponse> {
    let input: CreateMessage = serde_json::from_value(payload)
        .map_err(|err| bad_request(format!("Invalid message payload: {err}")))?;
    if input.sender_name.trim().is_empty()
        || input.sender_phone.trim().is_empty()
        || input.subject.trim().is_empty()
        || input.content.trim().is_empty()
    {
        return Err(bad_request("Missing required fields"));
    }

    let message = store::create_message(&state.db, input)
        .await
        .map_err(internal_error)?;

    // Best-effort notification; the create already succeeded.
    if state.cfg.notify_base_url.is_some() {
        let state = state.clone();
        let message = message.clone();
        tokio::spawn(async move {
            if let Err(err) =
                notify::send_new_message_notification(&state.http, &state.cfg, &message).await
            {
                warn!("Failed to send new-message notification: {err}");
            }
        });
    }

    Ok(Json(MessageEnvelope {
        success: true,
        message,
    }))
}

#[utoipa::path(
    patch,
    path = "/messages/{id}",
    tag = "messages",
    params(("id" = String, Path, description = "Message id")),
    request_body = PatchMessage,
    responses(
        (status = 200, description = "Updated message", body = MessageEnvelope),
        (status = 400, description = "Unknown action or missing status", body = crate::models::common::ApiError),
        (status = 500, description = "Unknown id or storage failure", body = crate::models::common::ApiError)
    )
)]
pub async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<JsonValue>,
) -> Result<Json<MessageEnvelope>, ErrorResponse> {
    let patch: PatchMessage = serde_json::from_value(payload)
        .map_err(|err| bad_request(format!("Invalid patch payload: {err}")))?;

    let result = match patch.action.as_str() {
        "markAsRead" => store::mark_as_read(&state.db, &id).await,
        "archive" => store::archive_message(&state.db, &id).await,
        "updateStatus" => {
            let status = patch.status.ok_or_else(|| bad_request("Missing status"))?;
            store::update_message_status(&state.db, &id, status).await
        }
        _ => return Err(bad_request("Invalid action")),
    };

    let message = result.map_err(internal_error)?;
    Ok(Json(MessageEnvelope {
        success: true,
        message,
    }))
}

#[utoipa::path(
    delete,
    path = "/messages/{id}",
    tag = "messages",
    params(("id" = String, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message removed", body = Ack),
        (status = 500, description = "Unknown id or storage failure", body = crate::models::common::ApiError)
    )
)]
pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, ErrorResponse> {
    store::delete_message(&state.db, &id)
        .await
        .map_err(internal_error)?;
    Ok(Json(Ack::ok()))
}

#[utoipa::path(
    patch,
    path = "/messages/batch",
    tag = "messages",
    request_body = BatchPatch,
    responses(
        (status = 200, description = "Bulk update applied", body = BatchResult),
        (status = 400, description = "Missing ids, unknown action or missing status", body = crate::models::common::ApiError),
        (status = 500, description = "Storage failure", body = crate::models::common::ApiError)
    )
)]
pub async fn batch_update_messages(
    State(state): State<AppState>,
    Json(payload): Json<JsonValue>,
) -> Result<Json<BatchResult>, ErrorResponse> {
    let patch: BatchPatch = serde_json::from_value(payload)
        .map_err(|err| bad_request(format!("Invalid batch payload: {err}")))?;

    let ids = patch.message_ids.unwrap_or_default();
    if ids.is_empty() {
        return Err(bad_request("Invalid message ids"));
    }

    let result = match patch.action.as_str() {
        "markAsRead" => store::mark_multiple_as_read(&state.db, &ids).await,
        "archive" => store::archive_multiple(&state.db, &ids).await,
        "updateStatus" => {
            let status = patch.status.ok_or_else(|| bad_request("Missing status"))?;
            store::update_multiple_status(&state.db, &ids, status).await
        }
        _ => return Err(bad_request("Invalid action")),
    };

    let updated = result.map_err(internal_error)?;
    Ok(Json(BatchResult {
        success: true,
        updated,
    }))
}

#[utoipa::path(
    get,
    path = "/messages/stats",
    tag = "messages",
    responses(
        (status = 200, description = "Inbox counts", body = StatsEnvelope),
        (status = 500, description = "Storage failure", body = crate::models::common::ApiError)
    )
)]
pub async fn message_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsEnvelope>, ErrorResponse> {
    let stats = store::get_message_stats(&state.db)
        .await
        .map_err(internal_error)?;
    Ok(Json(StatsEnvelope {
        success: true,
        stats,
    }))
}
