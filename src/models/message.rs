use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::request::RequestDetail;

/// Where an inbox message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Request,
    Contact,
    Review,
    System,
}

/// Triage status. Deliberately permissive: any status may be written over
/// any other, matching how staff actually move things around the inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Unread,
    Read,
    Archived,
    InProgress,
    Completed,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagePriority {
    Low,
    Normal,
    High,
    Urgent,
}

/// An inbox record. `request` is populated when the message was produced by
/// a service request; it is not a table column.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub request_id: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: MessageType,
    pub sender_name: String,
    pub sender_phone: String,
    pub sender_email: Option<String>,
    pub subject: String,
    pub content: String,
    pub status: MessageStatus,
    pub priority: MessagePriority,
    pub audio_url: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub request: Option<RequestDetail>,
}

/// Payload for creating a message, from `POST /messages` or request intake.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessage {
    pub request_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub sender_name: String,
    pub sender_phone: String,
    pub sender_email: Option<String>,
    pub subject: String,
    pub content: String,
    /// Defaults to NORMAL when omitted.
    pub priority: Option<MessagePriority>,
    pub audio_url: Option<String>,
    pub photo_url: Option<String>,
}

/// Query parameters for the inbox listing. All filters are conjunctive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<MessageStatus>,
    #[serde(rename = "type")]
    pub kind: Option<MessageType>,
    pub priority: Option<MessagePriority>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessagesPage {
    pub success: bool,
    pub messages: Vec<Message>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageEnvelope {
    pub success: bool,
    pub message: Message,
}

/// Counts for the inbox dashboard. The six status counts and `total` are
/// separate queries over the live table; skew between them is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageStats {
    pub total: i64,
    pub unread: i64,
    pub read: i64,
    pub archived: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub urgent: i64,
    pub by_type: std::collections::HashMap<String, i64>,
    pub by_priority: std::collections::HashMap<String, i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsEnvelope {
    pub success: bool,
    pub stats: MessageStats,
}
