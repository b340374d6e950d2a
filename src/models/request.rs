use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Text,
    Audio,
}

/// Ticket status. Intake only ever writes NEW; the remaining states belong
/// to the staff assignment tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    New,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

/// A contact, deduplicated by phone number.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub neighborhood: Option<String>,
    pub city: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    pub id: String,
    pub name: String,
    pub phone: String,
}

/// A service ticket row as stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: String,
    pub customer_id: String,
    pub technician_id: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: RequestType,
    pub description: Option<String>,
    /// Filled asynchronously for audio requests; absent until then.
    pub transcription: Option<String>,
    pub audio_url: Option<String>,
    pub photo_url: Option<String>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// A request with its owning customer and assigned technician embedded,
/// the shape every read path returns.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: ServiceRequest,
    pub customer: Customer,
    pub technician: Option<Technician>,
}

/// Fields accepted by the intake form, already pulled out of the multipart
/// body. File fields carry the original filename and the raw bytes.
#[derive(Debug, Default)]
pub struct IntakeSubmission {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub neighborhood: Option<String>,
    pub position: Option<String>,
    pub input_type: Option<String>,
    pub description: Option<String>,
    pub audio: Option<(String, Vec<u8>)>,
    pub photo: Option<(String, Vec<u8>)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestListQuery {
    pub status: Option<String>,
    pub technician_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IntakeEnvelope {
    pub success: bool,
    pub request: RequestDetail,
    pub message: crate::models::message::Message,
}
