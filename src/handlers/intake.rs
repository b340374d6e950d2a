use thiserror::Error;
use tracing::{info, warn};

use crate::models::message::{CreateMessage, Message, MessagePriority, MessageType};
use crate::models::request::{Customer, IntakeSubmission, RequestDetail, RequestType};
use crate::services::messages::{self, StoreError};
use crate::services::uploads::{self, UploadKind};
use crate::services::{requests, transcribe};
use crate::utils::parse_position;
use crate::AppState;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("name is required")]
    MissingName,
    #[error("phone number is required")]
    MissingPhone,
    #[error("file upload failed: {0}")]
    Upload(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl IntakeError {
    /// Input problems get a 400; everything else is a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, IntakeError::MissingName | IntakeError::MissingPhone)
    }
}

#[derive(Debug)]
pub struct IntakeOutcome {
    pub request: RequestDetail,
    pub message: Message,
}

/// Turn an intake form submission into a customer, a ticket, and a linked
/// inbox message.
///
/// Validation happens before any side effect. The phone number is the
/// customer's natural key, so the whole flow holds the per-phone lock; a
/// repeat submission reuses the existing customer instead of duplicating it.
pub async fn dispatch_intake(
    state: &AppState,
    submission: IntakeSubmission,
) -> Result<IntakeOutcome, IntakeError> {
    let name = non_blank(submission.name.as_deref()).ok_or(IntakeError::MissingName)?;
    let phone = non_blank(submission.phone.as_deref()).ok_or(IntakeError::MissingPhone)?;

    // Malformed positions are dropped, not rejected.
    let coordinates = submission.position.as_deref().and_then(parse_position);
    let kind = match submission.input_type.as_deref() {
        Some("audio") => RequestType::Audio,
        _ => RequestType::Text,
    };

    let _guard = state.phone_locks.lock(phone.to_string()).await;

    let customer = requests::find_or_create_customer(
        &state.db,
        name,
        phone,
        non_blank(submission.neighborhood.as_deref()),
        &state.cfg.default_city,
        coordinates,
    )
    .await?;

    let mut audio_url: Option<String> = None;
    if let Some((file_name, bytes)) = &submission.audio {
        if !bytes.is_empty() {
            audio_url = Some(
                uploads::save_upload(&state.cfg.upload_dir, UploadKind::Audio, file_name, bytes)
                    .await?,
            );
        }
    }
    let mut photo_url: Option<String> = None;
    if let Some((file_name, bytes)) = &submission.photo {
        if !bytes.is_empty() {
            photo_url = Some(
                uploads::save_upload(&state.cfg.upload_dir, UploadKind::Photo, file_name, bytes)
                    .await?,
            );
        }
    }

    let description = match kind {
        RequestType::Text => non_blank(submission.description.as_deref()),
        RequestType::Audio => None,
    };

    let request = requests::create_request(
        &state.db,
        &customer.id,
        kind,
        description,
        audio_url.as_deref(),
        photo_url.as_deref(),
    )
    .await?;

    let message = messages::create_message(
        &state.db,
        CreateMessage {
            request_id: Some(request.id.clone()),
            kind: MessageType::Request,
            sender_name: customer.name.clone(),
            sender_phone: customer.phone.clone(),
            sender_email: None,
            subject: format!("New request - {}", customer.name),
            content: message_content(&customer, kind, description, coordinates, &audio_url, &photo_url),
            priority: Some(MessagePriority::High),
            audio_url: audio_url.clone(),
            photo_url: photo_url.clone(),
        },
    )
    .await?;

    if let Some(audio_url) = audio_url {
        spawn_transcription(state.clone(), request.id.clone(), audio_url);
    }

    Ok(IntakeOutcome {
        request: RequestDetail {
            request,
            customer,
            technician: None,
        },
        message,
    })
}

/// Best-effort transcript, off the request/response path. Failures are
/// logged and never reach the submitter.
fn spawn_transcription(state: AppState, request_id: String, audio_url: String) {
    if state.cfg.transcribe_base_url.is_none() {
        return;
    }
    tokio::spawn(async move {
        match transcribe::transcribe_audio(&state.http, &state.cfg, &audio_url).await {
            Ok(Some(text)) => {
                if let Err(err) = requests::set_transcription(&state.db, &request_id, &text).await {
                    warn!("Failed to store transcription for {request_id}: {err}");
                }
            }
            Ok(None) => info!("Transcription service returned no text for {request_id}"),
            Err(err) => warn!("Transcription failed for {request_id}: {err}"),
        }
    });
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn message_content(
    customer: &Customer,
    kind: RequestType,
    description: Option<&str>,
    coordinates: Option<(f64, f64)>,
    audio_url: &Option<String>,
    photo_url: &Option<String>,
) -> String {
    let mut content = String::from("New service request:\n\n");
    content.push_str(&format!("Customer: {}\n", customer.name));
    content.push_str(&format!("Phone: {}\n", customer.phone));
    if let Some(neighborhood) = &customer.neighborhood {
        content.push_str(&format!("Neighborhood: {neighborhood}\n"));
    }
    if let Some((lat, lng)) = coordinates {
        content.push_str(&format!("Position: {lat}, {lng}\n"));
    }
    content.push_str(&format!(
        "Type: {}\n",
        match kind {
            RequestType::Text => "Text",
            RequestType::Audio => "Audio",
        }
    ));
    if let Some(description) = description {
        content.push_str(&format!("\nDescription:\n{description}"));
    }
    if audio_url.is_some() {
        content.push_str("\n\nVoice message available in the request.");
    }
    if photo_url.is_some() {
        content.push_str("\n\nPhoto attached to the request.");
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::MessageStatus;
    use crate::models::request::RequestStatus;
    use crate::synch::mutex_swapper::MutexSwapper;
    use crate::config::Config;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    async fn state(upload_dir: &str) -> AppState {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        crate::db::init_schema(&db).await.expect("schema");
        AppState {
            cfg: Config {
                app_host: "127.0.0.1".to_string(),
                app_port: 0,
                database_url: "sqlite::memory:".to_string(),
                upload_dir: upload_dir.to_string(),
                default_city: "Bouaké".to_string(),
                transcribe_base_url: None,
                transcribe_path: "/transcriptions".to_string(),
                notify_base_url: None,
            },
            db,
            http: reqwest::Client::new(),
            phone_locks: Arc::new(MutexSwapper::new()),
        }
    }

    fn submission() -> IntakeSubmission {
        IntakeSubmission {
            name: Some("KBlms".to_string()),
            phone: Some("+2250140916600".to_string()),
            input_type: Some("text".to_string()),
            description: Some("panne électrique".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn text_submission_produces_request_and_linked_message() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path().to_str().unwrap()).await;

        let outcome = dispatch_intake(&state, submission()).await.unwrap();

        assert_eq!(outcome.request.request.status, RequestStatus::New);
        assert_eq!(outcome.request.customer.name, "KBlms");
        assert_eq!(outcome.request.customer.city, "Bouaké");

        let message = &outcome.message;
        assert_eq!(message.kind, MessageType::Request);
        assert_eq!(message.priority, MessagePriority::High);
        assert_eq!(message.status, MessageStatus::Unread);
        assert!(message.subject.contains("KBlms"));
        assert!(message.content.contains("panne électrique"));
        assert_eq!(message.request_id.as_deref(), Some(outcome.request.request.id.as_str()));
    }

    #[tokio::test]
    async fn repeat_phone_reuses_the_customer() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path().to_str().unwrap()).await;

        let first = dispatch_intake(&state, submission()).await.unwrap();
        let second = dispatch_intake(&state, submission()).await.unwrap();
        assert_eq!(first.request.customer.id, second.request.customer.id);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn missing_name_or_phone_fails_before_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path().to_str().unwrap()).await;

        let mut no_name = submission();
        no_name.name = Some("   ".to_string());
        let err = dispatch_intake(&state, no_name).await.unwrap_err();
        assert!(matches!(err, IntakeError::MissingName));
        assert!(err.is_client_error());

        let mut no_phone = submission();
        no_phone.phone = None;
        let err = dispatch_intake(&state, no_phone).await.unwrap_err();
        assert!(matches!(err, IntakeError::MissingPhone));

        let requests: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM requests")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(requests, 0);
    }

    #[tokio::test]
    async fn malformed_position_is_dropped_silently() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path().to_str().unwrap()).await;

        let mut with_position = submission();
        with_position.position = Some("somewhere downtown".to_string());
        let outcome = dispatch_intake(&state, with_position).await.unwrap();
        assert!(outcome.request.customer.latitude.is_none());
        assert!(outcome.request.customer.longitude.is_none());
    }

    #[tokio::test]
    async fn audio_submission_stores_the_file_and_url() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path().to_str().unwrap()).await;

        let mut with_audio = submission();
        with_audio.input_type = Some("audio".to_string());
        with_audio.description = None;
        with_audio.audio = Some(("note.ogg".to_string(), b"voice".to_vec()));
        let outcome = dispatch_intake(&state, with_audio).await.unwrap();

        let audio_url = outcome.request.request.audio_url.as_deref().unwrap();
        assert!(audio_url.starts_with("/uploads/audio/"));
        assert_eq!(outcome.message.audio_url.as_deref(), Some(audio_url));
        assert!(outcome.message.content.contains("Voice message"));
    }
}
