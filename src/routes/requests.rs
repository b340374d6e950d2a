use axum::{
    extract::{multipart::Field, Multipart, Query, State},
    Json,
};

use crate::handlers::intake;
use crate::models::common::{bad_request, internal_error, ErrorResponse};
use crate::models::request::{IntakeEnvelope, IntakeSubmission, RequestDetail, RequestListQuery};
use crate::services::requests as store;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/requests",
    tag = "requests",
    request_body(content = String, content_type = "multipart/form-data", description = "Intake form: name, phone, neighborhood?, position? (\"lat,lng\"), inputType (text|audio), description?, audio?, photo?"),
    responses(
        (status = 200, description = "Request created with its linked inbox message", body = IntakeEnvelope),
        (status = 400, description = "Missing name or phone, or malformed form", body = crate::models::common::ApiError),
        (status = 500, description = "Storage or upload failure", body = crate::models::common::ApiError)
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IntakeEnvelope>, ErrorResponse> {
    let mut submission = IntakeSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad_request(format!("Invalid multipart payload: {err}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "name" => submission.name = Some(text_field(field).await?),
            "phone" => submission.phone = Some(text_field(field).await?),
            "neighborhood" => submission.neighborhood = Some(text_field(field).await?),
            "position" => submission.position = Some(text_field(field).await?),
            "inputType" => submission.input_type = Some(text_field(field).await?),
            "description" => submission.description = Some(text_field(field).await?),
            "audio" => submission.audio = Some(file_field(field, "audio").await?),
            "photo" => submission.photo = Some(file_field(field, "photo").await?),
            // Unknown form fields are ignored.
            _ => {}
        }
    }

    let outcome = intake::dispatch_intake(&state, submission)
        .await
        .map_err(|err| {
            if err.is_client_error() {
                bad_request(err.to_string())
            } else {
                internal_error(err)
            }
        })?;

    Ok(Json(IntakeEnvelope {
        success: true,
        request: outcome.request,
        message: outcome.message,
    }))
}

#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    params(
        ("status" = Option<String>, Query, description = "Filter by request status; `all` disables the filter"),
        ("technicianId" = Option<String>, Query, description = "Filter by assigned technician; `all` disables the filter")
    ),
    responses(
        (status = 200, description = "Requests with embedded customer and technician, newest first", body = Vec<RequestDetail>),
        (status = 500, description = "Storage failure", body = crate::models::common::ApiError)
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<Vec<RequestDetail>>, ErrorResponse> {
    let requests = store::list_requests(&state.db, &query)
        .await
        .map_err(internal_error)?;
    Ok(Json(requests))
}

async fn text_field(field: Field<'_>) -> Result<String, ErrorResponse> {
    field
        .text()
        .await
        .map_err(|err| bad_request(format!("Invalid form field: {err}")))
}

async fn file_field(field: Field<'_>, fallback: &str) -> Result<(String, Vec<u8>), ErrorResponse> {
    let file_name = field.file_name().unwrap_or(fallback).to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|err| bad_request(format!("Invalid file field: {err}")))?;
    Ok((file_name, bytes.to_vec()))
}
