pub mod apidoc;
pub mod config;
pub mod db;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod synch;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch},
    Router,
};
use sqlx::sqlite::SqlitePool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use synch::mutex_swapper::MutexSwapper;

/// Uploaded voice notes stay small; this bounds the whole multipart body.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub db: SqlitePool,
    pub http: reqwest::Client,
    /// Per-phone-number locks serializing customer find-or-create.
    pub phone_locks: Arc<MutexSwapper<String>>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(
            "/messages",
            get(routes::messages::list_messages).post(routes::messages::create_message),
        )
        .route("/messages/batch", patch(routes::messages::batch_update_messages))
        .route("/messages/stats", get(routes::messages::message_stats))
        .route(
            "/messages/:id",
            patch(routes::messages::update_message).delete(routes::messages::delete_message),
        )
        .route(
            "/requests",
            get(routes::requests::list_requests).post(routes::requests::create_request),
        )
        .route(
            "/notifications",
            get(routes::notifications::notification_status)
                .post(routes::notifications::post_notification),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", apidoc::ApiDoc::openapi()))
        .with_state(state)
}
