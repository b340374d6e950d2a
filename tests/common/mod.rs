#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use ops_console::config::Config;
use ops_console::synch::mutex_swapper::MutexSwapper;
use ops_console::{db, AppState};
use sqlx::sqlite::SqlitePoolOptions;

pub async fn test_state(upload_dir: &str) -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    db::init_schema(&pool).await.expect("schema");

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
        db: pool,
        http: reqwest::Client::new(),
        phone_locks: Arc::new(MutexSwapper::new()),
    }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// Hand-rolled multipart form body for intake tests.
pub fn multipart_form(
    text_fields: &[(&str, &str)],
    file_fields: &[(&str, &str, &str, &[u8])],
) -> (String, Vec<u8>) {
    let boundary = "ops-console-test-boundary";
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in text_fields {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    for (name, file_name, content_type, bytes) in file_fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
