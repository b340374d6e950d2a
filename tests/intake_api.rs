mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ops_console::app;
use serde_json::json;
use tower::ServiceExt;

use common::{body_json, get_request, multipart_form, test_state};

fn intake_request(content_type: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/requests")
        .header("content-type", content_type)
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn text_submission_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path().to_str().unwrap()).await;
    let pool = state.db.clone();
    let app = app(state);

    let (content_type, body) = multipart_form(
        &[
            ("name", "KBlms"),
            ("phone", "+2250140916600"),
            ("inputType", "text"),
            ("description", "panne électrique"),
        ],
        &[],
    );
    let response = app
        .clone()
        .oneshot(intake_request(&content_type, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let envelope = body_json(response).await;

    assert_eq!(envelope["success"], json!(true));
    assert_eq!(envelope["request"]["status"], json!("NEW"));
    assert_eq!(envelope["request"]["customer"]["name"], json!("KBlms"));
    assert_eq!(envelope["request"]["customer"]["city"], json!("Bouaké"));

    assert_eq!(envelope["message"]["type"], json!("REQUEST"));
    assert_eq!(envelope["message"]["priority"], json!("HIGH"));
    assert_eq!(envelope["message"]["status"], json!("UNREAD"));
    let subject = envelope["message"]["subject"].as_str().unwrap();
    assert!(subject.contains("KBlms"));
    assert!(envelope["message"]["content"]
        .as_str()
        .unwrap()
        .contains("panne électrique"));

    // The message is correlated to the request.
    assert_eq!(envelope["message"]["requestId"], envelope["request"]["id"]);

    // A second submission from the same phone reuses the customer.
    let (content_type, body) = multipart_form(
        &[
            ("name", "KBlms"),
            ("phone", "+2250140916600"),
            ("inputType", "text"),
            ("description", "autre panne"),
        ],
        &[],
    );
    let response = app
        .clone()
        .oneshot(intake_request(&content_type, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(customers, 1);
    let requests: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM requests")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(requests, 2);
}

#[tokio::test]
async fn missing_phone_is_rejected_before_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path().to_str().unwrap()).await;
    let pool = state.db.clone();
    let app = app(state);

    let (content_type, body) = multipart_form(
        &[("name", "KBlms"), ("inputType", "text"), ("description", "x")],
        &[],
    );
    let response = app
        .clone()
        .oneshot(intake_request(&content_type, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], json!(false));

    let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(customers, 0);
}

#[tokio::test]
async fn photo_upload_is_stored_under_the_upload_dir() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(test_state(dir.path().to_str().unwrap()).await);

    let (content_type, body) = multipart_form(
        &[
            ("name", "KBlms"),
            ("phone", "+2250140916600"),
            ("inputType", "text"),
            ("description", "compteur qui fume"),
            ("position", "7.6898,-5.0303"),
        ],
        &[("photo", "compteur.jpg", "image/jpeg", b"jpeg-bytes")],
    );
    let response = app
        .clone()
        .oneshot(intake_request(&content_type, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let envelope = body_json(response).await;

    let photo_url = envelope["request"]["photoUrl"].as_str().unwrap();
    assert!(photo_url.starts_with("/uploads/photos/"));
    assert!(photo_url.ends_with("-compteur.jpg"));

    let file_name = photo_url.rsplit('/').next().unwrap();
    let stored = dir.path().join("photos").join(file_name);
    assert_eq!(std::fs::read(stored).unwrap(), b"jpeg-bytes");

    // Position made it onto the customer.
    assert_eq!(envelope["request"]["customer"]["latitude"], json!(7.6898));
    assert_eq!(envelope["request"]["customer"]["longitude"], json!(-5.0303));
}

#[tokio::test]
async fn request_listing_embeds_customer_and_filters() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(test_state(dir.path().to_str().unwrap()).await);

    let (content_type, body) = multipart_form(
        &[
            ("name", "KBlms"),
            ("phone", "+2250140916600"),
            ("inputType", "text"),
            ("description", "panne électrique"),
        ],
        &[],
    );
    app.clone()
        .oneshot(intake_request(&content_type, body))
        .await
        .unwrap();

    let listing = body_json(app.clone().oneshot(get_request("/requests")).await.unwrap()).await;
    let listing = listing.as_array().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["customer"]["phone"], json!("+2250140916600"));
    assert_eq!(listing[0]["technician"], json!(null));

    let filtered = body_json(
        app.clone()
            .oneshot(get_request("/requests?status=COMPLETED"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(filtered.as_array().unwrap().len(), 0);

    let unfiltered = body_json(
        app.clone()
            .oneshot(get_request("/requests?status=all&technicianId=all"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(unfiltered.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn intake_produces_an_inbox_message_visible_in_the_listing() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(test_state(dir.path().to_str().unwrap()).await);

    let (content_type, body) = multipart_form(
        &[
            ("name", "KBlms"),
            ("phone", "+2250140916600"),
            ("inputType", "text"),
            ("description", "panne électrique"),
        ],
        &[],
    );
    app.clone()
        .oneshot(intake_request(&content_type, body))
        .await
        .unwrap();

    let page = body_json(
        app.clone()
            .oneshot(get_request("/messages?type=REQUEST&priority=HIGH"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(page["pagination"]["total"], json!(1));
    let message = &page["messages"][0];
    assert_eq!(message["senderName"], json!("KBlms"));
    // The embedded request detail rides along in the listing.
    assert_eq!(message["request"]["customer"]["phone"], json!("+2250140916600"));
}

#[tokio::test]
async fn notification_endpoint_logs_and_echoes() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(test_state(dir.path().to_str().unwrap()).await);

    let response = app
        .clone()
        .oneshot(get_request("/notifications"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "POST",
            "/notifications",
            json!({ "message": { "id": "x" }, "type": "new_message" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ack = body_json(response).await;
    assert_eq!(ack["success"], json!(true));
    assert_eq!(ack["message"], json!("Notification sent"));
    assert!(ack["timestamp"].is_string());
}
