use serde::Serialize;

use crate::config::Config;
use crate::models::message::Message;

#[derive(Debug, Serialize)]
struct NotificationOut<'a> {
    message: &'a Message,
    #[serde(rename = "type")]
    kind: &'a str,
}

/// POST a new-message notification to the configured notify endpoint.
/// Fire-and-forget from the caller's point of view: failures are returned
/// for logging and never affect the create that triggered them.
pub async fn send_new_message_notification(
    http: &reqwest::Client,
    cfg: &Config,
    message: &Message,
) -> Result<(), String> {
    let base = cfg
        .notify_base_url
        .as_ref()
        .ok_or_else(|| "notify endpoint not configured".to_string())?;
    let url = base.join("/notifications").map_err(|e| e.to_string())?;

    let payload = NotificationOut {
        message,
        kind: "new_message",
    };

    let res = http
        .post(url)
        .json(&payload)
        .send()
        .await
        .map_err(|e| format!("request error: {e}"))?;
    if !res.status().is_success() {
        return Err(format!("notify status {}", res.status()));
    }
    Ok(())
}
