use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Serialize)]
struct TranscriptionRequest<'a> {
    audio_url: &'a str,
    /// Context hint forwarded to the transcription model.
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    /// Optional in our tolerant runtime handling
    text: Option<String>,
}

/// Ask the external transcription service for a transcript of an uploaded
/// voice message. Returns `Ok(None)` when the service answered without a
/// transcript; callers treat any failure as best-effort.
pub async fn transcribe_audio(
    http: &reqwest::Client,
    cfg: &Config,
    audio_url: &str,
) -> Result<Option<String>, String> {
    let base = cfg
        .transcribe_base_url
        .as_ref()
        .ok_or_else(|| "transcription service not configured".to_string())?;
    let url = base
        .join(&cfg.transcribe_path)
        .map_err(|e| e.to_string())?;

    let body = TranscriptionRequest {
        audio_url,
        prompt: "Transcribe this voice message describing an electrical service problem, \
                 accurately and concisely.",
    };

    let res = http
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("request error: {e}"))?;
    if !res.status().is_success() {
        return Err(format!("transcription status {}", res.status()));
    }
    let parsed = res
        .json::<TranscriptionResponse>()
        .await
        .map_err(|e| format!("json error: {e}"))?;
    Ok(parsed.text)
}
