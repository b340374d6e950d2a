use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::utils::storage_file_name;

#[derive(Debug, Clone, Copy)]
pub enum UploadKind {
    Audio,
    Photo,
}

impl UploadKind {
    fn subdir(self) -> &'static str {
        match self {
            UploadKind::Audio => "audio",
            UploadKind::Photo => "photos",
        }
    }
}

/// Write an uploaded file under the upload dir and return its public URL
/// path (`/uploads/{kind}/{millis}-{name}`).
///
/// Two uploads of the same filename in the same millisecond collide; the
/// second write wins. Accepted for this traffic.
pub async fn save_upload(
    upload_dir: &str,
    kind: UploadKind,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, std::io::Error> {
    let file_name = storage_file_name(Utc::now().timestamp_millis(), original_name);
    let dir = Path::new(upload_dir).join(kind.subdir());
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(&file_name), bytes).await?;

    let url = format!("/uploads/{}/{}", kind.subdir(), file_name);
    info!("Upload stored: {url}");
    Ok(url)
}
