use crate::config::Config;
use crate::error::{ApiError, Result};
use chrono::Utc;
use std::path::Path;
use uuid::Uuid;

pub async fn init_upload_dir(config: &Config) -> std::result::Result<(), anyhow::Error> {
    tokio::fs::create_dir_all(&config.storage.upload_dir).await?;
    Ok(())
}

/// Collision-resistant name: millisecond timestamp plus a random suffix,
/// keeping the original extension so the file is served with the right
/// content type.
pub fn generate_filename(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension
    )
}

/// Writes an uploaded file into the upload directory and returns the
/// public path it will be served under.
pub async fn store_upload(config: &Config, original_name: &str, data: &[u8]) -> Result<String> {
    let filename = generate_filename(original_name);
    let path = Path::new(&config.storage.upload_dir).join(&filename);
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to store upload: {}", e)))?;
    Ok(format!("/uploads/{}", filename))
}

/// Best-effort removal of a previously uploaded file. URLs that do not
/// point into the upload directory are left alone; failures are logged
/// and never surfaced.
pub async fn remove_upload(config: &Config, url: &str) {
    let name = match url.strip_prefix("/uploads/") {
        Some(name) => name,
        None => return,
    };
    // file_name() drops any path components smuggled into the url.
    let file_name = match Path::new(name).file_name() {
        Some(file_name) => file_name,
        None => return,
    };
    let path = Path::new(&config.storage.upload_dir).join(file_name);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        log::warn!("Failed to remove uploaded file {}: {}", path.display(), e);
    }
}
