use async_trait::async_trait;
use base64::Engine;
use std::path::{Path, PathBuf};

use crate::models::{Image, ImageUpload};
use crate::utils::AppError;

/// URL prefix under which locally stored uploads are served.
pub const UPLOADS_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists the upload and returns where it can be fetched.
    async fn store(&self, upload: &ImageUpload) -> Result<Image, AppError>;

    /// Best-effort removal; `false` when nothing was deleted.
    async fn remove(&self, image: &Image) -> bool;

    /// Raw bytes of a stored file, `None` if unknown.
    async fn load(&self, filename: &str) -> Result<Option<Vec<u8>>, AppError>;
}

/// Uploads kept on local disk and served under `/uploads`.
pub struct LocalImageStore {
    dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Only bare generated names resolve inside the upload directory.
    fn path_for(&self, filename: &str) -> Option<PathBuf> {
        let is_bare = !filename.is_empty()
            && filename
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !filename.starts_with('.');
        is_bare.then(|| self.dir.join(filename))
    }

    fn is_local(image: &Image) -> bool {
        image.url.starts_with(&format!("{}/", UPLOADS_PREFIX)) && !image.is_placeholder()
    }
}

fn extension_of(filename: &str) -> Result<String, AppError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(AppError::InvalidRequest(format!(
            "Failed to process image upload: unsupported file type '{}'",
            filename
        )))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, upload: &ImageUpload) -> Result<Image, AppError> {
        let extension = extension_of(&upload.filename)?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(upload.data.trim())
            .map_err(|e| AppError::InvalidRequest(format!("Failed to process image upload: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::InvalidRequest(
                "Failed to process image upload: empty file".to_string(),
            ));
        }

        let filename = format!("{}.{}", uuid::Uuid::new_v4().simple(), extension);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;
        tokio::fs::write(self.dir.join(&filename), &bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write upload: {}", e)))?;

        log::info!("🖼️  Stored upload '{}' as {} ({} bytes)", upload.filename, filename, bytes.len());

        Ok(Image {
            url: format!("{}/{}", UPLOADS_PREFIX, filename),
            filename,
        })
    }

    async fn remove(&self, image: &Image) -> bool {
        // Externally hosted images and the placeholder are left alone
        if !Self::is_local(image) {
            return false;
        }
        let Some(path) = self.path_for(&image.filename) else {
            return false;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("🗑️  Removed old image {}", image.filename);
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                log::error!("❌ Error deleting old image {}: {}", image.filename, e);
                false
            }
        }
    }

    async fn load(&self, filename: &str) -> Result<Option<Vec<u8>>, AppError> {
        let Some(path) = self.path_for(filename) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Internal(format!("Failed to read upload: {}", e))),
        }
    }
}

/// Smaller preview for the edit form; only Cloudinary URLs can be resized.
pub fn preview_url(url: &str) -> String {
    if url.contains("res.cloudinary.com") {
        url.replacen("/upload", "/upload/w_250", 1)
    } else {
        url.to_string()
    }
}

pub fn content_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Ok("png") => "image/png",
        Ok("webp") => "image/webp",
        Ok("gif") => "image/gif",
        Ok(_) => "image/jpeg",
        Err(_) => "application/octet-stream",
    }
}
