/*!
 * Image Hosting
 * Staging of uploaded files and the hosts that turn them into public URLs
 */
pub mod cloudinary;
pub mod local;

use async_trait::async_trait;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

pub use cloudinary::{CloudinaryConfig, CloudinaryImageHost};
pub use local::LocalImageHost;

#[derive(Error, Debug)]
pub enum ImageHostError {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("image host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Stores a staged upload somewhere it can be fetched from and returns its URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, staged: &StagedUpload) -> Result<String, ImageHostError>;
}

/// Image formats accepted for blog posts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some(ImageFormat::Jpeg),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some(ImageFormat::Png),
        _ => None,
    }
}

/// Checks an uploaded file before it is staged. The error is user-facing.
pub fn sniff_image(bytes: &[u8], max_bytes: usize) -> Result<ImageFormat, String> {
    if bytes.is_empty() {
        return Err("Empty file".to_string());
    }
    if bytes.len() > max_bytes {
        return Err(format!(
            "File too large. Maximum size is {} bytes.",
            max_bytes
        ));
    }
    detect_format(bytes).ok_or_else(|| "Unsupported file type. Allowed: JPEG, PNG.".to_string())
}

/// An uploaded file written to the staging directory.
///
/// The file is removed when the value is dropped, whether or not the
/// transfer to the image host succeeded.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    format: ImageFormat,
    size: usize,
}

impl StagedUpload {
    pub async fn write(
        staging_dir: &Path,
        bytes: &[u8],
        format: ImageFormat,
    ) -> Result<Self, ImageHostError> {
        tokio::fs::create_dir_all(staging_dir).await?;

        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(staging_dir)?;
        tokio::fs::write(file.path(), bytes).await?;

        tracing::debug!(path = %file.path().display(), size = bytes.len(), "staged upload");

        Ok(Self {
            file,
            format,
            size: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Removes the staged file now, logging instead of failing if it is gone.
    pub fn discard(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove staged upload");
        }
    }
}
