//! Signed uploads to the Cloudinary image API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::{ImageHost, ImageHostError, StagedUpload};

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const ALLOWED_FORMATS: &str = "jpg,png,jpeg";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub api_base: String,
}

impl CloudinaryConfig {
    /// Reads credentials from the environment. Returns `None` unless all three
    /// of cloud name, key and secret are set.
    pub fn from_env() -> Option<Self> {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Some(Self {
            cloud_name: var("CLOUDINARY_CLOUD_NAME")?,
            api_key: var("CLOUDINARY_API_KEY")?,
            api_secret: var("CLOUDINARY_API_SECRET")?,
            folder: var("CLOUDINARY_FOLDER").unwrap_or_else(|| "public".to_string()),
            api_base: var("CLOUDINARY_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Clone)]
pub struct CloudinaryImageHost {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl CloudinaryImageHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: CloudinaryConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Signs the upload parameters: sorted `key=value` pairs joined by `&`,
    /// followed by the API secret.
    fn sign(&self, timestamp: i64) -> String {
        let to_sign = format!(
            "allowed_formats={}&folder={}&timestamp={}{}",
            ALLOWED_FORMATS, self.config.folder, timestamp, self.config.api_secret
        );
        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl ImageHost for CloudinaryImageHost {
    async fn upload(&self, staged: &StagedUpload) -> Result<String, ImageHostError> {
        let bytes = tokio::fs::read(staged.path()).await?;
        let format = staged.format();
        let timestamp = chrono::Utc::now().timestamp();

        let file = Part::bytes(bytes)
            .file_name(format!("upload.{}", format.extension()))
            .mime_str(format.mime_type())?;

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", self.config.folder.clone())
            .text("allowed_formats", ALLOWED_FORMATS)
            .text("signature", self.sign(timestamp))
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "no error message".to_string());
            return Err(ImageHostError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::info!(url = %uploaded.secure_url, size = staged.size(), "image uploaded to cloudinary");
        Ok(uploaded.secure_url)
    }
}
