use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use super::{ImageHost, ImageHostError, StagedUpload};

/// Keeps images on local disk; the router serves `public_dir` under `url_prefix`.
#[derive(Debug, Clone)]
pub struct LocalImageHost {
    public_dir: PathBuf,
    url_prefix: String,
}

impl LocalImageHost {
    pub fn new(public_dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            public_dir: public_dir.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageHost for LocalImageHost {
    async fn upload(&self, staged: &StagedUpload) -> Result<String, ImageHostError> {
        tokio::fs::create_dir_all(&self.public_dir).await?;

        let filename = format!("{}.{}", Uuid::new_v4(), staged.format().extension());
        tokio::fs::copy(staged.path(), self.public_dir.join(&filename)).await?;

        tracing::info!("Image stored: {} ({} bytes)", filename, staged.size());
        Ok(format!("{}/{}", self.url_prefix, filename))
    }
}
