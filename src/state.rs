use std::{path::PathBuf, sync::Arc};

use crate::config::{AppConfig, ImageHostConfig, UploadConfig};
use crate::db::{self, models::COLLECTIONS, Collection, DocumentStore, MemoryStore, PgStore, Resource};
use crate::images::{CloudinaryImageHost, ImageHost, LocalImageHost};

/// URL path under which locally hosted images are served
pub const UPLOADS_PATH: &str = "/uploads";

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub images: Arc<dyn ImageHost>,
    pub uploads: UploadConfig,
    /// Directory served under [`UPLOADS_PATH`], set when images stay on disk
    pub serve_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        images: Arc<dyn ImageHost>,
        uploads: UploadConfig,
    ) -> Self {
        Self {
            store,
            images,
            uploads,
            serve_dir: None,
        }
    }

    /// State that keeps uploaded images on local disk and serves them itself.
    pub fn with_local_images(store: Arc<dyn DocumentStore>, uploads: UploadConfig) -> Self {
        let host = LocalImageHost::new(uploads.public_dir.clone(), UPLOADS_PATH);
        Self {
            store,
            images: Arc::new(host),
            serve_dir: Some(uploads.public_dir.clone()),
            uploads,
        }
    }

    /// Connects the configured store and image host. Falls back to the
    /// in-memory store when the database is not configured or unreachable.
    pub async fn from_config(config: &AppConfig) -> Self {
        let store = connect_store(config).await;

        match &config.image_host {
            ImageHostConfig::Cloudinary(cloudinary) => {
                tracing::info!(cloud = %cloudinary.cloud_name, "Using Cloudinary image host");
                let host = CloudinaryImageHost::new(cloudinary.clone());
                Self::new(store, Arc::new(host), config.uploads.clone())
            }
            ImageHostConfig::Local => {
                tracing::info!(
                    dir = %config.uploads.public_dir.display(),
                    "Cloudinary not configured. Storing images locally."
                );
                Self::with_local_images(store, config.uploads.clone())
            }
        }
    }

    pub fn collection<T: Resource>(&self) -> Collection<T> {
        Collection::new(self.store.clone())
    }
}

async fn connect_store(config: &AppConfig) -> Arc<dyn DocumentStore> {
    let Some(db_config) = &config.database else {
        tracing::info!("DATABASE_URL not set. Running on the in-memory store.");
        return Arc::new(MemoryStore::new());
    };

    let pool = match db::init_pool(db_config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database pool: {}. Continuing on the in-memory store.",
                e
            );
            return Arc::new(MemoryStore::new());
        }
    };

    let store = PgStore::new(pool);
    if let Err(e) = store.run_migrations(COLLECTIONS).await {
        tracing::error!("Failed to run database migrations: {}", e);
    }
    Arc::new(store)
}
