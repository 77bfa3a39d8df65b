/**
 * Configuration
 * Environment-driven settings for the server, store and image host
 */
use std::{net::SocketAddr, path::PathBuf};

use crate::db::DbConfig;
use crate::images::CloudinaryConfig;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024; // 5MB

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Where incoming files wait for the image host
    pub staging_dir: PathBuf,
    /// Served under `/uploads` when images are kept locally
    pub public_dir: PathBuf,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("public/tmp"),
            public_dir: PathBuf::from("public/uploads"),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ImageHostConfig {
    Local,
    Cloudinary(CloudinaryConfig),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// `None` runs on the in-memory store
    pub database: Option<DbConfig>,
    pub uploads: UploadConfig,
    pub image_host: ImageHostConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = UploadConfig::default();
        let uploads = UploadConfig {
            staging_dir: std::env::var("UPLOAD_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_dir),
            public_dir: std::env::var("UPLOAD_PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            max_bytes: std::env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_bytes),
        };

        let image_host = match CloudinaryConfig::from_env() {
            Some(cloudinary) => ImageHostConfig::Cloudinary(cloudinary),
            None => ImageHostConfig::Local,
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4000),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            database: DbConfig::from_env(),
            uploads,
            image_host,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
