pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{marker::PhantomData, sync::Arc, time::Duration};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::Resource;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("could not encode document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("malformed document {id}: {source}")]
    Decode {
        id: Uuid,
        #[source]
        source: serde_json::Error,
    },
}

/// A stored document before it is bound to a concrete resource type.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: Uuid,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Schema-less collection store keyed by document id.
///
/// Updates overwrite the whole body. `find_by_id_and_update` and
/// `find_by_id_and_delete` return `None` when no document has the id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError>;

    async fn find_by_id(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<RawDocument>, StoreError>;

    async fn insert(&self, collection: &str, body: Value) -> Result<RawDocument, StoreError>;

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: Uuid,
        body: Value,
    ) -> Result<Option<RawDocument>, StoreError>;

    async fn find_by_id_and_delete(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<RawDocument>, StoreError>;

    /// Round-trip to the backing store, used by readiness checks
    async fn ping(&self) -> Result<Duration, StoreError>;
}

/// A typed document as it goes over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<T: Resource> Document<T> {
    fn from_raw(raw: RawDocument) -> Result<Self, StoreError> {
        let fields = serde_json::from_value(raw.body).map_err(|source| StoreError::Decode {
            id: raw.id,
            source,
        })?;
        Ok(Self {
            id: raw.id,
            fields,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

/// Typed view over one collection of a [`DocumentStore`].
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    _resource: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _resource: PhantomData,
        }
    }
}

impl<T: Resource> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _resource: PhantomData,
        }
    }

    pub async fn list(&self) -> Result<Vec<Document<T>>, StoreError> {
        self.store
            .find(T::COLLECTION)
            .await?
            .into_iter()
            .map(Document::from_raw)
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Document<T>>, StoreError> {
        self.store
            .find_by_id(T::COLLECTION, id)
            .await?
            .map(Document::from_raw)
            .transpose()
    }

    pub async fn create(&self, fields: &T) -> Result<Document<T>, StoreError> {
        let body = serde_json::to_value(fields).map_err(StoreError::Encode)?;
        let raw = self.store.insert(T::COLLECTION, body).await?;
        Document::from_raw(raw)
    }

    pub async fn update(&self, id: Uuid, fields: &T) -> Result<Option<Document<T>>, StoreError> {
        let body = serde_json::to_value(fields).map_err(StoreError::Encode)?;
        self.store
            .find_by_id_and_update(T::COLLECTION, id, body)
            .await?
            .map(Document::from_raw)
            .transpose()
    }

    pub async fn delete(&self, id: Uuid) -> Result<Option<Document<T>>, StoreError> {
        self.store
            .find_by_id_and_delete(T::COLLECTION, id)
            .await?
            .map(Document::from_raw)
            .transpose()
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    /// Reads pool settings from the environment. Returns `None` when
    /// `DATABASE_URL` is not set.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;
        Some(Self {
            url,
            ..Self::default()
        })
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/panel".to_string()),
            max_connections: std::env::var("DB_POOL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_POOL_MIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!(
        "Database URL: {}",
        config.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*"
        )
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}
