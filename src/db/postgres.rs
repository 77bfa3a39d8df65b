//! PostgreSQL-backed document store: one JSONB table per collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{DocumentStore, RawDocument, StoreError};

lazy_static::lazy_static! {
    /// Collection names double as table names, so keep them to plain identifiers
    static ref COLLECTION_REGEX: Regex = Regex::new(r"^[a-z][a-z0-9_]*$").unwrap();
}

fn table(collection: &str) -> Result<&str, StoreError> {
    if COLLECTION_REGEX.is_match(collection) {
        Ok(collection)
    } else {
        Err(StoreError::InvalidCollection(collection.to_string()))
    }
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    body: Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for RawDocument {
    fn from(row: DocumentRow) -> Self {
        RawDocument {
            id: row.id,
            body: row.body.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the backing table of each collection if it does not exist yet.
    pub async fn run_migrations(&self, collections: &[&str]) -> Result<(), StoreError> {
        tracing::info!("Running database migrations...");

        for collection in collections {
            let table = table(collection)?;

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    body JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at)"
            ))
            .execute(&self.pool)
            .await?;
        }

        tracing::info!("Database migrations completed successfully");

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        let table = table(collection)?;
        let rows = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT id, body, created_at, updated_at FROM {table} ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RawDocument::from).collect())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<RawDocument>, StoreError> {
        let table = table(collection)?;
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT id, body, created_at, updated_at FROM {table} WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RawDocument::from))
    }

    async fn insert(&self, collection: &str, body: Value) -> Result<RawDocument, StoreError> {
        let table = table(collection)?;
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            INSERT INTO {table} (body, created_at, updated_at)
            VALUES ($1, now(), now())
            RETURNING id, body, created_at, updated_at
            "#
        ))
        .bind(Json(body))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: Uuid,
        body: Value,
    ) -> Result<Option<RawDocument>, StoreError> {
        let table = table(collection)?;
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            UPDATE {table}
            SET body = $1, updated_at = now()
            WHERE id = $2
            RETURNING id, body, created_at, updated_at
            "#
        ))
        .bind(Json(body))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RawDocument::from))
    }

    async fn find_by_id_and_delete(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<RawDocument>, StoreError> {
        let table = table(collection)?;
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "DELETE FROM {table} WHERE id = $1 RETURNING id, body, created_at, updated_at"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RawDocument::from))
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::COLLECTIONS;

    #[test]
    fn test_resource_collections_are_valid_tables() {
        for collection in COLLECTIONS {
            assert!(table(collection).is_ok(), "{collection}");
        }
    }

    #[test]
    fn test_table_rejects_injection() {
        assert!(table("blogs; DROP TABLE blogs").is_err());
        assert!(table("Blogs").is_err());
        assert!(table("").is_err());
    }
}
