//! In-process document store. Used when no `DATABASE_URL` is configured and
//! by the test suites.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::{collections::HashMap, time::Duration};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, RawDocument, StoreError};

/// Documents kept in insertion order per collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<RawDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<RawDocument>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn insert(&self, collection: &str, body: Value) -> Result<RawDocument, StoreError> {
        let now = Utc::now();
        let doc = RawDocument {
            id: Uuid::new_v4(),
            body,
            created_at: now,
            updated_at: now,
        };

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());

        Ok(doc)
    }

    async fn find_by_id_and_update(
        &self,
        collection: &str,
        id: Uuid,
        body: Value,
    ) -> Result<Option<RawDocument>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
        else {
            return Ok(None);
        };

        doc.body = body;
        doc.updated_at = Utc::now();
        Ok(Some(doc.clone()))
    }

    async fn find_by_id_and_delete(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<RawDocument>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };

        Ok(docs
            .iter()
            .position(|d| d.id == id)
            .map(|index| docs.remove(index)))
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        Ok(Duration::ZERO)
    }
}
