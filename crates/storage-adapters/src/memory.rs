//! In-memory document store backed by a concurrent map.
//!
//! Used for development and tests. Contents are lost on restart.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::instrument;

use crate::document::{Document, DocumentKey, DocumentStore, Fields, StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: DashMap<DocumentKey, Fields>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, key: &DocumentKey) -> StoreResult<Option<Fields>> {
        Ok(self.documents.get(key).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self, fields), fields(document = %key))]
    async fn create(&self, key: &DocumentKey, fields: Fields) -> StoreResult<()> {
        match self.documents.entry(key.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists { key: key.clone() }),
            Entry::Vacant(slot) => {
                slot.insert(fields);
                Ok(())
            }
        }
    }

    async fn set(&self, key: &DocumentKey, fields: Fields) -> StoreResult<()> {
        self.documents.insert(key.clone(), fields);
        Ok(())
    }

    async fn update(&self, key: &DocumentKey, fields: Fields) -> StoreResult<()> {
        match self.documents.get_mut(key) {
            Some(mut existing) => {
                existing.extend(fields);
                Ok(())
            }
            None => Err(StoreError::NotFound { key: key.clone() }),
        }
    }

    #[instrument(skip(self), fields(document = %key))]
    async fn delete(&self, key: &DocumentKey) -> StoreResult<()> {
        self.documents
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { key: key.clone() })
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        Ok(self
            .documents
            .iter()
            .filter(|entry| entry.key().collection == collection)
            .map(|entry| Document {
                key: entry.key().clone(),
                fields: entry.value().clone(),
            })
            .collect())
    }
}
