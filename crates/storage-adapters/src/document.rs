//! # Document model
//!
//! The schemaless store contract: documents are typed field maps addressed by
//! collection name and id.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use domains::AppError;

/// Address of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey {
    pub collection: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

/// A single stored value. Tagged on the wire so that type mismatches stay
/// detectable after a round trip through a JSON-backed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    /// Pointer to another document.
    Reference(DocumentKey),
    Array(Vec<FieldValue>),
    Map(Fields),
}

impl FieldValue {
    /// Type name used in integrity reports.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Integer(_) => "integer",
            FieldValue::Double(_) => "double",
            FieldValue::String(_) => "string",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Reference(_) => "reference",
            FieldValue::Array(_) => "array",
            FieldValue::Map(_) => "map",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: DocumentKey,
    pub fields: Fields,
}

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {key}")]
    NotFound { key: DocumentKey },

    #[error("document already exists: {key}")]
    AlreadyExists { key: DocumentKey },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("storage backend error: {message}")]
    Backend { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => AppError::NotFound(key.collection, key.id),
            StoreError::AlreadyExists { key } => {
                AppError::Conflict(format!("document {key} already exists"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Per-collection document database. Single-document operations are atomic;
/// nothing spans documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &DocumentKey) -> StoreResult<Option<Fields>>;

    /// Fails with `AlreadyExists` if the document exists.
    async fn create(&self, key: &DocumentKey, fields: Fields) -> StoreResult<()>;

    /// Creates or fully overwrites.
    async fn set(&self, key: &DocumentKey, fields: Fields) -> StoreResult<()>;

    /// Merges the given top-level fields into an existing document.
    async fn update(&self, key: &DocumentKey, fields: Fields) -> StoreResult<()>;

    /// Fails with `NotFound` if the document does not exist.
    async fn delete(&self, key: &DocumentKey) -> StoreResult<()>;

    /// Every document in a collection, unordered.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// A fresh document id, unique across collections.
    fn new_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
