//! # storage-adapters
//!
//! The document store contract, its in-memory and PostgreSQL backends, and
//! the typed repositories built on top of it.

pub mod document;
pub mod memory;
#[cfg(feature = "db-postgres")]
pub mod postgres;
pub mod repos;
pub mod schema;

pub use document::{Document, DocumentKey, DocumentStore, FieldValue, Fields, StoreError};
pub use memory::MemoryDocumentStore;
#[cfg(feature = "db-postgres")]
pub use postgres::PostgresDocumentStore;
pub use repos::DocumentRepos;
