//! # PostgreSQL document store
//!
//! Each document is one row in a single `documents` table, keyed by
//! `(collection, id)`, with its tagged field map stored as JSONB. Every write
//! is a single statement, so single-document atomicity comes from Postgres.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Row;
use tracing::info;

use crate::document::{Document, DocumentKey, DocumentStore, Fields, StoreError, StoreResult};

pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StoreError::Serialization {
                message: err.to_string(),
            },
            other => StoreError::Backend {
                message: other.to_string(),
            },
        }
    }
}

impl PostgresDocumentStore {
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the backing table if it does not exist yet.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id         TEXT NOT NULL,
                fields     JSONB NOT NULL,
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(&self.pool)
        .await?;
        info!("document table ready");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, key: &DocumentKey) -> StoreResult<Option<Fields>> {
        let row = sqlx::query("SELECT fields FROM documents WHERE collection = $1 AND id = $2")
            .bind(&key.collection)
            .bind(&key.id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(fields) = row.try_get::<Json<Fields>, _>("fields")?;
                Ok(Some(fields))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, key: &DocumentKey, fields: Fields) -> StoreResult<()> {
        let result = sqlx::query(
            "INSERT INTO documents (collection, id, fields) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO NOTHING",
        )
        .bind(&key.collection)
        .bind(&key.id)
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists { key: key.clone() });
        }
        Ok(())
    }

    async fn set(&self, key: &DocumentKey, fields: Fields) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO documents (collection, id, fields) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id) DO UPDATE SET fields = EXCLUDED.fields",
        )
        .bind(&key.collection)
        .bind(&key.id)
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, key: &DocumentKey, fields: Fields) -> StoreResult<()> {
        // `||` on JSONB objects replaces matching top-level keys.
        let result = sqlx::query(
            "UPDATE documents SET fields = fields || $3 WHERE collection = $1 AND id = $2",
        )
        .bind(&key.collection)
        .bind(&key.id)
        .bind(Json(fields))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { key: key.clone() });
        }
        Ok(())
    }

    async fn delete(&self, key: &DocumentKey) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(&key.collection)
            .bind(&key.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { key: key.clone() });
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query("SELECT id, fields FROM documents WHERE collection = $1")
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> StoreResult<Document> {
                let id: String = row.try_get("id")?;
                let Json(fields) = row.try_get::<Json<Fields>, _>("fields")?;
                Ok(Document {
                    key: DocumentKey::new(collection, id),
                    fields,
                })
            })
            .collect()
    }
}
