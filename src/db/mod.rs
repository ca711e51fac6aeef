//! Document persistence.
//!
//! Every route performs exactly one call on a [`DocumentStore`]. Documents are
//! free-form JSON objects; the store assigns a UUID to each and exposes it as
//! the `_id` field when reading.

mod memory;
mod postgres;
pub mod query;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::config::{Config, StoreBackend};
use crate::error::Result;
use crate::models::{DeleteResult, InsertOneResult, UpdateResult};

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use query::{FieldPath, Filter, QuerySpec, Sort, Update};

pub type Document = serde_json::Map<String, serde_json::Value>;

pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Foods,
    Orders,
    Reviews,
}

impl Collection {
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Foods => "foods",
            Collection::Orders => "orders",
            Collection::Reviews => "reviews",
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: Collection, query: &QuerySpec) -> Result<Vec<Document>>;

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>>;

    /// Any `_id` already present in `doc` is discarded.
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<InsertOneResult>;

    async fn update_by_id(
        &self,
        collection: Collection,
        id: Uuid,
        update: &Update,
    ) -> Result<UpdateResult>;

    async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<DeleteResult>;

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn run_migrations(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) {}
}

/// Attach the store-assigned identifier to a stored document.
pub(crate) fn with_id(id: Uuid, mut doc: Document) -> Document {
    doc.insert(ID_FIELD.to_string(), serde_json::Value::String(id.to_string()));
    doc
}

#[derive(Clone)]
pub struct Database {
    pub store: Arc<dyn DocumentStore>,
}

impl Database {
    /// Builds the configured store. The Postgres pool connects lazily, so an
    /// unreachable database leaves the service running in a degraded state.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        match config.database.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory document store; data is lost on exit");
                Ok(Self::memory())
            }
            StoreBackend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .connect_lazy(&config.database.url)?;

                let db = Self {
                    store: Arc::new(PgStore::new(pool)),
                };

                match db.store.ping().await {
                    Ok(()) => tracing::info!("PostgreSQL connection pool established"),
                    Err(e) => tracing::error!(
                        error = %e,
                        "PostgreSQL unreachable, continuing in degraded mode"
                    ),
                }

                Ok(db)
            }
        }
    }

    pub fn memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
        }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        self.store.run_migrations().await?;
        tracing::info!("Database migrations completed");
        Ok(())
    }

    pub async fn close(&self) {
        self.store.close().await;
        tracing::info!("Document store closed");
    }
}
