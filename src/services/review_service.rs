use crate::db::{Collection, Database, Document, QuerySpec};
use crate::error::Result;

/// Reviews are read-only through the API; see the `seed` binary for writes.
pub struct ReviewService {
    db: Database,
}

impl ReviewService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Document>> {
        self.db.store.find(Collection::Reviews, &QuerySpec::all()).await
    }
}
