use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{with_id, Collection, Document, DocumentStore, Filter, QuerySpec, Sort, Update, ID_FIELD};
use crate::error::{AppError, Result};
use crate::models::{DeleteResult, InsertOneResult, UpdateResult};

/// Documents live in one JSONB column per row; `seq` keeps insertion order.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
        match filter {
            Filter::All => {}
            Filter::Eq { field, value } => {
                qb.push(" WHERE doc #>> ");
                qb.push_bind(field.segments().to_vec());
                qb.push(" = ");
                qb.push_bind(value.clone());
            }
            Filter::ContainsIgnoreCase { field, needle } => {
                qb.push(" WHERE strpos(lower(doc #>> ");
                qb.push_bind(field.segments().to_vec());
                qb.push("), lower(");
                qb.push_bind(needle.clone());
                qb.push(")) > 0");
            }
        }
    }

    fn push_sort(qb: &mut QueryBuilder<'_, Postgres>, sort: &Sort) {
        match sort {
            Sort::Natural => {
                qb.push(" ORDER BY seq");
            }
            Sort::Descending(field) => {
                qb.push(" ORDER BY doc #> ");
                qb.push_bind(field.segments().to_vec());
                qb.push(" DESC NULLS LAST, seq");
            }
        }
    }

    /// Pushes the expression computing the updated document from `target.doc`.
    fn push_update_expr(qb: &mut QueryBuilder<'_, Postgres>, update: &Update) {
        match update {
            Update::Set(fields) => {
                qb.push("target.doc || ");
                qb.push_bind(Json(fields.clone()));
            }
            Update::Inc(deltas) => {
                for _ in deltas {
                    qb.push("jsonb_set(");
                }
                qb.push("target.doc");
                for (field, delta) in deltas {
                    qb.push(", ");
                    qb.push_bind(vec![field.clone()]);
                    // only real numbers are read; text such as "10" is never cast
                    qb.push(", to_jsonb(CASE WHEN jsonb_typeof(target.doc -> ");
                    qb.push_bind(field.clone());
                    qb.push(") = 'number' THEN (target.doc ->> ");
                    qb.push_bind(field.clone());
                    qb.push(")::numeric ELSE 0 END + ");
                    qb.push_bind(*delta);
                    qb.push("), true)");
                }
            }
        }
    }

    /// Pushes the name of the first field an increment cannot apply to, or NULL.
    fn push_rejected_field(qb: &mut QueryBuilder<'_, Postgres>, update: &Update) {
        match update {
            Update::Set(_) => {
                qb.push("NULL::text");
            }
            Update::Inc(deltas) => {
                qb.push("CASE");
                for (field, _) in deltas {
                    qb.push(" WHEN jsonb_typeof(target.doc -> ");
                    qb.push_bind(field.clone());
                    qb.push(") NOT IN ('number', 'null') THEN ");
                    qb.push_bind(field.clone());
                }
                qb.push(" END");
            }
        }
    }
}

fn row_to_document(id: Uuid, doc: Value) -> Result<Document> {
    match doc {
        Value::Object(map) => Ok(with_id(id, map)),
        other => Err(AppError::Internal(anyhow::anyhow!(
            "Stored document {} is not an object: {}",
            id,
            other
        ))),
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(&self, collection: Collection, query: &QuerySpec) -> Result<Vec<Document>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id, doc FROM ");
        qb.push(collection.table());
        Self::push_filter(&mut qb, &query.filter);
        Self::push_sort(&mut qb, &query.sort);
        // LIMIT NULL returns every row
        qb.push(" LIMIT ");
        qb.push_bind(query.limit);

        let rows: Vec<(Uuid, Value)> = qb.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|(id, doc)| row_to_document(id, doc))
            .collect()
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>> {
        let query = format!("SELECT id, doc FROM {} WHERE id = $1", collection.table());

        let row: Option<(Uuid, Value)> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(id, doc)| row_to_document(id, doc)).transpose()
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<InsertOneResult> {
        doc.remove(ID_FIELD);
        let id = Uuid::new_v4();
        let query = format!(
            "INSERT INTO {} (id, doc, created_at) VALUES ($1, $2, NOW())",
            collection.table()
        );

        sqlx::query(&query)
            .bind(id)
            .bind(Json(doc))
            .execute(&self.pool)
            .await?;

        Ok(InsertOneResult::new(id))
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: Uuid,
        update: &Update,
    ) -> Result<UpdateResult> {
        let table = collection.table();

        let mut qb = QueryBuilder::<Postgres>::new("WITH target AS (SELECT id, doc FROM ");
        qb.push(table);
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" FOR UPDATE), changes AS (SELECT target.id, target.doc AS old_doc, ");
        Self::push_update_expr(&mut qb, update);
        qb.push(" AS new_doc, ");
        Self::push_rejected_field(&mut qb, update);
        qb.push(" AS rejected_field FROM target), updated AS (UPDATE ");
        qb.push(table);
        qb.push(" SET doc = changes.new_doc FROM changes WHERE ");
        qb.push(table);
        qb.push(".id = changes.id AND changes.rejected_field IS NULL");
        qb.push(" AND changes.new_doc IS DISTINCT FROM changes.old_doc RETURNING ");
        qb.push(table);
        qb.push(".id) SELECT (SELECT COUNT(*) FROM target), (SELECT COUNT(*) FROM updated),");
        qb.push(" (SELECT rejected_field FROM changes LIMIT 1)");

        let (matched, modified, rejected): (i64, i64, Option<String>) =
            qb.build_query_as().fetch_one(&self.pool).await?;

        if let Some(field) = rejected {
            return Err(AppError::BadRequest(format!(
                "Cannot increment non-numeric field {}",
                field
            )));
        }

        Ok(UpdateResult::new(matched as u64, modified as u64))
    }

    async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<DeleteResult> {
        let query = format!("DELETE FROM {} WHERE id = $1", collection.table());

        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;

        Ok(DeleteResult::new(result.rows_affected()))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Migration failed: {}", e)))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
