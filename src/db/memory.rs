use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Number, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{with_id, Collection, Document, DocumentStore, QuerySpec, Sort, Update, ID_FIELD};
use crate::error::{AppError, Result};
use crate::models::{DeleteResult, InsertOneResult, UpdateResult};

/// Process-local store used by tests and `DATABASE__BACKEND=memory`.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<(Uuid, Document)>>>,
}

/// Position of a value's type in jsonb ordering, lowest first.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Ascending jsonb-style comparison, so both stores sort alike. Arrays and
/// objects of the same type compare equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn increment(current: Option<&Value>, field: &str, delta: i64) -> Result<Value> {
    let next = match current {
        None | Some(Value::Null) => Number::from(delta),
        Some(Value::Number(n)) => match n.as_i64().and_then(|v| v.checked_add(delta)) {
            Some(sum) => Number::from(sum),
            None => n
                .as_f64()
                .and_then(|v| Number::from_f64(v + delta as f64))
                .ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!("Cannot increment field {}", field))
                })?,
        },
        Some(_) => {
            return Err(AppError::BadRequest(format!(
                "Cannot increment non-numeric field {}",
                field
            )))
        }
    };

    Ok(Value::Number(next))
}

fn apply_update(doc: &Document, update: &Update) -> Result<Document> {
    let mut next = doc.clone();
    match update {
        Update::Set(fields) => {
            for (key, value) in fields {
                next.insert(key.clone(), value.clone());
            }
        }
        Update::Inc(deltas) => {
            for (field, delta) in deltas {
                let value = increment(next.get(field), field, *delta)?;
                next.insert(field.clone(), value);
            }
        }
    }
    Ok(next)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: Collection, query: &QuerySpec) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(rows) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&(Uuid, Document)> = rows
            .iter()
            .filter(|(_, doc)| query.filter.matches(doc))
            .collect();

        if let Sort::Descending(field) = &query.sort {
            // stable, so ties keep insertion order
            matched.sort_by(|(_, a), (_, b)| match (field.lookup(a), field.lookup(b)) {
                (Some(x), Some(y)) => compare_values(y, x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        }

        let limit = query
            .limit
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .take(limit)
            .map(|(id, doc)| with_id(*id, doc.clone()))
            .collect())
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(&collection)
            .and_then(|rows| rows.iter().find(|(row_id, _)| *row_id == id))
            .map(|(row_id, doc)| with_id(*row_id, doc.clone())))
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<InsertOneResult> {
        doc.remove(ID_FIELD);
        let id = Uuid::new_v4();

        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push((id, doc));

        Ok(InsertOneResult::new(id))
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: Uuid,
        update: &Update,
    ) -> Result<UpdateResult> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|(row_id, _)| *row_id == id))
            .map(|(_, doc)| doc)
        else {
            return Ok(UpdateResult::new(0, 0));
        };

        let next = apply_update(doc, update)?;
        if next == *doc {
            return Ok(UpdateResult::new(1, 0));
        }

        *doc = next;
        Ok(UpdateResult::new(1, 1))
    }

    async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<DeleteResult> {
        let mut collections = self.collections.write().await;
        let Some(rows) = collections.get_mut(&collection) else {
            return Ok(DeleteResult::new(0));
        };

        let before = rows.len();
        rows.retain(|(row_id, _)| *row_id != id);

        Ok(DeleteResult::new((before - rows.len()) as u64))
    }
}
