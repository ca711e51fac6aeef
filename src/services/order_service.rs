// Order placement, listing and cancellation
use chrono::Utc;
use uuid::Uuid;

use crate::db::{Collection, Database, Document, Filter, QuerySpec};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{new_order, DeleteResult, InsertOneResult, BUYER_EMAIL_FIELD};

/// Orders are only listed to their buyer: the caller must be authenticated
/// and `requested_email` must be the caller's own address.
pub fn own_orders_query(requested_email: Option<&str>, caller: Option<&CurrentUser>) -> Result<QuerySpec> {
    let caller = caller.ok_or(AppError::Unauthorized)?;

    match requested_email {
        Some(email) if caller.owns(email) => Ok(QuerySpec::filtered(Filter::eq(BUYER_EMAIL_FIELD, email))),
        _ => Err(AppError::Forbidden),
    }
}

pub struct OrderService {
    db: Database,
}

impl OrderService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_own(
        &self,
        requested_email: Option<&str>,
        caller: Option<&CurrentUser>,
    ) -> Result<Vec<Document>> {
        let query = own_orders_query(requested_email, caller)?;

        self.db.store.find(Collection::Orders, &query).await
    }

    pub async fn place(&self, body: Document) -> Result<InsertOneResult> {
        let order = new_order(body, Utc::now().timestamp_millis());

        self.db.store.insert_one(Collection::Orders, order).await
    }

    /// No ownership check: anyone holding the id can cancel the order.
    pub async fn cancel(&self, id: Uuid) -> Result<DeleteResult> {
        self.db.store.delete_by_id(Collection::Orders, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Claims;

    fn caller(payload: serde_json::Value) -> CurrentUser {
        CurrentUser::from(Claims {
            iat: 0,
            exp: 0,
            payload: payload.as_object().cloned().unwrap(),
        })
    }

    #[test]
    fn test_own_orders_only() {
        let buyer = caller(serde_json::json!({ "email": "a@b.com" }));

        let query = own_orders_query(Some("a@b.com"), Some(&buyer)).unwrap();
        assert_eq!(query.filter, Filter::eq("buyerEmail", "a@b.com"));

        assert!(matches!(
            own_orders_query(Some("c@d.com"), Some(&buyer)),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(own_orders_query(None, Some(&buyer)), Err(AppError::Forbidden)));
    }

    #[test]
    fn test_anonymous_caller_unauthorized() {
        assert!(matches!(
            own_orders_query(Some("a@b.com"), None),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_token_without_email_forbidden() {
        let anonymous = caller(serde_json::json!({ "uid": 1 }));

        assert!(matches!(
            own_orders_query(Some("a@b.com"), Some(&anonymous)),
            Err(AppError::Forbidden)
        ));
    }
}
