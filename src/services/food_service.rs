// Food listing, lookup and stock updates
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{Collection, Database, Document, FieldPath, Filter, QuerySpec, Sort};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{
    FoodUpdate, InsertOneResult, PurchaseRequest, UpdateResult, ADDED_BY_EMAIL_FIELD,
    FOOD_NAME_FIELD, PURCHASE_COUNT_FIELD,
};
use crate::utils::parse_int_prefix;

/// Query parameters of `GET /allFoods`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct FoodListParams {
    pub limit: Option<String>,
    pub from: Option<String>,
    pub email: Option<String>,
    pub search: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Translate listing parameters into a query.
///
/// * `email` restricts to foods added by that address and requires the
///   caller to be that address, otherwise the request is forbidden.
/// * `search` matches `foodName` case-insensitively and replaces the `email`
///   filter; the ownership check still applies.
/// * `from` sorts by `purchaseCount`, most purchased first.
/// * `limit` of zero, or one that does not parse, means no limit.
pub fn build_food_query(params: &FoodListParams, caller: Option<&CurrentUser>) -> Result<QuerySpec> {
    let mut filter = Filter::All;

    if let Some(email) = present(&params.email) {
        if !caller.is_some_and(|user| user.owns(email)) {
            return Err(AppError::Forbidden);
        }
        filter = Filter::eq(ADDED_BY_EMAIL_FIELD, email);
    }

    if let Some(search) = present(&params.search) {
        filter = Filter::contains_ignore_case(FOOD_NAME_FIELD, search);
    }

    let sort = if present(&params.from).is_some() {
        Sort::Descending(FieldPath::new(PURCHASE_COUNT_FIELD))
    } else {
        Sort::Natural
    };

    let limit = present(&params.limit)
        .and_then(parse_int_prefix)
        .map(i64::saturating_abs)
        .filter(|n| *n > 0);

    Ok(QuerySpec {
        filter,
        sort,
        limit,
    })
}

pub struct FoodService {
    db: Database,
}

impl FoodService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        params: &FoodListParams,
        caller: Option<&CurrentUser>,
    ) -> Result<Vec<Document>> {
        let query = build_food_query(params, caller)?;
        tracing::debug!(?query, "Listing foods");

        self.db.store.find(Collection::Foods, &query).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Document>> {
        self.db.store.find_by_id(Collection::Foods, id).await
    }

    pub async fn create(&self, food: Document) -> Result<InsertOneResult> {
        self.db.store.insert_one(Collection::Foods, food).await
    }

    pub async fn replace(&self, id: Uuid, update: FoodUpdate) -> Result<UpdateResult> {
        self.db
            .store
            .update_by_id(Collection::Foods, id, &update.into_update())
            .await
    }

    pub async fn purchase(&self, id: Uuid, request: PurchaseRequest) -> Result<UpdateResult> {
        self.db
            .store
            .update_by_id(Collection::Foods, id, &request.into_update()?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Claims;

    fn caller(email: &str) -> CurrentUser {
        let payload = serde_json::json!({ "email": email });
        CurrentUser::from(Claims {
            iat: 0,
            exp: 0,
            payload: payload.as_object().cloned().unwrap(),
        })
    }

    fn params(pairs: &[(&str, &str)]) -> FoodListParams {
        let mut params = FoodListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "limit" => params.limit = value,
                "from" => params.from = value,
                "email" => params.email = value,
                "search" => params.search = value,
                other => panic!("unknown param {other}"),
            }
        }
        params
    }

    #[test]
    fn test_no_params_lists_everything() {
        let query = build_food_query(&params(&[]), None).unwrap();

        assert_eq!(query, QuerySpec::all());
    }

    #[test]
    fn test_owner_filter_requires_matching_caller() {
        let owner = caller("chef@kitchen.io");
        let query = build_food_query(&params(&[("email", "chef@kitchen.io")]), Some(&owner)).unwrap();

        assert_eq!(query.filter, Filter::eq("addedBy.email", "chef@kitchen.io"));

        let other = caller("guest@kitchen.io");
        assert!(matches!(
            build_food_query(&params(&[("email", "chef@kitchen.io")]), Some(&other)),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            build_food_query(&params(&[("email", "chef@kitchen.io")]), None),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_search_replaces_owner_filter() {
        let owner = caller("chef@kitchen.io");
        let query = build_food_query(
            &params(&[("email", "chef@kitchen.io"), ("search", "abc")]),
            Some(&owner),
        )
        .unwrap();

        assert_eq!(query.filter, Filter::contains_ignore_case("foodName", "abc"));
    }

    #[test]
    fn test_search_does_not_skip_ownership_check() {
        assert!(matches!(
            build_food_query(&params(&[("email", "chef@kitchen.io"), ("search", "abc")]), None),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_from_sorts_by_popularity() {
        let query = build_food_query(&params(&[("from", "home"), ("limit", "6")]), None).unwrap();

        assert_eq!(query.sort, Sort::Descending(FieldPath::new("purchaseCount")));
        assert_eq!(query.limit, Some(6));
    }

    #[test]
    fn test_limit_edge_values() {
        let limit = |raw: &str| build_food_query(&params(&[("limit", raw)]), None).unwrap().limit;

        assert_eq!(limit("0"), None);
        assert_eq!(limit("abc"), None);
        assert_eq!(limit("-3"), Some(3));
        assert_eq!(limit("9.7"), Some(9));
        assert_eq!(limit("-9223372036854775807"), Some(i64::MAX));
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let query = build_food_query(
            &params(&[("email", ""), ("search", ""), ("from", ""), ("limit", "")]),
            None,
        )
        .unwrap();

        assert_eq!(query, QuerySpec::all());
    }
}
