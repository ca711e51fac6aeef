use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};

use super::parse_id;
use crate::db::Document;
use crate::error::Result;
use crate::middleware::{verify_token, CurrentUser};
use crate::models::{FoodUpdate, InsertOneResult, PurchaseRequest, UpdateResult};
use crate::services::{FoodListParams, FoodService};
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/allFoods",
            get(list_foods).layer(middleware::from_fn_with_state(state, verify_token)),
        )
        .route("/allFoods", post(create_food))
        .route(
            "/allFood/:id",
            get(get_food).put(replace_food).patch(purchase_food),
        )
}

async fn list_foods(
    State(state): State<AppState>,
    caller: Option<Extension<CurrentUser>>,
    Query(params): Query<FoodListParams>,
) -> Result<Json<Vec<Document>>> {
    let food_service = FoodService::new(state.db.clone());
    let foods = food_service
        .list(&params, caller.as_ref().map(|ext| &ext.0))
        .await?;

    Ok(Json(foods))
}

async fn create_food(
    State(state): State<AppState>,
    Json(food): Json<Document>,
) -> Result<Json<InsertOneResult>> {
    let food_service = FoodService::new(state.db.clone());
    let ack = food_service.create(food).await?;
    tracing::info!(id = %ack.inserted_id, "Food added");

    Ok(Json(ack))
}

/// `null` when no food has this id.
async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Document>>> {
    let food_id = parse_id(&id)?;

    let food_service = FoodService::new(state.db.clone());
    Ok(Json(food_service.get(food_id).await?))
}

async fn replace_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<FoodUpdate>,
) -> Result<Json<UpdateResult>> {
    let food_id = parse_id(&id)?;

    let food_service = FoodService::new(state.db.clone());
    Ok(Json(food_service.replace(food_id, payload).await?))
}

async fn purchase_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PurchaseRequest>,
) -> Result<Json<UpdateResult>> {
    let food_id = parse_id(&id)?;

    let food_service = FoodService::new(state.db.clone());
    Ok(Json(food_service.purchase(food_id, payload).await?))
}
