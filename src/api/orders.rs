use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use super::parse_id;
use crate::db::Document;
use crate::error::Result;
use crate::middleware::{verify_token, CurrentUser};
use crate::models::{DeleteResult, InsertOneResult};
use crate::services::OrderService;
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/order",
            get(list_orders).layer(middleware::from_fn_with_state(state, verify_token)),
        )
        .route("/order", post(place_order))
        .route("/order/:id", delete(cancel_order))
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub email: Option<String>,
}

async fn list_orders(
    State(state): State<AppState>,
    caller: Option<Extension<CurrentUser>>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<Document>>> {
    let order_service = OrderService::new(state.db.clone());
    let orders = order_service
        .list_own(query.email.as_deref(), caller.as_ref().map(|ext| &ext.0))
        .await?;

    Ok(Json(orders))
}

async fn place_order(
    State(state): State<AppState>,
    Json(body): Json<Document>,
) -> Result<Json<InsertOneResult>> {
    let order_service = OrderService::new(state.db.clone());
    let ack = order_service.place(body).await?;
    tracing::info!(id = %ack.inserted_id, "Order placed");

    Ok(Json(ack))
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResult>> {
    let order_id = parse_id(&id)?;

    let order_service = OrderService::new(state.db.clone());
    let ack = order_service.cancel(order_id).await?;
    tracing::info!(id = %order_id, deleted = ack.deleted_count, "Order cancelled");

    Ok(Json(ack))
}
