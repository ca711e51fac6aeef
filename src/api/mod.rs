mod auth;
mod foods;
mod orders;
mod reviews;

use axum::Router;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::AppState;

/// All resource routes. Mutations are public; only `GET /allFoods` and
/// `GET /order` pass through the token guard.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(foods::routes(state.clone()))
        .merge(orders::routes(state))
        .merge(reviews::routes())
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest(format!("Invalid id: {}", id)))
}
