use axum::{extract::State, routing::get, Json, Router};

use crate::db::Document;
use crate::error::Result;
use crate::services::ReviewService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/reviews", get(list_reviews))
}

async fn list_reviews(State(state): State<AppState>) -> Result<Json<Vec<Document>>> {
    let review_service = ReviewService::new(state.db.clone());

    Ok(Json(review_service.list().await?))
}
