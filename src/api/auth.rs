use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{json, Value};

use crate::db::Document;
use crate::error::Result;
use crate::middleware::TOKEN_COOKIE;
use crate::services::TokenService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/jwt", post(issue_token))
}

/// Sign the posted identity payload and hand it back as an HTTP-only cookie.
async fn issue_token(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<Document>,
) -> Result<(CookieJar, Json<Value>)> {
    let token = TokenService::new(&state.config.jwt).issue(payload)?;

    let cookie = Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(state.config.cookie.secure)
        .path("/");

    tracing::debug!("Issued identity token");

    Ok((jar.add(cookie), Json(json!({ "success": true }))))
}
