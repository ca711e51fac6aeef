use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::db::Document;
use crate::error::Result;
use crate::services::TokenService;
use crate::AppState;

pub const TOKEN_COOKIE: &str = "token";

/// Token claims: the caller-supplied identity payload plus issue/expiry times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub payload: Document,
}

impl Claims {
    pub fn email(&self) -> Option<&str> {
        self.payload.get("email").and_then(|v| v.as_str())
    }
}

/// Identity decoded from a valid `token` cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub email: Option<String>,
}

impl CurrentUser {
    /// True when the caller's identity email is exactly `email`.
    pub fn owns(&self, email: &str) -> bool {
        self.email.as_deref() == Some(email)
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            email: claims.email().map(String::from),
        }
    }
}

/// Annotates the request with the caller's identity. A request without the
/// cookie passes through unauthenticated; a bad or expired token is rejected
/// with 401 before the handler runs.
pub async fn verify_token(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        let claims = TokenService::new(&state.config.jwt)
            .verify(cookie.value())
            .map_err(|e| {
                tracing::warn!(path = %request.uri().path(), "Rejected invalid token cookie");
                e
            })?;

        request.extensions_mut().insert(CurrentUser::from(claims));
    }

    Ok(next.run(request).await)
}
