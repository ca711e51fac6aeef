use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::config::JwtConfig;
use crate::db::Document;
use crate::error::{AppError, Result};
use crate::middleware::Claims;

/// Stateless HS256 signing and verification with the server-held secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            lifetime: Duration::minutes(config.expiry_minutes as i64),
        }
    }

    pub fn issue(&self, payload: Document) -> Result<String> {
        self.issue_at(payload, Utc::now())
    }

    /// `iat`/`exp` in the payload are overwritten by the issuer.
    pub fn issue_at(&self, mut payload: Document, now: DateTime<Utc>) -> Result<String> {
        payload.remove("iat");
        payload.remove("exp");

        let claims = Claims {
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
            payload,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Token generation failed: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token verification failed");
                AppError::Unauthorized
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: secret.to_string(),
            expiry_minutes: 60,
        })
    }

    fn payload(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("kitchen-secret");

        let token = tokens.issue(payload(json!({ "email": "a@b.com" }))).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(token.matches('.').count(), 2);
        assert_eq!(claims.email(), Some("a@b.com"));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_payload_keeps_arbitrary_fields() {
        let tokens = service("kitchen-secret");

        let token = tokens
            .issue(payload(json!({ "email": "a@b.com", "name": "Ada", "exp": 1 })))
            .unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.payload["name"], json!("Ada"));
        assert!(claims.exp > 1);
    }

    #[test]
    fn test_payload_without_email() {
        let tokens = service("kitchen-secret");

        let token = tokens.issue(payload(json!({ "uid": 7 }))).unwrap();

        assert_eq!(tokens.verify(&token).unwrap().email(), None);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service("kitchen-secret");
        let issued = Utc::now() - Duration::hours(3);

        let token = tokens
            .issue_at(payload(json!({ "email": "a@b.com" })), issued)
            .unwrap();

        assert!(matches!(tokens.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service("kitchen-secret")
            .issue(payload(json!({ "email": "a@b.com" })))
            .unwrap();

        assert!(matches!(
            service("other-secret").verify(&token),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            service("kitchen-secret").verify("not-a-token"),
            Err(AppError::Unauthorized)
        ));
    }
}
