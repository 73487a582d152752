use axum::http::{HeaderMap, header};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use mural_types::api::Claims;

use crate::error::AppError;

/// HS256 signing material, built once from the server secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, user_id: u64) -> anyhow::Result<String> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| anyhow::anyhow!("token lifetime out of range"))?;
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp() as usize,
            exp: expires.timestamp() as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Checks signature and expiry.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(token_data.claims)
    }

    /// Validates the `Authorization: Bearer <token>` header.
    pub fn validate_headers(&self, headers: &HeaderMap) -> Result<Claims, AppError> {
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated("missing authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthenticated("expected a Bearer token".into()))?;

        self.validate(token.trim())
            .map_err(|e| AppError::Unauthenticated(format!("invalid token: {}", e)))
    }
}
