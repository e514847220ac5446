//! Session tokens and request identity
//!
//! A token is `<user_id>.<expires_at>.<signature>` where the signature is the
//! HMAC-SHA256 of `<user_id>.<expires_at>` under the server's session secret.
//! Tokens are stateless: resolving one never touches the database.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use crate::AppState;
use crate::error::AppError;
use crate::models::{Principal, Session};
use crate::security::{sign_hmac, verify_hmac};

/// Issues and resolves session tokens
#[derive(Clone)]
pub struct SessionKeys {
    secret: String,
    ttl_secs: i64,
}

impl SessionKeys {
    pub fn new(secret: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    /// Issue a token for `user_id`, valid from `now` (Unix seconds)
    pub fn issue(&self, user_id: &str, now: i64) -> Session {
        let expires_at = now + self.ttl_secs;
        let claims = format!("{}.{}", user_id, expires_at);
        let signature = sign_hmac(&claims, &self.secret);

        Session {
            user_id: user_id.to_string(),
            token: format!("{}.{}", claims, signature),
            expires_at,
        }
    }

    /// Resolve a token to its principal, or `None` if malformed, forged or expired
    pub fn resolve(&self, token: &str, now: i64) -> Option<Principal> {
        let (claims, signature) = token.rsplit_once('.')?;
        let (user_id, expires_at) = claims.split_once('.')?;

        if user_id.is_empty() || !verify_hmac(claims, signature, &self.secret) {
            tracing::warn!("Rejected session token with invalid signature");
            return None;
        }

        let expires_at: i64 = expires_at.parse().ok()?;
        if expires_at <= now {
            tracing::debug!("Rejected expired session token");
            return None;
        }

        Some(Principal::new(user_id))
    }
}

/// Resolve `Authorization: Bearer <token>` to the calling principal
#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or(AppError::Unauthenticated)?;

        state
            .sessions
            .resolve(token, Utc::now().timestamp())
            .ok_or(AppError::Unauthenticated)
    }
}
