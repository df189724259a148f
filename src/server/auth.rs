//! Session resolution for the HTTP API
//!
//! Session issuance itself belongs to the external identity provider;
//! this module only resolves an already-issued bearer token to the owner
//! id it authenticates. Every handler takes the owner from here — never
//! from request parameters.

use crate::server::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use std::collections::HashMap;

/// Resolves bearer tokens to owner ids
///
/// Implementations wrap whatever identity backend the deployment uses.
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolve a token to the owner id it authenticates, if any
    async fn resolve(&self, token: &str) -> Option<String>;
}

/// Token table sourced from configuration
///
/// Stands in for the SSO-backed provider in development and tests.
pub struct StaticSessionProvider {
    tokens: HashMap<String, String>,
}

impl StaticSessionProvider {
    /// Create a provider from a token → owner map
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait::async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn resolve(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }
}

/// The authenticated caller, extracted from the `Authorization` header
///
/// Rejects with 401 when the header is missing, malformed, or names a
/// token the session provider does not recognize.
pub struct AuthedOwner(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthedOwner {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let token = match token {
            Some(token) => token,
            None => {
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "missing bearer token".to_string(),
                ))
            }
        };

        match state.sessions.resolve(token).await {
            Some(owner) => Ok(AuthedOwner(owner)),
            None => Err((
                StatusCode::UNAUTHORIZED,
                "invalid session token".to_string(),
            )),
        }
    }
}
