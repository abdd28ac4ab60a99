// Authentication middleware and extractors
// Decision: 401 when no bearer token is presented, 403 when one is presented
// but fails verification
//
// Every request re-verifies the access token from scratch; there is no
// per-request state carried anywhere else.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;

use super::{config::AuthConfig, jwt::TokenIssuer};
use crate::error::ApiError;
use crate::storage::StorageBackend;

/// Authenticated user context extracted from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    /// Check if the user has a specific role. Admin implies every role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role || r == "Admin")
    }

    pub fn is_manager(&self) -> bool {
        self.has_role("Manager")
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "Admin")
    }
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenIssuer>,
    pub db: Arc<StorageBackend>,
}

impl AuthState {
    pub fn new(config: AuthConfig, db: Arc<StorageBackend>) -> Self {
        Self {
            tokens: Arc::new(TokenIssuer::new(config)),
            db,
        }
    }
}

/// Helper trait for extracting AuthState from application state
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AuthState> for AuthState {
    fn from_ref(input: &AuthState) -> Self {
        input.clone()
    }
}

/// Extractor for the authenticated user. Rejects with 401 when no bearer
/// token is present, 403 when the token fails verification.
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::unauthorized("Unauthorized"))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

        let claims = auth_state.tokens.verify_access_token(token).map_err(|e| {
            tracing::debug!("access token verification failed: {}", e);
            ApiError::forbidden("Forbidden")
        })?;

        Ok(AuthUser {
            username: claims.sub,
            roles: claims.roles,
        })
    }
}
