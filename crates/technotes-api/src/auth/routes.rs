// Authentication HTTP routes
// Decision: The refresh token travels only in the `jwt` cookie; the access
// token travels only in the response body

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::middleware::AuthState;
use crate::api::common::MessageResponse;
use crate::error::{ApiError, ErrorResponse};
use crate::storage::password::verify_password;

/// Name of the refresh token cookie.
pub const REFRESH_COOKIE: &str = "jwt";

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Access token response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/auth", post(login))
        .route("/auth/refresh", get(refresh))
        .route("/auth/logout", post(logout))
        .with_state(state)
}

/// POST /auth - Login with username and password
#[utoipa::path(
    post,
    path = "/auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued, refresh cookie set", body = AccessTokenResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 401, description = "Unknown, inactive, or wrong-password user", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AccessTokenResponse>), ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request(
            "Please provide username and password",
        ));
    }

    // Unknown and inactive users get the same answer as a wrong password
    let user = state
        .db
        .get_user_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    if !user.active {
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    let access_token = state
        .tokens
        .issue_access_token(&user.username, &user.roles)?;
    let refresh_token = state.tokens.issue_refresh_token(&user.username)?;

    let cookie = refresh_cookie(&state, refresh_token);

    Ok((jar.add(cookie), Json(AccessTokenResponse { access_token })))
}

/// GET /auth/refresh - Mint a new access token from the refresh cookie
#[utoipa::path(
    get,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New access token with current roles", body = AccessTokenResponse),
        (status = 401, description = "No refresh cookie, or user no longer exists", body = ErrorResponse),
        (status = 403, description = "Invalid or expired refresh token", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let cookie = jar
        .get(REFRESH_COOKIE)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let claims = state
        .tokens
        .verify_refresh_token(cookie.value())
        .map_err(|e| {
            tracing::debug!("refresh token verification failed: {}", e);
            ApiError::forbidden("Forbidden")
        })?;

    let user = state
        .db
        .get_user_by_username(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    // Roles come from the database, not the old token, so role changes
    // propagate here
    let access_token = state
        .tokens
        .issue_access_token(&user.username, &user.roles)?;

    Ok(Json(AccessTokenResponse { access_token }))
}

/// POST /auth/logout - Clear the refresh cookie
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Refresh cookie cleared", body = MessageResponse),
        (status = 204, description = "No cookie was present")
    ),
    tag = "auth"
)]
pub async fn logout(jar: CookieJar) -> Response {
    if jar.get(REFRESH_COOKIE).is_none() {
        return StatusCode::NO_CONTENT.into_response();
    }

    let jar = jar.remove(Cookie::build(REFRESH_COOKIE).path("/"));
    (jar, Json(MessageResponse::new("Cookie cleared"))).into_response()
}

/// Build the refresh cookie: HTTP-only, cross-site, max-age matching the
/// token lifetime.
fn refresh_cookie(state: &AuthState, refresh_token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, refresh_token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(time::Duration::seconds(
            state.tokens.refresh_token_lifetime_secs(),
        ))
        .build()
}
