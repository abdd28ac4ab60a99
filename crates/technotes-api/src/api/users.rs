// Users API routes
//
// Update and delete take the target id in the request body, not the path;
// every verb shares the single /users route.

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::ListResponse;
use super::validation::{validate_password, validate_username};
use crate::auth::{AuthState, AuthUser, FromRef};
use crate::error::{ApiError, ErrorResponse};
use crate::storage::password::hash_password;
use crate::storage::{CreateUserRow, StorageBackend, UpdateUser, UserRow};

/// Default role assigned when a create request names none.
const DEFAULT_ROLE: &str = "Employee";

/// App state for users routes
#[derive(Clone)]
pub struct UsersState {
    pub db: Arc<StorageBackend>,
    pub auth: AuthState,
}

impl FromRef<UsersState> for AuthState {
    fn from_ref(input: &UsersState) -> Self {
        input.auth.clone()
    }
}

/// User as exposed by the API. The password hash never leaves the store
/// layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            roles: row.roles,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Request to create a new user
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Defaults to ["Employee"] when absent or empty.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Request to update a user. Everything except the password is required.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub active: Option<bool>,
    /// When present, the password is re-hashed.
    #[serde(default)]
    pub password: Option<String>,
}

/// Request to delete a user
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeleteUserRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// Create users routes
pub fn routes(state: UsersState) -> Router {
    Router::new()
        .route(
            "/users",
            get(list_users)
                .post(create_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .with_state(state)
}

/// GET /users - List all users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "List of users, password hashes excluded", body = ListResponse<User>),
        (status = 401, description = "No bearer token", body = ErrorResponse),
        (status = 403, description = "Invalid or expired token", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<UsersState>,
    _auth: AuthUser,
) -> Result<Json<ListResponse<User>>, ApiError> {
    let rows = state.db.list_users().await?;
    let users: Vec<User> = rows.into_iter().map(User::from).collect();

    Ok(Json(ListResponse::new(users)))
}

/// POST /users - Create a new user
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 409, description = "Duplicate username", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<UsersState>,
    _auth: AuthUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("All fields are required"));
    }
    validate_username(&req.username)?;
    validate_password(&req.password)?;

    let roles = if req.roles.is_empty() {
        vec![DEFAULT_ROLE.to_string()]
    } else {
        req.roles
    };

    let password_hash = hash_password(&req.password)?;

    let row = state
        .db
        .create_user(CreateUserRow {
            username: req.username,
            password_hash,
            roles,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PATCH /users - Update a user (id in body)
#[utoipa::path(
    patch,
    path = "/users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Missing required field", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Duplicate username", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<UsersState>,
    _auth: AuthUser,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let (Some(id), Some(active)) = (req.id, req.active) else {
        return Err(ApiError::bad_request("All fields are required"));
    };
    if req.username.is_empty() || req.roles.is_empty() {
        return Err(ApiError::bad_request("All fields are required"));
    }
    validate_username(&req.username)?;

    state
        .db
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let password_hash = match req.password.as_deref() {
        Some(password) if !password.is_empty() => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        _ => None,
    };

    let updated = state
        .db
        .update_user(
            id,
            UpdateUser {
                username: Some(req.username),
                roles: Some(req.roles),
                active: Some(active),
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(updated.into()))
}

/// DELETE /users - Delete a user (id in body)
#[utoipa::path(
    delete,
    path = "/users",
    request_body = DeleteUserRequest,
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Missing id, or user still owns notes", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<UsersState>,
    _auth: AuthUser,
    Json(req): Json<DeleteUserRequest>,
) -> Result<StatusCode, ApiError> {
    let id = req
        .id
        .ok_or_else(|| ApiError::bad_request("User ID required"))?;

    // A user with dependent notes cannot be removed
    if state.db.user_has_notes(id).await? {
        return Err(ApiError::bad_request("User has assigned notes"));
    }

    let deleted = state.db.delete_user(id).await?;
    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
