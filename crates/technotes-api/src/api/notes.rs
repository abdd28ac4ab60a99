// Notes API routes
//
// Same body-borne id convention as the users API. Every note response
// carries the owner's username alongside the owner id.

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
use super::validation::{validate_text, validate_title};
use crate::auth::{AuthState, AuthUser, FromRef};
use crate::error::{ApiError, ErrorResponse};
use crate::storage::{CreateNoteRow, NoteRow, NoteWithOwnerRow, StorageBackend, UpdateNote};

/// App state for notes routes
#[derive(Clone)]
pub struct NotesState {
    pub db: Arc<StorageBackend>,
    pub auth: AuthState,
}

impl FromRef<NotesState> for AuthState {
    fn from_ref(input: &NotesState) -> Self {
        input.auth.clone()
    }
}

/// Note as exposed by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    /// Owner's user id
    pub user: Uuid,
    /// Owner's username at response time
    pub username: String,
    pub title: String,
    pub text: String,
    pub completed: bool,
    pub ticket: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    fn from_row(row: NoteRow, username: String) -> Self {
        Self {
            id: row.id,
            user: row.user_id,
            username,
            title: row.title,
            text: row.text,
            completed: row.completed,
            ticket: row.ticket,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<NoteWithOwnerRow> for Note {
    fn from(row: NoteWithOwnerRow) -> Self {
        Self {
            id: row.id,
            user: row.user_id,
            username: row.username,
            title: row.title,
            text: row.text,
            completed: row.completed,
            ticket: row.ticket,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Request to create a new note
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    /// Owner's user id
    #[serde(default)]
    pub user: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

/// Request to update a note. All fields are required.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Owner's user id
    #[serde(default)]
    pub user: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Request to delete a note
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeleteNoteRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// Create notes routes
pub fn routes(state: NotesState) -> Router {
    Router::new()
        .route(
            "/notes",
            get(list_notes)
                .post(create_note)
                .patch(update_note)
                .delete(delete_note),
        )
        .with_state(state)
}

/// GET /notes - List all notes with their owners
#[utoipa::path(
    get,
    path = "/notes",
    responses(
        (status = 200, description = "List of notes", body = ListResponse<Note>),
        (status = 401, description = "No bearer token", body = ErrorResponse),
        (status = 403, description = "Invalid or expired token", body = ErrorResponse)
    ),
    tag = "notes"
)]
pub async fn list_notes(
    State(state): State<NotesState>,
    _auth: AuthUser,
) -> Result<Json<ListResponse<Note>>, ApiError> {
    let rows = state.db.list_notes_with_owner().await?;
    let notes: Vec<Note> = rows.into_iter().map(Note::from).collect();

    Ok(Json(ListResponse::new(notes)))
}

/// POST /notes - Create a new note
#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = Note),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 404, description = "Owner not found", body = ErrorResponse),
        (status = 409, description = "Duplicate title", body = ErrorResponse)
    ),
    tag = "notes"
)]
pub async fn create_note(
    State(state): State<NotesState>,
    _auth: AuthUser,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let Some(user_id) = req.user else {
        return Err(ApiError::bad_request("All fields are required"));
    };
    if req.title.is_empty() || req.text.is_empty() {
        return Err(ApiError::bad_request("All fields are required"));
    }
    validate_title(&req.title)?;
    validate_text(&req.text)?;

    let owner = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let row = state
        .db
        .create_note(CreateNoteRow {
            user_id,
            title: req.title,
            text: req.text,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Note::from_row(row, owner.username)),
    ))
}

/// PATCH /notes - Update a note (id in body)
#[utoipa::path(
    patch,
    path = "/notes",
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated", body = Note),
        (status = 400, description = "Missing required field", body = ErrorResponse),
        (status = 404, description = "Note or owner not found", body = ErrorResponse),
        (status = 409, description = "Duplicate title", body = ErrorResponse)
    ),
    tag = "notes"
)]
pub async fn update_note(
    State(state): State<NotesState>,
    _auth: AuthUser,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let (Some(id), Some(user_id), Some(completed)) = (req.id, req.user, req.completed) else {
        return Err(ApiError::bad_request("All fields are required"));
    };
    if req.title.is_empty() || req.text.is_empty() {
        return Err(ApiError::bad_request("All fields are required"));
    }
    validate_title(&req.title)?;
    validate_text(&req.text)?;

    state
        .db
        .get_note(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Note not found"))?;

    let owner = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let updated = state
        .db
        .update_note(
            id,
            UpdateNote {
                user_id: Some(user_id),
                title: Some(req.title),
                text: Some(req.text),
                completed: Some(completed),
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Note not found"))?;

    Ok(Json(Note::from_row(updated, owner.username)))
}

/// DELETE /notes - Delete a note (id in body)
#[utoipa::path(
    delete,
    path = "/notes",
    request_body = DeleteNoteRequest,
    responses(
        (status = 204, description = "Note deleted"),
        (status = 400, description = "Missing id", body = ErrorResponse),
        (status = 404, description = "Note not found", body = ErrorResponse)
    ),
    tag = "notes"
)]
pub async fn delete_note(
    State(state): State<NotesState>,
    _auth: AuthUser,
    Json(req): Json<DeleteNoteRequest>,
) -> Result<StatusCode, ApiError> {
    let id = req
        .id
        .ok_or_else(|| ApiError::bad_request("All fields are required"))?;

    let deleted = state.db.delete_note(id).await?;
    if !deleted {
        return Err(ApiError::not_found("Note not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
