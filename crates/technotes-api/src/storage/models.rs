// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// User models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUserRow {
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub roles: Option<Vec<String>>,
    pub active: Option<bool>,
    pub password_hash: Option<String>,
}

// ============================================
// Note models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub text: String,
    pub completed: bool,
    /// Human-facing ticket number, assigned from a sequence starting at 500.
    pub ticket: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note joined with its owner's username, for listing.
#[derive(Debug, Clone, FromRow)]
pub struct NoteWithOwnerRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub text: String,
    pub completed: bool,
    pub ticket: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct CreateNoteRow {
    pub user_id: Uuid,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateNote {
    pub user_id: Option<Uuid>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub completed: Option<bool>,
}
