// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// The backend is constructed once at startup and handed to handler state as
// an Arc, so every handler talks to an explicitly injected store rather than
// a module-global connection.

use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

use super::memory::InMemoryStore;
use super::models::*;
use super::postgres::PgDatabase;
use super::StorageResult;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(PgDatabase),
    /// In-memory store (dev mode, tests)
    InMemory(Arc<InMemoryStore>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = PgDatabase::from_url(database_url).await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryStore::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> StorageResult<UserRow> {
        match self {
            Self::Postgres(db) => db.create_user(input).await,
            Self::InMemory(db) => db.create_user(input).await,
        }
    }

    pub async fn get_user(&self, id: Uuid) -> StorageResult<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user(id).await,
            Self::InMemory(db) => db.get_user(id).await,
        }
    }

    pub async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user_by_username(username).await,
            Self::InMemory(db) => db.get_user_by_username(username).await,
        }
    }

    pub async fn list_users(&self) -> StorageResult<Vec<UserRow>> {
        match self {
            Self::Postgres(db) => db.list_users().await,
            Self::InMemory(db) => db.list_users().await,
        }
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> StorageResult<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.update_user(id, input).await,
            Self::InMemory(db) => db.update_user(id, input).await,
        }
    }

    pub async fn delete_user(&self, id: Uuid) -> StorageResult<bool> {
        match self {
            Self::Postgres(db) => db.delete_user(id).await,
            Self::InMemory(db) => db.delete_user(id).await,
        }
    }

    pub async fn user_has_notes(&self, user_id: Uuid) -> StorageResult<bool> {
        match self {
            Self::Postgres(db) => db.user_has_notes(user_id).await,
            Self::InMemory(db) => db.user_has_notes(user_id).await,
        }
    }

    // ============================================
    // Notes
    // ============================================

    pub async fn create_note(&self, input: CreateNoteRow) -> StorageResult<NoteRow> {
        match self {
            Self::Postgres(db) => db.create_note(input).await,
            Self::InMemory(db) => db.create_note(input).await,
        }
    }

    pub async fn get_note(&self, id: Uuid) -> StorageResult<Option<NoteRow>> {
        match self {
            Self::Postgres(db) => db.get_note(id).await,
            Self::InMemory(db) => db.get_note(id).await,
        }
    }

    pub async fn list_notes_with_owner(&self) -> StorageResult<Vec<NoteWithOwnerRow>> {
        match self {
            Self::Postgres(db) => db.list_notes_with_owner().await,
            Self::InMemory(db) => db.list_notes_with_owner().await,
        }
    }

    pub async fn update_note(&self, id: Uuid, input: UpdateNote) -> StorageResult<Option<NoteRow>> {
        match self {
            Self::Postgres(db) => db.update_note(id, input).await,
            Self::InMemory(db) => db.update_note(id, input).await,
        }
    }

    pub async fn delete_note(&self, id: Uuid) -> StorageResult<bool> {
        match self {
            Self::Postgres(db) => db.delete_note(id).await,
            Self::InMemory(db) => db.delete_note(id).await,
        }
    }
}
