// Storage layer for the technotes API
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
// Decision: Uniqueness of usernames and note titles is enforced by the store
// itself (unique index / single write lock), not by a read-then-write check

pub mod backend;
pub mod memory;
pub mod models;
pub mod password;
pub mod postgres;

pub use backend::StorageBackend;
pub use memory::InMemoryStore;
pub use models::*;
pub use postgres::PgDatabase;

use thiserror::Error;

/// Errors surfaced by the storage layer. Unique-constraint violations get
/// their own variant so handlers can answer 409 without string matching.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("duplicate {field}")]
    Duplicate { field: &'static str },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some("users_username_lower_idx") => "username",
                    Some("notes_title_lower_idx") => "title",
                    _ => "field",
                };
                return StorageError::Duplicate { field };
            }
        }
        StorageError::Other(err.into())
    }
}
