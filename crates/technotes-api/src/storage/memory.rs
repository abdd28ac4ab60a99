// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// This implementation provides a PostgreSQL-compatible API backed by in-memory
// HashMaps, allowing the server to run without a database for development and
// letting tests exercise the full router in-process.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::*;
use super::{StorageError, StorageResult};

/// First ticket number handed out to a note.
const TICKET_SEQ_START: i64 = 500;

/// In-memory store for dev mode. All data is lost on restart.
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, UserRow>>,
    notes: RwLock<HashMap<Uuid, NoteRow>>,
    tickets: RwLock<i64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            notes: RwLock::new(HashMap::new()),
            tickets: RwLock::new(TICKET_SEQ_START),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> StorageResult<UserRow> {
        // Duplicate check and insert happen under one write lock, so two
        // concurrent creates cannot both pass the check.
        let mut users = self.users.write();
        if users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(&input.username))
        {
            return Err(StorageError::Duplicate { field: "username" });
        }

        let now = Self::now();
        let id = Uuid::now_v7();
        let row = UserRow {
            id,
            username: input.username,
            password_hash: input.password_hash,
            roles: input.roles,
            active: true,
            created_at: now,
            updated_at: now,
        };
        users.insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> StorageResult<Option<UserRow>> {
        Ok(self.users.read().get(&id).cloned())
    }

    pub async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<UserRow>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    pub async fn list_users(&self) -> StorageResult<Vec<UserRow>> {
        let users = self.users.read();
        let mut result: Vec<_> = users.values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> StorageResult<Option<UserRow>> {
        let mut users = self.users.write();

        if let Some(username) = &input.username {
            if users
                .values()
                .any(|u| u.id != id && u.username.eq_ignore_ascii_case(username))
            {
                return Err(StorageError::Duplicate { field: "username" });
            }
        }

        if let Some(user) = users.get_mut(&id) {
            if let Some(username) = input.username {
                user.username = username;
            }
            if let Some(roles) = input.roles {
                user.roles = roles;
            }
            if let Some(active) = input.active {
                user.active = active;
            }
            if let Some(password_hash) = input.password_hash {
                user.password_hash = password_hash;
            }
            user.updated_at = Self::now();
            return Ok(Some(user.clone()));
        }
        Ok(None)
    }

    pub async fn delete_user(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.users.write().remove(&id).is_some())
    }

    pub async fn user_has_notes(&self, user_id: Uuid) -> StorageResult<bool> {
        Ok(self.notes.read().values().any(|n| n.user_id == user_id))
    }

    // ============================================
    // Notes
    // ============================================

    pub async fn create_note(&self, input: CreateNoteRow) -> StorageResult<NoteRow> {
        let mut notes = self.notes.write();
        if notes
            .values()
            .any(|n| n.title.eq_ignore_ascii_case(&input.title))
        {
            return Err(StorageError::Duplicate { field: "title" });
        }

        let ticket = {
            let mut seq = self.tickets.write();
            let ticket = *seq;
            *seq += 1;
            ticket
        };

        let now = Self::now();
        let id = Uuid::now_v7();
        let row = NoteRow {
            id,
            user_id: input.user_id,
            title: input.title,
            text: input.text,
            completed: false,
            ticket,
            created_at: now,
            updated_at: now,
        };
        notes.insert(id, row.clone());
        Ok(row)
    }

    pub async fn get_note(&self, id: Uuid) -> StorageResult<Option<NoteRow>> {
        Ok(self.notes.read().get(&id).cloned())
    }

    pub async fn list_notes_with_owner(&self) -> StorageResult<Vec<NoteWithOwnerRow>> {
        let users = self.users.read();
        let notes = self.notes.read();
        let mut result: Vec<_> = notes
            .values()
            .filter_map(|n| {
                let username = users.get(&n.user_id)?.username.clone();
                Some(NoteWithOwnerRow {
                    id: n.id,
                    user_id: n.user_id,
                    title: n.title.clone(),
                    text: n.text.clone(),
                    completed: n.completed,
                    ticket: n.ticket,
                    created_at: n.created_at,
                    updated_at: n.updated_at,
                    username,
                })
            })
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    pub async fn update_note(&self, id: Uuid, input: UpdateNote) -> StorageResult<Option<NoteRow>> {
        let mut notes = self.notes.write();

        if let Some(title) = &input.title {
            if notes
                .values()
                .any(|n| n.id != id && n.title.eq_ignore_ascii_case(title))
            {
                return Err(StorageError::Duplicate { field: "title" });
            }
        }

        if let Some(note) = notes.get_mut(&id) {
            if let Some(user_id) = input.user_id {
                note.user_id = user_id;
            }
            if let Some(title) = input.title {
                note.title = title;
            }
            if let Some(text) = input.text {
                note.text = text;
            }
            if let Some(completed) = input.completed {
                note.completed = completed;
            }
            note.updated_at = Self::now();
            return Ok(Some(note.clone()));
        }
        Ok(None)
    }

    pub async fn delete_note(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.notes.write().remove(&id).is_some())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
