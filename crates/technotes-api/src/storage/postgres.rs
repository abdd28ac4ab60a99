// PostgreSQL repository
// Uniqueness of usernames and note titles lives in unique indexes on
// lower(...); violations come back to callers as StorageError::Duplicate.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::*;
use super::StorageResult;

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date.
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> StorageResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash, roles)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, roles, active, created_at, updated_at
            "#,
        )
        .bind(&input.username)
        .bind(&input.password_hash)
        .bind(&input.roles)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> StorageResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, roles, active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Exact-match lookup used by login and refresh.
    pub async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, roles, active, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_users(&self) -> StorageResult<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, roles, active, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> StorageResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                username = COALESCE($2, username),
                roles = COALESCE($3, roles),
                active = COALESCE($4, active),
                password_hash = COALESCE($5, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, password_hash, roles, active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.username)
        .bind(&input.roles)
        .bind(input.active)
        .bind(&input.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_user(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn user_has_notes(&self, user_id: Uuid) -> StorageResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM notes WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    // ============================================
    // Notes
    // ============================================

    pub async fn create_note(&self, input: CreateNoteRow) -> StorageResult<NoteRow> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            INSERT INTO notes (user_id, title, text)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, text, completed, ticket, created_at, updated_at
            "#,
        )
        .bind(input.user_id)
        .bind(&input.title)
        .bind(&input.text)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_note(&self, id: Uuid) -> StorageResult<Option<NoteRow>> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            SELECT id, user_id, title, text, completed, ticket, created_at, updated_at
            FROM notes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_notes_with_owner(&self) -> StorageResult<Vec<NoteWithOwnerRow>> {
        let rows = sqlx::query_as::<_, NoteWithOwnerRow>(
            r#"
            SELECT n.id, n.user_id, n.title, n.text, n.completed, n.ticket,
                   n.created_at, n.updated_at, u.username
            FROM notes n
            JOIN users u ON u.id = n.user_id
            ORDER BY n.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_note(&self, id: Uuid, input: UpdateNote) -> StorageResult<Option<NoteRow>> {
        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            UPDATE notes
            SET
                user_id = COALESCE($2, user_id),
                title = COALESCE($3, title),
                text = COALESCE($4, text),
                completed = COALESCE($5, completed),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, title, text, completed, ticket, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.user_id)
        .bind(&input.title)
        .bind(&input.text)
        .bind(input.completed)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_note(&self, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
