use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::repo_types::User;

impl User {
    /// Find a user by username.
    pub async fn find_by_username(db: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &SqlitePool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// True when either the username or the email is already registered.
    pub async fn credentials_taken(
        db: &SqlitePool,
        username: &str,
        email: &str,
    ) -> sqlx::Result<bool> {
        let row: Option<(Uuid,)> =
            sqlx::query_as(r#"SELECT id FROM users WHERE username = ? OR email = ? LIMIT 1"#)
                .bind(username)
                .bind(email)
                .fetch_optional(db)
                .await?;
        Ok(row.is_some())
    }

    /// Create a new user with an already hashed password.
    pub async fn create(
        db: &SqlitePool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(crate::db::now())
        .fetch_one(db)
        .await
    }
}
