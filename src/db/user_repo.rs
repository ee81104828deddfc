use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{decode_time, encode_time};

/// An account as stored, including its password digest.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: decode_time(&row.created_at),
        }
    }
}

/// Users and their bearer-token sessions.
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a user. Fails with a unique-constraint error if the email is
    /// taken.
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<User, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(encode_time(Utc::now()))
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Emails are compared case-insensitively.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, created_at FROM users WHERE LOWER(email) = LOWER(?)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    pub async fn create_session(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token)
        .bind(user_id)
        .bind(encode_time(Utc::now()))
        .bind(encode_time(expires_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The user a token belongs to, if the token exists and has not expired
    /// at `now`.
    pub async fn user_for_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.email, u.password_hash, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = ? AND s.expires_at > ?
            "#,
        )
        .bind(token)
        .bind(encode_time(now))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Removes sessions expired at `now`. Returns how many were removed.
    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(encode_time(now))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use chrono::Duration;
    use tempfile::TempDir;

    struct TestContext {
        repo: UserRepository,
        _temp_dir: TempDir,
    }

    async fn setup_repo() -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        TestContext {
            repo: UserRepository::new(pool),
            _temp_dir: temp_dir,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;

        let user = repo.create("ada@example.com", "salt$hash").await.unwrap();
        assert_eq!(user.email, "ada@example.com");

        let by_email = repo.get_by_email("ADA@example.com").await.unwrap().unwrap();
        assert_eq!(by_email, user);
        assert!(repo.get_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let ctx = setup_repo().await;
        ctx.repo.create("ada@example.com", "h").await.unwrap();

        let err = ctx.repo.create("ada@example.com", "h").await.unwrap_err();
        assert!(matches!(
            err,
            sqlx::Error::Database(ref db) if db.is_unique_violation()
        ));
    }

    #[tokio::test]
    async fn test_session_lookup_respects_expiry() {
        let ctx = setup_repo().await;
        let repo = &ctx.repo;
        let user = repo.create("ada@example.com", "h").await.unwrap();
        let now = Utc::now();

        repo.create_session("live", user.id, now + Duration::minutes(5))
            .await
            .unwrap();
        repo.create_session("dead", user.id, now - Duration::minutes(5))
            .await
            .unwrap();

        let found = repo.user_for_token("live", now).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(repo.user_for_token("dead", now).await.unwrap().is_none());
        assert!(repo.user_for_token("unknown", now).await.unwrap().is_none());

        // The live token stops working once its expiry passes.
        let later = now + Duration::minutes(10);
        assert!(repo.user_for_token("live", later).await.unwrap().is_none());

        assert_eq!(repo.delete_expired_sessions(now).await.unwrap(), 1);
    }
}
