use chrono::Utc;
use inkdraft_core::{NewPost, Post, PostId, PostStatus, PostUpdate};
use sqlx::SqlitePool;

use super::{decode_time, encode_time};

pub struct PostRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let status = row.status.parse::<PostStatus>().unwrap_or_else(|e| {
            tracing::warn!(post_id = row.id, "{}", e);
            PostStatus::Draft
        });
        Post {
            id: row.id,
            title: row.title,
            content: row.content,
            status,
            created_at: decode_time(&row.created_at),
            updated_at: decode_time(&row.updated_at),
        }
    }
}

const COLUMNS: &str = "id, title, content, status, created_at, updated_at";

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a draft. A missing title becomes "Untitled".
    pub async fn create(&self, post: &NewPost, owner: Option<i64>) -> Result<Post, sqlx::Error> {
        let now = encode_time(Utc::now());
        let title = post.title.as_deref().unwrap_or("Untitled");

        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, content, status, created_at, updated_at, user_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(&post.content)
        .bind(PostStatus::Draft.as_str())
        .bind(&now)
        .bind(&now)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        self.get_by_id(result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn get_by_id(&self, id: PostId) -> Result<Option<Post>, sqlx::Error> {
        let row: Option<PostRow> =
            sqlx::query_as(&format!("SELECT {} FROM posts WHERE id = ?", COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Post::from))
    }

    /// Most recently updated first.
    pub async fn list(&self, status: Option<PostStatus>) -> Result<Vec<Post>, sqlx::Error> {
        let rows: Vec<PostRow> = match status {
            Some(status) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM posts WHERE status = ? ORDER BY updated_at DESC, id DESC",
                    COLUMNS
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM posts ORDER BY updated_at DESC, id DESC",
                    COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// Writes the fields present in `fields` and bumps `updated_at`.
    /// Returns `None` if the post does not exist.
    pub async fn update(
        &self,
        id: PostId,
        fields: &PostUpdate,
    ) -> Result<Option<Post>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = COALESCE(?, title),
                content = COALESCE(?, content),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.content)
        .bind(encode_time(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn set_status(
        &self,
        id: PostId,
        status: PostStatus,
    ) -> Result<Option<Post>, sqlx::Error> {
        let result = sqlx::query("UPDATE posts SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(encode_time(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Returns `false` if there was nothing to delete.
    pub async fn delete(&self, id: PostId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[cfg(test)]
    pub async fn owner(&self, id: PostId) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(Option<i64>,)> = sqlx::query_as("SELECT user_id FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|r| r.0))
    }
}
