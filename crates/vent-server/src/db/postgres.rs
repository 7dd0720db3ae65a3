use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use vent_shared::{Comment, Post, Profile};

use super::{DbPool, Store};
use crate::error::AppError;

const COMMENT_COLUMNS: &str =
    "id, post_id, author_id, content, parent_comment_id, created_at, updated_at";

pub struct PgStore {
    db: DbPool,
}

impl PgStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, content, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.content)
        .bind(post.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, author_id, content, created_at FROM posts WHERE id = $1",
        )
        .bind(post_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let comments = sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .fetch_all(&self.db)
            .await?;

        Ok(comments)
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, AppError> {
        let query = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let comment = sqlx::query_as::<_, Comment>(&query)
            .bind(comment_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(comment)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, author_id, content, parent_comment_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.parent_comment_id)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError> {
        let query = format!(
            "UPDATE comments SET content = $1, updated_at = $2 WHERE id = $3 \
             RETURNING {COMMENT_COLUMNS}"
        );
        let comment = sqlx::query_as::<_, Comment>(&query)
            .bind(content)
            .bind(updated_at)
            .bind(comment_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn like_count(&self, comment_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM comment_likes WHERE comment_id = $1")
                .bind(comment_id)
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }

    async fn has_liked(&self, comment_id: Uuid, author_id: Uuid) -> Result<bool, AppError> {
        let (liked,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM comment_likes WHERE comment_id = $1 AND author_id = $2)",
        )
        .bind(comment_id)
        .bind(author_id)
        .fetch_one(&self.db)
        .await?;

        Ok(liked)
    }

    async fn toggle_like(&self, comment_id: Uuid, author_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.db.begin().await?;

        // Toggles on one comment queue on its row until the holder commits.
        sqlx::query("SELECT id FROM comments WHERE id = $1 FOR UPDATE")
            .bind(comment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        let removed = sqlx::query(
            "DELETE FROM comment_likes WHERE comment_id = $1 AND author_id = $2",
        )
        .bind(comment_id)
        .bind(author_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            sqlx::query(
                r#"
                INSERT INTO comment_likes (comment_id, author_id, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (comment_id, author_id) DO NOTHING
                "#,
            )
            .bind(comment_id)
            .bind(author_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(removed == 0)
    }

    async fn find_profile(&self, author_id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT author_id, username, created_at, updated_at FROM profiles WHERE author_id = $1",
        )
        .bind(author_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(profile)
    }

    async fn find_profile_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT author_id, username, created_at, updated_at FROM profiles WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(profile)
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (author_id, username, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (author_id)
            DO UPDATE SET username = EXCLUDED.username, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.author_id)
        .bind(&profile.username)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Username already taken".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(())
    }
}
