use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;
use vent_shared::{Comment, Post, Profile};

use crate::config::Config;
use crate::error::AppError;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type DbPool = PgPool;

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Opens the configured store. Without a database URL the server runs on an
/// in-memory store that is lost on restart.
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, config.db_max_connections).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Connected to Postgres, migrations applied");
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}

/// Relational storage behind the handlers.
///
/// Deleting a post removes its comments, deleting a comment removes its
/// replies, and either removes the affected likes. Implementations enforce
/// this themselves; callers never cascade by hand.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_post(&self, post: &Post) -> Result<(), AppError>;
    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, AppError>;
    async fn delete_post(&self, post_id: Uuid) -> Result<(), AppError>;

    /// Every comment of the post, newest first.
    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError>;
    async fn count_comments(&self, post_id: Uuid) -> Result<i64, AppError>;
    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, AppError>;
    async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError>;
    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError>;
    async fn delete_comment(&self, comment_id: Uuid) -> Result<(), AppError>;

    async fn like_count(&self, comment_id: Uuid) -> Result<i64, AppError>;
    async fn has_liked(&self, comment_id: Uuid, author_id: Uuid) -> Result<bool, AppError>;
    /// Flips the author's like on the comment and returns whether it is now liked.
    async fn toggle_like(&self, comment_id: Uuid, author_id: Uuid) -> Result<bool, AppError>;

    async fn find_profile(&self, author_id: Uuid) -> Result<Option<Profile>, AppError>;
    async fn find_profile_by_username(&self, username: &str)
        -> Result<Option<Profile>, AppError>;
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError>;
}
