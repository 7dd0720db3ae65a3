use std::collections::{HashMap, HashSet};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use vent_shared::{Comment, CommentLike, Post, Profile};

use super::Store;
use crate::error::AppError;

#[derive(Default)]
struct Tables {
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    likes: Vec<CommentLike>,
    profiles: HashMap<Uuid, Profile>,
}

impl Tables {
    /// Removes the comments and, transitively, their replies and likes.
    fn cascade_comments(&mut self, mut doomed: HashSet<Uuid>) {
        loop {
            let replies: Vec<Uuid> = self
                .comments
                .values()
                .filter(|c| c.parent_comment_id.is_some_and(|p| doomed.contains(&p)))
                .map(|c| c.id)
                .filter(|id| !doomed.contains(id))
                .collect();
            if replies.is_empty() {
                break;
            }
            doomed.extend(replies);
        }

        self.comments.retain(|id, _| !doomed.contains(id));
        self.likes.retain(|like| !doomed.contains(&like.comment_id));
    }
}

/// Process-local store with the same cascade and uniqueness rules as the
/// Postgres schema. Used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        self.tables.write().await.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>, AppError> {
        Ok(self.tables.read().await.posts.get(&post_id).cloned())
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.posts.remove(&post_id);
        let doomed = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.id)
            .collect();
        tables.cascade_comments(doomed);
        Ok(())
    }

    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, AppError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(comments)
    }

    async fn count_comments(&self, post_id: Uuid) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.values().filter(|c| c.post_id == post_id).count() as i64)
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, AppError> {
        Ok(self.tables.read().await.comments.get(&comment_id).cloned())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(AppError::Internal(anyhow!(
                "comment {} references missing post {}",
                comment.id,
                comment.post_id
            )));
        }
        if let Some(parent) = comment.parent_comment_id {
            if !tables.comments.contains_key(&parent) {
                return Err(AppError::Internal(anyhow!(
                    "comment {} references missing parent {}",
                    comment.id,
                    parent
                )));
            }
        }
        if tables.comments.contains_key(&comment.id) {
            return Err(AppError::Internal(anyhow!("duplicate comment id {}", comment.id)));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn update_comment(
        &self,
        comment_id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables.comments.get_mut(&comment_id).map(|comment| {
            comment.content = content.to_string();
            comment.updated_at = updated_at;
            comment.clone()
        }))
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.comments.contains_key(&comment_id) {
            tables.cascade_comments(HashSet::from([comment_id]));
        }
        Ok(())
    }

    async fn like_count(&self, comment_id: Uuid) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .iter()
            .filter(|like| like.comment_id == comment_id)
            .count() as i64)
    }

    async fn has_liked(&self, comment_id: Uuid, author_id: Uuid) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .iter()
            .any(|like| like.comment_id == comment_id && like.author_id == author_id))
    }

    async fn toggle_like(&self, comment_id: Uuid, author_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.comments.contains_key(&comment_id) {
            return Err(AppError::Internal(anyhow!(
                "like references missing comment {comment_id}"
            )));
        }

        let before = tables.likes.len();
        tables
            .likes
            .retain(|like| !(like.comment_id == comment_id && like.author_id == author_id));
        if tables.likes.len() < before {
            return Ok(false);
        }

        tables.likes.push(CommentLike {
            comment_id,
            author_id,
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn find_profile(&self, author_id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(self.tables.read().await.profiles.get(&author_id).cloned())
    }

    async fn find_profile_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Profile>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .profiles
            .values()
            .find(|profile| profile.username == username)
            .cloned())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .profiles
            .values()
            .any(|p| p.username == profile.username && p.author_id != profile.author_id);
        if taken {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        tables
            .profiles
            .entry(profile.author_id)
            .and_modify(|existing| {
                existing.username = profile.username.clone();
                existing.updated_at = profile.updated_at;
            })
            .or_insert_with(|| profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn post() -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            content: "rough day".to_string(),
            created_at: Utc::now(),
        }
    }

    fn comment(post_id: Uuid, parent: Option<Uuid>, age_minutes: i64) -> Comment {
        let created_at = Utc::now() - Duration::minutes(age_minutes);
        Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id: Uuid::new_v4(),
            content: "same".to_string(),
            parent_comment_id: parent,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn comments_come_back_newest_first() {
        let store = MemoryStore::default();
        let post = post();
        store.insert_post(&post).await.unwrap();
        let old = comment(post.id, None, 10);
        let new = comment(post.id, None, 1);
        store.insert_comment(&old).await.unwrap();
        store.insert_comment(&new).await.unwrap();

        let fetched = store.comments_for_post(post.id).await.unwrap();

        assert_eq!(fetched.iter().map(|c| c.id).collect::<Vec<_>>(), vec![new.id, old.id]);
    }

    #[tokio::test]
    async fn deleting_a_comment_cascades_to_replies_and_likes() {
        let store = MemoryStore::default();
        let post = post();
        store.insert_post(&post).await.unwrap();
        let root = comment(post.id, None, 3);
        let reply = comment(post.id, Some(root.id), 2);
        let nested = comment(post.id, Some(reply.id), 1);
        let other = comment(post.id, None, 0);
        for c in [&root, &reply, &nested, &other] {
            store.insert_comment(c).await.unwrap();
        }
        store.toggle_like(nested.id, Uuid::new_v4()).await.unwrap();
        store.toggle_like(other.id, Uuid::new_v4()).await.unwrap();

        store.delete_comment(root.id).await.unwrap();

        let left = store.comments_for_post(post.id).await.unwrap();
        assert_eq!(left.iter().map(|c| c.id).collect::<Vec<_>>(), vec![other.id]);
        assert_eq!(store.like_count(nested.id).await.unwrap(), 0);
        assert_eq!(store.like_count(other.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_a_post_cascades_to_comments() {
        let store = MemoryStore::default();
        let post = post();
        store.insert_post(&post).await.unwrap();
        let root = comment(post.id, None, 1);
        store.insert_comment(&root).await.unwrap();

        store.delete_post(post.id).await.unwrap();

        assert!(store.find_comment(root.id).await.unwrap().is_none());
        assert_eq!(store.count_comments(post.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn comment_for_missing_post_is_rejected() {
        let store = MemoryStore::default();
        let orphan = comment(Uuid::new_v4(), None, 0);

        assert!(store.insert_comment(&orphan).await.is_err());
    }

    #[tokio::test]
    async fn toggle_like_twice_restores_count() {
        let store = MemoryStore::default();
        let post = post();
        store.insert_post(&post).await.unwrap();
        let target = comment(post.id, None, 0);
        store.insert_comment(&target).await.unwrap();
        let author = Uuid::new_v4();

        assert!(store.toggle_like(target.id, author).await.unwrap());
        assert_eq!(store.like_count(target.id).await.unwrap(), 1);
        assert!(store.has_liked(target.id, author).await.unwrap());

        assert!(!store.toggle_like(target.id, author).await.unwrap());
        assert_eq!(store.like_count(target.id).await.unwrap(), 0);
        assert!(!store.has_liked(target.id, author).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_toggles_by_one_author_cancel_out() {
        let store = MemoryStore::default();
        let post = post();
        store.insert_post(&post).await.unwrap();
        let target = comment(post.id, None, 0);
        store.insert_comment(&target).await.unwrap();
        let fan = Uuid::new_v4();

        let (first, second) = tokio::join!(
            store.toggle_like(target.id, fan),
            store.toggle_like(target.id, fan)
        );

        assert_ne!(first.unwrap(), second.unwrap());
        assert_eq!(store.like_count(target.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn usernames_are_unique_across_authors() {
        let store = MemoryStore::default();
        let now = Utc::now();
        let first = Profile {
            author_id: Uuid::new_v4(),
            username: "owl".to_string(),
            created_at: now,
            updated_at: now,
        };
        store.upsert_profile(&first).await.unwrap();
        store.upsert_profile(&first).await.unwrap();

        let second = Profile {
            author_id: Uuid::new_v4(),
            ..first.clone()
        };
        let err = store.upsert_profile(&second).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }
}
