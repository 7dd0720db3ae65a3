use std::collections::HashMap;

use uuid::Uuid;
use vent_shared::{
    tree::{self, Page},
    Comment, CommentNode, CommentStats, ANONYMOUS_AUTHOR,
};

use crate::db::Store;
use crate::error::AppError;

/// Loads every comment of a post, newest first.
///
/// The post must exist; a missing post aborts before comments are read.
pub async fn fetch_post_comments(store: &dyn Store, post_id: Uuid) -> Result<Vec<Comment>, AppError> {
    if store.find_post(post_id).await?.is_none() {
        return Err(AppError::not_found("Post"));
    }

    let comments = store.comments_for_post(post_id).await?;
    tracing::debug!(%post_id, rows = comments.len(), "fetched comments");

    Ok(comments)
}

/// Turns fetched comments into the nested response for one requester.
pub struct CommentTreeAssembler<'a> {
    store: &'a dyn Store,
    requester: Option<Uuid>,
}

impl<'a> CommentTreeAssembler<'a> {
    pub fn new(store: &'a dyn Store, requester: Option<Uuid>) -> Self {
        Self { store, requester }
    }

    pub async fn assemble(
        &self,
        comments: &[Comment],
        page: Page,
    ) -> Result<Vec<CommentNode>, AppError> {
        let author_names = self.resolve_author_names(comments).await?;
        let stats = self.resolve_stats(comments).await?;

        Ok(tree::assemble(comments, &author_names, &stats, page))
    }

    /// One profile lookup per distinct author.
    async fn resolve_author_names(
        &self,
        comments: &[Comment],
    ) -> Result<HashMap<Uuid, String>, AppError> {
        let mut names = HashMap::new();

        for comment in comments {
            if names.contains_key(&comment.author_id) {
                continue;
            }
            let name = self
                .store
                .find_profile(comment.author_id)
                .await?
                .map(|profile| profile.username)
                .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string());
            names.insert(comment.author_id, name);
        }

        Ok(names)
    }

    async fn resolve_stats(
        &self,
        comments: &[Comment],
    ) -> Result<HashMap<Uuid, CommentStats>, AppError> {
        let mut stats = HashMap::with_capacity(comments.len());

        for comment in comments {
            let like_count = self.store.like_count(comment.id).await?;
            let has_liked = match self.requester {
                Some(author_id) => self.store.has_liked(comment.id, author_id).await?,
                None => false,
            };
            stats.insert(
                comment.id,
                CommentStats {
                    like_count,
                    has_liked,
                },
            );
        }

        Ok(stats)
    }
}

/// Fetch then assemble: the comment listing of a post.
pub async fn list_comment_tree(
    store: &dyn Store,
    post_id: Uuid,
    requester: Option<Uuid>,
    page: Page,
) -> Result<Vec<CommentNode>, AppError> {
    let comments = fetch_post_comments(store, post_id).await?;
    let forest = CommentTreeAssembler::new(store, requester)
        .assemble(&comments, page)
        .await?;

    tracing::debug!(
        %post_id,
        roots = forest.len(),
        nodes = tree::count_nodes(&forest),
        "assembled comment tree"
    );

    Ok(forest)
}
