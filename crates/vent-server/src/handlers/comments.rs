use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use vent_shared::{
    api::{
        CommentCountResponse, CommentListParams, CreateCommentRequest, LikeToggleResponse,
        UpdateCommentRequest,
    },
    Comment, CommentNode,
};

use crate::auth::{AuthUser, MaybeAuthUser};
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::AppState;
use crate::services::list_comment_tree;

/// Trimmed comment text, or a validation error when nothing is left.
fn comment_content(raw: &str) -> Result<String, AppError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Comment content is required".to_string()));
    }
    Ok(content.to_string())
}

/// Helper to load a comment the requester owns
async fn owned_comment(
    state: &AppState,
    comment_id: Uuid,
    author_id: Uuid,
) -> Result<Comment, AppError> {
    let comment = state
        .store
        .find_comment(comment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))?;

    if comment.author_id != author_id {
        return Err(AppError::Forbidden);
    }
    Ok(comment)
}

/// GET /api/v1/posts/:post_id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    requester: MaybeAuthUser,
    Path(post_id): Path<Uuid>,
    Query(params): Query<CommentListParams>,
) -> Result<Json<Vec<CommentNode>>, AppError> {
    let forest =
        list_comment_tree(state.store.as_ref(), post_id, requester.id(), params.page()).await?;
    Ok(Json(forest))
}

/// POST /api/v1/posts/:post_id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
    AppJson(req): AppJson<CreateCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    let content = comment_content(&req.content)?;

    if state.store.find_post(post_id).await?.is_none() {
        return Err(AppError::not_found("Post"));
    }

    if let Some(parent_id) = req.parent_comment_id {
        let parent = state
            .store
            .find_comment(parent_id)
            .await?
            .ok_or_else(|| AppError::not_found("Parent comment"))?;

        if parent.post_id != post_id {
            return Err(AppError::Validation(
                "Parent comment must belong to the same post".to_string(),
            ));
        }
    }

    let now = Utc::now();
    let comment = Comment {
        id: Uuid::new_v4(),
        post_id,
        author_id: user.id,
        content,
        parent_comment_id: req.parent_comment_id,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_comment(&comment).await?;
    tracing::info!(
        comment_id = %comment.id,
        %post_id,
        reply = comment.parent_comment_id.is_some(),
        "comment created"
    );

    Ok(Json(comment))
}

/// GET /api/v1/posts/:post_id/comments/count
pub async fn count_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<CommentCountResponse>, AppError> {
    if state.store.find_post(post_id).await?.is_none() {
        return Err(AppError::not_found("Post"));
    }

    let count = state.store.count_comments(post_id).await?;
    Ok(Json(CommentCountResponse { count }))
}

/// PATCH /api/v1/comments/:comment_id
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<Uuid>,
    AppJson(req): AppJson<UpdateCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    let content = comment_content(&req.content)?;
    owned_comment(&state, comment_id, user.id).await?;

    let comment = state
        .store
        .update_comment(comment_id, &content, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found("Comment"))?;

    Ok(Json(comment))
}

/// DELETE /api/v1/comments/:comment_id
///
/// Replies and likes go with the comment.
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<(), AppError> {
    owned_comment(&state, comment_id, user.id).await?;

    state.store.delete_comment(comment_id).await?;
    tracing::info!(%comment_id, "comment deleted");

    Ok(())
}

/// POST /api/v1/comments/:comment_id/like
pub async fn toggle_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<LikeToggleResponse>, AppError> {
    if state.store.find_comment(comment_id).await?.is_none() {
        return Err(AppError::not_found("Comment"));
    }

    let liked = state.store.toggle_like(comment_id, user.id).await?;
    let like_count = state.store.like_count(comment_id).await?;

    Ok(Json(LikeToggleResponse { liked, like_count }))
}
