use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use vent_shared::{api::CreatePostRequest, Post};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::AppState;

/// POST /api/v1/posts
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreatePostRequest>,
) -> Result<Json<Post>, AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Post content is required".to_string()));
    }

    let post = Post {
        id: Uuid::new_v4(),
        author_id: user.id,
        content: content.to_string(),
        created_at: Utc::now(),
    };

    state.store.insert_post(&post).await?;
    tracing::info!(post_id = %post.id, "post created");

    Ok(Json(post))
}

/// GET /api/v1/posts/:post_id
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Post>, AppError> {
    let post = state
        .store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    Ok(Json(post))
}

/// DELETE /api/v1/posts/:post_id
///
/// Comments, replies and likes under the post go with it.
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<(), AppError> {
    let post = state
        .store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    if post.author_id != user.id {
        return Err(AppError::Forbidden);
    }

    state.store.delete_post(post_id).await?;
    tracing::info!(%post_id, "post deleted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn create_then_fetch_post() {
        let app = TestApp::new();
        let author = app.author();

        let (status, created) = app
            .request(
                Method::POST,
                "/api/v1/posts",
                Some(author),
                Some(json!({ "content": " long week " })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["content"], "long week");

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = app
            .request(Method::GET, &format!("/api/v1/posts/{id}"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn empty_post_is_rejected() {
        let app = TestApp::new();

        let (status, _) = app
            .request(
                Method::POST,
                "/api/v1/posts",
                Some(app.author()),
                Some(json!({ "content": "" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_post_removes_comments_and_is_owner_only() {
        let app = TestApp::new();
        let (owner, stranger) = (app.author(), app.author());
        let post = app.seed_post(owner).await;
        let root = app.comment(owner, post, "root", None).await;
        app.comment(stranger, post, "reply", Some(root)).await;
        let uri = format!("/api/v1/posts/{post}");

        let (status, _) = app.request(Method::DELETE, &uri, Some(stranger), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.request(Method::DELETE, &uri, Some(owner), None).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(app.comment_count(post).await, 0);
        let (status, _) = app.request(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
