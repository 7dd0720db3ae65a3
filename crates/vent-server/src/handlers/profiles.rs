use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use vent_shared::{
    api::{validate_username, UpdateProfileRequest},
    Profile,
};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::routes::AppState;

/// PUT /api/v1/profile
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    let username = req.username.trim();
    validate_username(username).map_err(|e| AppError::Validation(e.to_string()))?;

    if let Some(holder) = state.store.find_profile_by_username(username).await? {
        if holder.author_id != user.id {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
    }

    let now = Utc::now();
    let created_at = state
        .store
        .find_profile(user.id)
        .await?
        .map(|existing| existing.created_at)
        .unwrap_or(now);

    let profile = Profile {
        author_id: user.id,
        username: username.to_string(),
        created_at,
        updated_at: now,
    };
    state.store.upsert_profile(&profile).await?;

    Ok(Json(profile))
}

/// GET /api/v1/profile/:author_id
pub async fn get_profile(
    State(state): State<AppState>,
    Path(author_id): Path<Uuid>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .store
        .find_profile(author_id)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))?;

    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn username_shows_on_comments_after_profile_is_set() {
        let app = TestApp::new();
        let (named, nameless) = (app.author(), app.author());
        let post = app.seed_post(named).await;
        let root = app.comment(nameless, post, "root", None).await;
        app.comment(named, post, "reply", Some(root)).await;

        let (status, _) = app
            .request(
                Method::PUT,
                "/api/v1/profile",
                Some(named),
                Some(json!({ "username": "night_owl" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = app
            .request(Method::GET, &format!("/api/v1/posts/{post}/comments"), None, None)
            .await;
        assert_eq!(listed[0]["authorName"], "anonymous");
        assert_eq!(listed[0]["replies"][0]["authorName"], "night_owl");
    }

    #[tokio::test]
    async fn malformed_username_is_a_validation_error() {
        let app = TestApp::new();

        let (status, _) = app
            .request(
                Method::PUT,
                "/api/v1/profile",
                Some(app.author()),
                Some(json!({ "username": "no way!" })),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn taken_username_conflicts() {
        let app = TestApp::new();
        let (first, second) = (app.author(), app.author());
        let body = json!({ "username": "owl" });

        let (status, _) = app
            .request(Method::PUT, "/api/v1/profile", Some(first), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .request(Method::PUT, "/api/v1/profile", Some(second), Some(body))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_profile_is_not_found() {
        let app = TestApp::new();

        let (status, body) = app
            .request(
                Method::GET,
                &format!("/api/v1/profile/{}", app.author()),
                None,
                None,
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Profile not found");
    }
}
