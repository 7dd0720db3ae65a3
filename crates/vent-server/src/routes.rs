use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::identity_middleware;
use crate::db::Store;
use crate::handlers::{
    comments as comment_handlers, posts as post_handlers, profiles as profile_handlers,
};
use crate::Config;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
}

pub fn create_router(store: Arc<dyn Store>, config: Config) -> Router {
    let state = AppState { store, config };

    // Comment routes (nested under posts)
    let post_comment_routes = Router::new()
        .route(
            "/",
            get(comment_handlers::list_comments).post(comment_handlers::create_comment),
        )
        .route("/count", get(comment_handlers::count_comments));

    let post_routes = Router::new()
        .route("/", post(post_handlers::create_post))
        .route(
            "/:post_id",
            get(post_handlers::get_post).delete(post_handlers::delete_post),
        )
        .nest("/:post_id/comments", post_comment_routes);

    let comment_routes = Router::new()
        .route(
            "/:comment_id",
            patch(comment_handlers::update_comment).delete(comment_handlers::delete_comment),
        )
        .route("/:comment_id/like", post(comment_handlers::toggle_like));

    let profile_routes = Router::new()
        .route("/", put(profile_handlers::update_profile))
        .route("/:author_id", get(profile_handlers::get_profile));

    // Identity is resolved for every API route; handlers decide whether they need it
    let api_routes = Router::new()
        .nest("/posts", post_routes)
        .nest("/comments", comment_routes)
        .nest("/profile", profile_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn health_is_public() {
        let app = TestApp::new();

        let (status, _) = app.request(Method::GET, "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = TestApp::new();

        let (status, _) = app.request(Method::GET, "/api/v1/nope", None, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
