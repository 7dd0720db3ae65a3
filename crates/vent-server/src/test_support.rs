use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;
use vent_shared::{Comment, Post};

use crate::auth::create_access_token;
use crate::db::{MemoryStore, Store};
use crate::routes::create_router;
use crate::Config;

const TEST_SECRET: &str = "test-secret";

/// Router over a fresh in-memory store, with a clock that hands seeded rows
/// strictly increasing timestamps.
pub struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    ticks: AtomicI64,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let config = Config {
            database_url: None,
            jwt_secret: TEST_SECRET.to_string(),
            db_max_connections: 1,
            port: 0,
        };

        Self {
            router: create_router(store.clone(), config),
            store,
            ticks: AtomicI64::new(0),
        }
    }

    pub fn author(&self) -> Uuid {
        Uuid::new_v4()
    }

    fn tick(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        Utc::now() - Duration::days(1) + Duration::seconds(tick)
    }

    pub async fn seed_post(&self, author_id: Uuid) -> Uuid {
        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            content: "venting".to_string(),
            created_at: self.tick(),
        };
        self.store.insert_post(&post).await.unwrap();
        post.id
    }

    pub async fn comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        content: &str,
        parent: Option<Uuid>,
    ) -> Uuid {
        let created_at = self.tick();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            content: content.to_string(),
            parent_comment_id: parent,
            created_at,
            updated_at: created_at,
        };
        self.store.insert_comment(&comment).await.unwrap();
        comment.id
    }

    pub async fn comment_count(&self, post_id: Uuid) -> i64 {
        self.store.count_comments(post_id).await.unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        as_author: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(author_id) = as_author {
            let token = create_access_token(author_id, TEST_SECRET, 300);
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(request).await
    }

    pub async fn request_with_header(
        &self,
        method: Method,
        uri: &str,
        authorization: &str,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, authorization)
            .body(Body::empty())
            .unwrap();

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }
}
