//! Shared fixtures for the integration tests: a fully wired application
//! over an in-memory SQLite store and a temporary media directory.

use api_adapters::{create_router, AppState};
use auth_adapters::{hash_token, ApiTokenVerifier};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use domains::{CreatePost, Post, PostType, Visibility};
use serde_json::Value;
use services::{CollectionService, IdCodec, PostService, RedirectService, SearchService, SiteInfo};
use std::sync::Arc;
use storage_adapters::{LocalMediaStorage, SqliteStore};
use tempfile::TempDir;
use tower::ServiceExt;

/// Token accepted by every `TestApp`.
pub const TEST_TOKEN: &str = "integration-test-token";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<SqliteStore>,
    pub media_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(SqliteStore::in_memory().await.expect("in-memory store"));
        let media_dir = tempfile::tempdir().expect("temp media dir");
        let storage = Arc::new(LocalMediaStorage::new(media_dir.path(), "/media"));
        let hash = hash_token(TEST_TOKEN).expect("hash test token");
        let auth = Arc::new(ApiTokenVerifier::new(Some(hash.into())));
        let site = SiteInfo {
            name: "Test Site".into(),
            description: "A site under test".into(),
            language: "en".into(),
            base_url: "https://example.test".into(),
        };
        let ids = IdCodec::new(5).expect("sqid codec");

        let state = AppState::from_store(store.clone(), storage, auth, ids, site)
            .with_local_media(media_dir.path(), "/media");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            store,
            media_dir,
        }
    }

    pub fn posts(&self) -> PostService {
        PostService::new(self.store.clone())
    }

    pub fn search(&self) -> SearchService {
        SearchService::new(self.store.clone())
    }

    pub fn collections(&self) -> CollectionService {
        CollectionService::new(self.store.clone(), self.store.clone())
    }

    pub fn redirects(&self) -> RedirectService {
        RedirectService::new(self.store.clone())
    }

    /// Creates a note with the given visibility.
    pub async fn note(&self, content: &str, visibility: Visibility) -> Post {
        self.posts()
            .create(CreatePost {
                post_type: Some(PostType::Note),
                visibility: Some(visibility),
                content: Some(content.to_string()),
                ..Default::default()
            })
            .await
            .expect("create note")
    }

    pub async fn reply(&self, parent: &Post, content: &str) -> Post {
        self.posts()
            .create(CreatePost {
                content: Some(content.to_string()),
                reply_to_id: Some(parent.id),
                ..Default::default()
            })
            .await
            .expect("create reply")
    }

    pub fn sqid(&self, post: &Post) -> String {
        self.state.ids.encode(post.id).expect("encode id")
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// JSON request against the management API.
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&v).expect("serialize body"))
            }
            None => Body::empty(),
        };
        let response = self.send(builder.body(body).expect("request")).await;
        let status = response.status();
        let bytes = body_bytes(response).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Authenticated JSON request.
    pub async fn api(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.json(method, uri, body, Some(TEST_TOKEN)).await
    }

    /// Plain GET, returning the response for header inspection.
    pub async fn get(&self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let response = self.get(uri).await;
        let status = response.status();
        let text = String::from_utf8(body_bytes(response).await.to_vec()).expect("utf-8 body");
        (status, text)
    }
}

pub async fn body_bytes(response: Response) -> bytes::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
}
