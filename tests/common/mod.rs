// SPDX-License-Identifier: MIT
// Copyright 2026 TeenConnect contributors

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use teenconnect::backend::{tables, Backend, MemoryBackend, Query};
use teenconnect::config::{Config, SESSION_COOKIE};
use teenconnect::error::{AppError, Result};
use teenconnect::models::Session;
use teenconnect::routes::create_router;
use teenconnect::session::{SessionContext, SessionHolder, SignUpForm};
use teenconnect::AppState;
use tokio::sync::watch;
use tower::ServiceExt;

/// Backend with three clubs and three challenges.
#[allow(dead_code)]
pub fn seeded_backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new(&Config::test_default().jwt_secret);
    backend.seed(
        tables::CLUBS,
        vec![
            json!({"id": "club-chess", "name": "Chess", "description": "Weekly games",
                   "category": "games", "member_count": 5}),
            json!({"id": "club-choir", "name": "Choir", "category": "arts", "member_count": 0}),
            json!({"id": "club-soccer", "name": "Soccer", "category": "sports", "member_count": 3}),
        ],
    );
    backend.seed(
        tables::CHALLENGES,
        vec![
            json!({"id": "ch-walk", "title": "Walk 10k steps", "difficulty": "easy",
                   "points": 10, "category": "fitness", "created_at": "2025-09-01T00:00:00Z"}),
            json!({"id": "ch-book", "title": "Read a book", "difficulty": "hard",
                   "points": 25, "category": "learning", "created_at": "2025-09-02T00:00:00Z"}),
            json!({"id": "ch-odd", "title": "Mystery", "difficulty": "legendary",
                   "points": 5, "category": "circus", "created_at": "2025-09-03T00:00:00Z"}),
        ],
    );
    Arc::new(backend)
}

/// Create a test app over the seeded in-memory backend.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>, Arc<MemoryBackend>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    let (app, state, _) = create_test_app_with_config(config);
    (app, state)
}

fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>, Arc<MemoryBackend>) {
    let memory = seeded_backend();
    let backend: Arc<dyn Backend> = memory.clone();
    let state = Arc::new(AppState::new(config, backend));
    (create_router(state.clone()), state, memory)
}

/// Create a test app over any backend.
#[allow(dead_code)]
pub fn create_test_app_with_backend(backend: Arc<dyn Backend>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), backend));
    (create_router(state.clone()), state)
}

/// Memory backend whose writes can be held back, or refused, on demand.
///
/// Reads and auth calls always pass straight through.
#[allow(dead_code)]
pub struct HeldBackend {
    inner: Arc<MemoryBackend>,
    held: watch::Sender<bool>,
    waiting: AtomicUsize,
    fail_deletes: AtomicBool,
}

#[allow(dead_code)]
impl HeldBackend {
    pub fn new(inner: Arc<MemoryBackend>) -> Arc<Self> {
        let (held, _) = watch::channel(false);
        Arc::new(Self {
            inner,
            held,
            waiting: AtomicUsize::new(0),
            fail_deletes: AtomicBool::new(false),
        })
    }

    /// Park every write issued from now on until [`HeldBackend::release`].
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Wait until `count` writes are parked.
    pub async fn wait_for_parked(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.waiting.load(Ordering::SeqCst) < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("write never reached the backend");
    }

    async fn pass(&self) {
        let mut rx = self.held.subscribe();
        let held = *rx.borrow();
        if held {
            self.waiting.fetch_add(1, Ordering::SeqCst);
            let _ = rx.wait_for(|held| !*held).await;
            self.waiting.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Backend for HeldBackend {
    async fn select(&self, table: &str, query: &Query, access_token: Option<&str>) -> Result<Vec<Value>> {
        self.inner.select(table, query, access_token).await
    }

    async fn insert(&self, table: &str, record: Value, access_token: &str) -> Result<Value> {
        self.pass().await;
        self.inner.insert(table, record, access_token).await
    }

    async fn update(&self, table: &str, id: &str, patch: Value, access_token: &str) -> Result<Value> {
        self.pass().await;
        self.inner.update(table, id, patch, access_token).await
    }

    async fn delete(&self, table: &str, query: &Query, access_token: &str) -> Result<()> {
        self.pass().await;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Backend("connection reset by peer".to_string()));
        }
        self.inner.delete(table, query, access_token).await
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>> {
        self.inner.get_session(access_token).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.inner.sign_in(email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Session> {
        self.inner.sign_up(email, password, display_name).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.inner.sign_out(access_token).await
    }
}

/// Send one request through a clone of the router.
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

#[allow(dead_code)]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn post_json(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn post_empty(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Sign up over HTTP and return the `Cookie` header value for the session.
#[allow(dead_code)]
pub async fn sign_up(app: &Router, email: &str, display_name: &str) -> String {
    let response = send(
        app,
        post_json(
            "/auth/signup",
            None,
            json!({"email": email, "password": "secret123", "display_name": display_name}),
        ),
    )
    .await;

    let prefix = format!("{SESSION_COOKIE}=");
    let cookie = set_cookie_headers(&response)
        .into_iter()
        .find(|c| c.starts_with(&prefix))
        .unwrap_or_else(|| panic!("sign-up did not set a session cookie"));
    cookie.split(';').next().unwrap().to_string()
}

/// Sign up directly against the backend and return the screen context.
#[allow(dead_code)]
pub async fn signed_up_context(
    backend: &Arc<dyn Backend>,
    email: &str,
    display_name: &str,
) -> SessionContext {
    let holder = SessionHolder::new(backend.clone());
    let session = holder
        .sign_up(&SignUpForm {
            email: email.to_string(),
            password: "secret123".to_string(),
            display_name: display_name.to_string(),
        })
        .await
        .unwrap();
    SessionContext::from(&session)
}
