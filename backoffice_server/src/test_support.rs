//! Shared test fixtures: local HTTP listeners and instrumented stores.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::routes::{site_router, SiteState};
use crate::services::identity_service::IdentityClient;
use crate::services::revalidate::{RevalidationNotifier, SECRET_HEADER};
use crate::services::slug::SlugDeriver;
use crate::services::SiteContext;
use crate::store::memory::MemoryStore;
use crate::store::{Collection, Document, DocumentStore, Fields, StoreError};

pub const TEST_SECRET: &str = "s3cret";

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Requests received by a fake public site: (secret header, JSON body).
pub type RevalidationLog = Arc<Mutex<Vec<(Option<String>, Value)>>>;

/// Fake public-site `/api/revalidate` endpoint answering with `status`.
pub async fn revalidation_receiver(status: StatusCode) -> (String, RevalidationLog) {
    let log: RevalidationLog = Arc::default();
    let app = Router::new()
        .route(
            "/api/revalidate",
            post(
                move |State(log): State<RevalidationLog>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let secret = headers
                        .get(SECRET_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    log.lock().unwrap().push((secret, body));
                    (status, Json(json!({ "revalidated": status.is_success() })))
                },
            ),
        )
        .with_state(log.clone());
    (serve(app).await, log)
}

/// Paths received so far, sorted.
pub fn revalidated_paths(log: &RevalidationLog) -> Vec<String> {
    let mut paths: Vec<String> = log
        .lock()
        .unwrap()
        .iter()
        .map(|(_, body)| body["path"].as_str().unwrap_or_default().to_string())
        .collect();
    paths.sort();
    paths
}

/// Wait until the receiver has seen `count` requests (detached tasks).
pub async fn wait_for_revalidations(log: &RevalidationLog, count: usize) -> Vec<String> {
    for _ in 0..200 {
        if log.lock().unwrap().len() >= count {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    revalidated_paths(log)
}

/// Memory store that counts write calls and can be switched to fail.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub writes: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail.store(true, Ordering::SeqCst);
        store
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Pool("storage offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        self.check()?;
        self.inner.list(collection).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        self.check()?;
        self.inner.get(collection, id).await
    }

    async fn insert(&self, collection: Collection, fields: Fields) -> Result<Document, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.insert(collection, fields).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Fields,
    ) -> Result<Document, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.delete(collection, id).await
    }
}

/// Context over `store` with fallback slugs and the given notifier.
pub fn context(store: Arc<dyn DocumentStore>, notifier: RevalidationNotifier) -> SiteContext {
    SiteContext {
        store,
        slugs: SlugDeriver::default(),
        notifier,
    }
}

/// Notifier pointed at a local receiver.
pub fn notifier_for(base: &str) -> RevalidationNotifier {
    RevalidationNotifier::new(reqwest::Client::new(), Some(base), Some(TEST_SECRET))
}

/// Cookie header carrying a session.
pub const SESSION: &str = "session=test-token";

/// Router state over `store` with revalidation and login disabled.
pub fn state_with(store: Arc<dyn DocumentStore>) -> SiteState {
    SiteState {
        ctx: context(store, RevalidationNotifier::disabled()),
        identity: IdentityClient::new(reqwest::Client::new(), "http://127.0.0.1:1", None),
        secure_cookies: false,
    }
}

pub fn test_router() -> Router {
    site_router(state_with(Arc::new(MemoryStore::new())))
}

/// Send one request through `app`. The body is `Null` when empty or not JSON.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}
