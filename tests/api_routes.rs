//! HTTP surface driven through the router without binding a socket.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use wagerboard::api::{create_router, AppState};
use wagerboard::config::{AdminConfig, RefreshConfig};
use wagerboard::domain::{PlayerRecord, Snapshot};
use wagerboard::{LiveState, RankedSource, Refresher, SnapshotStore, WindowedGainCalculator};

const SECRET: &str = "letmein";

struct FixedSource {
    records: Vec<PlayerRecord>,
    calls: AtomicUsize,
}

#[async_trait]
impl RankedSource for FixedSource {
    async fn fetch_ranked(&self) -> Vec<PlayerRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.records.clone()
    }
}

struct Harness {
    router: Router,
    live: Arc<LiveState>,
    store: Arc<SnapshotStore>,
    source: Arc<FixedSource>,
    dir: PathBuf,
}

impl Harness {
    fn new(admin: AdminConfig) -> Self {
        let dir = std::env::temp_dir().join(format!("wagerboard_api_{}", uuid::Uuid::new_v4()));
        let source = Arc::new(FixedSource {
            records: vec![
                PlayerRecord::new("u1", "Alice", 120.0),
                PlayerRecord::new("u2", "Bob", 300.0),
            ],
            calls: AtomicUsize::new(0),
        });
        let live = Arc::new(LiveState::new(dir.join("cache.json"), None));
        let store = Arc::new(SnapshotStore::new(dir.join("snapshots.jsonl")));
        let gains = Arc::new(WindowedGainCalculator::new(store.clone(), live.clone()));
        let refresher = Arc::new(Refresher::new(
            source.clone(),
            live.clone(),
            store.clone(),
            RefreshConfig::default(),
        ));
        let router = create_router(AppState::new(live.clone(), gains, refresher, admin));
        Self {
            router,
            live,
            store,
            source,
            dir,
        }
    }

    fn with_secret() -> Self {
        Self::new(AdminConfig {
            secret: Some(SECRET.to_string()),
            auth_required: true,
        })
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_admin(&self, uri: &str, secret: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::post(uri).header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header("x-admin-secret", secret);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn cleanup(self) {
        let _ = tokio::fs::remove_dir_all(&self.dir).await;
    }
}

#[tokio::test]
async fn health_and_empty_leaderboard_before_first_refresh() {
    let h = Harness::with_secret();

    let (status, body) = h.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = h.get("/api/leaderboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedAt"], Value::Null);
    assert_eq!(body["data"], json!([]));

    h.cleanup().await;
}

#[tokio::test]
async fn admin_refresh_requires_secret_then_commits() {
    let h = Harness::with_secret();

    let (status, _) = h.post_admin("/api/admin/refresh", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = h
        .post_admin("/api/admin/refresh", Some("wrong"), json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);

    let (status, body) = h
        .post_admin("/api/admin/refresh", Some(SECRET), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "updated");
    assert_eq!(body["count"], 2);

    let (_, board) = h.get("/api/leaderboard").await;
    assert_eq!(board["data"][0]["id"], "u2");
    assert_eq!(board["data"][1]["id"], "u1");
    assert!(board["updatedAt"].is_string());
    assert_eq!(h.store.read_all().await.unwrap().len(), 1);

    h.cleanup().await;
}

#[tokio::test]
async fn contest_window_switches_to_gains() {
    let h = Harness::with_secret();
    h.post_admin("/api/admin/refresh", Some(SECRET), json!({}))
        .await;

    // No window yet: contest view is the live board
    let (_, body) = h.get("/api/leaderboard/contest").await;
    assert_eq!(body["window"], Value::Null);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let mut before = std::collections::BTreeMap::new();
    before.insert("u1".to_string(), 100.0);
    before.insert("u2".to_string(), 300.0);
    h.store.append(&Snapshot::new(1_000, before)).await.unwrap();
    let mut after = std::collections::BTreeMap::new();
    after.insert("u1".to_string(), 120.0);
    after.insert("u2".to_string(), 300.0);
    h.store.append(&Snapshot::new(2_000, after)).await.unwrap();

    let (status, _) = h
        .post_admin(
            "/api/admin/window",
            Some(SECRET),
            json!({ "start": 1_500, "end": 2_500 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = h.get("/api/leaderboard/contest").await;
    assert_eq!(body["window"]["start"], 1_500);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], "u1");
    assert_eq!(data[0]["name"], "Alice");
    assert_eq!(data[0]["points"], 20.0);

    let (status, _) = h
        .post_admin("/api/admin/window", Some(SECRET), json!({ "start": 10, "end": 5 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    h.cleanup().await;
}

#[tokio::test]
async fn adhoc_window_query_tolerates_bad_bounds() {
    let h = Harness::with_secret();

    let (status, body) = h.get("/api/leaderboard/window?start=abc&end=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, body) = h.get("/api/leaderboard/window?start=0&end=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["window"]["end"], 10);

    h.cleanup().await;
}

#[tokio::test]
async fn countdown_freezes_refresh() {
    let h = Harness::with_secret();
    let past = Utc::now() - Duration::minutes(5);

    let (status, meta) = h
        .post_admin(
            "/api/admin/countdown",
            Some(SECRET),
            json!({ "deadline": past.to_rfc3339() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meta["frozen"], true);

    let (_, body) = h
        .post_admin("/api/admin/refresh", Some(SECRET), json!({}))
        .await;
    assert_eq!(body["outcome"], "frozen");
    assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
    assert!(h.live.leaderboard().await.is_empty());

    let (_, meta) = h.get("/api/leaderboard/meta").await;
    assert_eq!(meta["frozen"], true);
    assert_eq!(meta["phase"], "idle");

    h.cleanup().await;
}

#[tokio::test]
async fn admin_open_when_secret_not_required() {
    let h = Harness::new(AdminConfig {
        secret: None,
        auth_required: false,
    });
    let (status, _) = h.post_admin("/api/admin/refresh", None, json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let locked = Harness::new(AdminConfig::default());
    let (status, _) = locked
        .post_admin("/api/admin/refresh", None, json!({}))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    h.cleanup().await;
    locked.cleanup().await;
}
