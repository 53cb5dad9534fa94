//! End-to-end tests for `POST /api/scrape`
//!
//! Each test serves the router on an ephemeral port and talks to it with reqwest.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use casecache::cache::CacheStore;
use casecache::data::{CaseIdentifier, Document, FetchError, Fetcher};
use casecache::resolver::{CaseResolver, ResolverConfig};
use casecache::server::router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Fetcher with a fixed outcome that counts its calls
struct CountingFetcher {
    calls: AtomicUsize,
    outcome: Result<Document, String>,
}

impl CountingFetcher {
    fn new(outcome: Result<Document, String>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            outcome,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, case: &CaseIdentifier) -> Result<Document, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(document) => {
                let mut document = document.clone();
                document["parties"] = json!(format!("{} {}/{}", case.kind, case.number, case.year));
                Ok(document)
            }
            Err(message) => Err(FetchError::Failed(message.clone())),
        }
    }
}

struct TestApp {
    addr: SocketAddr,
    store: CacheStore,
    client: reqwest::Client,
    _data_dir: TempDir,
}

impl TestApp {
    async fn spawn(fetcher: Arc<CountingFetcher>) -> Self {
        let data_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CacheStore::with_dir(data_dir.path());
        let resolver = Arc::new(CaseResolver::new(
            store.clone(),
            fetcher,
            ResolverConfig::default(),
        ));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener should have an address");
        let app = router(resolver);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            addr,
            store,
            client: reqwest::Client::new(),
            _data_dir: data_dir,
        }
    }

    async fn post(&self, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(format!("http://{}/api/scrape", self.addr))
            .json(&body)
            .send()
            .await
            .expect("Request should complete");
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.expect("Response should be JSON");
        (status, body)
    }
}

fn crl_body() -> Value {
    json!({"type": "CRL", "number": "123", "year": "2024"})
}

#[tokio::test]
async fn test_live_result_then_cache_hit() {
    let fetcher = CountingFetcher::new(Ok(json!({"source": "Live Scrape", "status": "Pending"})));
    let app = TestApp::spawn(fetcher.clone()).await;

    let (status, first) = app.post(crl_body()).await;
    assert_eq!(status, 200);
    assert_eq!(first["source"], "Live Scrape");
    assert_eq!(first["parties"], "CRL 123/2024");

    let (status, second) = app.post(crl_body()).await;
    assert_eq!(status, 200);
    assert_eq!(second["source"], "Database Cache");
    assert_eq!(second["status"], "Pending");
    assert_eq!(second["parties"], "CRL 123/2024");

    assert_eq!(fetcher.calls(), 1, "Second request should not fetch");
}

#[tokio::test]
async fn test_fetch_failure_returns_500_with_message() {
    let fetcher = CountingFetcher::new(Err(
        "Live scrape failed: Case not found on the source website.".to_string(),
    ));
    let app = TestApp::spawn(fetcher.clone()).await;

    let (status, body) = app.post(crl_body()).await;

    assert_eq!(status, 500);
    assert_eq!(
        body,
        json!({"message": "Live scrape failed: Case not found on the source website."})
    );
    assert!(app.store.get("CRL-123-2024").unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_failure_keeps_stale_record() {
    let fetcher = CountingFetcher::new(Err("unavailable".to_string()));
    let app = TestApp::spawn(fetcher.clone()).await;
    let written = Utc::now() - Duration::hours(48);
    app.store
        .put_at("CRL-123-2024", &json!({"status": "old"}), written)
        .unwrap();

    let (status, body) = app.post(crl_body()).await;

    assert_eq!(status, 500);
    assert_eq!(body["message"], "unavailable");
    let record = app.store.get("CRL-123-2024").unwrap().unwrap();
    assert_eq!(record.data, json!({"status": "old"}));
    assert_eq!(record.last_updated, written);
}

#[tokio::test]
async fn test_stale_record_is_refetched_and_overwritten() {
    let fetcher = CountingFetcher::new(Ok(json!({"status": "fresh"})));
    let app = TestApp::spawn(fetcher.clone()).await;
    let written = Utc::now() - Duration::hours(25);
    app.store
        .put_at("CRL-123-2024", &json!({"status": "old"}), written)
        .unwrap();

    let (status, body) = app.post(crl_body()).await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "fresh");
    assert_eq!(fetcher.calls(), 1);
    let record = app.store.get("CRL-123-2024").unwrap().unwrap();
    assert_eq!(record.data["status"], "fresh");
    assert!(record.last_updated > written);
}

#[tokio::test]
async fn test_missing_field_is_rejected() {
    let fetcher = CountingFetcher::new(Ok(json!({})));
    let app = TestApp::spawn(fetcher.clone()).await;

    let (status, body) = app.post(json!({"type": "CRL", "number": "123"})).await;

    assert_eq!(status, 400);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_invalid_field_is_rejected_before_lookup() {
    let fetcher = CountingFetcher::new(Ok(json!({})));
    let app = TestApp::spawn(fetcher.clone()).await;

    let (status, body) = app
        .post(json!({"type": "CRL", "number": "../../x", "year": "2024"}))
        .await;

    assert_eq!(status, 400);
    assert!(body["message"]
        .as_str()
        .is_some_and(|m| m.contains("Invalid case identifier")));
    assert_eq!(fetcher.calls(), 0);
    assert!(!app.store.cases_dir().exists());
}

#[tokio::test]
async fn test_concurrent_misses_all_succeed() {
    let fetcher = CountingFetcher::new(Ok(json!({"status": "Pending"})));
    let app = TestApp::spawn(fetcher.clone()).await;

    let requests = (0..8).map(|_| app.post(crl_body()));
    let responses = futures::future::join_all(requests).await;

    for (status, body) in &responses {
        assert_eq!(*status, 200);
        assert_eq!(body["status"], "Pending");
    }
    let calls = fetcher.calls();
    assert!((1..=8).contains(&calls), "Unexpected fetch count {}", calls);

    let record = app.store.get("CRL-123-2024").unwrap().unwrap();
    assert_eq!(record.data["status"], "Pending");
}
