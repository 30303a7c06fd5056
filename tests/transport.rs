//! Transport, auth and catalog client against a scripted local upstream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};

use grocer::auth::{ClientCredentialsProvider, StaticTokenProvider, TokenProvider};
use grocer::breaker::{BreakerSettings, CircuitBreaker, CircuitState};
use grocer::catalog::{CatalogSearch, HttpCatalog, SearchQuery};
use grocer::config::RateLimitConfig;
use grocer::error::{CatalogError, ErrorKind};
use grocer::governor::{RateGovernor, RATE_PREFIX};
use grocer::queue::{Priority, QueueSettings, RequestQueue};
use grocer::transport::{ResilientTransport, TransportSettings};
use grocer_core::store::memory::InMemoryStore;
use grocer_core::store::KvStore;

struct Reply {
    status: u16,
    retry_after: Option<&'static str>,
    body: Value,
}

fn reply(status: u16) -> Reply {
    Reply {
        status,
        retry_after: None,
        body: json!({ "errors": { "reason": "scripted" } }),
    }
}

fn ok(body: Value) -> Reply {
    Reply {
        status: 200,
        retry_after: None,
        body,
    }
}

#[derive(Clone, Default)]
struct Upstream {
    script: Arc<Mutex<VecDeque<Reply>>>,
    hits: Arc<AtomicUsize>,
    token_hits: Arc<AtomicUsize>,
    authorization: Arc<Mutex<Vec<String>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl Upstream {
    fn push(&self, r: Reply) {
        self.script.lock().unwrap().push_back(r);
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn handle_api(
    State(up): State<Upstream>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    up.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        up.authorization.lock().unwrap().push(auth.to_string());
    }
    up.queries.lock().unwrap().push(query.unwrap_or_default());

    let next = up
        .script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| ok(json!({ "data": [] })));
    let mut resp = (StatusCode::from_u16(next.status).unwrap(), Json(next.body)).into_response();
    if let Some(ra) = next.retry_after {
        resp.headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static(ra));
    }
    resp
}

async fn handle_token(State(up): State<Upstream>, headers: HeaderMap) -> Json<Value> {
    let n = up.token_hits.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        up.authorization.lock().unwrap().push(auth.to_string());
    }
    Json(json!({ "access_token": format!("tok-{}", n), "expires_in": 3600 }))
}

async fn handle_stalled_token() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(10)).await;
    Json(json!({ "access_token": "late", "expires_in": 3600 }))
}

async fn spawn_upstream() -> (String, Upstream) {
    let up = Upstream::default();
    let app = Router::new()
        .route("/products", get(handle_api))
        .route("/locations", get(handle_api))
        .route("/token", post(handle_token))
        .route("/stalled-token", post(handle_stalled_token))
        .with_state(up.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), up)
}

fn queue() -> RequestQueue {
    RequestQueue::new(QueueSettings {
        max_concurrent: 5,
        dispatch_delay: Duration::from_millis(1),
        task_timeout: Duration::from_secs(30),
    })
}

fn breaker(threshold: u32) -> Arc<CircuitBreaker> {
    Arc::new(CircuitBreaker::new(BreakerSettings {
        failure_threshold: threshold,
        cooldown: Duration::from_secs(120),
        failure_window: Duration::from_secs(60),
    }))
}

fn governor(store: Arc<InMemoryStore>) -> Arc<RateGovernor> {
    Arc::new(RateGovernor::new(store, &RateLimitConfig::default()))
}

/// Counts recorded in the current rate windows, sorted.
async fn recorded_counts(store: &InMemoryStore) -> Vec<i64> {
    let mut counts: Vec<i64> = store
        .scan(RATE_PREFIX)
        .await
        .unwrap()
        .iter()
        .map(|(_, doc)| doc["count"].as_i64().unwrap())
        .collect();
    counts.sort();
    counts
}

fn transport(
    breaker: Arc<CircuitBreaker>,
    queue: RequestQueue,
    max_attempts: u32,
) -> ResilientTransport {
    transport_with(governor(Arc::new(InMemoryStore::new())), breaker, queue, max_attempts)
}

fn transport_with(
    governor: Arc<RateGovernor>,
    breaker: Arc<CircuitBreaker>,
    queue: RequestQueue,
    max_attempts: u32,
) -> ResilientTransport {
    ResilientTransport::new(
        reqwest::Client::new(),
        breaker,
        governor,
        queue,
        TransportSettings {
            max_attempts,
            base_delay: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
            default_retry_after: Duration::from_secs(1),
        },
    )
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let (base, up) = spawn_upstream().await;
    up.push(reply(500));
    up.push(reply(503));
    up.push(ok(json!({ "data": [] })));

    let b = breaker(5);
    let t = transport(b.clone(), queue(), 3);
    let url = format!("{}/products", base);
    let resp = t.execute(|c| c.get(&url)).await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(up.hits(), 3);
    assert_eq!(b.state(), CircuitState::Closed);
    assert_eq!(b.snapshot().failures, 0);
}

#[tokio::test]
async fn test_every_sent_attempt_is_counted() {
    let (base, up) = spawn_upstream().await;
    up.push(reply(500));
    up.push(reply(503));
    up.push(ok(json!({ "data": [] })));

    let store = Arc::new(InMemoryStore::new());
    let t = transport_with(governor(store.clone()), breaker(5), queue(), 3);
    let url = format!("{}/products", base);
    t.execute(|c| c.get(&url)).await.unwrap();

    assert_eq!(up.hits(), 3);
    // Second and hour window both saw three calls. A test straddling a
    // second boundary splits the second window, so check the hour total.
    let counts = recorded_counts(&store).await;
    assert_eq!(*counts.last().unwrap(), 3);
}

#[tokio::test]
async fn test_circuit_open_rejection_is_not_counted() {
    let (base, up) = spawn_upstream().await;
    up.push(reply(500));

    let store = Arc::new(InMemoryStore::new());
    let b = breaker(1);
    let t = transport_with(governor(store.clone()), b.clone(), queue(), 1);
    let url = format!("{}/products", base);
    t.execute(|c| c.get(&url)).await.unwrap_err();
    assert_eq!(b.state(), CircuitState::Open);
    assert_eq!(recorded_counts(&store).await, vec![1, 1]);

    let err = t.execute(|c| c.get(&url)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CircuitOpen);
    assert_eq!(up.hits(), 1);
    assert_eq!(recorded_counts(&store).await, vec![1, 1]);
}

#[tokio::test]
async fn test_connection_refused_is_not_counted() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = Arc::new(InMemoryStore::new());
    let t = transport_with(governor(store.clone()), breaker(10), queue(), 2);
    let url = format!("http://{}/products", addr);
    let err = t.execute(|c| c.get(&url)).await.unwrap_err();

    assert!(err.is_retryable());
    assert!(recorded_counts(&store).await.is_empty());
}

#[tokio::test]
async fn test_exhausted_retries_return_last_error() {
    let (base, up) = spawn_upstream().await;
    for _ in 0..3 {
        up.push(reply(502));
    }

    let t = transport(breaker(10), queue(), 3);
    let url = format!("{}/products", base);
    let err = t.execute(|c| c.get(&url)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert!(err.is_retryable());
    assert_eq!(up.hits(), 3);
}

#[tokio::test]
async fn test_not_found_is_not_retried_and_leaves_breaker_alone() {
    let (base, up) = spawn_upstream().await;
    up.push(reply(404));

    let b = breaker(1);
    let t = transport(b.clone(), queue(), 3);
    let url = format!("{}/products", base);
    let err = t.execute(|c| c.get(&url)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!err.is_retryable());
    assert_eq!(up.hits(), 1);
    assert_eq!(b.state(), CircuitState::Closed);
    assert_eq!(b.snapshot().failures, 0);
}

#[tokio::test]
async fn test_auth_errors_are_not_retried() {
    let (base, up) = spawn_upstream().await;
    up.push(reply(403));

    let t = transport(breaker(5), queue(), 3);
    let url = format!("{}/products", base);
    let err = t.execute(|c| c.get(&url)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthError);
    assert_eq!(up.hits(), 1);
}

#[tokio::test]
async fn test_rate_limit_pauses_queue() {
    let (base, up) = spawn_upstream().await;
    up.push(Reply {
        retry_after: Some("30"),
        ..reply(429)
    });

    let q = queue();
    let t = transport(breaker(5), q.clone(), 1);
    let url = format!("{}/products", base);
    let err = t.execute(|c| c.get(&url)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));
    assert!(q.is_paused());
    assert!(q.stats().paused_for_ms > 25_000);
}

#[tokio::test]
async fn test_rate_limit_waits_for_retry_after_then_succeeds() {
    let (base, up) = spawn_upstream().await;
    up.push(Reply {
        retry_after: Some("1"),
        ..reply(429)
    });
    up.push(ok(json!({ "data": [] })));

    let t = transport(breaker(5), queue(), 2);
    let url = format!("{}/products", base);
    let started = Instant::now();
    let resp = t.execute(|c| c.get(&url)).await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(up.hits(), 2);
    assert!(started.elapsed() >= Duration::from_millis(900));
}

#[tokio::test]
async fn test_breaker_opens_and_fails_fast() {
    let (base, up) = spawn_upstream().await;
    up.push(reply(500));
    up.push(reply(500));

    let b = breaker(2);
    let t = transport(b.clone(), queue(), 1);
    let url = format!("{}/products", base);
    for _ in 0..2 {
        assert_eq!(
            t.execute(|c| c.get(&url)).await.unwrap_err().kind(),
            ErrorKind::ServerError
        );
    }
    assert_eq!(b.state(), CircuitState::Open);

    let err = t.execute(|c| c.get(&url)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CircuitOpen);
    assert_eq!(up.hits(), 2);
    assert!(b.snapshot().retry_in_ms > 0);
}

#[tokio::test]
async fn test_client_credentials_token_is_cached() {
    let (base, up) = spawn_upstream().await;
    let provider = ClientCredentialsProvider::new(
        reqwest::Client::new(),
        format!("{}/token", base),
        "my-id",
        "my-secret",
        "product.compact",
    );

    assert_eq!(provider.get_token().await.unwrap(), "tok-1");
    assert_eq!(provider.get_token().await.unwrap(), "tok-1");
    assert_eq!(up.token_hits.load(Ordering::SeqCst), 1);

    provider.invalidate().await;
    assert_eq!(provider.get_token().await.unwrap(), "tok-2");
    assert_eq!(up.token_hits.load(Ordering::SeqCst), 2);

    let expected = format!("Basic {}", STANDARD.encode("my-id:my-secret"));
    assert_eq!(up.authorization.lock().unwrap()[0], expected);
}

#[tokio::test]
async fn test_stalled_token_endpoint_times_out() {
    let (base, _up) = spawn_upstream().await;
    let provider = ClientCredentialsProvider::new(
        reqwest::Client::new(),
        format!("{}/stalled-token", base),
        "id",
        "secret",
        "product.compact",
    )
    .with_timeout(Duration::from_millis(200));

    let started = Instant::now();
    let err = provider.get_token().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(5));
}

fn catalog(
    base: &str,
    store: Arc<InMemoryStore>,
    tokens: Arc<dyn TokenProvider>,
) -> HttpCatalog {
    let q = queue();
    HttpCatalog::new(
        base,
        Some("ais".to_string()),
        q.clone(),
        Arc::new(transport_with(governor(store), breaker(5), q, 3)),
        tokens,
    )
}

#[tokio::test]
async fn test_catalog_search_end_to_end() {
    let (base, up) = spawn_upstream().await;
    up.push(ok(json!({
        "data": [
            {
                "productId": "0001111041700",
                "description": "Kroger 2% Reduced Fat Milk",
                "brand": "Kroger",
                "categories": ["Dairy"],
                "items": [{
                    "size": "1 gal",
                    "soldBy": "UNIT",
                    "price": { "regular": 3.49, "promo": 0 },
                    "inventory": { "stockLevel": "HIGH" },
                    "fulfillment": { "inStore": true }
                }]
            }
        ],
        "meta": { "pagination": { "total": 87 } }
    })));

    let store = Arc::new(InMemoryStore::new());
    let c = catalog(&base, store.clone(), Arc::new(StaticTokenProvider::new("static-token")));
    let page = c
        .search(&SearchQuery {
            term: "2% milk".to_string(),
            location_id: Some("01400943".to_string()),
            limit: 20,
            priority: Priority::INGREDIENT_ENRICHMENT,
        })
        .await
        .unwrap();

    assert_eq!(page.total, 87);
    assert_eq!(page.candidates.len(), 1);
    let milk = &page.candidates[0];
    assert_eq!(milk.id, "0001111041700");
    assert_eq!(milk.price, Some(3.49));
    assert_eq!(milk.stock_level.as_deref(), Some("HIGH"));

    assert_eq!(up.authorization.lock().unwrap()[0], "Bearer static-token");
    let query = up.queries.lock().unwrap()[0].clone();
    assert!(query.contains("filter.locationId=01400943"));
    assert!(query.contains("filter.fulfillment=ais"));
    assert!(query.contains("filter.limit=20"));

    // One call recorded in both the second and the hour window.
    let windows = store.scan(RATE_PREFIX).await.unwrap();
    assert_eq!(windows.len(), 2);
    assert!(windows.iter().all(|(_, doc)| doc["count"] == 1));
}

#[tokio::test]
async fn test_catalog_refreshes_token_once_on_401() {
    let (base, up) = spawn_upstream().await;
    up.push(reply(401));
    up.push(ok(json!({ "data": [] })));

    let tokens = Arc::new(ClientCredentialsProvider::new(
        reqwest::Client::new(),
        format!("{}/token", base),
        "id",
        "secret",
        "product.compact",
    ));
    let store = Arc::new(InMemoryStore::new());
    let c = catalog(&base, store.clone(), tokens);
    let page = c
        .search(&SearchQuery {
            term: "eggs".to_string(),
            location_id: None,
            limit: 10,
            priority: Priority::INGREDIENT_ENRICHMENT,
        })
        .await
        .unwrap();

    assert!(page.candidates.is_empty());
    assert_eq!(up.hits(), 2);
    // Both the rejected and the retried request reached the catalog.
    assert_eq!(*recorded_counts(&store).await.last().unwrap(), 2);
    assert_eq!(up.token_hits.load(Ordering::SeqCst), 2);
    let auth = up.authorization.lock().unwrap().clone();
    assert!(auth.contains(&"Bearer tok-1".to_string()));
    assert!(auth.contains(&"Bearer tok-2".to_string()));
}

#[tokio::test]
async fn test_catalog_locations() {
    let (base, up) = spawn_upstream().await;
    up.push(ok(json!({
        "data": [{
            "locationId": "01400943",
            "name": "Kroger Fry's",
            "chain": "FRYS",
            "address": { "addressLine1": "1 Main St", "city": "Phoenix", "state": "AZ", "zipCode": "85001" }
        }]
    })));

    let c = catalog(&base, Arc::new(InMemoryStore::new()), Arc::new(StaticTokenProvider::new("t")));
    let locations = c.search_locations("85001", 10, 5).await.unwrap();

    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].id, "01400943");
    assert!(up.queries.lock().unwrap()[0].contains("filter.zipCode.near=85001"));
}

#[tokio::test]
async fn test_undecodable_body_is_invalid_response() {
    let (base, up) = spawn_upstream().await;
    up.push(ok(json!({ "unexpected": true })));

    let c = catalog(&base, Arc::new(InMemoryStore::new()), Arc::new(StaticTokenProvider::new("t")));
    let err = c
        .search(&SearchQuery {
            term: "eggs".to_string(),
            location_id: None,
            limit: 10,
            priority: Priority::INGREDIENT_ENRICHMENT,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Decode(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}
