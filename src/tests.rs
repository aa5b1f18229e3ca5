//! Integration tests for the Book Finder backend.
//!
//! Each fixture runs the router on a random port next to a fake catalog server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Query, State},
    http::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::Config;
use crate::errors::messages;
use crate::wishlist::{FileStore, KeyValueStore, MemoryStore, WISHLIST_KEY};
use crate::{create_router, AppState};

/// Total number of matches the fake catalog reports for ordinary queries.
const FAKE_TOTAL: u32 = 5;

/// Fake upstream catalog.
///
/// - `q=upstream-down` answers 500
/// - `q=garbage` answers a non-JSON body
/// - `q=nothing` answers without an `items` field
/// - any other query serves `FAKE_TOTAL` books, the second of which has no title
async fn fake_volumes(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);

    let q = params.get("q").cloned().unwrap_or_default();
    let start: u32 = params
        .get("startIndex")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let max: u32 = params
        .get("maxResults")
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    match q.as_str() {
        "upstream-down" => {
            (StatusCode::INTERNAL_SERVER_ERROR, "quota exhausted: key=abc").into_response()
        }
        "garbage" => (StatusCode::OK, "<html>not json</html>").into_response(),
        "nothing" => Json(json!({ "kind": "books#volumes", "totalItems": 0 })).into_response(),
        _ => {
            let end = (start + max).min(FAKE_TOTAL);
            let items: Vec<Value> = (start..end)
                .map(|i| {
                    if i == 1 {
                        json!({ "id": format!("vol{}", i), "volumeInfo": { "title": " " } })
                    } else {
                        json!({
                            "id": format!("vol{}", i),
                            "volumeInfo": {
                                "title": format!("{} volume {}", q, i),
                                "authors": ["A. Writer"],
                                "averageRating": 4.0,
                                "imageLinks": { "thumbnail": format!("http://covers/{}.jpg", i) }
                            }
                        })
                    }
                })
                .collect();
            Json(json!({ "totalItems": FAKE_TOTAL, "items": items })).into_response()
        }
    }
}

/// Start the fake catalog and return its base URL.
async fn spawn_fake_catalog(hits: Arc<AtomicUsize>) -> String {
    let app = Router::new()
        .route("/books/v1/volumes", get(fake_volumes))
        .with_state(hits);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake catalog");
    let addr = listener.local_addr().expect("Failed to get addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/books/v1", addr)
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    upstream_hits: Arc<AtomicUsize>,
    storage: Arc<dyn KeyValueStore>,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_options(Duration::ZERO, Arc::new(MemoryStore::new())).await
    }

    async fn with_options(cache_ttl: Duration, storage: Arc<dyn KeyValueStore>) -> Self {
        let upstream_hits = Arc::new(AtomicUsize::new(0));
        let upstream_url = spawn_fake_catalog(upstream_hits.clone()).await;
        Self::start(upstream_url, cache_ttl, storage, upstream_hits).await
    }

    async fn start(
        upstream_url: String,
        cache_ttl: Duration,
        storage: Arc<dyn KeyValueStore>,
        upstream_hits: Arc<AtomicUsize>,
    ) -> Self {
        let config = Config {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            upstream_url,
            upstream_timeout: Duration::from_secs(5),
            cache_ttl,
            default_page_size: 2,
            wishlist_dir: "./unused".into(),
            log_level: "warn".to_string(),
        };

        let state =
            AppState::with_storage(config, storage.clone()).expect("Failed to build state");
        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            upstream_hits,
            storage,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn hits(&self) -> usize {
        self.upstream_hits.load(Ordering::SeqCst)
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.json().await.unwrap())
    }
}

fn book_json(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "authors": ["A. Writer"],
        "imageLinks": { "smallThumbnail": format!("http://covers/{}.jpg", id) },
        "averageRating": 3.5
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_router_rejects_missing_query_in_process() {
    let config = Config {
        upstream_url: "http://127.0.0.1:9".to_string(),
        ..Config::default()
    };
    let state = AppState::with_storage(config, Arc::new(MemoryStore::new())).unwrap();
    let app = create_router(state);

    let resp = app
        .oneshot(Request::get("/api/books").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({ "success": false, "error": messages::QUERY_REQUIRED })
    );
}

#[tokio::test]
async fn test_search_returns_normalized_page() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .get_json("/api/books?q=golang&startIndex=0&maxResults=4")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["query"], "golang");
    assert_eq!(data["totalItems"], 5);
    assert_eq!(data["startIndex"], 0);
    assert_eq!(data["maxResults"], 4);
    // Filtering shortened the page to three books, which ends pagination.
    assert_eq!(data["hasMore"], false);
    assert_eq!(data["nextStartIndex"], 4);

    // The titleless second volume is filtered out.
    let books = data["books"].as_array().unwrap();
    assert_eq!(books.len(), 3);
    for book in books {
        assert!(!book["title"].as_str().unwrap().trim().is_empty());
    }
    assert_eq!(books[0]["id"], "vol0");
    assert_eq!(books[0]["authors"][0], "A. Writer");
    assert_eq!(books[0]["imageLinks"]["thumbnail"], "http://covers/0.jpg");
}

#[tokio::test]
async fn test_search_short_page_has_no_more() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .get_json("/api/books?q=golang&startIndex=4&maxResults=4")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["books"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["hasMore"], false);
}

#[tokio::test]
async fn test_search_uses_default_page_size() {
    let fixture = TestFixture::new().await;

    let (_, body) = fixture.get_json("/api/books?q=golang").await;

    assert_eq!(body["data"]["maxResults"], 2);
    assert_eq!(body["data"]["startIndex"], 0);
}

#[tokio::test]
async fn test_search_missing_query() {
    let fixture = TestFixture::new().await;

    for path in ["/api/books", "/api/books?q=", "/api/books?q=%20%20"] {
        let (status, body) = fixture.get_json(path).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], messages::QUERY_REQUIRED);
    }

    assert_eq!(fixture.hits(), 0);
}

#[tokio::test]
async fn test_search_rejects_bad_pagination() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/books?q=rust&startIndex=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "startIndex must be a non-negative integer");

    let (status, _) = fixture.get_json("/api/books?q=rust&maxResults=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(fixture.hits(), 0);
}

#[tokio::test]
async fn test_search_upstream_failure_is_masked() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/books?q=upstream-down").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], messages::FETCH_FAILED);
    assert!(!body.to_string().contains("quota exhausted"));
}

#[tokio::test]
async fn test_search_unparseable_body() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/books?q=garbage").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], messages::FETCH_FAILED);
}

#[tokio::test]
async fn test_search_without_items() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/api/books?q=nothing").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["books"], json!([]));
    assert_eq!(body["data"]["totalItems"], 0);
    assert_eq!(body["data"]["hasMore"], false);
}

#[tokio::test]
async fn test_search_unreachable_upstream() {
    // Grab a free port, then close it so connections are refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let fixture = TestFixture::start(
        format!("http://{}/books/v1", dead_addr),
        Duration::ZERO,
        Arc::new(MemoryStore::new()),
        Arc::new(AtomicUsize::new(0)),
    )
    .await;

    let (status, body) = fixture.get_json("/api/books?q=golang").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], messages::NETWORK);
}

#[tokio::test]
async fn test_search_upstream_drops_connection() {
    // Accept each connection and close it before any response is written.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let drop_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let fixture = TestFixture::start(
        format!("http://{}/books/v1", drop_addr),
        Duration::ZERO,
        Arc::new(MemoryStore::new()),
        Arc::new(AtomicUsize::new(0)),
    )
    .await;

    let (status, body) = fixture.get_json("/api/books?q=golang").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], messages::NETWORK);
}

#[tokio::test]
async fn test_search_full_page_has_more() {
    let fixture = TestFixture::new().await;

    // Volumes 2 and 3 both have titles, so the page stays full.
    let (status, body) = fixture
        .get_json("/api/books?q=golang&startIndex=2&maxResults=2")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["books"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["hasMore"], true);
    assert_eq!(body["data"]["nextStartIndex"], 4);
}

#[tokio::test]
async fn test_search_responses_are_cached() {
    let fixture =
        TestFixture::with_options(Duration::from_secs(60), Arc::new(MemoryStore::new())).await;

    fixture.get_json("/api/books?q=golang&maxResults=2").await;
    fixture.get_json("/api/books?q=golang&maxResults=2").await;
    assert_eq!(fixture.hits(), 1);

    fixture
        .get_json("/api/books?q=golang&maxResults=2&startIndex=2")
        .await;
    assert_eq!(fixture.hits(), 2);

    // Failures are not cached.
    fixture.get_json("/api/books?q=upstream-down").await;
    fixture.get_json("/api/books?q=upstream-down").await;
    assert_eq!(fixture.hits(), 4);
}

#[tokio::test]
async fn test_wishlist_add_list_remove() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/wishlist"))
        .json(&book_json("a", "Alpha"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .post(fixture.url("/api/wishlist"))
        .json(&book_json("b", "Beta"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["id"], "b");
    assert_eq!(body["data"][1]["id"], "a");
    assert_eq!(body["data"][1]["thumbnail"], "https://covers/a.jpg");
    assert_eq!(body["data"][1]["rating"], 3.5);
    assert!(body["data"][1]["addedAt"].is_string());

    let (_, ids) = fixture.get_json("/api/wishlist/ids").await;
    assert_eq!(ids["data"], json!(["b", "a"]));

    let (_, membership) = fixture.get_json("/api/wishlist/a").await;
    assert_eq!(membership["data"]["inWishlist"], true);

    let resp = fixture
        .client
        .delete(fixture.url("/api/wishlist/a"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, membership) = fixture.get_json("/api/wishlist/a").await;
    assert_eq!(membership["data"]["inWishlist"], false);

    fixture
        .client
        .delete(fixture.url("/api/wishlist/b"))
        .send()
        .await
        .unwrap();
    let (_, list) = fixture.get_json("/api/wishlist").await;
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn test_wishlist_repeated_add_keeps_one_entry() {
    let fixture = TestFixture::new().await;

    for _ in 0..3 {
        fixture
            .client
            .post(fixture.url("/api/wishlist"))
            .json(&book_json("a", "Alpha"))
            .send()
            .await
            .unwrap();
    }

    let (_, list) = fixture.get_json("/api/wishlist").await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_wishlist_remove_absent_id() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .delete(fixture.url("/api/wishlist/missing"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_wishlist_rejects_blank_title() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/wishlist"))
        .json(&book_json("a", "   "))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Book title is required");
}

#[tokio::test]
async fn test_wishlist_malformed_body_uses_envelope() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/wishlist"))
        .header("content-type", "application/json")
        .body("{\"id\": \"a\", \"title\":")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));

    let (_, list) = fixture.get_json("/api/wishlist").await;
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn test_wishlist_drops_out_of_range_rating() {
    let fixture = TestFixture::new().await;

    let mut book = book_json("a", "Alpha");
    book["averageRating"] = json!(9.5);
    let resp = fixture
        .client
        .post(fixture.url("/api/wishlist"))
        .json(&book)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"][0].get("rating").is_none());
}

#[tokio::test]
async fn test_wishlist_corrupt_storage_reads_empty() {
    let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    storage.set(WISHLIST_KEY, "[{\"broken\":").unwrap();
    let fixture = TestFixture::with_options(Duration::ZERO, storage).await;

    let (status, list) = fixture.get_json("/api/wishlist").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn test_wishlist_file_storage_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let first = TestFixture::with_options(
        Duration::ZERO,
        Arc::new(FileStore::new(temp_dir.path())),
    )
    .await;
    first
        .client
        .post(first.url("/api/wishlist"))
        .json(&book_json("a", "Alpha"))
        .send()
        .await
        .unwrap();

    let second = TestFixture::with_options(
        Duration::ZERO,
        Arc::new(FileStore::new(temp_dir.path())),
    )
    .await;
    let (_, ids) = second.get_json("/api/wishlist/ids").await;
    assert_eq!(ids["data"], json!(["a"]));

    let raw = second.storage.get(WISHLIST_KEY).unwrap().unwrap();
    assert!(raw.contains("Alpha"));
}

#[tokio::test]
async fn test_search_then_save_flow() {
    let fixture = TestFixture::new().await;

    let (_, body) = fixture.get_json("/api/books?q=golang&maxResults=4").await;
    let first_book = body["data"]["books"][0].clone();

    let resp = fixture
        .client
        .post(fixture.url("/api/wishlist"))
        .json(&first_book)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (_, ids) = fixture.get_json("/api/wishlist/ids").await;
    assert_eq!(ids["data"], json!(["vol0"]));

    let (_, list) = fixture.get_json("/api/wishlist").await;
    assert_eq!(list["data"][0]["thumbnail"], "https://covers/0.jpg");
}
