//! Integration tests for the HTTP store source
//!
//! An axum router stands in for the REST collection. It answers `/stores`
//! with a canned status and body and records the raw query of every
//! request, so the tests see exactly what went over the wire.

use axum::{
    Router,
    extract::{RawQuery, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use store_feed::prelude::*;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    body: String,
    queries: Arc<Mutex<Vec<String>>>,
}

struct CannedServer {
    addr: SocketAddr,
    queries: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn collection_url(&self) -> String {
        format!("{}/stores", self.base_url())
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

async fn list_stores(State(canned): State<Canned>, RawQuery(query): RawQuery) -> impl IntoResponse {
    canned.queries.lock().unwrap().push(query.unwrap_or_default());
    (
        canned.status,
        [(header::CONTENT_TYPE, "application/json")],
        canned.body,
    )
}

/// Serve `status` and `body` on `/stores`
async fn serve(status: StatusCode, body: String) -> CannedServer {
    let queries = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/stores", get(list_stores))
        .with_state(Canned {
            status,
            body,
            queries: queries.clone(),
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    CannedServer { addr, queries }
}

fn wire_stores(ids: std::ops::RangeInclusive<u64>) -> String {
    let stores: Vec<_> = ids
        .map(|i| {
            json!({
                "id": i,
                "name": format!("Store {}", i),
                "logo": null,
                "cashback_enabled": i % 2 == 0,
                "cashback_amount": "2.5",
                "rate_type": "upto",
                "amount_type": "percent",
                "clicks": i,
                "is_promoted": false,
                "is_sharable": true,
                "published_at": "2024-01-01T00:00:00.000Z",
                "cats": ["travel"]
            })
        })
        .collect();
    serde_json::to_string(&stores).unwrap()
}

#[tokio::test]
async fn test_fetch_page_over_http() {
    let server = serve(StatusCode::OK, wire_stores(1..=3)).await;
    let source = HttpStoreSource::new(server.collection_url());
    let fetcher = PageFetcher::new(Arc::new(source), 20);

    let query = QueryBuilder::build(&FilterSelection::new().with_letter("B"));
    let page = assert_ok!(fetcher.fetch(&query, 2).await);

    assert_eq!(page.page, 2);
    assert_eq!(page.stores.len(), 3);
    assert!(!page.has_more);
    assert_eq!(page.stores[1].cashback_label(), "Upto 2.50% cashback");

    let queries = server.queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].starts_with("name_like=%5EB&published_at_lte="));
    assert!(queries[0].ends_with("&_sort=name&_page=2&_limit=20"));
}

#[tokio::test]
async fn test_error_status_is_transport_error() {
    let server = serve(StatusCode::INTERNAL_SERVER_ERROR, "{}".to_string()).await;
    let source = HttpStoreSource::new(server.collection_url());

    let err = assert_err!(source.fetch(&CanonicalQuery::new()).await);
    assert_eq!(err.error_code(), "TRANSPORT_ERROR");
    assert_eq!(err.http_status(), Some(500));
    assert!(err.message().contains("500"));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = serve(StatusCode::OK, r#"{"stores": []}"#.to_string()).await;
    let source = HttpStoreSource::new(server.collection_url());

    let err = assert_err!(source.fetch(&CanonicalQuery::new()).await);
    assert_eq!(err.error_code(), "DECODE_ERROR");
    assert_eq!(err.http_status(), None);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = HttpStoreSource::new(format!("http://{}/stores", addr));
    let err = assert_err!(source.fetch(&CanonicalQuery::new()).await);
    assert!(matches!(err, FetchError::Transport { status: None, .. }));
}

#[tokio::test]
async fn test_session_uses_configured_collection() {
    let server = serve(StatusCode::OK, wire_stores(1..=20)).await;
    let config = ListingConfig::from_yaml_str(&format!(
        "base_url: {}\ncollection: stores\npage_size: 20\nloading_delay_ms: 0\nsettle_delay_ms: 0\n",
        server.base_url()
    ))
    .unwrap();

    let history = InMemoryHistory::new("?cats=travel");
    let session = SessionBuilder::new()
        .with_config(config)
        .with_location(history)
        .start()
        .unwrap();

    let snapshot = timeout(
        Duration::from_secs(5),
        session.wait_for(|s| s.generation == 1 && !s.loading),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(snapshot.len(), 20);
    assert!(snapshot.has_more);
    assert!(snapshot.error.is_none());

    assert_eq!(server.queries()[0], "cats=travel&_page=1&_limit=20");

    session.shutdown().await;
}
