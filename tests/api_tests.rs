//! HTTP boundary: status mapping for resolved, missing and failed prices.

use std::sync::Arc;
use std::time::Duration;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use price_aggregator::api::rest::{create_router, ApiState, PriceResponse, NOT_FOUND_MESSAGE};
use price_aggregator::observability::metrics::register_metrics;
use price_aggregator::price_infra::cache::PriceCache;
use price_aggregator::price_infra::connectors::http::HttpPriceConnector;
use price_aggregator::price_infra::resolver::PriceResolver;
use price_aggregator::price_infra::{PriceSourceConfig, ResponseShape};
use price_aggregator::storage::SqlitePriceRepository;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn upstreams(bitfinex: ResponseTemplate) -> MockServer {
    let bitstamp = ResponseTemplate::new(200)
        .set_body_string(r#"{"data":{"ohlc":[{"close":"45000.0"}]}}"#);
    upstreams_with(bitstamp, bitfinex).await
}

async fn upstreams_with(bitstamp: ResponseTemplate, bitfinex: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bitstamp"))
        .respond_with(bitstamp)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bitfinex"))
        .respond_with(bitfinex)
        .mount(&server)
        .await;
    server
}

fn healthy_bitfinex() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string("[[1710511200000,44900,45200.0,45300,44800,12.5]]")
}

fn router(server: &MockServer, repository: Arc<SqlitePriceRepository>) -> Router {
    let sources = vec![
        PriceSourceConfig::new("bitstamp", &format!("{}/bitstamp", server.uri()), ResponseShape::Bitstamp),
        PriceSourceConfig::new("bitfinex", &format!("{}/bitfinex", server.uri()), ResponseShape::Bitfinex),
    ];
    let connector = HttpPriceConnector::new(Duration::from_millis(500)).unwrap();
    let resolver = PriceResolver::new(sources, Arc::new(connector), repository, Arc::new(PriceCache::new())).unwrap();

    create_router(Arc::new(ApiState {
        resolver: Arc::new(resolver),
    }))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn resolved_price_is_ok() {
    let server = upstreams(healthy_bitfinex()).await;
    let repository = Arc::new(SqlitePriceRepository::in_memory().await.unwrap());

    let (status, body) = get(router(&server, repository), "/api/price/2024-03-15T14:20:00Z").await;

    assert_eq!(status, StatusCode::OK);
    let response: PriceResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.price, 45100.0);
    assert_eq!(response.timestamp, "2024-03-15T14:00:00Z");
}

#[tokio::test]
async fn unix_seconds_are_accepted() {
    let server = upstreams(healthy_bitfinex()).await;
    let repository = Arc::new(SqlitePriceRepository::in_memory().await.unwrap());

    let (status, body) = get(router(&server, repository), "/api/price/1710512400").await;

    assert_eq!(status, StatusCode::OK);
    let response: PriceResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.timestamp, "2024-03-15T14:00:00Z");
}

#[tokio::test]
async fn partial_upstream_failure_is_not_found() {
    let server = upstreams(ResponseTemplate::new(500)).await;
    let repository = Arc::new(SqlitePriceRepository::in_memory().await.unwrap());

    let (status, body) = get(router(&server, repository), "/api/price/2024-03-15T14:20:00Z").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn unparsable_timestamp_is_bad_request() {
    let server = upstreams(healthy_bitfinex()).await;
    let repository = Arc::new(SqlitePriceRepository::in_memory().await.unwrap());

    let (status, _) = get(router(&server, repository), "/api/price/not-a-time").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn storage_fault_is_server_error() {
    let server = upstreams(healthy_bitfinex()).await;
    let repository = Arc::new(SqlitePriceRepository::in_memory().await.unwrap());
    repository.close().await;

    let (status, body) = get(router(&server, repository), "/api/price/2024-03-15T14:20:00Z").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "internal_error");
}

#[tokio::test]
async fn health_check() {
    let server = upstreams(healthy_bitfinex()).await;
    let repository = Arc::new(SqlitePriceRepository::in_memory().await.unwrap());

    let (status, body) = get(router(&server, repository), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn huge_quotes_resolve_to_a_finite_price() {
    let server = upstreams_with(
        ResponseTemplate::new(200).set_body_string(r#"{"data":{"ohlc":[{"close":"1.7e308"}]}}"#),
        ResponseTemplate::new(200).set_body_string("[[1710511200000,1,1.7e308,1,1,1]]"),
    ).await;
    let repository = Arc::new(SqlitePriceRepository::in_memory().await.unwrap());

    let (status, body) = get(router(&server, repository), "/api/price/2024-03-15T14:20:00Z").await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["price"].as_f64(), Some(1.7e308));
}

#[tokio::test]
async fn metrics_are_exported_after_a_resolution() {
    // The only registration in this test binary.
    register_metrics().unwrap();

    let server = upstreams(healthy_bitfinex()).await;
    let repository = Arc::new(SqlitePriceRepository::in_memory().await.unwrap());
    let app = router(&server, repository);

    let (status, _) = get(app.clone(), "/api/price/2024-03-15T14:20:00Z").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("price_samples_persisted_total"));
    assert!(text.contains("price_upstream_fetch_latency_seconds"));
}
