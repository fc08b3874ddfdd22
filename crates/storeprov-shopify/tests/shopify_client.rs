//! Integration tests for `ShopifyOrdersClient::fetch_orders_in_window`.
//!
//! Each test stands up a `wiremock` server and points the store's
//! `shop_url` at it, so no real network traffic is made.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storeprov_core::{DateWindow, RuleType, StoreConfig};
use storeprov_shopify::{ScraperError, ShopifyOrdersClient, StopReason};

const ORDERS_PATH: &str = "/admin/api/2024-04/orders.json";

/// 5-second timeout, no retries.
fn test_client() -> ShopifyOrdersClient {
    ShopifyOrdersClient::new(5, "storeprov-test/0.1", 0, 0).expect("failed to build test client")
}

fn test_store(server: &MockServer, first_order: Option<&str>) -> StoreConfig {
    StoreConfig {
        store_name: "nordic-shirts".to_owned(),
        api_key: "key".to_owned(),
        password: "secret".to_owned(),
        rule_type: RuleType::PerItemTitle,
        rule_value: "Shirt".to_owned(),
        average_spend_per_order: Decimal::new(78, 0),
        first_order: first_order.map(str::to_owned),
        shop_url: Some(server.uri()),
    }
}

/// May 2024, UTC.
fn may_window() -> DateWindow {
    DateWindow::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    )
}

fn order_json(number: u64, created_at: &str) -> serde_json::Value {
    json!({
        "id": number * 1000,
        "order_number": number,
        "created_at": created_at,
        "line_items": [{"title": "Shirt - Red", "quantity": 1}]
    })
}

fn next_link(server: &MockServer, cursor: &str) -> String {
    format!(
        "<{base}{ORDERS_PATH}?limit=250&page_info={cursor}>; rel=\"next\"",
        base = server.uri()
    )
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_page_sends_window_filters_and_basic_auth() {
    let server = MockServer::start().await;

    // "key:secret" in base64
    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .and(query_param("status", "any"))
        .and(query_param("limit", "250"))
        .and(query_param("created_at_min", "2024-05-01T00:00:00Z"))
        .and(query_param("created_at_max", "2024-06-01T00:00:00Z"))
        .and(header("authorization", "Basic a2V5OnNlY3JldA=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orders": [
                order_json(1002, "2024-05-20T10:00:00+02:00"),
                order_json(1001, "2024-05-10T10:00:00+02:00"),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetch = test_client()
        .fetch_orders_in_window(&test_store(&server, None), &may_window())
        .await
        .expect("fetch should succeed");

    assert_eq!(fetch.pages, 1);
    assert_eq!(fetch.stop, StopReason::NoNextPage);
    let numbers: Vec<&str> = fetch.orders.iter().map(|o| o.order_number.as_str()).collect();
    assert_eq!(numbers, vec!["1002", "1001"]);
}

#[tokio::test]
async fn empty_first_page_is_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orders": []})))
        .mount(&server)
        .await;

    let fetch = test_client()
        .fetch_orders_in_window(&test_store(&server, None), &may_window())
        .await
        .unwrap();

    assert!(fetch.orders.is_empty());
    assert_eq!(fetch.stop, StopReason::Exhausted);
}

#[tokio::test]
async fn follows_cursor_without_repeating_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .and(query_param_is_missing("page_info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"orders": [order_json(1003, "2024-05-20T10:00:00Z")]}))
                .insert_header("Link", next_link(&server, "cursor2").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .and(query_param("page_info", "cursor2"))
        .and(query_param_is_missing("status"))
        .and(query_param_is_missing("created_at_min"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"orders": [order_json(1002, "2024-05-10T10:00:00Z")]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetch = test_client()
        .fetch_orders_in_window(&test_store(&server, None), &may_window())
        .await
        .unwrap();

    assert_eq!(fetch.pages, 2);
    assert_eq!(fetch.orders.len(), 2);
    assert_eq!(fetch.orders[1].order_number, "1002");
    assert_eq!(fetch.stop, StopReason::NoNextPage);
}

// ---------------------------------------------------------------------------
// Stop conditions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stops_once_oldest_order_precedes_window_start() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .and(query_param_is_missing("page_info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"orders": [
                    order_json(1003, "2024-05-02T10:00:00Z"),
                    order_json(1002, "2024-04-30T23:00:00Z"),
                ]}))
                .insert_header("Link", next_link(&server, "older").as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .and(query_param("page_info", "older"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orders": []})))
        .expect(0)
        .mount(&server)
        .await;

    let fetch = test_client()
        .fetch_orders_in_window(&test_store(&server, None), &may_window())
        .await
        .unwrap();

    assert_eq!(fetch.stop, StopReason::BeforeWindow);
    assert_eq!(fetch.pages, 1);
    assert_eq!(fetch.orders.len(), 2, "the fetched page is kept whole");
}

#[tokio::test]
async fn sentinel_order_ends_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .and(query_param_is_missing("page_info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"orders": [
                    order_json(1005, "2024-05-20T10:00:00Z"),
                    order_json(1004, "2024-05-19T10:00:00Z"),
                    order_json(1003, "2024-05-18T10:00:00Z"),
                ]}))
                .insert_header("Link", next_link(&server, "more").as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .and(query_param("page_info", "more"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"orders": []})))
        .expect(0)
        .mount(&server)
        .await;

    let fetch = test_client()
        .fetch_orders_in_window(&test_store(&server, Some("1004")), &may_window())
        .await
        .unwrap();

    assert_eq!(fetch.stop, StopReason::SentinelReached);
    let numbers: Vec<&str> = fetch.orders.iter().map(|o| o.order_number.as_str()).collect();
    assert_eq!(numbers, vec!["1005", "1004"]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_yields_empty_partial_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_orders_in_window(&test_store(&server, None), &may_window())
        .await
        .expect_err("401 must fail");

    assert!(err.collected.is_empty());
    assert!(
        matches!(err.source, ScraperError::Unauthorized { .. }),
        "expected Unauthorized, got: {:?}",
        err.source
    );
}

#[tokio::test]
async fn failure_on_second_page_keeps_first_page_orders() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .and(query_param_is_missing("page_info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"orders": [order_json(1003, "2024-05-20T10:00:00Z")]}))
                .insert_header("Link", next_link(&server, "broken").as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .and(query_param("page_info", "broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_orders_in_window(&test_store(&server, None), &may_window())
        .await
        .expect_err("500 must fail without retries");

    assert_eq!(err.collected.len(), 1);
    assert!(matches!(
        err.source,
        ScraperError::UnexpectedStatus { status: 500, .. }
    ));
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_orders_in_window(&test_store(&server, None), &may_window())
        .await
        .unwrap_err();

    assert!(matches!(err.source, ScraperError::Deserialize { .. }));
}

#[tokio::test]
async fn rate_limit_reads_fractional_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2.0"))
        .mount(&server)
        .await;

    let err = test_client()
        .fetch_orders_in_window(&test_store(&server, None), &may_window())
        .await
        .unwrap_err();

    match err.source {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => assert_eq!(retry_after_secs, 2),
        other => panic!("expected RateLimited, got: {other:?}"),
    }
}

#[tokio::test]
async fn retries_server_error_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ORDERS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"orders": [order_json(1001, "2024-05-20T10:00:00Z")]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ShopifyOrdersClient::new(5, "storeprov-test/0.1", 1, 0).unwrap();
    let fetch = client
        .fetch_orders_in_window(&test_store(&server, None), &may_window())
        .await
        .expect("second attempt should succeed");

    assert_eq!(fetch.orders.len(), 1);
}
