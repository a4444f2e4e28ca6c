//! Integration tests for `HttpSourceAdapter` against a local `wiremock` server.

use dealhub_core::{SourceQuery, SourceReliability};
use dealhub_pipeline::{HttpSourceAdapter, SourceAdapter, SourceError};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(server: &MockServer, api_key: Option<&str>, timeout_secs: u64) -> HttpSourceAdapter {
    HttpSourceAdapter::new(
        "product-api",
        &server.uri(),
        SourceReliability::StructuredApi,
        api_key.map(str::to_string),
        timeout_secs,
        "dealhub-test/0.1",
    )
    .expect("failed to build test adapter")
}

fn sneakers_query() -> SourceQuery {
    SourceQuery {
        brand: Some("Nike".to_string()),
        ..SourceQuery::new("air max")
    }
}

#[tokio::test]
async fn query_decodes_products_and_stamps_source_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "air max"))
        .and(query_param("brand", "Nike"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{
                "name": "Nike Air Max 90",
                "brand": "Nike",
                "original_price": "140.00",
                "sale_price": "98.00",
                "product_url": "https://shop.example.com/p/air-max-90",
                "source": "ignored"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = adapter(&server, None, 5)
        .query(&sneakers_query())
        .await
        .expect("query should succeed");

    assert_eq!(candidates.len(), 1);
    let c = &candidates[0];
    assert_eq!(c.name, "Nike Air Max 90");
    assert_eq!(c.source, "product-api");
    assert_eq!(c.currency, "EUR");
    assert_eq!(c.original_price, Some(Decimal::new(14000, 2)));
    assert_eq!(c.sale_price, Some(Decimal::new(9800, 2)));
}

#[tokio::test]
async fn query_sends_bearer_key_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("authorization", "Bearer secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = adapter(&server, Some("secret-key"), 5)
        .query(&SourceQuery::new("boots"))
        .await
        .expect("query should succeed");
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn missing_products_field_is_an_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let candidates = adapter(&server, None, 5)
        .query(&SourceQuery::new("boots"))
        .await
        .expect("query should succeed");
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn not_found_maps_to_no_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = adapter(&server, None, 5)
        .query(&SourceQuery::new("boots"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, SourceError::NoResultsFound { ref source_id } if source_id == "product-api"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn forbidden_and_rate_limited_map_to_blocked() {
    for status in [403, 429, 451] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let err = adapter(&server, None, 5)
            .query(&SourceQuery::new("boots"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, SourceError::BlockedByTarget { .. }),
            "status {status} gave: {err:?}"
        );
    }
}

#[tokio::test]
async fn captcha_page_maps_to_blocked() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Please solve the CAPTCHA to continue</body></html>"),
        )
        .mount(&server)
        .await;

    let err = adapter(&server, None, 5)
        .query(&SourceQuery::new("boots"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::BlockedByTarget { .. }), "got: {err:?}");
}

#[tokio::test]
async fn undecodable_body_maps_to_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"products\": 42}"))
        .mount(&server)
        .await;

    let err = adapter(&server, None, 5)
        .query(&SourceQuery::new("boots"))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::MalformedResponse { .. }), "got: {err:?}");
}

#[tokio::test]
async fn one_broken_product_does_not_sink_the_rest() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                { "name": "Good", "original_price": 100, "sale_price": 70 },
                { "name": "Bad", "original_price": 100, "sale_price": "N/A" },
                { "original_price": 80, "sale_price": 40 },
                { "name": "Also good", "original_price": "50", "sale_price": "35" }
            ]
        })))
        .mount(&server)
        .await;

    let candidates = adapter(&server, None, 5)
        .query(&SourceQuery::new("boots"))
        .await
        .expect("valid products should survive");

    let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Good", "Also good"]);
    assert!(candidates.iter().all(|c| c.source == "product-api"));
}

#[tokio::test]
async fn loosely_typed_reported_discount_is_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                { "name": "Float", "original_price": 100, "sale_price": 70, "reported_discount_pct": 30.0 },
                { "name": "Percent", "original_price": 100, "sale_price": 70, "reported_discount_pct": "30%" },
                { "name": "Prose", "original_price": 100, "sale_price": 70, "reported_discount_pct": "mega deal" }
            ]
        })))
        .mount(&server)
        .await;

    let candidates = adapter(&server, None, 5)
        .query(&SourceQuery::new("boots"))
        .await
        .expect("query should succeed");

    let reported: Vec<Option<Decimal>> = candidates
        .iter()
        .map(|c| c.reported_discount_pct)
        .collect();
    assert_eq!(
        reported,
        vec![Some(Decimal::from(30)), Some(Decimal::from(30)), None]
    );
}

#[tokio::test]
async fn server_error_maps_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = adapter(&server, None, 5)
        .query(&SourceQuery::new("boots"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, SourceError::UnexpectedStatus { status: 503, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn slow_source_maps_to_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "products": [] }))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = adapter(&server, None, 1)
        .query(&SourceQuery::new("boots"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, SourceError::Timeout { timeout_ms: 1000, .. }),
        "got: {err:?}"
    );
}
