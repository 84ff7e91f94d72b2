// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for `IndexerClient` and `StatsAggregator`
//!
//! These tests use wiremock to simulate indexer mirrors and check fallback,
//! pagination and price lookups end to end.

use api_client::{ApiError, StatsProvider};
use external_apis::{FetchError, FetchTarget, StatsAggregator};
use serde_json::json;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param, query_param_is_missing},
};

use fixtures::*;

/// A failing first mirror falls through to the second
#[tokio::test]
async fn fetch_falls_back_after_server_error() {
    let broken = MockServer::start().await;
    let healthy = MockServer::start().await;
    mount_failure(&broken, 500).await;
    mount_stats(&healthy, json!({ "assets": "321" })).await;

    let client = client_for(&[&broken, &healthy], 1000, 10);

    assert_eq!(client.collection_total().await, Some(321));
    assert_eq!(broken.received_requests().await.unwrap().len(), 1);
}

/// A timed out first mirror falls through to the second
#[tokio::test]
async fn fetch_falls_back_after_timeout() {
    let slow = MockServer::start().await;
    let healthy = MockServer::start().await;
    mount_slow(&slow).await;
    mount_stats(&healthy, json!({ "assets_count": 77 })).await;

    let client = client_for(&[&slow, &healthy], 1000, 10);

    assert_eq!(client.collection_total().await, Some(77));
}

/// Malformed JSON counts as a host failure
#[tokio::test]
async fn fetch_falls_back_after_malformed_json() {
    let garbled = MockServer::start().await;
    let healthy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&garbled)
        .await;
    mount_stats(&healthy, json!({ "num_assets": "5" })).await;

    let client = client_for(&[&garbled, &healthy], 1000, 10);

    assert_eq!(client.collection_total().await, Some(5));
}

/// The first healthy mirror wins and later mirrors are never contacted
#[tokio::test]
async fn fetch_stops_at_first_success() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    mount_stats(&primary, json!({ "assets": 10 })).await;
    mount_stats(&secondary, json!({ "assets": 20 })).await;

    let client = client_for(&[&primary, &secondary], 1000, 10);

    assert_eq!(client.collection_total().await, Some(10));
    assert!(secondary.received_requests().await.unwrap().is_empty());
}

/// Every mirror failing surfaces `AllProvidersFailed`
#[tokio::test]
async fn fetch_reports_all_providers_failed() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_failure(&first, 500).await;
    mount_failure(&second, 503).await;

    let client = client_for(&[&first, &second], 1000, 10);
    let result = client
        .fetcher()
        .get_json(&FetchTarget::path("/atomicassets/v1/accounts"))
        .await;

    match result.unwrap_err() {
        FetchError::AllProvidersFailed { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(last.to_string().contains("503"));
        }
        other => panic!("Expected AllProvidersFailed, got: {other:?}"),
    }
}

/// Absolute targets bypass the mirror list
#[tokio::test]
async fn fetch_absolute_url() {
    let mirror = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/custom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": 1 })))
        .mount(&elsewhere)
        .await;

    let client = client_for(&[&mirror], 1000, 10);
    let url = Url::parse(&format!("{}/custom", elsewhere.uri())).unwrap();
    let value = client
        .fetcher()
        .get_json(&FetchTarget::absolute(url))
        .await
        .unwrap();

    assert_eq!(value, json!({ "value": 1 }));
    assert!(mirror.received_requests().await.unwrap().is_empty());
}

/// Pages of 1000, 1000 and 400 records are all counted
#[tokio::test]
async fn holder_pagination_sums_all_pages() {
    let server = MockServer::start().await;
    mount_accounts_page(&server, 1, direct_records(1000, 1)).await;
    mount_accounts_page(&server, 2, template_records(1000, &[2, 1])).await;
    mount_accounts_page(&server, 3, direct_records(400, 5)).await;

    let client = client_for(&[&server], 1000, 10);
    let tally = client.holder_tally().await.unwrap();

    assert_eq!(tally.holders, 2400);
    assert_eq!(tally.total_by_sum, Some(1000 + 3000 + 2000));
    assert_eq!(tally.pages_fetched, 3);
    assert!(!tally.truncated);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

/// An exactly full last page is followed by an empty page
#[tokio::test]
async fn holder_pagination_stops_on_empty_page() {
    let server = MockServer::start().await;
    mount_accounts_page(&server, 1, direct_records(3, 2)).await;
    mount_accounts_page(&server, 2, json!([])).await;

    let client = client_for(&[&server], 3, 10);
    let tally = client.holder_tally().await.unwrap();

    assert_eq!(tally.holders, 3);
    assert_eq!(tally.total_by_sum, Some(6));
    assert_eq!(tally.pages_fetched, 1);
}

/// An indexer that always returns full pages is cut off at the page cap
#[tokio::test]
async fn holder_pagination_respects_page_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/atomicassets/v1/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(direct_records(4, 1))))
        .expect(10)
        .mount(&server)
        .await;

    let client = client_for(&[&server], 4, 10);
    let tally = client.holder_tally().await.unwrap();

    assert_eq!(tally.holders, 40);
    assert_eq!(tally.pages_fetched, 10);
    assert!(tally.truncated);
}

/// Records without any asset information still count as holders
#[tokio::test]
async fn holder_pagination_zero_sum_is_null() {
    let server = MockServer::start().await;
    mount_accounts_page(&server, 1, json!([{ "account": "a" }, { "account": "b" }])).await;

    let client = client_for(&[&server], 1000, 10);
    let tally = client.holder_tally().await.unwrap();

    assert_eq!(tally.holders, 2);
    assert_eq!(tally.total_by_sum, None);
}

/// A page failing on every mirror fails the whole tally
#[tokio::test]
async fn holder_pagination_propagates_exhaustion() {
    let server = MockServer::start().await;
    mount_accounts_page(&server, 1, direct_records(2, 1)).await;
    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client_for(&[&server], 2, 10);

    match client.holder_tally().await.unwrap_err() {
        ApiError::AllProvidersFailed { attempts, .. } => assert_eq!(attempts, 1),
        other => panic!("Expected AllProvidersFailed, got: {other:?}"),
    }
}

/// Stats without any usable key are unavailable, not an error
#[tokio::test]
async fn stats_lookup_without_usable_total() {
    let server = MockServer::start().await;
    mount_stats(&server, json!({ "assets": "0", "burned": "12" })).await;

    let client = client_for(&[&server], 1000, 10);

    assert_eq!(client.collection_total().await, None);
}

/// The v1 sales endpoint is queried with the symbol filter
#[tokio::test]
async fn floor_from_v1_text_price() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/atomicmarket/v1/sales"))
        .and(query_param("symbol", "WAX"))
        .and(query_param("collection_name", TEST_COLLECTION))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!([{ "price": "123.45670000 WAX" }]))),
        )
        .mount(&server)
        .await;

    let client = client_for(&[&server], 1000, 10);

    assert_eq!(client.floor_price().await, Some(123.4567));
}

/// An empty v1 listing falls back to v2, which carries no symbol filter
#[tokio::test]
async fn floor_falls_back_to_v2() {
    let server = MockServer::start().await;
    mount_sales(&server, "v1", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/atomicmarket/v2/sales"))
        .and(query_param_is_missing("symbol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([{
            "sale_id": "99",
            "price": { "amount": "5000000000", "token_precision": 8, "token_symbol": "WAX" }
        }]))))
        .mount(&server)
        .await;

    let client = client_for(&[&server], 1000, 10);

    assert_eq!(client.floor_price().await, Some(50.0));
}

/// A failing v1 endpoint also falls back to v2
#[tokio::test]
async fn floor_falls_back_to_v2_after_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/atomicmarket/v1/sales"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_sales(&server, "v2", json!([{ "price": 12_345_000_000_u64 }])).await;

    let client = client_for(&[&server], 1000, 10);

    assert_eq!(client.floor_price().await, Some(123.45));
}

/// No sales on either version means no floor price
#[tokio::test]
async fn floor_without_sales() {
    let server = MockServer::start().await;
    mount_sales(&server, "v1", json!([])).await;
    mount_sales(&server, "v2", json!([])).await;

    let client = client_for(&[&server], 1000, 10);

    assert_eq!(client.floor_price().await, None);
}

/// End to end: empty sales leave `floor_wax` null while `ok` stays true
#[tokio::test]
async fn aggregate_without_sales_is_ok() {
    let server = MockServer::start().await;
    mount_accounts_page(&server, 1, direct_records(400, 2)).await;
    mount_stats(&server, json!({ "assets": "5000" })).await;
    mount_sales(&server, "v1", json!([])).await;
    mount_sales(&server, "v2", json!([])).await;

    let aggregator = StatsAggregator::new(client_for(&[&server], 1000, 10));
    let body = serde_json::to_value(aggregator.collect().await).unwrap();

    assert_eq!(
        body,
        json!({ "ok": true, "holders": 400, "total_assets": 5000, "floor_wax": null })
    );
}

/// End to end: the pagination sum is used when the stats endpoint is down
#[tokio::test]
async fn aggregate_falls_back_to_pagination_sum() {
    let server = MockServer::start().await;
    mount_accounts_page(&server, 1, direct_records(3, 4)).await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/atomicassets/v1/collections/{TEST_COLLECTION}/stats"
        )))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_sales(&server, "v1", json!([{ "price": { "amount": "150000000" } }])).await;

    let aggregator = StatsAggregator::new(client_for(&[&server], 1000, 10));
    let body = serde_json::to_value(aggregator.collect().await).unwrap();

    assert_eq!(
        body,
        json!({ "ok": true, "holders": 3, "total_assets": 12, "floor_wax": 1.5 })
    );
}

/// End to end: every mirror down yields an error payload
#[tokio::test]
async fn aggregate_with_all_mirrors_down() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_failure(&first, 500).await;
    mount_failure(&second, 500).await;

    let aggregator = StatsAggregator::new(client_for(&[&first, &second], 1000, 10));
    let body = serde_json::to_value(aggregator.collect().await).unwrap();

    assert_eq!(body["ok"], json!(false));
    assert!(!body["error"].as_str().unwrap().is_empty());
}

/// End to end: a hanging primary mirror costs one request timeout per query,
/// yet every page served by the second mirror still produces a full result
#[tokio::test]
async fn aggregate_survives_slow_primary_mirror() {
    let slow = MockServer::start().await;
    let healthy = MockServer::start().await;
    mount_slow(&slow).await;
    mount_accounts_page(&healthy, 1, direct_records(2, 1)).await;
    mount_accounts_page(&healthy, 2, direct_records(2, 1)).await;
    mount_accounts_page(&healthy, 3, direct_records(1, 1)).await;
    mount_stats(&healthy, json!({ "assets": "7" })).await;
    mount_sales(&healthy, "v1", json!([{ "price": "2.50000000 WAX" }])).await;

    let aggregator = StatsAggregator::new(client_for(&[&slow, &healthy], 2, 10));
    let body = serde_json::to_value(aggregator.collect().await).unwrap();

    assert_eq!(
        body,
        json!({ "ok": true, "holders": 5, "total_assets": 7, "floor_wax": 2.5 })
    );
    let pages_served = healthy
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/atomicassets/v1/accounts")
        .count();
    assert_eq!(pages_served, 3);
}

/// Mirror health probes classify each host
#[tokio::test]
async fn mirror_health_probes() {
    let up = MockServer::start().await;
    let limited = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&up)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&limited)
        .await;

    let client = client_for(&[&up, &limited], 1000, 10);
    let results = client.fetcher().probe_mirrors().await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, up.uri());
    assert_eq!(results[0].1.status, api_client::HealthStatus::Up);
    assert!(matches!(
        results[1].1.status,
        api_client::HealthStatus::Degraded { .. }
    ));
}
