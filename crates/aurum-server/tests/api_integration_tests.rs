//! Integration tests for the Aurum Server API endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

use aurum_engine::{ManualClock, PriceEngine, PriceEngineBuilder};
use aurum_ext_file::{StaticPriceSource, UnavailablePriceSource};
use aurum_server::routes::create_router;
use aurum_traits::config::EngineConfig;
use aurum_traits::market_data::{HistoricalResponse, PriceSource, RawBar, RawQuote, UpstreamProvider};

fn bar(date: &str, close: rust_decimal::Decimal) -> RawBar {
    RawBar {
        date: date.to_string(),
        close: Some(close),
        ..Default::default()
    }
}

/// Primary source with a spot quote and a few days of history.
fn stocked_source() -> Arc<StaticPriceSource> {
    Arc::new(
        StaticPriceSource::new("primary")
            .with_quote(RawQuote {
                symbol: "GCUSD".into(),
                name: Some("Gold".into()),
                price: Some(dec!(2330.1)),
                ..Default::default()
            })
            .with_history(
                "GCUSD",
                HistoricalResponse::Wrapped {
                    symbol: Some("GCUSD".into()),
                    historical: vec![
                        bar("2024-06-13", dec!(2317.5)),
                        bar("2024-06-12", dec!(2325.0)),
                        bar("2024-06-10", dec!(2310.2)),
                    ],
                },
            ),
    )
}

/// Engine pinned to 2024-06-14 15:00 UTC.
fn create_test_engine(
    primary: Arc<dyn PriceSource>,
    secondary: Arc<dyn PriceSource>,
) -> Arc<PriceEngine> {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 14, 15, 0, 0).unwrap(),
    ));

    let engine = PriceEngineBuilder::new()
        .with_config(EngineConfig::default())
        .with_sources(UpstreamProvider::new(primary, secondary))
        .with_clock(clock)
        .build()
        .expect("Failed to build engine");

    Arc::new(engine)
}

fn stocked_engine() -> (Arc<PriceEngine>, Arc<StaticPriceSource>) {
    let primary = stocked_source();
    let engine = create_test_engine(primary.clone(), Arc::new(StaticPriceSource::new("secondary")));
    (engine, primary)
}

async fn send(engine: &Arc<PriceEngine>, method: &str, uri: &str) -> (StatusCode, Value) {
    let app = create_router(engine.clone());

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

// =============================================================================
// HEALTH TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (engine, _) = stocked_engine();
    let (status, json) = send(&engine, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

// =============================================================================
// CURRENT PRICE TESTS
// =============================================================================

#[tokio::test]
async fn test_current_price_miss_then_hit() {
    let (engine, primary) = stocked_engine();

    let (status, json) = send(&engine, "GET", "/api/v1/price/current").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cached"], false);
    assert_eq!(json["data"]["symbol"], "GCUSD");
    assert_eq!(json["data"]["price"], 2330.1);

    let calls = primary.quote_calls();

    let (status, json) = send(&engine, "GET", "/api/v1/price/current").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cached"], true);
    assert_eq!(primary.quote_calls(), calls);
}

#[tokio::test]
async fn test_current_price_unavailable() {
    let engine = create_test_engine(
        Arc::new(UnavailablePriceSource),
        Arc::new(UnavailablePriceSource),
    );

    let (status, json) = send(&engine, "GET", "/api/v1/price/current").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].is_string());
}

// =============================================================================
// HISTORICAL TESTS
// =============================================================================

#[tokio::test]
async fn test_historical_default_timeframe() {
    let (engine, _) = stocked_engine();

    let (status, json) = send(&engine, "GET", "/api/v1/price/historical").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["timeframe"], "1M");
    assert_eq!(json["cached"], false);
    assert_eq!(json["count"], 3);

    let data = json["data"].as_array().unwrap();
    assert_eq!(data[0]["date"], "2024-06-10");
    assert_eq!(data[2]["date"], "2024-06-13");
}

#[tokio::test]
async fn test_historical_unknown_timeframe_shares_default_entry() {
    let (engine, primary) = stocked_engine();

    let (status, _) = send(&engine, "GET", "/api/v1/price/historical?timeframe=1M").await;
    assert_eq!(status, StatusCode::OK);
    let calls = primary.history_calls();

    let (status, json) = send(&engine, "GET", "/api/v1/price/historical?timeframe=bogus").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["timeframe"], "1M");
    assert_eq!(json["cached"], true);
    assert_eq!(primary.history_calls(), calls);
}

#[tokio::test]
async fn test_historical_falls_back_to_secondary() {
    let secondary = Arc::new(StaticPriceSource::new("secondary").with_history(
        "XAUUSD",
        HistoricalResponse::Bars(vec![bar("2024-06-13", dec!(2318.0))]),
    ));
    let engine = create_test_engine(Arc::new(UnavailablePriceSource), secondary);

    let (status, json) = send(&engine, "GET", "/api/v1/price/historical?timeframe=1W").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["timeframe"], "1W");
    assert_eq!(json["data"][0]["close"], 2318.0);
}

#[tokio::test]
async fn test_historical_unavailable() {
    let engine = create_test_engine(
        Arc::new(UnavailablePriceSource),
        Arc::new(UnavailablePriceSource),
    );

    let (status, _) = send(&engine, "GET", "/api/v1/price/historical?timeframe=1Y").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// DATE TESTS
// =============================================================================

#[tokio::test]
async fn test_price_for_date() {
    let (engine, _) = stocked_engine();

    let (status, json) = send(&engine, "GET", "/api/v1/price/date/2024-06-12").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cached"], false);
    assert_eq!(json["data"]["date"], "2024-06-12");
    assert_eq!(json["data"]["close"], 2325.0);

    let (_, json) = send(&engine, "GET", "/api/v1/price/date/2024-06-12").await;
    assert_eq!(json["cached"], true);
}

#[tokio::test]
async fn test_price_for_date_errors() {
    let (engine, _) = stocked_engine();

    let (status, json) = send(&engine, "GET", "/api/v1/price/date/12-06-2024").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    // Weekend with no bar
    let (status, _) = send(&engine, "GET", "/api/v1/price/date/2024-06-09").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Well-formed but not traded yet
    let (status, _) = send(&engine, "GET", "/api/v1/price/date/2030-01-01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// CACHE TESTS
// =============================================================================

#[tokio::test]
async fn test_cache_stats_and_clear() {
    let (engine, _) = stocked_engine();

    send(&engine, "GET", "/api/v1/price/current").await;
    send(&engine, "GET", "/api/v1/price/date/2024-06-13").await;

    let (status, json) = send(&engine, "GET", "/api/v1/cache/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["size"], 2);
    assert_eq!(json["max_size"], 1000);

    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries[0]["key"], "quote:current");
    assert_eq!(entries[1]["key"], "date:2024-06-13");
    assert_eq!(entries[0]["expired"], false);

    let (status, json) = send(&engine, "DELETE", "/api/v1/cache").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], true);

    let (_, json) = send(&engine, "GET", "/api/v1/cache/stats").await;
    assert_eq!(json["size"], 0);

    let (_, json) = send(&engine, "GET", "/api/v1/price/current").await;
    assert_eq!(json["cached"], false);
}
