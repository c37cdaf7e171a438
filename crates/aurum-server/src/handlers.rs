//! Request handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use aurum_engine::{FetchError, PriceEngine, Timeframe};

/// Application state.
pub struct AppState {
    /// The price engine
    pub engine: Arc<PriceEngine>,
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Health check handler.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Map a fetch failure to a status code and JSON body.
fn fetch_error(err: FetchError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        FetchError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        FetchError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        FetchError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    debug!("Request failed with {}: {}", status, err);
    (status, Json(json!({ "error": err.to_string() })))
}

/// Current gold price.
pub async fn get_current_price(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.engine.current_quote().await {
        Ok(fetched) => (
            StatusCode::OK,
            Json(json!({ "data": fetched.value, "cached": fetched.cached })),
        ),
        Err(e) => fetch_error(e),
    }
}

/// Query parameters for historical prices.
#[derive(Debug, Deserialize)]
pub struct HistoricalQuery {
    /// Timeframe token (1D, 1W, 1M, 3M, 6M, 1Y, 5Y, ALL). Defaults to 1M.
    pub timeframe: Option<String>,
}

/// Historical prices for a timeframe.
pub async fn get_historical_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoricalQuery>,
) -> impl IntoResponse {
    let token = query.timeframe.unwrap_or_default();
    let timeframe = Timeframe::parse(&token);

    match state.engine.historical(&token).await {
        Ok(fetched) => (
            StatusCode::OK,
            Json(json!({
                "timeframe": timeframe.token(),
                "count": fetched.value.len(),
                "data": fetched.value.as_ref(),
                "cached": fetched.cached,
            })),
        ),
        Err(e) => fetch_error(e),
    }
}

/// Price record for one date.
pub async fn get_price_for_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> impl IntoResponse {
    match state.engine.for_date(&date).await {
        Ok(fetched) => (
            StatusCode::OK,
            Json(json!({ "data": fetched.value, "cached": fetched.cached })),
        ),
        Err(e) => fetch_error(e),
    }
}

/// Cache statistics.
pub async fn get_cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.cache_stats())
}

/// Clear the cache.
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.engine.cache_clear();
    Json(json!({ "cleared": true }))
}
