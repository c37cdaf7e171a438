//! Route definitions.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use aurum_engine::PriceEngine;

use crate::handlers::{self, AppState};

/// Create the API router.
///
/// # Arguments
/// * `engine` - The price engine
pub fn create_router(engine: Arc<PriceEngine>) -> Router {
    let state = Arc::new(AppState { engine });

    Router::new()
        // Health
        .route("/health", get(handlers::health))
        .route("/api/v1/health", get(handlers::health))
        // Prices
        .route("/api/v1/price/current", get(handlers::get_current_price))
        .route("/api/v1/price/historical", get(handlers::get_historical_prices))
        .route("/api/v1/price/date/:date", get(handlers::get_price_for_date))
        // Cache
        .route("/api/v1/cache/stats", get(handlers::get_cache_stats))
        .route("/api/v1/cache", axum::routing::delete(handlers::clear_cache))
        // State
        .with_state(state)
}
