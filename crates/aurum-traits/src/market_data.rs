//! Upstream price source traits.
//!
//! These types describe what an upstream quote API hands back before any
//! normalization:
//! - [`RawQuote`]: a single real-time quote
//! - [`RawBar`]: one daily bar of a historical series
//! - [`HistoricalResponse`]: the two shapes a historical endpoint may answer with
//!
//! [`PriceSource`] is the only trait an upstream client has to implement.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::ids::Symbol;

// =============================================================================
// RAW RECORDS
// =============================================================================

/// Raw quote as returned by the upstream quote endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    /// Ticker symbol
    pub symbol: String,
    /// Display name
    pub name: Option<String>,
    /// Last price
    pub price: Option<Decimal>,
    /// Percentage change versus previous close
    pub changes_percentage: Option<Decimal>,
    /// Absolute change versus previous close
    pub change: Option<Decimal>,
    /// Session low
    pub day_low: Option<Decimal>,
    /// Session high
    pub day_high: Option<Decimal>,
    /// 52-week high
    pub year_high: Option<Decimal>,
    /// 52-week low
    pub year_low: Option<Decimal>,
    /// Session open
    pub open: Option<Decimal>,
    /// Previous session close
    pub previous_close: Option<Decimal>,
    /// Session volume
    pub volume: Option<Decimal>,
    /// Unix timestamp (seconds) of the quote
    pub timestamp: Option<i64>,
}

impl RawQuote {
    /// True when the quote carries no usable price.
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
    }
}

/// One daily bar from a historical endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBar {
    /// Bar date, `YYYY-MM-DD` optionally followed by a time
    pub date: String,
    /// Open
    pub open: Option<Decimal>,
    /// High
    pub high: Option<Decimal>,
    /// Low
    pub low: Option<Decimal>,
    /// Close
    pub close: Option<Decimal>,
    /// Volume
    pub volume: Option<Decimal>,
    /// Adjusted close
    pub adj_close: Option<Decimal>,
    /// Absolute change over the bar
    pub change: Option<Decimal>,
    /// Percentage change over the bar
    pub change_percent: Option<Decimal>,
}

impl RawBar {
    /// Trading date of the bar. Any time suffix after `YYYY-MM-DD` is ignored.
    pub fn trading_date(&self) -> Option<NaiveDate> {
        let day = self.date.trim().get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

/// Historical response shapes.
///
/// Some endpoints answer with a bare list of bars, others wrap the list in an
/// object under `historical`. An empty object (`{}`) is a valid empty answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoricalResponse {
    /// Bare list of bars
    Bars(Vec<RawBar>),
    /// Object wrapping the bars
    Wrapped {
        /// Symbol echoed by the upstream
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
        /// The bars
        #[serde(default)]
        historical: Vec<RawBar>,
    },
}

impl HistoricalResponse {
    /// An empty answer.
    pub fn empty() -> Self {
        HistoricalResponse::Bars(Vec::new())
    }

    /// Number of bars in the response.
    pub fn len(&self) -> usize {
        self.bars().len()
    }

    /// True when the response carries no bars.
    pub fn is_empty(&self) -> bool {
        self.bars().is_empty()
    }

    /// Borrow the bars regardless of shape.
    pub fn bars(&self) -> &[RawBar] {
        match self {
            HistoricalResponse::Bars(bars) => bars,
            HistoricalResponse::Wrapped { historical, .. } => historical,
        }
    }

    /// Take the bars regardless of shape.
    pub fn into_bars(self) -> Vec<RawBar> {
        match self {
            HistoricalResponse::Bars(bars) => bars,
            HistoricalResponse::Wrapped { historical, .. } => historical,
        }
    }
}

impl Default for HistoricalResponse {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// PRICE SOURCE
// =============================================================================

/// Trait for upstream price providers.
///
/// Implementations own transport concerns (HTTP, auth, timeouts). A source
/// must keep "answered with nothing" (`Ok(None)`, empty response) distinct
/// from "failed" (`Err`); the engine's fallback logic depends on it.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Get the current quote for a symbol.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<RawQuote>, SourceError>;

    /// Get daily bars for a symbol between `from` and `to` inclusive.
    async fn fetch_historical(
        &self,
        symbol: &Symbol,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HistoricalResponse, SourceError>;
}

/// Upstream sources consumed by the engine.
#[derive(Clone)]
pub struct UpstreamProvider {
    /// Primary source: quotes, historical ranges and single dates
    pub primary: Arc<dyn PriceSource>,
    /// Secondary source: historical fallback when the primary errors
    pub secondary: Arc<dyn PriceSource>,
}

impl UpstreamProvider {
    /// Create a provider from a primary and a secondary source.
    pub fn new(primary: Arc<dyn PriceSource>, secondary: Arc<dyn PriceSource>) -> Self {
        Self { primary, secondary }
    }
}

impl std::fmt::Debug for UpstreamProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamProvider")
            .field("primary", &self.primary.name())
            .field("secondary", &self.secondary.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bar_trading_date() {
        let bar = |date: &str| RawBar {
            date: date.to_string(),
            ..Default::default()
        };
        let expected = NaiveDate::from_ymd_opt(2024, 2, 9);

        assert_eq!(bar("2024-02-09").trading_date(), expected);
        assert_eq!(bar("2024-02-09 00:00:00").trading_date(), expected);
        assert_eq!(bar(" 2024-02-09T16:00:00Z").trading_date(), expected);
        assert_eq!(bar("02/09/2024").trading_date(), None);
        assert_eq!(bar("2024").trading_date(), None);
    }

    #[test]
    fn test_historical_bare_list() {
        let json = r#"[{"date":"2024-01-02","open":2060.1,"high":2075.0,"low":2055.2,"close":2070.5,"volume":1200}]"#;
        let response: HistoricalResponse = serde_json::from_str(json).unwrap();

        assert!(matches!(response, HistoricalResponse::Bars(_)));
        assert_eq!(response.len(), 1);
        assert_eq!(response.bars()[0].close, Some(dec!(2070.5)));
    }

    #[test]
    fn test_historical_wrapped() {
        let json = r#"{"symbol":"GCUSD","historical":[
            {"date":"2024-01-03","close":2041.3,"adjClose":2041.3,"changePercent":-0.4},
            {"date":"2024-01-02","close":2070.5}
        ]}"#;
        let response: HistoricalResponse = serde_json::from_str(json).unwrap();

        match &response {
            HistoricalResponse::Wrapped { symbol, historical } => {
                assert_eq!(symbol.as_deref(), Some("GCUSD"));
                assert_eq!(historical.len(), 2);
                assert_eq!(historical[0].change_percent, Some(dec!(-0.4)));
            }
            other => panic!("expected wrapped response, got {:?}", other),
        }
    }

    #[test]
    fn test_historical_empty_object() {
        let response: HistoricalResponse = serde_json::from_str("{}").unwrap();
        assert!(response.is_empty());
        assert!(response.into_bars().is_empty());
    }

    #[test]
    fn test_quote_camel_case() {
        let json = r#"{"symbol":"GCUSD","price":2350.4,"changesPercentage":0.52,
            "dayLow":2331.0,"dayHigh":2355.9,"previousClose":2338.2,"timestamp":1714060800}"#;
        let quote: RawQuote = serde_json::from_str(json).unwrap();

        assert_eq!(quote.price, Some(dec!(2350.4)));
        assert_eq!(quote.changes_percentage, Some(dec!(0.52)));
        assert_eq!(quote.previous_close, Some(dec!(2338.2)));
        assert!(!quote.is_empty());
        assert!(RawQuote::default().is_empty());
    }
}
