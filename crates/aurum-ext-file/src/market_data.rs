//! File-based and in-memory price sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Deserialize;
use tracing::{debug, info};

use aurum_traits::error::SourceError;
use aurum_traits::ids::Symbol;
use aurum_traits::market_data::{HistoricalResponse, PriceSource, RawBar, RawQuote};

/// Keep the bars inside `[from, to]`, preserving the response shape.
fn filter_range(response: &HistoricalResponse, from: NaiveDate, to: NaiveDate) -> HistoricalResponse {
    let in_range = |bar: &&RawBar| bar.trading_date().is_some_and(|d| d >= from && d <= to);

    match response {
        HistoricalResponse::Bars(bars) => {
            HistoricalResponse::Bars(bars.iter().filter(in_range).cloned().collect())
        }
        HistoricalResponse::Wrapped { symbol, historical } => HistoricalResponse::Wrapped {
            symbol: symbol.clone(),
            historical: historical.iter().filter(in_range).cloned().collect(),
        },
    }
}

// =============================================================================
// STATIC SOURCE
// =============================================================================

/// In-memory price source.
///
/// Quotes and history are keyed by symbol. Unknown symbols answer with
/// nothing, never with an error. Calls are counted so tests can check how
/// often the upstream was hit.
pub struct StaticPriceSource {
    name: String,
    quotes: DashMap<Symbol, RawQuote>,
    history: DashMap<Symbol, HistoricalResponse>,
    quote_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

impl StaticPriceSource {
    /// Create an empty source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quotes: DashMap::new(),
            history: DashMap::new(),
            quote_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        }
    }

    /// Add a quote under its own symbol.
    pub fn with_quote(self, quote: RawQuote) -> Self {
        self.insert_quote(quote);
        self
    }

    /// Add history for a symbol.
    pub fn with_history(self, symbol: impl Into<Symbol>, response: HistoricalResponse) -> Self {
        self.insert_history(symbol.into(), response);
        self
    }

    /// Insert or replace a quote.
    pub fn insert_quote(&self, quote: RawQuote) {
        self.quotes.insert(Symbol::new(quote.symbol.clone()), quote);
    }

    /// Insert or replace the history for a symbol.
    pub fn insert_history(&self, symbol: Symbol, response: HistoricalResponse) {
        self.history.insert(symbol, response);
    }

    /// Drop all data.
    pub fn clear(&self) {
        self.quotes.clear();
        self.history.clear();
    }

    /// Number of `fetch_quote` calls served.
    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::Relaxed)
    }

    /// Number of `fetch_historical` calls served.
    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<RawQuote>, SourceError> {
        self.quote_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.quotes.get(symbol).map(|q| q.clone()))
    }

    async fn fetch_historical(
        &self,
        symbol: &Symbol,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HistoricalResponse, SourceError> {
        self.history_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .history
            .get(symbol)
            .map(|response| filter_range(&response, from, to))
            .unwrap_or_default())
    }
}

// =============================================================================
// JSON FILE SOURCE
// =============================================================================

/// On-disk fixture layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FixtureFile {
    quotes: Vec<RawQuote>,
    historical: HashMap<String, HistoricalResponse>,
}

/// JSON-file-backed price source.
///
/// ```json
/// {
///   "quotes": [{ "symbol": "GCUSD", "price": 2330.1 }],
///   "historical": {
///     "GCUSD": { "symbol": "GCUSD", "historical": [{ "date": "2024-06-13", "close": 2317.5 }] },
///     "GLD": [{ "date": "2024-06-13", "close": 214.2 }]
///   }
/// }
/// ```
pub struct JsonFileSource {
    file_path: PathBuf,
    data: StaticPriceSource,
}

impl JsonFileSource {
    /// Create a source from a fixture file. A missing file gives an empty source.
    pub fn new(file_path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file_path = file_path.as_ref().to_path_buf();
        let source = Self {
            data: StaticPriceSource::new(format!("file:{}", file_path.display())),
            file_path,
        };
        source.reload()?;
        Ok(source)
    }

    /// Reload data from the file.
    pub fn reload(&self) -> Result<(), SourceError> {
        if !self.file_path.exists() {
            debug!("Fixture {} not found, source is empty", self.file_path.display());
            self.data.clear();
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.file_path)?;
        let fixture: FixtureFile = serde_json::from_str(&content)?;

        self.data.clear();
        let quote_count = fixture.quotes.len();
        for quote in fixture.quotes {
            self.data.insert_quote(quote);
        }
        let series_count = fixture.historical.len();
        for (symbol, response) in fixture.historical {
            self.data.insert_history(Symbol::new(symbol), response);
        }

        info!(
            "Loaded {} quotes and {} historical series from {}",
            quote_count,
            series_count,
            self.file_path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl PriceSource for JsonFileSource {
    fn name(&self) -> &str {
        self.data.name()
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<RawQuote>, SourceError> {
        self.data.fetch_quote(symbol).await
    }

    async fn fetch_historical(
        &self,
        symbol: &Symbol,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HistoricalResponse, SourceError> {
        self.data.fetch_historical(symbol, from, to).await
    }
}

// =============================================================================
// EMPTY / UNAVAILABLE SOURCES
// =============================================================================

/// Source that always answers with nothing.
pub struct EmptyPriceSource;

#[async_trait]
impl PriceSource for EmptyPriceSource {
    fn name(&self) -> &str {
        "empty"
    }

    async fn fetch_quote(&self, _symbol: &Symbol) -> Result<Option<RawQuote>, SourceError> {
        Ok(None)
    }

    async fn fetch_historical(
        &self,
        _symbol: &Symbol,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<HistoricalResponse, SourceError> {
        Ok(HistoricalResponse::empty())
    }
}

/// Source that always fails, standing in for an unreachable upstream.
pub struct UnavailablePriceSource;

#[async_trait]
impl PriceSource for UnavailablePriceSource {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn fetch_quote(&self, _symbol: &Symbol) -> Result<Option<RawQuote>, SourceError> {
        Err(SourceError::SourceNotAvailable("upstream unreachable".into()))
    }

    async fn fetch_historical(
        &self,
        _symbol: &Symbol,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<HistoricalResponse, SourceError> {
        Err(SourceError::SourceNotAvailable("upstream unreachable".into()))
    }
}
