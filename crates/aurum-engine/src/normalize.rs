//! Canonical records and conversion from raw upstream shapes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use aurum_traits::market_data::{HistoricalResponse, RawBar, RawQuote};

/// One day of price history in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Open
    pub open: Decimal,
    /// High
    pub high: Decimal,
    /// Low
    pub low: Decimal,
    /// Close
    pub close: Decimal,
    /// Volume, when the upstream reports one
    pub volume: Option<Decimal>,
    /// Adjusted close
    pub adj_close: Option<Decimal>,
    /// Absolute change over the day
    pub change: Option<Decimal>,
    /// Percentage change over the day
    pub change_percent: Option<Decimal>,
}

/// Current quote in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldQuote {
    /// Symbol that answered
    pub symbol: String,
    /// Display name
    pub name: Option<String>,
    /// Last price
    pub price: Decimal,
    /// Session open
    pub open: Option<Decimal>,
    /// Session high
    pub high: Option<Decimal>,
    /// Session low
    pub low: Option<Decimal>,
    /// Previous close
    pub previous_close: Option<Decimal>,
    /// Absolute change
    pub change: Option<Decimal>,
    /// Percentage change
    pub change_percent: Option<Decimal>,
    /// 52-week high
    pub year_high: Option<Decimal>,
    /// 52-week low
    pub year_low: Option<Decimal>,
    /// Volume
    pub volume: Option<Decimal>,
    /// Date of the quote
    pub date: NaiveDate,
    /// Time of the quote
    pub timestamp: DateTime<Utc>,
}

/// Convert one raw bar. Bars without a date or close are unusable.
///
/// Missing open/high/low default to the close.
pub fn normalize_bar(bar: RawBar) -> Option<PricePoint> {
    let date = bar.trading_date()?;
    let close = bar.close?;

    Some(PricePoint {
        date,
        open: bar.open.unwrap_or(close),
        high: bar.high.unwrap_or(close),
        low: bar.low.unwrap_or(close),
        close,
        volume: bar.volume,
        adj_close: bar.adj_close,
        change: bar.change,
        change_percent: bar.change_percent,
    })
}

/// Convert either response shape into points sorted by ascending date,
/// one point per date.
pub fn normalize_history(response: HistoricalResponse) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = response
        .into_bars()
        .into_iter()
        .filter_map(normalize_bar)
        .collect();

    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    points
}

/// Convert a raw quote. `None` when it has no price.
///
/// `now` stamps quotes that arrive without a timestamp.
pub fn normalize_quote(raw: RawQuote, now: DateTime<Utc>) -> Option<GoldQuote> {
    let price = raw.price?;
    let timestamp = raw
        .timestamp
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(now);

    Some(GoldQuote {
        symbol: raw.symbol,
        name: raw.name,
        price,
        open: raw.open,
        high: raw.day_high,
        low: raw.day_low,
        previous_close: raw.previous_close,
        change: raw.change,
        change_percent: raw.changes_percentage,
        year_high: raw.year_high,
        year_low: raw.year_low,
        volume: raw.volume,
        date: timestamp.date_naive(),
        timestamp,
    })
}
