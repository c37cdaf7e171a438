//! Logical cache keys.
//!
//! One key per (data kind, parameter). The kind prefix keeps keys from
//! different kinds apart even when parameters look alike.

use std::fmt;

use chrono::NaiveDate;

use crate::timeframe::Timeframe;

/// Cache key for one fetch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The current quote
    CurrentQuote,
    /// A historical range
    Historical(Timeframe),
    /// A single calendar date
    Date(NaiveDate),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::CurrentQuote => f.write_str("quote:current"),
            CacheKey::Historical(timeframe) => write!(f, "historical:{}", timeframe.token()),
            CacheKey::Date(date) => write!(f, "date:{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_format() {
        assert_eq!(CacheKey::CurrentQuote.to_string(), "quote:current");
        assert_eq!(
            CacheKey::Historical(Timeframe::ThreeMonths).to_string(),
            "historical:3M"
        );
        assert_eq!(
            CacheKey::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()).to_string(),
            "date:2024-01-05"
        );
    }

    #[test]
    fn test_keys_are_distinct_across_kinds() {
        let mut keys = HashSet::new();
        keys.insert(CacheKey::CurrentQuote.to_string());
        for tf in Timeframe::ALL {
            keys.insert(CacheKey::Historical(tf).to_string());
        }
        keys.insert(CacheKey::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()).to_string());
        keys.insert(CacheKey::Date(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()).to_string());

        assert_eq!(keys.len(), 1 + Timeframe::ALL.len() + 2);
    }

    #[test]
    fn test_unknown_tokens_share_default_key() {
        let a = CacheKey::Historical(Timeframe::parse("nope"));
        let b = CacheKey::Historical(Timeframe::parse("1M"));
        assert_eq!(a.to_string(), b.to_string());
    }
}
