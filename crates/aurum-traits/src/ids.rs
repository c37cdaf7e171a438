//! Identifier types used across the price cache.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream ticker symbol (e.g. `GCUSD` for spot gold, `GLD` for the ETF proxy).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Create a new symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// Get the symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_display() {
        let symbol = Symbol::new("GCUSD");
        assert_eq!(symbol.to_string(), "GCUSD");
        assert_eq!(symbol.as_str(), "GCUSD");
        assert_eq!(Symbol::from("GLD"), Symbol::new("GLD".to_string()));
    }
}
