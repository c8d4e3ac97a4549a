//! Currency pair identifier

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Traded currency pair: `first` is the base currency, `second` the quote currency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyPair {
    first: String,
    second: String,
}

impl CurrencyPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into().to_ascii_uppercase(),
            second: second.into().to_ascii_uppercase(),
        }
    }

    /// Base currency
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Quote currency
    pub fn second(&self) -> &str {
        &self.second
    }
}

impl FromStr for CurrencyPair {
    type Err = Error;

    /// Accepts `BTC/EUR`, `BTC_EUR` and `BTC-EUR`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split(['/', '_', '-']);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(first), Some(second), None) if !first.is_empty() && !second.is_empty() => {
                Ok(Self::new(first, second))
            }
            _ => Err(Error::Parse(format!("invalid currency pair: {s}"))),
        }
    }
}

impl TryFrom<String> for CurrencyPair {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CurrencyPair> for String {
    fn from(pair: CurrencyPair) -> Self {
        pair.to_string()
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_separators() {
        for raw in ["BTC/EUR", "btc_eur", "BTC-EUR", " BTC/EUR "] {
            let pair: CurrencyPair = raw.parse().unwrap();
            assert_eq!(pair.first(), "BTC");
            assert_eq!(pair.second(), "EUR");
            assert_eq!(pair.to_string(), "BTC_EUR");
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!("BTC".parse::<CurrencyPair>().is_err());
        assert!("BTC/".parse::<CurrencyPair>().is_err());
        assert!("A/B/C".parse::<CurrencyPair>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let pair = CurrencyPair::new("eth", "btc");
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, "\"ETH_BTC\"");
        let back: CurrencyPair = serde_json::from_str("\"ETH/BTC\"").unwrap();
        assert_eq!(back, pair);
    }
}
