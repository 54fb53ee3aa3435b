//! Ticker symbols and the market they trade on.
//!
//! Callers pass either a bare ticker (`AAPL`), a Yahoo-style suffixed ticker
//! (`SHOP.TO`) or a ticker plus exchange code (`RELIANCE` on `NSE`). Each
//! provider later renders the symbol in its own format.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::Ticker;
use crate::errors::FetchError;

/// Market a ticker trades on.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Market {
    /// NYSE / NASDAQ and anything without an explicit qualifier.
    #[default]
    Us,
    /// Toronto Stock Exchange.
    Tsx,
    /// TSX Venture Exchange.
    TsxVenture,
    /// National Stock Exchange of India.
    Nse,
    /// Bombay Stock Exchange.
    Bse,
}

impl Market {
    /// Resolve an exchange code such as `TSX` or `NASDAQ`.
    ///
    /// Unknown codes fall back to [`Market::Us`], the market every provider
    /// understands without a qualifier.
    pub fn from_exchange(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "TSX" | "TOR" => Self::Tsx,
            "TSXV" | "CVE" => Self::TsxVenture,
            "NSE" | "NSI" => Self::Nse,
            "BSE" | "BOM" => Self::Bse,
            _ => Self::Us,
        }
    }

    /// Resolve a Yahoo-style suffix (without the dot).
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_uppercase().as_str() {
            "TO" => Some(Self::Tsx),
            "V" => Some(Self::TsxVenture),
            "NS" => Some(Self::Nse),
            "BO" => Some(Self::Bse),
            _ => None,
        }
    }

    /// Short exchange code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Us => "US",
            Self::Tsx => "TSX",
            Self::TsxVenture => "TSXV",
            Self::Nse => "NSE",
            Self::Bse => "BSE",
        }
    }

    /// Suffix Yahoo appends to tickers on this market (empty for US).
    pub fn yahoo_suffix(&self) -> &'static str {
        match self {
            Self::Us => "",
            Self::Tsx => ".TO",
            Self::TsxVenture => ".V",
            Self::Nse => ".NS",
            Self::Bse => ".BO",
        }
    }
}

/// A ticker plus its market.
///
/// Opaque to the engine beyond being non-empty; providers decide how to
/// render it.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    ticker: Ticker,
    market: Market,
}

impl Symbol {
    /// Parse a ticker that may carry a Yahoo-style market suffix.
    ///
    /// Suffixes that do not name a known market (`BRK.B`) stay part of the
    /// ticker.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let cleaned = input.trim().to_ascii_uppercase();

        if let Some((base, suffix)) = cleaned.rsplit_once('.') {
            if let Some(market) = Market::from_suffix(suffix) {
                return Self::build(base, market);
            }
        }

        Self::build(&cleaned, Market::Us)
    }

    /// Build a symbol from a ticker and an exchange code (`NYSE`, `TSX`, `NSE`, ...).
    ///
    /// A suffix already present on the ticker is stripped; the exchange code wins.
    pub fn with_exchange(ticker: &str, exchange: &str) -> Result<Self, FetchError> {
        let parsed = Self::parse(ticker)?;
        Self::build(&parsed.ticker, Market::from_exchange(exchange))
    }

    fn build(ticker: &str, market: Market) -> Result<Self, FetchError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(FetchError::InvalidSymbol);
        }
        Ok(Self {
            ticker: Arc::from(ticker),
            market,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn market(&self) -> Market {
        self.market
    }

    /// Yahoo format: `SHOP.TO`, `TCS.NS`, `AAPL`.
    pub fn yahoo(&self) -> String {
        format!("{}{}", self.ticker, self.market.yahoo_suffix())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.market {
            Market::Us => write!(f, "{}", self.ticker),
            market => write!(f, "{} ({})", self.ticker, market.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_ticker() {
        let symbol = Symbol::parse(" aapl ").unwrap();
        assert_eq!(symbol.ticker(), "AAPL");
        assert_eq!(symbol.market(), Market::Us);
    }

    #[test]
    fn test_parse_yahoo_suffix() {
        let symbol = Symbol::parse("SHOP.TO").unwrap();
        assert_eq!(symbol.ticker(), "SHOP");
        assert_eq!(symbol.market(), Market::Tsx);

        let symbol = Symbol::parse("tcs.ns").unwrap();
        assert_eq!(symbol.ticker(), "TCS");
        assert_eq!(symbol.market(), Market::Nse);
    }

    #[test]
    fn test_unknown_suffix_kept_in_ticker() {
        let symbol = Symbol::parse("BRK.B").unwrap();
        assert_eq!(symbol.ticker(), "BRK.B");
        assert_eq!(symbol.market(), Market::Us);
    }

    #[test]
    fn test_empty_symbol_rejected() {
        assert!(matches!(Symbol::parse("   "), Err(FetchError::InvalidSymbol)));
        assert!(matches!(Symbol::parse(".TO"), Err(FetchError::InvalidSymbol)));
    }

    #[test]
    fn test_with_exchange() {
        let symbol = Symbol::with_exchange("RY", "TSX").unwrap();
        assert_eq!(symbol.market(), Market::Tsx);
        assert_eq!(symbol.yahoo(), "RY.TO");

        let symbol = Symbol::with_exchange("RELIANCE.BO", "NSE").unwrap();
        assert_eq!(symbol.ticker(), "RELIANCE");
        assert_eq!(symbol.market(), Market::Nse);

        let symbol = Symbol::with_exchange("AAPL", "NASDAQ").unwrap();
        assert_eq!(symbol.market(), Market::Us);
        assert_eq!(symbol.yahoo(), "AAPL");
    }

    #[test]
    fn test_display() {
        assert_eq!(Symbol::parse("AAPL").unwrap().to_string(), "AAPL");
        assert_eq!(Symbol::parse("SHOP.TO").unwrap().to_string(), "SHOP (TSX)");
    }
}
