use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::DataCategory;
use super::symbol::Symbol;
use super::types::ProviderId;

/// Canonical field names shared by every provider.
///
/// Units are canonical too: ratios (margins, returns, yields, payout) are
/// fractions in 0..1, `ChangePercent` is in percentage points, market cap is
/// in currency units, and timestamps are UTC.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // Live price
    Price,
    Open,
    High,
    Low,
    Volume,
    PreviousClose,
    Change,
    ChangePercent,
    Currency,
    QuoteTime,

    // Statistics
    MarketCap,
    EnterpriseValue,
    TrailingPe,
    ForwardPe,
    PriceToBook,
    PriceToSales,
    PegRatio,
    Beta,
    DividendYield,
    DividendRate,
    PayoutRatio,
    ProfitMargin,
    OperatingMargin,
    ReturnOnAssets,
    ReturnOnEquity,
    RevenuePerShare,
    TrailingEps,
    BookValue,
    SharesOutstanding,
    DebtToEquity,
    CurrentRatio,
    QuickRatio,
    FiftyTwoWeekHigh,
    FiftyTwoWeekLow,
    FiftyDayAverage,
    TwoHundredDayAverage,
    AverageVolume,

    // Historical series
    Bars,

    // News sentiment
    Headlines,
    ArticleCount,
    SentimentScore,
    SentimentLabel,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Volume => "volume",
            Self::PreviousClose => "previous_close",
            Self::Change => "change",
            Self::ChangePercent => "change_percent",
            Self::Currency => "currency",
            Self::QuoteTime => "quote_time",
            Self::MarketCap => "market_cap",
            Self::EnterpriseValue => "enterprise_value",
            Self::TrailingPe => "trailing_pe",
            Self::ForwardPe => "forward_pe",
            Self::PriceToBook => "price_to_book",
            Self::PriceToSales => "price_to_sales",
            Self::PegRatio => "peg_ratio",
            Self::Beta => "beta",
            Self::DividendYield => "dividend_yield",
            Self::DividendRate => "dividend_rate",
            Self::PayoutRatio => "payout_ratio",
            Self::ProfitMargin => "profit_margin",
            Self::OperatingMargin => "operating_margin",
            Self::ReturnOnAssets => "return_on_assets",
            Self::ReturnOnEquity => "return_on_equity",
            Self::RevenuePerShare => "revenue_per_share",
            Self::TrailingEps => "trailing_eps",
            Self::BookValue => "book_value",
            Self::SharesOutstanding => "shares_outstanding",
            Self::DebtToEquity => "debt_to_equity",
            Self::CurrentRatio => "current_ratio",
            Self::QuickRatio => "quick_ratio",
            Self::FiftyTwoWeekHigh => "fifty_two_week_high",
            Self::FiftyTwoWeekLow => "fifty_two_week_low",
            Self::FiftyDayAverage => "fifty_day_average",
            Self::TwoHundredDayAverage => "two_hundred_day_average",
            Self::AverageVolume => "average_volume",
            Self::Bars => "bars",
            Self::Headlines => "headlines",
            Self::ArticleCount => "article_count",
            Self::SentimentScore => "sentiment_score",
            Self::SentimentLabel => "sentiment_label",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One daily OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Decimal>,
    pub close: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}

/// Where a headline's sentiment score came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentSource {
    /// Score supplied by the provider.
    Provider,
    /// Score computed from the headline text.
    Lexicon,
}

/// A news article with its sentiment score in -1..1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub sentiment: Decimal,
    pub scored_by: SentimentSource,
}

/// Typed value of a canonical field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Number(Decimal),
    Text(String),
    Timestamp(DateTime<Utc>),
    Bars(Vec<Bar>),
    Headlines(Vec<Headline>),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_bars(&self) -> Option<&[Bar]> {
        match self {
            Self::Bars(bars) => Some(bars),
            _ => None,
        }
    }

    pub fn as_headlines(&self) -> Option<&[Headline]> {
        match self {
            Self::Headlines(headlines) => Some(headlines),
            _ => None,
        }
    }
}

/// Provider response mapped onto canonical fields.
///
/// Fields a provider did not return are absent; consumers must read absence
/// as "unknown", never as zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub category: DataCategory,
    /// Provider that produced the data
    pub provider: ProviderId,
    /// Request symbol, filled in by the orchestrator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    /// When the provider response arrived
    pub retrieved_at: DateTime<Utc>,
    pub fields: BTreeMap<Field, FieldValue>,
    /// Mapped values that could not be parsed and were left out
    pub dropped: u32,
}

impl NormalizedRecord {
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn number(&self, field: Field) -> Option<Decimal> {
        self.get(field).and_then(FieldValue::as_number)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn bars(&self) -> &[Bar] {
        self.get(Field::Bars)
            .and_then(FieldValue::as_bars)
            .unwrap_or(&[])
    }

    pub fn headlines(&self) -> &[Headline] {
        self.get(Field::Headlines)
            .and_then(FieldValue::as_headlines)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Drop bars older than `cutoff`, removing the field if nothing is left.
    ///
    /// Returns the number of bars removed.
    pub fn retain_bars_since(&mut self, cutoff: DateTime<Utc>) -> usize {
        let Some(FieldValue::Bars(bars)) = self.fields.get_mut(&Field::Bars) else {
            return 0;
        };

        let before = bars.len();
        bars.retain(|bar| bar.timestamp >= cutoff);
        let removed = before - bars.len();

        if bars.is_empty() {
            self.fields.remove(&Field::Bars);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::borrow::Cow;

    fn bar(day: u32, close: Decimal) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    fn record_with_bars(bars: Vec<Bar>) -> NormalizedRecord {
        let mut fields = BTreeMap::new();
        fields.insert(Field::Bars, FieldValue::Bars(bars));
        NormalizedRecord {
            category: DataCategory::HistoricalSeries,
            provider: Cow::Borrowed("TEST"),
            symbol: None,
            retrieved_at: Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
            fields,
            dropped: 0,
        }
    }

    #[test]
    fn test_retain_bars_since() {
        let mut record = record_with_bars(vec![bar(2, dec!(1)), bar(10, dec!(2)), bar(20, dec!(3))]);
        let cutoff = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();

        assert_eq!(record.retain_bars_since(cutoff), 1);
        assert_eq!(record.bars().len(), 2);
        assert_eq!(record.bars()[0].close, dec!(2));
    }

    #[test]
    fn test_retain_bars_removes_empty_field() {
        let mut record = record_with_bars(vec![bar(2, dec!(1))]);
        let cutoff = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();

        assert_eq!(record.retain_bars_since(cutoff), 1);
        assert!(record.is_empty());
        assert!(record.bars().is_empty());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(Field::PreviousClose.as_str(), "previous_close");
        assert_eq!(Field::FiftyTwoWeekHigh.to_string(), "fifty_two_week_high");
        assert_eq!(
            serde_json::to_string(&Field::TwoHundredDayAverage).unwrap(),
            "\"two_hundred_day_average\""
        );
    }

    #[test]
    fn test_typed_accessors() {
        let mut fields = BTreeMap::new();
        fields.insert(Field::Price, FieldValue::Number(dec!(150.2)));
        fields.insert(Field::Currency, FieldValue::Text("USD".to_string()));
        let record = NormalizedRecord {
            category: DataCategory::LivePrice,
            provider: Cow::Borrowed("TEST"),
            symbol: None,
            retrieved_at: Utc::now(),
            fields,
            dropped: 0,
        };

        assert_eq!(record.number(Field::Price), Some(dec!(150.2)));
        assert_eq!(record.text(Field::Currency), Some("USD"));
        assert_eq!(record.number(Field::Currency), None);
        assert_eq!(record.number(Field::Volume), None);
        assert_eq!(record.len(), 2);
    }
}
