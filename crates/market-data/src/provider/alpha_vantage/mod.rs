//! Alpha Vantage market data provider implementation.
//!
//! This module provides market data from the Alpha Vantage query API:
//! - Live price via GLOBAL_QUOTE
//! - Daily bars via TIME_SERIES_DAILY
//! - Fundamentals via OVERVIEW
//! - Scored news via NEWS_SENTIMENT
//!
//! Note: Alpha Vantage answers throttled or rejected calls with HTTP 200 and a
//! `Note` / `Information` / `Error Message` object instead of data.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{DataCategory, FetchRequest, Field, Market, Symbol};
use crate::normalizer::{BarKeys, Conversion, FieldRule, NewsLayout, Schema, SeriesLayout};
use crate::provider::http::{HttpRequest, HttpTransport};
use crate::provider::{AuthRule, ErrorEnvelope, ProviderAdapter, ProviderSpec, RawOutcome};

pub const PROVIDER_ID: &str = "ALPHA_VANTAGE";
pub const BASE_URL: &str = "https://www.alphavantage.co";
pub const AUTH: AuthRule = AuthRule::QueryParam("apikey");

/// Largest window served by `outputsize=compact`.
const COMPACT_LIMIT: usize = 100;

/// Articles requested per news call.
const NEWS_LIMIT: &str = "50";

/// `time_from` format for NEWS_SENTIMENT.
const NEWS_TIME_FORMAT: &str = "%Y%m%dT%H%M";

/// Every function goes through the same query endpoint.
pub fn path(_category: DataCategory) -> Option<&'static str> {
    Some("/query")
}

const GLOBAL_QUOTE: &[FieldRule] = &[
    FieldRule::new("/Global Quote/05. price", Field::Price, Conversion::PositiveNumber),
    FieldRule::new("/Global Quote/02. open", Field::Open, Conversion::Number),
    FieldRule::new("/Global Quote/03. high", Field::High, Conversion::Number),
    FieldRule::new("/Global Quote/04. low", Field::Low, Conversion::Number),
    FieldRule::new("/Global Quote/06. volume", Field::Volume, Conversion::Number),
    FieldRule::new("/Global Quote/08. previous close", Field::PreviousClose, Conversion::Number),
    FieldRule::new("/Global Quote/09. change", Field::Change, Conversion::Number),
    FieldRule::new("/Global Quote/10. change percent", Field::ChangePercent, Conversion::Percent),
    FieldRule::new("/Global Quote/07. latest trading day", Field::QuoteTime, Conversion::Date),
];

const OVERVIEW: &[FieldRule] = &[
    FieldRule::new("/MarketCapitalization", Field::MarketCap, Conversion::Number),
    FieldRule::new("/TrailingPE", Field::TrailingPe, Conversion::Number),
    FieldRule::new("/PERatio", Field::TrailingPe, Conversion::Number),
    FieldRule::new("/ForwardPE", Field::ForwardPe, Conversion::Number),
    FieldRule::new("/PriceToBookRatio", Field::PriceToBook, Conversion::Number),
    FieldRule::new("/PriceToSalesRatioTTM", Field::PriceToSales, Conversion::Number),
    FieldRule::new("/PEGRatio", Field::PegRatio, Conversion::Number),
    FieldRule::new("/Beta", Field::Beta, Conversion::Number),
    FieldRule::new("/DividendYield", Field::DividendYield, Conversion::Number),
    FieldRule::new("/DividendPerShare", Field::DividendRate, Conversion::Number),
    FieldRule::new("/ProfitMargin", Field::ProfitMargin, Conversion::Number),
    FieldRule::new("/OperatingMarginTTM", Field::OperatingMargin, Conversion::Number),
    FieldRule::new("/ReturnOnAssetsTTM", Field::ReturnOnAssets, Conversion::Number),
    FieldRule::new("/ReturnOnEquityTTM", Field::ReturnOnEquity, Conversion::Number),
    FieldRule::new("/RevenuePerShareTTM", Field::RevenuePerShare, Conversion::Number),
    FieldRule::new("/EPS", Field::TrailingEps, Conversion::Number),
    FieldRule::new("/BookValue", Field::BookValue, Conversion::Number),
    FieldRule::new("/SharesOutstanding", Field::SharesOutstanding, Conversion::Number),
    FieldRule::new("/52WeekHigh", Field::FiftyTwoWeekHigh, Conversion::Number),
    FieldRule::new("/52WeekLow", Field::FiftyTwoWeekLow, Conversion::Number),
    FieldRule::new("/50DayMovingAverage", Field::FiftyDayAverage, Conversion::Number),
    FieldRule::new("/200DayMovingAverage", Field::TwoHundredDayAverage, Conversion::Number),
    FieldRule::new("/Currency", Field::Currency, Conversion::Text),
];

const DAILY_BARS: SeriesLayout = SeriesLayout::Keyed {
    map: "/Time Series (Daily)",
    time: Conversion::Date,
    keys: BarKeys {
        open: "/1. open",
        high: "/2. high",
        low: "/3. low",
        close: "/4. close",
        volume: "/5. volume",
    },
};

const NEWS: NewsLayout = NewsLayout {
    rows: "/feed",
    title: "/title",
    summary: Some("/summary"),
    url: Some("/url"),
    source: Some("/source"),
    published: "/time_published",
    published_time: Conversion::CompactDateTime,
    score: Some("/overall_sentiment_score"),
};

/// Error objects Alpha Vantage returns in place of data.
#[derive(Debug, Deserialize)]
struct AlphaVantageEnvelope {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

fn detect_envelope(body: &Value) -> Option<ErrorEnvelope> {
    let envelope = AlphaVantageEnvelope::deserialize(body).ok()?;
    envelope
        .error_message
        .or(envelope.note)
        .or(envelope.information)
        .map(ErrorEnvelope::new)
}

/// Alpha Vantage adapter.
pub struct AlphaVantageAdapter {
    http: HttpTransport,
}

impl AlphaVantageAdapter {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderAdapter for AlphaVantageAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn schema(&self, category: DataCategory) -> Option<Schema> {
        Some(match category {
            DataCategory::LivePrice => Schema::Fields(GLOBAL_QUOTE),
            DataCategory::HistoricalSeries => Schema::Series(DAILY_BARS),
            DataCategory::Statistics => Schema::Fields(OVERVIEW),
            DataCategory::NewsSentiment => Schema::News(NEWS),
        })
    }

    /// Plain ticker for US listings, `TICKER.TSX` / `.NSE` / `.BSE` otherwise.
    fn format_symbol(&self, symbol: &Symbol) -> String {
        match symbol.market() {
            Market::Tsx | Market::Nse | Market::Bse => {
                format!("{}.{}", symbol.ticker(), symbol.market().code())
            }
            Market::Us | Market::TsxVenture => symbol.ticker().to_string(),
        }
    }

    async fn call(&self, request: &FetchRequest, spec: &ProviderSpec) -> RawOutcome {
        let symbol = self.format_symbol(&request.symbol);
        debug!("Fetching {} for {} from Alpha Vantage", request.category, symbol);

        let http_request = HttpRequest::get(spec.url(&[]));
        let http_request = match request.category {
            DataCategory::LivePrice => http_request
                .query("function", "GLOBAL_QUOTE")
                .query("symbol", symbol),
            DataCategory::HistoricalSeries => {
                let output_size = if request.period.trading_days() <= COMPACT_LIMIT {
                    "compact"
                } else {
                    "full"
                };
                http_request
                    .query("function", "TIME_SERIES_DAILY")
                    .query("symbol", symbol)
                    .query("outputsize", output_size)
            }
            DataCategory::Statistics => http_request
                .query("function", "OVERVIEW")
                .query("symbol", symbol),
            DataCategory::NewsSentiment => http_request
                .query("function", "NEWS_SENTIMENT")
                .query("tickers", symbol)
                .query(
                    "time_from",
                    request
                        .period
                        .start(Utc::now())
                        .format(NEWS_TIME_FORMAT)
                        .to_string(),
                )
                .query("limit", NEWS_LIMIT),
        };

        self.http.send(spec, http_request, detect_envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentSource;
    use crate::normalizer::normalize_sample;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;

    fn adapter() -> AlphaVantageAdapter {
        AlphaVantageAdapter::new(HttpTransport::new(Duration::from_secs(1)))
    }

    #[test]
    fn test_symbol_format() {
        let adapter = adapter();
        assert_eq!(adapter.format_symbol(&Symbol::parse("SHOP.TO").unwrap()), "SHOP.TSX");
        assert_eq!(adapter.format_symbol(&Symbol::parse("RELIANCE.BO").unwrap()), "RELIANCE.BSE");
        assert_eq!(adapter.format_symbol(&Symbol::parse("IBM").unwrap()), "IBM");
    }

    #[test]
    fn test_detect_envelope() {
        let note = json!({"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."});
        assert!(detect_envelope(&note).unwrap().message.contains("call frequency"));

        let error = json!({"Error Message": "Invalid API call. Please retry or visit the documentation."});
        assert!(detect_envelope(&error).unwrap().message.starts_with("Invalid API call"));

        let info = json!({"Information": "The **demo** API key is for demo purposes only."});
        assert!(detect_envelope(&info).is_some());

        let data = json!({"Global Quote": {"05. price": "1.0"}});
        assert!(detect_envelope(&data).is_none());
    }

    #[test]
    fn test_global_quote_schema() {
        let body = json!({"Global Quote": {
            "01. symbol": "IBM",
            "02. open": "161.0000",
            "03. high": "162.3800",
            "04. low": "160.1500",
            "05. price": "161.5000",
            "06. volume": "3456789",
            "07. latest trading day": "2024-01-05",
            "08. previous close": "160.0000",
            "09. change": "1.5000",
            "10. change percent": "0.9375%"
        }});

        let record = normalize_sample(&adapter(), DataCategory::LivePrice, body).unwrap();
        assert_eq!(record.number(Field::Price), Some(dec!(161.5)));
        assert_eq!(record.number(Field::ChangePercent), Some(dec!(0.9375)));
        assert_eq!(record.number(Field::Volume), Some(dec!(3456789)));
        assert_eq!(record.dropped, 0);
    }

    #[test]
    fn test_empty_global_quote_has_no_fields() {
        let body = json!({"Global Quote": {}});
        assert!(normalize_sample(&adapter(), DataCategory::LivePrice, body).is_err());
    }

    #[test]
    fn test_overview_schema_keeps_fractions() {
        let body = json!({
            "Symbol": "IBM",
            "MarketCapitalization": "148000000000",
            "PERatio": "22.5",
            "DividendYield": "0.0412",
            "ProfitMargin": "0.127",
            "PEGRatio": "None",
            "52WeekHigh": "166.34",
            "Currency": "USD"
        });

        let record = normalize_sample(&adapter(), DataCategory::Statistics, body).unwrap();
        assert_eq!(record.number(Field::MarketCap), Some(dec!(148000000000)));
        assert_eq!(record.number(Field::TrailingPe), Some(dec!(22.5)));
        assert_eq!(record.number(Field::DividendYield), Some(dec!(0.0412)));
        assert_eq!(record.number(Field::ProfitMargin), Some(dec!(0.127)));
        assert_eq!(record.get(Field::PegRatio), None);
        assert_eq!(record.dropped, 1);
    }

    #[test]
    fn test_daily_series_schema() {
        let body = json!({
            "Meta Data": {"2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-01-05": {"1. open": "160.5", "2. high": "161.9", "3. low": "159.8", "4. close": "161.1", "5. volume": "4000000"},
                "2024-01-04": {"1. open": "159.0", "2. high": "160.9", "3. low": "158.5", "4. close": "160.4", "5. volume": "3500000"}
            }
        });

        let record = normalize_sample(&adapter(), DataCategory::HistoricalSeries, body).unwrap();
        let bars = record.bars();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[1].close, dec!(161.1));
    }

    #[test]
    fn test_news_schema_uses_provider_score() {
        let body = json!({"items": "2", "feed": [
            {"title": "IBM beats estimates", "url": "https://example.com/a",
             "time_published": "20240105T133000", "summary": "Strong quarter.",
             "source": "Reuters", "overall_sentiment_score": 0.31},
            {"title": "IBM flat", "url": "https://example.com/b",
             "time_published": "20240104T090000", "summary": "",
             "source": "Benzinga", "overall_sentiment_score": -0.05}
        ]});

        let record = normalize_sample(&adapter(), DataCategory::NewsSentiment, body).unwrap();
        let headlines = record.headlines();
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].sentiment, dec!(0.31));
        assert_eq!(headlines[0].scored_by, SentimentSource::Provider);
        assert_eq!(headlines[1].summary, None);
        assert_eq!(record.number(Field::SentimentScore), Some(dec!(0.13)));
        assert_eq!(record.text(Field::SentimentLabel), Some("positive"));
    }
}
