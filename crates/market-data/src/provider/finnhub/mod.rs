//! Finnhub market data provider implementation.
//!
//! - Live price via `/quote`
//! - Daily bars via `/stock/candle`
//! - Fundamentals via `/stock/metric`
//! - Company news via `/company-news` (unscored; headlines get keyword scores)
//!
//! Finnhub reports an unknown symbol as an all-zero quote, so price fields use
//! [`Conversion::PositiveNumber`]. Metric ratios are percentages and market
//! cap is in millions.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{DataCategory, FetchRequest, Field, Market, Symbol};
use crate::normalizer::{BarKeys, Conversion, FieldRule, NewsLayout, Schema, SeriesLayout};
use crate::provider::http::{HttpRequest, HttpTransport};
use crate::provider::{AuthRule, ErrorEnvelope, ProviderAdapter, ProviderSpec, RawOutcome};

pub const PROVIDER_ID: &str = "FINNHUB";
pub const BASE_URL: &str = "https://finnhub.io/api/v1";
pub const AUTH: AuthRule = AuthRule::Header("X-Finnhub-Token");

pub fn path(category: DataCategory) -> Option<&'static str> {
    Some(match category {
        DataCategory::LivePrice => "/quote",
        DataCategory::HistoricalSeries => "/stock/candle",
        DataCategory::Statistics => "/stock/metric",
        DataCategory::NewsSentiment => "/company-news",
    })
}

const QUOTE: &[FieldRule] = &[
    FieldRule::new("/c", Field::Price, Conversion::PositiveNumber),
    FieldRule::new("/o", Field::Open, Conversion::PositiveNumber),
    FieldRule::new("/h", Field::High, Conversion::PositiveNumber),
    FieldRule::new("/l", Field::Low, Conversion::PositiveNumber),
    FieldRule::new("/pc", Field::PreviousClose, Conversion::PositiveNumber),
    FieldRule::new("/d", Field::Change, Conversion::Number),
    FieldRule::new("/dp", Field::ChangePercent, Conversion::Number),
    FieldRule::new("/t", Field::QuoteTime, Conversion::UnixSeconds),
];

const METRICS: &[FieldRule] = &[
    FieldRule::new("/metric/marketCapitalization", Field::MarketCap, Conversion::Millions),
    FieldRule::new("/metric/enterpriseValue", Field::EnterpriseValue, Conversion::Millions),
    FieldRule::new("/metric/peTTM", Field::TrailingPe, Conversion::Number),
    FieldRule::new("/metric/peBasicExclExtraTTM", Field::TrailingPe, Conversion::Number),
    FieldRule::new("/metric/pbQuarterly", Field::PriceToBook, Conversion::Number),
    FieldRule::new("/metric/psTTM", Field::PriceToSales, Conversion::Number),
    FieldRule::new("/metric/beta", Field::Beta, Conversion::Number),
    FieldRule::new("/metric/dividendYieldIndicatedAnnual", Field::DividendYield, Conversion::PercentToFraction),
    FieldRule::new("/metric/dividendPerShareAnnual", Field::DividendRate, Conversion::Number),
    FieldRule::new("/metric/payoutRatioTTM", Field::PayoutRatio, Conversion::PercentToFraction),
    FieldRule::new("/metric/netProfitMarginTTM", Field::ProfitMargin, Conversion::PercentToFraction),
    FieldRule::new("/metric/operatingMarginTTM", Field::OperatingMargin, Conversion::PercentToFraction),
    FieldRule::new("/metric/roaTTM", Field::ReturnOnAssets, Conversion::PercentToFraction),
    FieldRule::new("/metric/roeTTM", Field::ReturnOnEquity, Conversion::PercentToFraction),
    FieldRule::new("/metric/revenuePerShareTTM", Field::RevenuePerShare, Conversion::Number),
    FieldRule::new("/metric/epsTTM", Field::TrailingEps, Conversion::Number),
    FieldRule::new("/metric/bookValuePerShareQuarterly", Field::BookValue, Conversion::Number),
    FieldRule::new("/metric/totalDebt~1totalEquityQuarterly", Field::DebtToEquity, Conversion::Number),
    FieldRule::new("/metric/currentRatioQuarterly", Field::CurrentRatio, Conversion::Number),
    FieldRule::new("/metric/quickRatioQuarterly", Field::QuickRatio, Conversion::Number),
    FieldRule::new("/metric/52WeekHigh", Field::FiftyTwoWeekHigh, Conversion::Number),
    FieldRule::new("/metric/52WeekLow", Field::FiftyTwoWeekLow, Conversion::Number),
    FieldRule::new("/metric/3MonthAverageTradingVolume", Field::AverageVolume, Conversion::Millions),
];

const DAILY_BARS: SeriesLayout = SeriesLayout::Columns {
    timestamps: "/t",
    time: Conversion::UnixSeconds,
    columns: BarKeys {
        open: "/o",
        high: "/h",
        low: "/l",
        close: "/c",
        volume: "/v",
    },
};

const NEWS: NewsLayout = NewsLayout {
    rows: "",
    title: "/headline",
    summary: Some("/summary"),
    url: Some("/url"),
    source: Some("/source"),
    published: "/datetime",
    published_time: Conversion::UnixSeconds,
    score: None,
};

#[derive(Debug, Deserialize)]
struct FinnhubEnvelope {
    error: Option<String>,
}

/// `{"error": "..."}`
fn detect_envelope(body: &Value) -> Option<ErrorEnvelope> {
    FinnhubEnvelope::deserialize(body)
        .ok()?
        .error
        .map(ErrorEnvelope::new)
}

/// Finnhub adapter.
pub struct FinnhubAdapter {
    http: HttpTransport,
}

impl FinnhubAdapter {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderAdapter for FinnhubAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn schema(&self, category: DataCategory) -> Option<Schema> {
        Some(match category {
            DataCategory::LivePrice => Schema::Fields(QUOTE),
            DataCategory::HistoricalSeries => Schema::Series(DAILY_BARS),
            DataCategory::Statistics => Schema::Fields(METRICS),
            DataCategory::NewsSentiment => Schema::News(NEWS),
        })
    }

    /// `TICKER:CA` for Toronto, `TICKER:IN` for Indian exchanges.
    fn format_symbol(&self, symbol: &Symbol) -> String {
        match symbol.market() {
            Market::Tsx => format!("{}:CA", symbol.ticker()),
            Market::Nse | Market::Bse => format!("{}:IN", symbol.ticker()),
            Market::Us | Market::TsxVenture => symbol.ticker().to_string(),
        }
    }

    async fn call(&self, request: &FetchRequest, spec: &ProviderSpec) -> RawOutcome {
        let symbol = self.format_symbol(&request.symbol);
        debug!("Fetching {} for {} from Finnhub", request.category, symbol);

        let now = Utc::now();
        let start = request.period.start(now);

        let http_request = HttpRequest::get(spec.url(&[])).query("symbol", symbol);
        let http_request = match request.category {
            DataCategory::LivePrice => http_request,
            DataCategory::HistoricalSeries => http_request
                .query("resolution", "D")
                .query("from", start.timestamp().to_string())
                .query("to", now.timestamp().to_string()),
            DataCategory::Statistics => http_request.query("metric", "all"),
            DataCategory::NewsSentiment => http_request
                .query("from", start.format("%Y-%m-%d").to_string())
                .query("to", now.format("%Y-%m-%d").to_string()),
        };

        self.http.send(spec, http_request, detect_envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentSource;
    use crate::normalizer::{normalize_sample, NormalizeError};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;

    fn adapter() -> FinnhubAdapter {
        FinnhubAdapter::new(HttpTransport::new(Duration::from_secs(1)))
    }

    #[test]
    fn test_symbol_format() {
        let adapter = adapter();
        assert_eq!(adapter.format_symbol(&Symbol::parse("SHOP.TO").unwrap()), "SHOP:CA");
        assert_eq!(adapter.format_symbol(&Symbol::parse("TCS.NS").unwrap()), "TCS:IN");
        assert_eq!(adapter.format_symbol(&Symbol::parse("AAPL").unwrap()), "AAPL");
    }

    #[test]
    fn test_detect_envelope() {
        let body = json!({"error": "You don't have access to this resource."});
        assert!(detect_envelope(&body).is_some());
        assert!(detect_envelope(&json!({"c": 1.0})).is_none());
        assert!(detect_envelope(&json!([{"headline": "x"}])).is_none());
    }

    #[test]
    fn test_quote_schema() {
        let body = json!({"c": 185.64, "d": 1.46, "dp": 0.7927, "h": 186.4, "l": 183.92, "o": 184.35, "pc": 184.18, "t": 1704402000});
        let record = normalize_sample(&adapter(), DataCategory::LivePrice, body).unwrap();
        assert_eq!(record.number(Field::Price), Some(dec!(185.64)));
        assert_eq!(record.number(Field::ChangePercent), Some(dec!(0.7927)));
        assert_eq!(record.number(Field::Change), Some(dec!(1.46)));
    }

    #[test]
    fn test_unknown_symbol_quote_is_empty() {
        let body = json!({"c": 0, "d": null, "dp": null, "h": 0, "l": 0, "o": 0, "pc": 0, "t": 0});
        let result = normalize_sample(&adapter(), DataCategory::LivePrice, body);
        assert_eq!(result, Err(NormalizeError::NoUsableFields { dropped: 6 }));
    }

    #[test]
    fn test_metric_schema_converts_units() {
        let body = json!({"symbol": "AAPL", "metricType": "all", "metric": {
            "marketCapitalization": 2846000.5,
            "netProfitMarginTTM": 25.31,
            "totalDebt/totalEquityQuarterly": 1.458,
            "peTTM": 29.4,
            "52WeekHigh": 199.62
        }});

        let record = normalize_sample(&adapter(), DataCategory::Statistics, body).unwrap();
        assert_eq!(record.number(Field::MarketCap), Some(dec!(2846000500000)));
        assert_eq!(record.number(Field::ProfitMargin), Some(dec!(0.2531)));
        assert_eq!(record.number(Field::DebtToEquity), Some(dec!(1.458)));
        assert_eq!(record.number(Field::TrailingPe), Some(dec!(29.4)));
    }

    #[test]
    fn test_candle_no_data() {
        let result = normalize_sample(
            &adapter(),
            DataCategory::HistoricalSeries,
            json!({"s": "no_data"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_company_news_scored_by_lexicon() {
        let body = json!([
            {"category": "company", "datetime": 1704402000, "headline": "Apple shares rally on upgrade",
             "id": 1, "source": "Yahoo", "summary": "", "url": "https://example.com/1"}
        ]);

        let record = normalize_sample(&adapter(), DataCategory::NewsSentiment, body).unwrap();
        assert_eq!(record.headlines().len(), 1);
        assert_eq!(record.headlines()[0].scored_by, SentimentSource::Lexicon);
        assert_eq!(record.text(Field::SentimentLabel), Some("positive"));
    }
}
