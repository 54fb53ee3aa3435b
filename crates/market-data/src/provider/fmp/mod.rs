//! Financial Modeling Prep provider implementation.
//!
//! - Live price via `/api/v3/quote/{symbol}` (one-element array)
//! - Daily bars via `/api/v3/historical-price-full/{symbol}`
//! - Fundamentals via `/api/v3/key-metrics-ttm/{symbol}`

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{DataCategory, FetchRequest, Field};
use crate::normalizer::{BarKeys, Conversion, FieldRule, Schema, SeriesLayout};
use crate::provider::http::{HttpRequest, HttpTransport};
use crate::provider::{AuthRule, ErrorEnvelope, ProviderAdapter, ProviderSpec, RawOutcome};

pub const PROVIDER_ID: &str = "FMP";
pub const BASE_URL: &str = "https://financialmodelingprep.com";
pub const AUTH: AuthRule = AuthRule::QueryParam("apikey");

pub fn path(category: DataCategory) -> Option<&'static str> {
    match category {
        DataCategory::LivePrice => Some("/api/v3/quote/{symbol}"),
        DataCategory::HistoricalSeries => Some("/api/v3/historical-price-full/{symbol}"),
        DataCategory::Statistics => Some("/api/v3/key-metrics-ttm/{symbol}"),
        DataCategory::NewsSentiment => None,
    }
}

const QUOTE: &[FieldRule] = &[
    FieldRule::new("/0/price", Field::Price, Conversion::PositiveNumber),
    FieldRule::new("/0/open", Field::Open, Conversion::Number),
    FieldRule::new("/0/dayHigh", Field::High, Conversion::Number),
    FieldRule::new("/0/dayLow", Field::Low, Conversion::Number),
    FieldRule::new("/0/volume", Field::Volume, Conversion::Number),
    FieldRule::new("/0/previousClose", Field::PreviousClose, Conversion::Number),
    FieldRule::new("/0/change", Field::Change, Conversion::Number),
    FieldRule::new("/0/changesPercentage", Field::ChangePercent, Conversion::Number),
    FieldRule::new("/0/timestamp", Field::QuoteTime, Conversion::UnixSeconds),
    FieldRule::new("/0/yearHigh", Field::FiftyTwoWeekHigh, Conversion::Number),
    FieldRule::new("/0/yearLow", Field::FiftyTwoWeekLow, Conversion::Number),
    FieldRule::new("/0/priceAvg50", Field::FiftyDayAverage, Conversion::Number),
    FieldRule::new("/0/priceAvg200", Field::TwoHundredDayAverage, Conversion::Number),
    FieldRule::new("/0/avgVolume", Field::AverageVolume, Conversion::Number),
];

const KEY_METRICS: &[FieldRule] = &[
    FieldRule::new("/0/marketCapTTM", Field::MarketCap, Conversion::Number),
    FieldRule::new("/0/enterpriseValueTTM", Field::EnterpriseValue, Conversion::Number),
    FieldRule::new("/0/peRatioTTM", Field::TrailingPe, Conversion::Number),
    FieldRule::new("/0/pbRatioTTM", Field::PriceToBook, Conversion::Number),
    FieldRule::new("/0/priceToSalesRatioTTM", Field::PriceToSales, Conversion::Number),
    FieldRule::new("/0/pegRatioTTM", Field::PegRatio, Conversion::Number),
    FieldRule::new("/0/dividendYieldTTM", Field::DividendYield, Conversion::Number),
    FieldRule::new("/0/dividendPerShareTTM", Field::DividendRate, Conversion::Number),
    FieldRule::new("/0/payoutRatioTTM", Field::PayoutRatio, Conversion::Number),
    FieldRule::new("/0/roeTTM", Field::ReturnOnEquity, Conversion::Number),
    FieldRule::new("/0/returnOnTangibleAssetsTTM", Field::ReturnOnAssets, Conversion::Number),
    FieldRule::new("/0/revenuePerShareTTM", Field::RevenuePerShare, Conversion::Number),
    FieldRule::new("/0/netIncomePerShareTTM", Field::TrailingEps, Conversion::Number),
    FieldRule::new("/0/bookValuePerShareTTM", Field::BookValue, Conversion::Number),
    FieldRule::new("/0/debtToEquityTTM", Field::DebtToEquity, Conversion::Number),
    FieldRule::new("/0/currentRatioTTM", Field::CurrentRatio, Conversion::Number),
];

const DAILY_BARS: SeriesLayout = SeriesLayout::Rows {
    rows: "/historical",
    timestamp: "/date",
    time: Conversion::Date,
    keys: BarKeys {
        open: "/open",
        high: "/high",
        low: "/low",
        close: "/close",
        volume: "/volume",
    },
};

#[derive(Debug, Deserialize)]
struct FmpEnvelope {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

/// `{"Error Message": "..."}`
fn detect_envelope(body: &Value) -> Option<ErrorEnvelope> {
    if !body.is_object() {
        return None;
    }
    FmpEnvelope::deserialize(body)
        .ok()?
        .error_message
        .map(ErrorEnvelope::new)
}

/// Financial Modeling Prep adapter.
pub struct FmpAdapter {
    http: HttpTransport,
}

impl FmpAdapter {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderAdapter for FmpAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn schema(&self, category: DataCategory) -> Option<Schema> {
        match category {
            DataCategory::LivePrice => Some(Schema::Fields(QUOTE)),
            DataCategory::HistoricalSeries => Some(Schema::Series(DAILY_BARS)),
            DataCategory::Statistics => Some(Schema::Fields(KEY_METRICS)),
            DataCategory::NewsSentiment => None,
        }
    }

    async fn call(&self, request: &FetchRequest, spec: &ProviderSpec) -> RawOutcome {
        let symbol = self.format_symbol(&request.symbol);
        debug!("Fetching {} for {} from FMP", request.category, symbol);

        let mut http_request = HttpRequest::get(spec.url(&[("symbol", symbol.as_str())]));
        if request.category == DataCategory::HistoricalSeries {
            let now = Utc::now();
            http_request = http_request
                .query("from", request.period.start(now).format("%Y-%m-%d").to_string())
                .query("to", now.format("%Y-%m-%d").to_string());
        }

        self.http.send(spec, http_request, detect_envelope).await
    }
}
