//! Yahoo Finance provider implementation.
//!
//! Uses the public v8 chart endpoint, which needs no key:
//! - Live price from the chart `meta` block
//! - Daily bars from the chart `indicators` arrays
//!
//! Statistics and news are not served here; the quoteSummary endpoints
//! require a crumb/cookie handshake.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{DataCategory, FetchRequest, Field, Symbol};
use crate::normalizer::{BarKeys, Conversion, FieldRule, Schema, SeriesLayout};
use crate::provider::http::{HttpRequest, HttpTransport};
use crate::provider::{AuthRule, ErrorEnvelope, ProviderAdapter, ProviderSpec, RawOutcome};

pub const PROVIDER_ID: &str = "YAHOO";
pub const BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const AUTH: AuthRule = AuthRule::None;

const CHART_PATH: &str = "/v8/finance/chart/{symbol}";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Endpoint path template for `category`.
pub fn path(category: DataCategory) -> Option<&'static str> {
    match category {
        DataCategory::LivePrice | DataCategory::HistoricalSeries => Some(CHART_PATH),
        _ => None,
    }
}

const LIVE_PRICE: &[FieldRule] = &[
    FieldRule::new("/chart/result/0/meta/regularMarketPrice", Field::Price, Conversion::PositiveNumber),
    FieldRule::new("/chart/result/0/indicators/quote/0/open/0", Field::Open, Conversion::Number),
    FieldRule::new("/chart/result/0/meta/regularMarketDayHigh", Field::High, Conversion::Number),
    FieldRule::new("/chart/result/0/meta/regularMarketDayLow", Field::Low, Conversion::Number),
    FieldRule::new("/chart/result/0/meta/regularMarketVolume", Field::Volume, Conversion::Number),
    FieldRule::new("/chart/result/0/meta/previousClose", Field::PreviousClose, Conversion::Number),
    FieldRule::new("/chart/result/0/meta/chartPreviousClose", Field::PreviousClose, Conversion::Number),
    FieldRule::new("/chart/result/0/meta/currency", Field::Currency, Conversion::Text),
    FieldRule::new("/chart/result/0/meta/regularMarketTime", Field::QuoteTime, Conversion::UnixSeconds),
    FieldRule::new("/chart/result/0/meta/fiftyTwoWeekHigh", Field::FiftyTwoWeekHigh, Conversion::Number),
    FieldRule::new("/chart/result/0/meta/fiftyTwoWeekLow", Field::FiftyTwoWeekLow, Conversion::Number),
];

const DAILY_BARS: SeriesLayout = SeriesLayout::Columns {
    timestamps: "/chart/result/0/timestamp",
    time: Conversion::UnixSeconds,
    columns: BarKeys {
        open: "/chart/result/0/indicators/quote/0/open",
        high: "/chart/result/0/indicators/quote/0/high",
        low: "/chart/result/0/indicators/quote/0/low",
        close: "/chart/result/0/indicators/quote/0/close",
        volume: "/chart/result/0/indicators/quote/0/volume",
    },
};

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

/// `{"chart": {"result": null, "error": {"code": "Not Found", ...}}}`
fn detect_envelope(body: &Value) -> Option<ErrorEnvelope> {
    let error = ChartEnvelope::deserialize(body).ok()?.chart?.error?;
    let message = error
        .description
        .or(error.code)
        .unwrap_or_else(|| "chart error".to_string());
    Some(ErrorEnvelope::new(message))
}

/// Yahoo Finance adapter.
pub struct YahooAdapter {
    http: HttpTransport,
}

impl YahooAdapter {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderAdapter for YahooAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn schema(&self, category: DataCategory) -> Option<Schema> {
        match category {
            DataCategory::LivePrice => Some(Schema::Fields(LIVE_PRICE)),
            DataCategory::HistoricalSeries => Some(Schema::Series(DAILY_BARS)),
            _ => None,
        }
    }

    fn format_symbol(&self, symbol: &Symbol) -> String {
        symbol.yahoo()
    }

    async fn call(&self, request: &FetchRequest, spec: &ProviderSpec) -> RawOutcome {
        let symbol = self.format_symbol(&request.symbol);
        let range = match request.category {
            DataCategory::HistoricalSeries => request.period.yahoo_range(),
            _ => "1d",
        };
        debug!("Fetching {} for {} from Yahoo (range {})", request.category, symbol, range);

        let http_request = HttpRequest::get(spec.url(&[("symbol", symbol.as_str())]))
            .query("interval", "1d")
            .query("range", range)
            .header("User-Agent", USER_AGENT);

        self.http.send(spec, http_request, detect_envelope).await
    }
}
