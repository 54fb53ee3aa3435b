//! Twelve Data provider implementation.
//!
//! - Live price via `/quote`
//! - Daily bars via `/time_series`
//! - Fundamentals via `/statistics`
//!
//! Errors come back as `{"code": 429, "message": "...", "status": "error"}`,
//! usually with HTTP 200.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{DataCategory, FetchRequest, Field};
use crate::normalizer::{BarKeys, Conversion, FieldRule, Schema, SeriesLayout};
use crate::provider::http::{code_at, HttpRequest, HttpTransport};
use crate::provider::{AuthRule, ErrorEnvelope, ProviderAdapter, ProviderSpec, RawOutcome};

pub const PROVIDER_ID: &str = "TWELVE_DATA";
pub const BASE_URL: &str = "https://api.twelvedata.com";
pub const AUTH: AuthRule = AuthRule::QueryParam("apikey");

pub fn path(category: DataCategory) -> Option<&'static str> {
    match category {
        DataCategory::LivePrice => Some("/quote"),
        DataCategory::HistoricalSeries => Some("/time_series"),
        DataCategory::Statistics => Some("/statistics"),
        DataCategory::NewsSentiment => None,
    }
}

const QUOTE: &[FieldRule] = &[
    FieldRule::new("/close", Field::Price, Conversion::PositiveNumber),
    FieldRule::new("/open", Field::Open, Conversion::Number),
    FieldRule::new("/high", Field::High, Conversion::Number),
    FieldRule::new("/low", Field::Low, Conversion::Number),
    FieldRule::new("/volume", Field::Volume, Conversion::Number),
    FieldRule::new("/previous_close", Field::PreviousClose, Conversion::Number),
    FieldRule::new("/change", Field::Change, Conversion::Number),
    FieldRule::new("/percent_change", Field::ChangePercent, Conversion::Number),
    FieldRule::new("/currency", Field::Currency, Conversion::Text),
    FieldRule::new("/timestamp", Field::QuoteTime, Conversion::UnixSeconds),
    FieldRule::new("/fifty_two_week/high", Field::FiftyTwoWeekHigh, Conversion::Number),
    FieldRule::new("/fifty_two_week/low", Field::FiftyTwoWeekLow, Conversion::Number),
    FieldRule::new("/average_volume", Field::AverageVolume, Conversion::Number),
];

const STATISTICS: &[FieldRule] = &[
    FieldRule::new("/statistics/valuations_metrics/market_capitalization", Field::MarketCap, Conversion::Number),
    FieldRule::new("/statistics/valuations_metrics/enterprise_value", Field::EnterpriseValue, Conversion::Number),
    FieldRule::new("/statistics/valuations_metrics/trailing_pe", Field::TrailingPe, Conversion::Number),
    FieldRule::new("/statistics/valuations_metrics/forward_pe", Field::ForwardPe, Conversion::Number),
    FieldRule::new("/statistics/valuations_metrics/peg_ratio", Field::PegRatio, Conversion::Number),
    FieldRule::new("/statistics/valuations_metrics/price_to_sales_ttm", Field::PriceToSales, Conversion::Number),
    FieldRule::new("/statistics/valuations_metrics/price_to_book_mrq", Field::PriceToBook, Conversion::Number),
    FieldRule::new("/statistics/financials/profit_margin", Field::ProfitMargin, Conversion::Number),
    FieldRule::new("/statistics/financials/operating_margin", Field::OperatingMargin, Conversion::Number),
    FieldRule::new("/statistics/financials/return_on_assets_ttm", Field::ReturnOnAssets, Conversion::Number),
    FieldRule::new("/statistics/financials/return_on_equity_ttm", Field::ReturnOnEquity, Conversion::Number),
    FieldRule::new("/statistics/financials/income_statement/revenue_per_share_ttm", Field::RevenuePerShare, Conversion::Number),
    FieldRule::new("/statistics/financials/income_statement/diluted_eps_ttm", Field::TrailingEps, Conversion::Number),
    FieldRule::new("/statistics/financials/balance_sheet/book_value_per_share_mrq", Field::BookValue, Conversion::Number),
    FieldRule::new("/statistics/financials/balance_sheet/total_debt_to_equity_mrq", Field::DebtToEquity, Conversion::PercentToFraction),
    FieldRule::new("/statistics/financials/balance_sheet/current_ratio_mrq", Field::CurrentRatio, Conversion::Number),
    FieldRule::new("/statistics/stock_statistics/shares_outstanding", Field::SharesOutstanding, Conversion::Number),
    FieldRule::new("/statistics/stock_statistics/avg_90_volume", Field::AverageVolume, Conversion::Number),
    FieldRule::new("/statistics/stock_price_summary/fifty_two_week_high", Field::FiftyTwoWeekHigh, Conversion::Number),
    FieldRule::new("/statistics/stock_price_summary/fifty_two_week_low", Field::FiftyTwoWeekLow, Conversion::Number),
    FieldRule::new("/statistics/stock_price_summary/day_50_ma", Field::FiftyDayAverage, Conversion::Number),
    FieldRule::new("/statistics/stock_price_summary/day_200_ma", Field::TwoHundredDayAverage, Conversion::Number),
    FieldRule::new("/statistics/stock_price_summary/beta", Field::Beta, Conversion::Number),
    FieldRule::new("/statistics/dividends_and_splits/forward_annual_dividend_rate", Field::DividendRate, Conversion::Number),
    FieldRule::new("/statistics/dividends_and_splits/forward_annual_dividend_yield", Field::DividendYield, Conversion::Number),
    FieldRule::new("/statistics/dividends_and_splits/payout_ratio", Field::PayoutRatio, Conversion::Number),
    FieldRule::new("/meta/currency", Field::Currency, Conversion::Text),
];

const DAILY_BARS: SeriesLayout = SeriesLayout::Rows {
    rows: "/values",
    timestamp: "/datetime",
    time: Conversion::DateTime,
    keys: BarKeys {
        open: "/open",
        high: "/high",
        low: "/low",
        close: "/close",
        volume: "/volume",
    },
};

#[derive(Debug, Deserialize)]
struct TwelveDataEnvelope {
    status: Option<String>,
    message: Option<String>,
}

/// `{"status": "error", ...}`; successful payloads carry `"status": "ok"` or
/// no status at all.
fn detect_envelope(body: &Value) -> Option<ErrorEnvelope> {
    let envelope = TwelveDataEnvelope::deserialize(body).ok()?;
    if envelope.status.as_deref() != Some("error") {
        return None;
    }
    let message = envelope
        .message
        .unwrap_or_else(|| "unknown error".to_string());
    Some(ErrorEnvelope::new(message).with_code(code_at(body, "code")))
}

/// Twelve Data adapter.
pub struct TwelveDataAdapter {
    http: HttpTransport,
}

impl TwelveDataAdapter {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderAdapter for TwelveDataAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn schema(&self, category: DataCategory) -> Option<Schema> {
        match category {
            DataCategory::LivePrice => Some(Schema::Fields(QUOTE)),
            DataCategory::HistoricalSeries => Some(Schema::Series(DAILY_BARS)),
            DataCategory::Statistics => Some(Schema::Fields(STATISTICS)),
            DataCategory::NewsSentiment => None,
        }
    }

    async fn call(&self, request: &FetchRequest, spec: &ProviderSpec) -> RawOutcome {
        let symbol = self.format_symbol(&request.symbol);
        debug!("Fetching {} for {} from Twelve Data", request.category, symbol);

        let mut http_request = HttpRequest::get(spec.url(&[])).query("symbol", symbol);
        if request.category == DataCategory::HistoricalSeries {
            http_request = http_request
                .query("interval", "1day")
                .query("outputsize", request.period.trading_days().to_string());
        }

        self.http.send(spec, http_request, detect_envelope).await
    }
}
