//! Polygon.io provider implementation.
//!
//! Uses the aggregates API: the previous-day bar stands in for a live quote,
//! and daily range aggregates provide history.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{DataCategory, FetchRequest, Field};
use crate::normalizer::{BarKeys, Conversion, FieldRule, Schema, SeriesLayout};
use crate::provider::http::{HttpRequest, HttpTransport};
use crate::provider::{AuthRule, ErrorEnvelope, ProviderAdapter, ProviderSpec, RawOutcome};

pub const PROVIDER_ID: &str = "POLYGON";
pub const BASE_URL: &str = "https://api.polygon.io";
pub const AUTH: AuthRule = AuthRule::QueryParam("apiKey");

pub fn path(category: DataCategory) -> Option<&'static str> {
    match category {
        DataCategory::LivePrice => Some("/v2/aggs/ticker/{symbol}/prev"),
        DataCategory::HistoricalSeries => Some("/v2/aggs/ticker/{symbol}/range/1/day/{from}/{to}"),
        _ => None,
    }
}

const PREVIOUS_DAY: &[FieldRule] = &[
    FieldRule::new("/results/0/c", Field::Price, Conversion::PositiveNumber),
    FieldRule::new("/results/0/o", Field::Open, Conversion::Number),
    FieldRule::new("/results/0/h", Field::High, Conversion::Number),
    FieldRule::new("/results/0/l", Field::Low, Conversion::Number),
    FieldRule::new("/results/0/v", Field::Volume, Conversion::Number),
    FieldRule::new("/results/0/t", Field::QuoteTime, Conversion::UnixMillis),
];

const DAILY_BARS: SeriesLayout = SeriesLayout::Rows {
    rows: "/results",
    timestamp: "/t",
    time: Conversion::UnixMillis,
    keys: BarKeys {
        open: "/o",
        high: "/h",
        low: "/l",
        close: "/c",
        volume: "/v",
    },
};

#[derive(Debug, Deserialize)]
struct PolygonEnvelope {
    status: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

/// `{"status": "ERROR" | "NOT_AUTHORIZED", "error"/"message": "..."}`
fn detect_envelope(body: &Value) -> Option<ErrorEnvelope> {
    let envelope = PolygonEnvelope::deserialize(body).ok()?;
    let code = match envelope.status.as_deref() {
        Some("ERROR") => None,
        Some("NOT_AUTHORIZED") => Some(403),
        _ => return None,
    };
    let message = envelope
        .error
        .or(envelope.message)
        .unwrap_or_else(|| "request failed".to_string());
    Some(ErrorEnvelope::new(message).with_code(code))
}

/// Polygon.io adapter.
pub struct PolygonAdapter {
    http: HttpTransport,
}

impl PolygonAdapter {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderAdapter for PolygonAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn schema(&self, category: DataCategory) -> Option<Schema> {
        match category {
            DataCategory::LivePrice => Some(Schema::Fields(PREVIOUS_DAY)),
            DataCategory::HistoricalSeries => Some(Schema::Series(DAILY_BARS)),
            _ => None,
        }
    }

    async fn call(&self, request: &FetchRequest, spec: &ProviderSpec) -> RawOutcome {
        let symbol = self.format_symbol(&request.symbol);
        debug!("Fetching {} for {} from Polygon", request.category, symbol);

        let now = Utc::now();
        let from = request.period.start(now).format("%Y-%m-%d").to_string();
        let to = now.format("%Y-%m-%d").to_string();

        let url = spec.url(&[("symbol", symbol.as_str()), ("from", from.as_str()), ("to", to.as_str())]);
        let mut http_request = HttpRequest::get(url).query("adjusted", "true");
        if request.category == DataCategory::HistoricalSeries {
            http_request = http_request.query("sort", "asc").query("limit", "50000");
        }

        self.http.send(spec, http_request, detect_envelope).await
    }
}
