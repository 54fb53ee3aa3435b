//! IEX Cloud provider implementation.
//!
//! Only live quotes are served, via `/stock/{symbol}/quote`. IEX reports
//! failures through the HTTP status with a plain-text body.

use async_trait::async_trait;
use tracing::debug;

use crate::models::{DataCategory, FetchRequest, Field};
use crate::normalizer::{Conversion, FieldRule, Schema};
use crate::provider::http::{no_envelope, HttpRequest, HttpTransport};
use crate::provider::{AuthRule, ProviderAdapter, ProviderSpec, RawOutcome};

pub const PROVIDER_ID: &str = "IEX_CLOUD";
pub const BASE_URL: &str = "https://cloud.iexapis.com/stable";
pub const AUTH: AuthRule = AuthRule::QueryParam("token");

pub fn path(category: DataCategory) -> Option<&'static str> {
    match category {
        DataCategory::LivePrice => Some("/stock/{symbol}/quote"),
        _ => None,
    }
}

const QUOTE: &[FieldRule] = &[
    FieldRule::new("/latestPrice", Field::Price, Conversion::PositiveNumber),
    FieldRule::new("/open", Field::Open, Conversion::Number),
    FieldRule::new("/high", Field::High, Conversion::Number),
    FieldRule::new("/low", Field::Low, Conversion::Number),
    FieldRule::new("/volume", Field::Volume, Conversion::Number),
    FieldRule::new("/latestVolume", Field::Volume, Conversion::Number),
    FieldRule::new("/previousClose", Field::PreviousClose, Conversion::Number),
    FieldRule::new("/change", Field::Change, Conversion::Number),
    FieldRule::new("/changePercent", Field::ChangePercent, Conversion::FractionToPercent),
    FieldRule::new("/latestUpdate", Field::QuoteTime, Conversion::UnixMillis),
    FieldRule::new("/currency", Field::Currency, Conversion::Text),
    FieldRule::new("/week52High", Field::FiftyTwoWeekHigh, Conversion::Number),
    FieldRule::new("/week52Low", Field::FiftyTwoWeekLow, Conversion::Number),
    FieldRule::new("/avgTotalVolume", Field::AverageVolume, Conversion::Number),
];

/// IEX Cloud adapter.
pub struct IexCloudAdapter {
    http: HttpTransport,
}

impl IexCloudAdapter {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderAdapter for IexCloudAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn schema(&self, category: DataCategory) -> Option<Schema> {
        match category {
            DataCategory::LivePrice => Some(Schema::Fields(QUOTE)),
            _ => None,
        }
    }

    async fn call(&self, request: &FetchRequest, spec: &ProviderSpec) -> RawOutcome {
        let symbol = self.format_symbol(&request.symbol);
        debug!("Fetching {} for {} from IEX Cloud", request.category, symbol);

        let http_request = HttpRequest::get(spec.url(&[("symbol", symbol.as_str())]));
        self.http.send(spec, http_request, no_envelope).await
    }
}
