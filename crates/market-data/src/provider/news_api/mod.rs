//! NewsAPI provider implementation.
//!
//! Searches `/v2/everything` for articles mentioning the ticker. Articles carry
//! no sentiment, so every headline is scored by the keyword lexicon.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{DataCategory, FetchRequest};
use crate::normalizer::{Conversion, NewsLayout, Schema};
use crate::provider::http::{HttpRequest, HttpTransport};
use crate::provider::{AuthRule, ErrorEnvelope, ProviderAdapter, ProviderSpec, RawOutcome};

pub const PROVIDER_ID: &str = "NEWS_API";
pub const BASE_URL: &str = "https://newsapi.org";
pub const AUTH: AuthRule = AuthRule::QueryParam("apiKey");

const PAGE_SIZE: &str = "50";

pub fn path(category: DataCategory) -> Option<&'static str> {
    match category {
        DataCategory::NewsSentiment => Some("/v2/everything"),
        _ => None,
    }
}

const ARTICLES: NewsLayout = NewsLayout {
    rows: "/articles",
    title: "/title",
    summary: Some("/description"),
    url: Some("/url"),
    source: Some("/source/name"),
    published: "/publishedAt",
    published_time: Conversion::DateTime,
    score: None,
};

#[derive(Debug, Deserialize)]
struct NewsApiEnvelope {
    status: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

/// `{"status": "error", "code": "rateLimited", "message": "..."}`
fn detect_envelope(body: &Value) -> Option<ErrorEnvelope> {
    let envelope = NewsApiEnvelope::deserialize(body).ok()?;
    if envelope.status.as_deref() != Some("error") {
        return None;
    }
    let message = match (envelope.code, envelope.message) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code,
        (None, Some(message)) => message,
        (None, None) => "unknown error".to_string(),
    };
    Some(ErrorEnvelope::new(message))
}

/// NewsAPI adapter.
pub struct NewsApiAdapter {
    http: HttpTransport,
}

impl NewsApiAdapter {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProviderAdapter for NewsApiAdapter {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn schema(&self, category: DataCategory) -> Option<Schema> {
        match category {
            DataCategory::NewsSentiment => Some(Schema::News(ARTICLES)),
            _ => None,
        }
    }

    async fn call(&self, request: &FetchRequest, spec: &ProviderSpec) -> RawOutcome {
        let ticker = self.format_symbol(&request.symbol);
        debug!("Fetching news for {} from NewsAPI", ticker);

        let now = Utc::now();
        let http_request = HttpRequest::get(spec.url(&[]))
            .query("q", format!("{} stock OR {} shares", ticker, ticker))
            .query("from", request.period.start(now).format("%Y-%m-%d").to_string())
            .query("to", now.format("%Y-%m-%d").to_string())
            .query("language", "en")
            .query("sortBy", "publishedAt")
            .query("pageSize", PAGE_SIZE);

        self.http.send(spec, http_request, detect_envelope).await
    }
}
