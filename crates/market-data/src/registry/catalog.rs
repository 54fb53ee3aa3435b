//! Built-in provider catalog: which upstreams serve which category, and in
//! what order they are tried.

use std::sync::Arc;

use crate::models::DataCategory;
use crate::provider::{
    alpha_vantage, finnhub, fmp, iex_cloud, news_api, polygon, twelve_data, yahoo,
    AlphaVantageAdapter, AuthRule, FinnhubAdapter, FmpAdapter, HttpTransport, IexCloudAdapter,
    NewsApiAdapter, PolygonAdapter, ProviderAdapter, TwelveDataAdapter, YahooAdapter,
};

/// Static facts about one built-in upstream.
#[derive(Clone, Copy, Debug)]
pub struct CatalogEntry {
    pub provider: &'static str,
    pub base_url: &'static str,
    pub auth: AuthRule,
    pub path: fn(DataCategory) -> Option<&'static str>,
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        provider: yahoo::PROVIDER_ID,
        base_url: yahoo::BASE_URL,
        auth: yahoo::AUTH,
        path: yahoo::path,
    },
    CatalogEntry {
        provider: alpha_vantage::PROVIDER_ID,
        base_url: alpha_vantage::BASE_URL,
        auth: alpha_vantage::AUTH,
        path: alpha_vantage::path,
    },
    CatalogEntry {
        provider: twelve_data::PROVIDER_ID,
        base_url: twelve_data::BASE_URL,
        auth: twelve_data::AUTH,
        path: twelve_data::path,
    },
    CatalogEntry {
        provider: finnhub::PROVIDER_ID,
        base_url: finnhub::BASE_URL,
        auth: finnhub::AUTH,
        path: finnhub::path,
    },
    CatalogEntry {
        provider: polygon::PROVIDER_ID,
        base_url: polygon::BASE_URL,
        auth: polygon::AUTH,
        path: polygon::path,
    },
    CatalogEntry {
        provider: fmp::PROVIDER_ID,
        base_url: fmp::BASE_URL,
        auth: fmp::AUTH,
        path: fmp::path,
    },
    CatalogEntry {
        provider: iex_cloud::PROVIDER_ID,
        base_url: iex_cloud::BASE_URL,
        auth: iex_cloud::AUTH,
        path: iex_cloud::path,
    },
    CatalogEntry {
        provider: news_api::PROVIDER_ID,
        base_url: news_api::BASE_URL,
        auth: news_api::AUTH,
        path: news_api::path,
    },
];

/// Default rank order per category; position 0 has rank 1.
pub fn default_ranking(category: DataCategory) -> &'static [&'static str] {
    match category {
        DataCategory::LivePrice => &[
            yahoo::PROVIDER_ID,
            alpha_vantage::PROVIDER_ID,
            twelve_data::PROVIDER_ID,
            finnhub::PROVIDER_ID,
            polygon::PROVIDER_ID,
            fmp::PROVIDER_ID,
            iex_cloud::PROVIDER_ID,
        ],
        DataCategory::HistoricalSeries => &[
            yahoo::PROVIDER_ID,
            alpha_vantage::PROVIDER_ID,
            twelve_data::PROVIDER_ID,
            finnhub::PROVIDER_ID,
            polygon::PROVIDER_ID,
            fmp::PROVIDER_ID,
        ],
        DataCategory::Statistics => &[
            alpha_vantage::PROVIDER_ID,
            fmp::PROVIDER_ID,
            twelve_data::PROVIDER_ID,
            finnhub::PROVIDER_ID,
        ],
        DataCategory::NewsSentiment => &[
            alpha_vantage::PROVIDER_ID,
            news_api::PROVIDER_ID,
            finnhub::PROVIDER_ID,
        ],
    }
}

pub fn entry(provider: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.provider == provider)
}

/// Construct the adapter for a built-in provider.
pub fn adapter(provider: &str, http: &HttpTransport) -> Option<Arc<dyn ProviderAdapter>> {
    let http = http.clone();
    let adapter: Arc<dyn ProviderAdapter> = match provider {
        yahoo::PROVIDER_ID => Arc::new(YahooAdapter::new(http)),
        alpha_vantage::PROVIDER_ID => Arc::new(AlphaVantageAdapter::new(http)),
        twelve_data::PROVIDER_ID => Arc::new(TwelveDataAdapter::new(http)),
        finnhub::PROVIDER_ID => Arc::new(FinnhubAdapter::new(http)),
        polygon::PROVIDER_ID => Arc::new(PolygonAdapter::new(http)),
        fmp::PROVIDER_ID => Arc::new(FmpAdapter::new(http)),
        iex_cloud::PROVIDER_ID => Arc::new(IexCloudAdapter::new(http)),
        news_api::PROVIDER_ID => Arc::new(NewsApiAdapter::new(http)),
        _ => return None,
    };
    Some(adapter)
}
