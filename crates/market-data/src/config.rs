//! Engine configuration read from the environment.
//!
//! Keys, the per-attempt timeout, base URL overrides and rank overrides are
//! read once at startup. Nothing here is consulted again after the registry
//! is built.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::warn;

use crate::provider::{
    alpha_vantage, finnhub, fmp, iex_cloud, news_api, polygon, twelve_data, yahoo,
};

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Placeholder keys that some setups ship with; treated as unconfigured.
const PLACEHOLDER_KEYS: &[&str] = &["demo"];

/// Environment variables holding each provider's key, primary name first.
const KEY_VARS: &[(&str, &[&str])] = &[
    (alpha_vantage::PROVIDER_ID, &["ALPHA_VANTAGE_KEY", "ALPHA_VANTAGE_API_KEY"]),
    (twelve_data::PROVIDER_ID, &["TWELVE_DATA_API_KEY", "TWELVE_DATA_KEY"]),
    (finnhub::PROVIDER_ID, &["FINNHUB_API_KEY", "FINNHUB_KEY"]),
    (polygon::PROVIDER_ID, &["POLYGON_API_KEY"]),
    (fmp::PROVIDER_ID, &["FMP_KEY", "FMP_API_KEY"]),
    (iex_cloud::PROVIDER_ID, &["IEX_CLOUD_API_KEY"]),
    (news_api::PROVIDER_ID, &["NEWS_API_KEY"]),
];

/// Every built-in provider, for `<PROVIDER>_BASE_URL` lookups.
const PROVIDERS: &[&str] = &[
    yahoo::PROVIDER_ID,
    alpha_vantage::PROVIDER_ID,
    twelve_data::PROVIDER_ID,
    finnhub::PROVIDER_ID,
    polygon::PROVIDER_ID,
    fmp::PROVIDER_ID,
    iex_cloud::PROVIDER_ID,
    news_api::PROVIDER_ID,
];

/// API keys by provider id.
#[derive(Clone, Default)]
pub struct ProviderKeys {
    keys: HashMap<String, Arc<str>>,
}

impl ProviderKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key. Blank and placeholder values are ignored.
    pub fn with(mut self, provider: &str, key: &str) -> Self {
        if let Some(key) = usable_key(key) {
            self.keys.insert(provider.to_string(), key);
        }
        self
    }

    pub fn get(&self, provider: &str) -> Option<Arc<str>> {
        self.keys.get(provider).cloned()
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.keys.contains_key(provider)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl std::fmt::Debug for ProviderKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("ProviderKeys")
            .field("configured", &providers)
            .finish()
    }
}

/// Settings for building a [`ProviderRegistry`](crate::registry::ProviderRegistry)
/// and [`FailoverOrchestrator`](crate::orchestrator::FailoverOrchestrator).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub keys: ProviderKeys,
    /// Upper bound for a single provider attempt
    pub request_timeout: Duration,
    /// Base URL overrides by provider id
    pub base_urls: HashMap<String, String>,
    /// Rank overrides by provider id; lower is tried first
    pub priorities: HashMap<String, u8>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            keys: ProviderKeys::new(),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            base_urls: HashMap::new(),
            priorities: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Parse configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut keys = ProviderKeys::new();
        for (provider, vars) in KEY_VARS {
            if let Some(key) = vars
                .iter()
                .filter_map(|&var| lookup(var))
                .find(|value| usable_key(value).is_some())
            {
                keys = keys.with(provider, &key);
            }
        }

        let timeout_ms = lookup("MARKET_DATA_TIMEOUT_MS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let base_urls = PROVIDERS
            .iter()
            .filter_map(|provider| {
                let url = lookup(&format!("{}_BASE_URL", provider))?;
                let url = url.trim().trim_end_matches('/');
                (!url.is_empty()).then(|| (provider.to_string(), url.to_string()))
            })
            .collect();

        let priorities = lookup("MARKET_DATA_PRIORITIES")
            .map(|value| parse_priorities(&value))
            .unwrap_or_default();

        Self {
            keys,
            request_timeout: Duration::from_millis(timeout_ms),
            base_urls,
            priorities,
        }
    }

    pub fn with_key(mut self, provider: &str, key: &str) -> Self {
        self.keys = self.keys.with(provider, key);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, provider: &str, url: impl Into<String>) -> Self {
        self.base_urls.insert(provider.to_string(), url.into());
        self
    }

    pub fn with_priority(mut self, provider: &str, priority: u8) -> Self {
        self.priorities.insert(provider.to_string(), priority);
        self
    }
}

fn usable_key(value: &str) -> Option<Arc<str>> {
    let value = value.trim();
    if value.is_empty() || PLACEHOLDER_KEYS.iter().any(|p| value.eq_ignore_ascii_case(p)) {
        None
    } else {
        Some(Arc::from(value))
    }
}

/// `FINNHUB=1,YAHOO=4` into a rank map. Malformed entries are skipped.
fn parse_priorities(value: &str) -> HashMap<String, u8> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parsed = entry
                .split_once('=')
                .and_then(|(name, rank)| Some((name.trim(), rank.trim().parse::<u8>().ok()?)));
            if parsed.is_none() {
                warn!("Ignoring malformed MARKET_DATA_PRIORITIES entry '{}'", entry);
            }
            parsed.map(|(name, rank)| (name.to_ascii_uppercase(), rank))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(vars: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert!(config.keys.is_empty());
        assert_eq!(config.request_timeout, Duration::from_millis(10_000));
        assert!(config.base_urls.is_empty());
        assert!(config.priorities.is_empty());
    }

    #[test]
    fn test_keys_and_aliases() {
        let config = config(&[
            ("ALPHA_VANTAGE_API_KEY", "av-key"),
            ("FINNHUB_API_KEY", "fh-key"),
            ("FMP_KEY", ""),
            ("FMP_API_KEY", "fmp-key"),
        ]);
        assert_eq!(config.keys.get("ALPHA_VANTAGE").as_deref(), Some("av-key"));
        assert_eq!(config.keys.get("FINNHUB").as_deref(), Some("fh-key"));
        assert_eq!(config.keys.get("FMP").as_deref(), Some("fmp-key"));
        assert!(!config.keys.contains("POLYGON"));
        assert_eq!(config.keys.len(), 3);
    }

    #[test]
    fn test_placeholder_keys_are_absent() {
        let config = config(&[("ALPHA_VANTAGE_KEY", "demo"), ("NEWS_API_KEY", "   ")]);
        assert!(config.keys.is_empty());
    }

    #[test]
    fn test_timeout_and_overrides() {
        let config = config(&[
            ("MARKET_DATA_TIMEOUT_MS", "2500"),
            ("FINNHUB_BASE_URL", "http://127.0.0.1:9000/"),
            ("MARKET_DATA_PRIORITIES", "finnhub=1, YAHOO=9, broken, POLYGON=x"),
        ]);
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(
            config.base_urls.get("FINNHUB").map(String::as_str),
            Some("http://127.0.0.1:9000")
        );
        assert_eq!(config.priorities.get("FINNHUB"), Some(&1));
        assert_eq!(config.priorities.get("YAHOO"), Some(&9));
        assert_eq!(config.priorities.len(), 2);
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let config = config(&[("MARKET_DATA_TIMEOUT_MS", "soon")]);
        assert_eq!(config.request_timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn test_debug_hides_keys() {
        let config = config(&[("POLYGON_API_KEY", "secret-value")]);
        let debug = format!("{:?}", config);
        assert!(debug.contains("POLYGON"));
        assert!(!debug.contains("secret-value"));
    }
}
