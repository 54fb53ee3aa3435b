//! Static provider descriptions.

use std::fmt;
use std::sync::Arc;

use crate::models::{DataCategory, ProviderId};

/// How an API key is attached to a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuthRule {
    /// No key needed.
    None,
    /// Key sent as a query parameter with this name.
    QueryParam(&'static str),
    /// Key sent as a header with this name.
    Header(&'static str),
}

impl AuthRule {
    pub fn requires_key(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// One provider serving one category.
///
/// Specs are immutable once the registry is built.
#[derive(Clone)]
pub struct ProviderSpec {
    pub provider: ProviderId,
    pub category: DataCategory,
    /// Scheme and host, e.g. `https://finnhub.io/api/v1`
    pub base_url: String,
    /// Path template with `{name}` placeholders
    pub path: &'static str,
    pub auth: AuthRule,
    /// Lower values are tried first
    pub priority: u8,
    api_key: Option<Arc<str>>,
}

impl ProviderSpec {
    pub fn new(
        provider: impl Into<ProviderId>,
        category: DataCategory,
        base_url: impl Into<String>,
        path: &'static str,
        auth: AuthRule,
        priority: u8,
    ) -> Self {
        Self {
            provider: provider.into(),
            category,
            base_url: base_url.into(),
            path,
            auth,
            priority,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<Arc<str>>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Whether a call can be made at all: either no key is needed or one is
    /// configured.
    pub fn has_credential(&self) -> bool {
        !self.auth.requires_key() || self.api_key.is_some()
    }

    /// Full URL with `{name}` placeholders replaced by URL-encoded values.
    pub fn url(&self, vars: &[(&str, &str)]) -> String {
        let mut path = self.path.to_string();
        for (name, value) in vars {
            path = path.replace(&format!("{{{}}}", name), &urlencoding::encode(value));
        }
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl fmt::Debug for ProviderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSpec")
            .field("provider", &self.provider)
            .field("category", &self.category)
            .field("base_url", &self.base_url)
            .field("path", &self.path)
            .field("auth", &self.auth)
            .field("priority", &self.priority)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(auth: AuthRule) -> ProviderSpec {
        ProviderSpec::new(
            "TEST",
            DataCategory::LivePrice,
            "https://api.example.com/",
            "/quote/{symbol}",
            auth,
            1,
        )
    }

    #[test]
    fn test_url_rendering() {
        let spec = spec(AuthRule::None);
        assert_eq!(spec.url(&[("symbol", "AAPL")]), "https://api.example.com/quote/AAPL");
        assert_eq!(
            spec.url(&[("symbol", "BRK.B X")]),
            "https://api.example.com/quote/BRK.B%20X"
        );
    }

    #[test]
    fn test_has_credential() {
        assert!(spec(AuthRule::None).has_credential());
        assert!(!spec(AuthRule::QueryParam("apikey")).has_credential());
        assert!(spec(AuthRule::Header("X-Token"))
            .with_api_key(Some(Arc::from("k")))
            .has_credential());
    }

    #[test]
    fn test_debug_redacts_key() {
        let spec = spec(AuthRule::QueryParam("apikey")).with_api_key(Some(Arc::from("s3cret")));
        let debug = format!("{:?}", spec);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }
}
