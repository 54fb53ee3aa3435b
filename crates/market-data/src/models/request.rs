use super::category::{DataCategory, Period};
use super::symbol::Symbol;
use super::types::ProviderId;

/// A single fetch: what to get, for which symbol, over which window.
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub symbol: Symbol,
    pub category: DataCategory,
    /// Bar window for historical series, lookback for news
    pub period: Period,
    /// Provider to try before the ranked list, if registered for the category
    pub preferred_provider: Option<ProviderId>,
}

impl FetchRequest {
    pub fn new(symbol: Symbol, category: DataCategory) -> Self {
        Self {
            symbol,
            category,
            period: Period::default_for(category),
            preferred_provider: None,
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn with_preferred_provider(mut self, provider: impl Into<ProviderId>) -> Self {
        self.preferred_provider = Some(provider.into());
        self
    }
}
