//! Provider registry.
//!
//! The registry holds, per category, the ordered list of providers able to
//! serve it. It is built once (normally from [`EngineConfig`]) and never
//! mutated while requests are in flight.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};

use super::catalog;
use crate::config::EngineConfig;
use crate::models::DataCategory;
use crate::normalizer::Normalizer;
use crate::provider::{HttpTransport, ProviderAdapter, ProviderSpec};

/// One provider able to serve one category.
#[derive(Clone)]
pub struct RegisteredProvider {
    pub spec: ProviderSpec,
    pub adapter: Arc<dyn ProviderAdapter>,
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("spec", &self.spec)
            .field("adapter", &self.adapter.id())
            .finish()
    }
}

/// Ordered providers per category.
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<DataCategory, Vec<RegisteredProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the built-in catalog from configuration.
    ///
    /// Every catalog provider is registered, keyed or not; a provider without
    /// its key is still tried and reports a missing credential without any
    /// network traffic.
    pub fn from_config(config: &EngineConfig) -> Self {
        let http = HttpTransport::new(config.request_timeout);
        let mut registry = Self::new();

        for category in DataCategory::ALL {
            for (index, provider) in catalog::default_ranking(category).iter().enumerate() {
                let Some(entry) = catalog::entry(provider) else {
                    continue;
                };
                let Some(path) = (entry.path)(category) else {
                    continue;
                };
                let Some(adapter) = catalog::adapter(provider, &http) else {
                    continue;
                };

                let default_rank = u8::try_from(index + 1).unwrap_or(u8::MAX);
                let priority = config
                    .priorities
                    .get(*provider)
                    .copied()
                    .unwrap_or(default_rank);
                let base_url = config
                    .base_urls
                    .get(*provider)
                    .cloned()
                    .unwrap_or_else(|| entry.base_url.to_string());

                let spec = ProviderSpec::new(
                    Cow::Borrowed(entry.provider),
                    category,
                    base_url,
                    path,
                    entry.auth,
                    priority,
                )
                .with_api_key(config.keys.get(provider));

                registry.register(spec, adapter);
            }
        }

        for category in DataCategory::ALL {
            let providers = registry.providers(category);
            let keyed = providers.iter().filter(|p| p.spec.has_credential()).count();
            info!(
                "{}: {} providers registered, {} usable",
                category,
                providers.len(),
                keyed
            );
        }

        registry
    }

    /// Register a provider for `spec.category`.
    ///
    /// The category list stays sorted by priority; equal priorities keep
    /// registration order.
    pub fn register(&mut self, spec: ProviderSpec, adapter: Arc<dyn ProviderAdapter>) {
        debug!(
            "Registering provider '{}' for {} (priority {})",
            spec.provider, spec.category, spec.priority
        );
        let list = self.providers.entry(spec.category).or_default();
        list.retain(|p| p.spec.provider != spec.provider);
        list.push(RegisteredProvider { spec, adapter });
        list.sort_by_key(|p| p.spec.priority);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, spec: ProviderSpec, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(spec, adapter);
        self
    }

    /// Providers for `category` in priority order.
    pub fn providers(&self, category: DataCategory) -> &[RegisteredProvider] {
        self.providers
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Attempt order for one request: the preferred provider first when it is
    /// registered for the category, then everyone else by priority.
    pub fn ordered(
        &self,
        category: DataCategory,
        preferred: Option<&str>,
    ) -> Vec<&RegisteredProvider> {
        let mut ordered: Vec<&RegisteredProvider> = self.providers(category).iter().collect();
        if let Some(preferred) = preferred {
            if let Some(pos) = ordered.iter().position(|p| p.spec.provider == preferred) {
                let provider = ordered.remove(pos);
                ordered.insert(0, provider);
            }
        }
        ordered
    }

    /// Build a normalizer holding every registered adapter's schemas.
    pub fn normalizer(&self) -> Normalizer {
        let mut normalizer = Normalizer::new();
        for (category, providers) in &self.providers {
            for provider in providers {
                if let Some(schema) = provider.adapter.schema(*category) {
                    normalizer.register(*category, &provider.spec.provider, schema);
                }
            }
        }
        normalizer
    }

    pub fn is_empty(&self) -> bool {
        self.providers.values().all(Vec::is_empty)
    }
}
