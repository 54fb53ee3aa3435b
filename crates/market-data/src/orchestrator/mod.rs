//! Failover orchestrator.
//!
//! For one request, walks the category's providers in order and returns the
//! first normalized result. Each attempt is:
//! 1. Call the adapter, bounded by the per-attempt timeout
//! 2. Classify the raw outcome
//! 3. Normalize a successful payload (an unusable payload counts as `NoData`)
//! 4. On any failure, record it and move to the next provider
//!
//! Every registered provider is tried at most once per request, and the
//! orchestrator never sleeps, retries, or remembers anything between requests.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::classifier::{classify, Classification};
use crate::config::EngineConfig;
use crate::errors::{AggregateFailure, FailureKind, FetchError, ProviderFailure};
use crate::models::{DataCategory, FetchRequest, NormalizedRecord, Symbol};
use crate::normalizer::Normalizer;
use crate::registry::{FetchDiagnostics, ProviderRegistry, RegisteredProvider};

/// Result of one request.
pub type Outcome = Result<Fetched, FetchError>;

/// Successful fetch plus the attempts that led to it.
#[derive(Clone, Debug)]
pub struct Fetched {
    pub record: NormalizedRecord,
    /// Failed attempts before the winner, then the winner itself
    pub diagnostics: FetchDiagnostics,
}

/// Sequential failover across registered providers.
pub struct FailoverOrchestrator {
    registry: Arc<ProviderRegistry>,
    normalizer: Normalizer,
    request_timeout: Duration,
}

impl FailoverOrchestrator {
    /// Create an orchestrator over `registry`, normalizing with the
    /// registered adapters' schemas.
    pub fn new(registry: Arc<ProviderRegistry>, request_timeout: Duration) -> Self {
        let normalizer = registry.normalizer();
        Self {
            registry,
            normalizer,
            request_timeout,
        }
    }

    /// Build the built-in catalog from `config`.
    pub fn from_config(config: &EngineConfig) -> Self {
        let registry = ProviderRegistry::from_config(config);
        Self::new(Arc::new(registry), config.request_timeout)
    }

    /// Load configuration from the environment and build the built-in catalog.
    pub fn from_env() -> Self {
        Self::from_config(&EngineConfig::from_env())
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Fetch `category` data for `symbol` with default period and ordering.
    pub async fn fetch(&self, symbol: &str, category: DataCategory) -> Outcome {
        let symbol = Symbol::parse(symbol)?;
        self.execute(&FetchRequest::new(symbol, category)).await
    }

    /// Run the failover sweep for `request`.
    pub async fn execute(&self, request: &FetchRequest) -> Outcome {
        let providers = self
            .registry
            .ordered(request.category, request.preferred_provider.as_deref());

        if providers.is_empty() {
            warn!("No providers configured for {}", request.category);
            return Err(FetchError::NoProvidersConfigured {
                category: request.category,
            });
        }

        let mut diagnostics = FetchDiagnostics::new();

        for provider in providers {
            match self.attempt(provider, request).await {
                Ok(mut record) => {
                    record.symbol = Some(request.symbol.clone());
                    diagnostics.record_success(provider.spec.provider.clone());
                    info!(
                        "Fetched {} for {} from '{}' ({} fields)",
                        request.category,
                        request.symbol,
                        provider.spec.provider,
                        record.len()
                    );
                    return Ok(Fetched {
                        record,
                        diagnostics,
                    });
                }
                Err(failure) => {
                    debug!(
                        "Provider '{}' failed for {} {}: {} ({}), trying next provider",
                        failure.provider,
                        request.symbol,
                        request.category,
                        failure.kind,
                        failure.detail
                    );
                    diagnostics.record_failure(&failure);
                }
            }
        }

        let aggregate = AggregateFailure {
            symbol: request.symbol.clone(),
            category: request.category,
            failures: diagnostics.failures(),
        };
        warn!(
            "All providers failed for {} {}: {}",
            request.symbol,
            request.category,
            diagnostics.summary()
        );
        Err(FetchError::AllProvidersFailed(aggregate))
    }

    /// One provider, one call.
    async fn attempt(
        &self,
        provider: &RegisteredProvider,
        request: &FetchRequest,
    ) -> Result<NormalizedRecord, ProviderFailure> {
        let id = provider.spec.provider.clone();
        let fail = |kind: FailureKind, detail: String| ProviderFailure::new(id.clone(), kind, detail);

        debug!(
            "Trying '{}' for {} {}",
            provider.spec.provider, request.symbol, request.category
        );

        let raw = match tokio::time::timeout(
            self.request_timeout,
            provider.adapter.call(request, &provider.spec),
        )
        .await
        {
            Ok(raw) => raw,
            Err(_) => {
                return Err(fail(
                    FailureKind::Transient,
                    format!("timed out after {}ms", self.request_timeout.as_millis()),
                ))
            }
        };

        let payload = match classify(raw) {
            Classification::Success(payload) => payload,
            Classification::Failure { kind, detail } => return Err(fail(kind, detail)),
        };

        let mut record = self
            .normalizer
            .normalize(request.category, &provider.spec.provider, &payload)
            .map_err(|e| fail(FailureKind::NoData, e.to_string()))?;

        if request.category == DataCategory::HistoricalSeries {
            let cutoff = request.period.start(record.retrieved_at);
            let removed = record.retain_bars_since(cutoff);
            if removed > 0 {
                debug!(
                    "Trimmed {} bars older than {} from '{}'",
                    removed,
                    cutoff.format("%Y-%m-%d"),
                    provider.spec.provider
                );
            }
            if record.bars().is_empty() {
                return Err(fail(
                    FailureKind::NoData,
                    format!("no bars within {}", request.period),
                ));
            }
        }

        Ok(record)
    }
}
