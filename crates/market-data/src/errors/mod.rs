//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`FailureKind`]: Why a single provider attempt declined
//! - [`RetryClass`]: What that failure says about the provider
//! - [`ProviderFailure`]: One failed attempt with its diagnostic detail
//! - [`AggregateFailure`]: Every attempt of an exhausted sweep, in order
//! - [`FetchError`]: Request-level failure returned to callers

mod retry;

pub use retry::RetryClass;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::{DataCategory, ProviderId, Symbol};

/// Why a provider attempt failed.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// No API key is configured for a provider that needs one.
    /// The adapter short-circuits without touching the network.
    MissingCredential,

    /// The provider rejected the configured key (HTTP 401/403 or an
    /// invalid-key error envelope).
    InvalidCredential,

    /// HTTP 429, or an error envelope mentioning quota or rate limits.
    RateLimited,

    /// 5xx, timeout, connection failure, or any ambiguous provider behavior.
    Transient,

    /// The provider answered but the payload holds nothing usable for the
    /// requested symbol.
    NoData,
}

impl FailureKind {
    /// Returns the retry classification for this failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use marketlens_market_data::errors::{FailureKind, RetryClass};
    ///
    /// assert_eq!(FailureKind::RateLimited.retry_class(), RetryClass::RetryAfterDelay);
    /// assert_eq!(FailureKind::NoData.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited | Self::Transient => RetryClass::RetryAfterDelay,
            Self::NoData => RetryClass::NextProvider,
            Self::MissingCredential | Self::InvalidCredential => RetryClass::FatalForProvider,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::RateLimited => "RATE_LIMITED",
            Self::Transient => "TRANSIENT",
            Self::NoData => "NO_DATA",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider attempt that did not produce data.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub kind: FailureKind,
    /// Provider message, HTTP status, or transport error text
    pub detail: String,
}

impl ProviderFailure {
    pub fn new(provider: ProviderId, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            detail: detail.into(),
        }
    }

    pub fn retry_class(&self) -> RetryClass {
        self.kind.retry_class()
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.provider, self.kind, self.detail)
    }
}

/// Every provider was tried and none produced data.
///
/// Holds one failure per provider, in the order they were tried.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AggregateFailure {
    pub symbol: Symbol,
    pub category: DataCategory,
    pub failures: Vec<ProviderFailure>,
}

impl AggregateFailure {
    /// Providers in attempt order.
    pub fn providers(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.provider.as_ref()).collect()
    }

    /// Failure kinds in attempt order.
    pub fn kinds(&self) -> Vec<FailureKind> {
        self.failures.iter().map(|f| f.kind).collect()
    }

    /// Whether any provider is disabled for lack of a key.
    pub fn has_missing_credentials(&self) -> bool {
        self.failures
            .iter()
            .any(|f| f.kind == FailureKind::MissingCredential)
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "all {} providers failed for {} {}",
            self.failures.len(),
            self.symbol,
            self.category
        )?;
        for failure in &self.failures {
            write!(f, "\n  - {}", failure)?;
        }
        Ok(())
    }
}

/// Request-level failure.
///
/// Individual provider failures are never surfaced on their own; only an
/// exhausted sweep is, and it carries the full diagnostic trail.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The symbol was empty after trimming.
    #[error("Invalid symbol: ticker must not be empty")]
    InvalidSymbol,

    /// No provider is registered for the category.
    #[error("No providers configured for {category}")]
    NoProvidersConfigured { category: DataCategory },

    /// Every registered provider was tried and declined.
    #[error("{0}")]
    AllProvidersFailed(AggregateFailure),
}

impl FetchError {
    /// The per-provider trail, if the sweep actually ran.
    pub fn aggregate(&self) -> Option<&AggregateFailure> {
        match self {
            Self::AllProvidersFailed(aggregate) => Some(aggregate),
            _ => None,
        }
    }
}
