//! Per-request attempt tracking for failover diagnostics.

use std::fmt;

use serde::Serialize;

use crate::errors::{FailureKind, ProviderFailure};
use crate::models::ProviderId;

/// Record of a single provider attempt during a fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderAttempt {
    pub provider: ProviderId,
    /// `None` when the attempt produced data
    pub failure: Option<FailureKind>,
    pub detail: Option<String>,
}

impl ProviderAttempt {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Ordered trail of every provider tried for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, failure: &ProviderFailure) {
        self.attempts.push(ProviderAttempt {
            provider: failure.provider.clone(),
            failure: Some(failure.kind),
            detail: Some(failure.detail.clone()),
        });
    }

    pub fn record_success(&mut self, provider: ProviderId) {
        self.attempts.push(ProviderAttempt {
            provider,
            failure: None,
            detail: None,
        });
    }

    /// Summary for logging/debugging, e.g. `YAHOO: RATE_LIMITED (HTTP 429) -> FINNHUB: SUCCESS`.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match (&a.failure, &a.detail) {
                (None, _) => format!("{}: SUCCESS", a.provider),
                (Some(kind), Some(detail)) => format!("{}: {} ({})", a.provider, kind, detail),
                (Some(kind), None) => format!("{}: {}", a.provider, kind),
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Check if any provider succeeded.
    pub fn has_success(&self) -> bool {
        self.attempts.iter().any(ProviderAttempt::is_success)
    }

    /// Providers in the order they were tried.
    pub fn providers(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.provider.as_ref()).collect()
    }

    /// Failed attempts only, in order.
    pub fn failures(&self) -> Vec<ProviderFailure> {
        self.attempts
            .iter()
            .filter_map(|a| {
                a.failure.map(|kind| {
                    ProviderFailure::new(
                        a.provider.clone(),
                        kind,
                        a.detail.clone().unwrap_or_default(),
                    )
                })
            })
            .collect()
    }
}

impl fmt::Display for FetchDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    fn failure(provider: &'static str, kind: FailureKind, detail: &str) -> ProviderFailure {
        ProviderFailure::new(Cow::Borrowed(provider), kind, detail)
    }

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = FetchDiagnostics::new();
        diag.record_failure(&failure("YAHOO", FailureKind::RateLimited, "HTTP 429"));
        diag.record_failure(&failure("ALPHA_VANTAGE", FailureKind::MissingCredential, "no API key configured"));
        diag.record_success(Cow::Borrowed("FINNHUB"));

        assert_eq!(
            diag.summary(),
            "YAHOO: RATE_LIMITED (HTTP 429) -> ALPHA_VANTAGE: MISSING_CREDENTIAL (no API key configured) -> FINNHUB: SUCCESS"
        );
    }

    #[test]
    fn test_has_success() {
        let mut diag = FetchDiagnostics::new();
        diag.record_failure(&failure("YAHOO", FailureKind::Transient, "timeout"));
        assert!(!diag.has_success());

        diag.record_success(Cow::Borrowed("FINNHUB"));
        assert!(diag.has_success());
    }

    #[test]
    fn test_failures_skip_success() {
        let mut diag = FetchDiagnostics::new();
        diag.record_failure(&failure("A", FailureKind::NoData, "empty"));
        diag.record_failure(&failure("B", FailureKind::InvalidCredential, "HTTP 401"));
        diag.record_success(Cow::Borrowed("C"));

        let failures = diag.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[1].kind, FailureKind::InvalidCredential);
        assert_eq!(diag.providers(), vec!["A", "B", "C"]);
    }
}
