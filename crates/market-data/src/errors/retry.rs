/// Classification for retry policy.
///
/// Describes what a failure says about the provider that produced it. The
/// failover sweep advances to the next provider for every class; the class
/// is carried in diagnostics so callers and operators can tell a provider
/// that will recover on its own from one that needs configuration.
///
/// # Behavior Summary
///
/// | Class | Same provider later? | Typical cause |
/// |-------|----------------------|---------------|
/// | `RetryAfterDelay` | Yes | 429, quota envelope, 5xx, timeout |
/// | `NextProvider` | Not for this symbol | Empty or unparseable payload |
/// | `FatalForProvider` | Not until reconfigured | Missing or rejected API key |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The provider is temporarily unavailable (rate limit, outage, timeout).
    /// Upstream quotas reset on the order of hours, so the sweep moves on
    /// instead of waiting.
    RetryAfterDelay,

    /// The provider answered but has nothing usable for this symbol.
    /// Another provider may cover it.
    NextProvider,

    /// The provider cannot serve any request until its credential is fixed.
    FatalForProvider,
}
