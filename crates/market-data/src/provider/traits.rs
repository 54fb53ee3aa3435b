//! Provider adapter trait and the raw results adapters hand back.
//!
//! Adapters only talk to the network. They never decide whether a response
//! is a success or a failure; the classifier turns every [`RawOutcome`]
//! into one.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{DataCategory, FetchRequest, Symbol};
use crate::normalizer::Schema;

use super::spec::ProviderSpec;

/// Trait for provider adapters.
///
/// Implement this trait to add support for a new market data source. The
/// registry pairs each adapter with one [`ProviderSpec`] per category it
/// serves, and the normalizer uses [`schema`](Self::schema) to map its
/// payloads onto canonical fields.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use marketlens_market_data::provider::{ProviderAdapter, ProviderSpec, RawOutcome};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl ProviderAdapter for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn schema(&self, category: DataCategory) -> Option<Schema> {
///         None
///     }
///
///     async fn call(&self, request: &FetchRequest, spec: &ProviderSpec) -> RawOutcome {
///         RawOutcome::MissingCredential
///     }
/// }
/// ```
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Unique identifier for this provider, e.g. "YAHOO", "ALPHA_VANTAGE".
    fn id(&self) -> &'static str;

    /// Field mapping for `category`, or `None` if the provider does not
    /// serve it.
    fn schema(&self, category: DataCategory) -> Option<Schema>;

    /// Render a symbol in this provider's format.
    ///
    /// Default is the bare ticker.
    fn format_symbol(&self, symbol: &Symbol) -> String {
        symbol.ticker().to_string()
    }

    /// Perform one request.
    ///
    /// Must return [`RawOutcome::MissingCredential`] without touching the
    /// network when `spec` requires a key that is not configured. Must not
    /// retry, sleep, or otherwise throttle.
    async fn call(&self, request: &FetchRequest, spec: &ProviderSpec) -> RawOutcome;
}

/// What went wrong below HTTP.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    /// Request could not be built or sent
    Request,
    /// Response body could not be read
    Body,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connection failed",
            Self::Request => "request failed",
            Self::Body => "body read failed",
        };
        f.write_str(s)
    }
}

/// Response body, parsed as JSON when possible.
#[derive(Clone, Debug, PartialEq)]
pub enum RawBody {
    Json(Value),
    /// Non-JSON body, truncated
    Text(String),
}

/// A provider error object recognized inside an otherwise normal response
/// (Alpha Vantage `{"Note": ...}`, Twelve Data `{"status":"error"}`, ...).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorEnvelope {
    /// Numeric code carried by the envelope, if any
    pub code: Option<u16>,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: Option<u16>) -> Self {
        self.code = code;
        self
    }
}

/// Unclassified result of one adapter call.
#[derive(Clone, Debug, PartialEq)]
pub enum RawOutcome {
    /// Key required but not configured; no request was made.
    MissingCredential,
    /// No HTTP response.
    Transport {
        kind: TransportErrorKind,
        detail: String,
    },
    /// HTTP response whose body carried a provider error envelope.
    ErrorEnvelope { status: u16, envelope: ErrorEnvelope },
    /// Any other HTTP response.
    Response {
        status: u16,
        body: RawBody,
        received_at: DateTime<Utc>,
    },
}

impl RawOutcome {
    /// Response with a JSON body, received now.
    pub fn json(status: u16, body: Value) -> Self {
        Self::Response {
            status,
            body: RawBody::Json(body),
            received_at: Utc::now(),
        }
    }

    /// Response with a non-JSON body, received now.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::Response {
            status,
            body: RawBody::Text(body.into()),
            received_at: Utc::now(),
        }
    }

    pub fn envelope(status: u16, envelope: ErrorEnvelope) -> Self {
        Self::ErrorEnvelope { status, envelope }
    }

    pub fn transport(kind: TransportErrorKind, detail: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            detail: detail.into(),
        }
    }
}

/// A successful response body, ready for normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct Payload {
    pub body: Value,
    pub received_at: DateTime<Utc>,
}
