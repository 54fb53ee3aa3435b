//! Shared HTTP plumbing for provider adapters.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::spec::{AuthRule, ProviderSpec};
use super::traits::{ErrorEnvelope, RawBody, RawOutcome, TransportErrorKind};

/// Longest non-JSON body kept for diagnostics.
const MAX_TEXT_BODY: usize = 200;

/// Largest response body read before the call is abandoned.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Recognizes a provider error object inside a response body.
pub type EnvelopeDetector = fn(&Value) -> Option<ErrorEnvelope>;

/// One GET request, before auth is applied.
#[derive(Clone, Debug, Default)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub headers: Vec<(&'static str, String)>,
}

impl HttpRequest {
    pub fn get(url: String) -> Self {
        Self {
            url,
            ..Default::default()
        }
    }

    pub fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// A `reqwest` client shared by all adapters.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    max_body_bytes: usize,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Send `request` with `spec`'s credential attached.
    ///
    /// Returns [`RawOutcome::MissingCredential`] before any I/O when the key
    /// is required but absent.
    pub async fn send(
        &self,
        spec: &ProviderSpec,
        request: HttpRequest,
        detect_envelope: EnvelopeDetector,
    ) -> RawOutcome {
        let HttpRequest {
            url,
            mut query,
            headers,
        } = request;

        let mut builder = self.client.get(&url);
        match (spec.auth, spec.api_key()) {
            (AuthRule::None, _) => {}
            (_, None) => return RawOutcome::MissingCredential,
            (AuthRule::QueryParam(name), Some(key)) => query.push((name, key.to_string())),
            (AuthRule::Header(name), Some(key)) => builder = builder.header(name, key),
        }
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        debug!(
            "{} request: {} with {} params",
            spec.provider,
            url,
            query.len()
        );

        let response = match builder.query(&query).send().await {
            Ok(response) => response,
            Err(e) => return transport_error(e),
        };

        let status = response.status().as_u16();
        let text = match self.read_body(response).await {
            Ok(text) => text,
            Err(outcome) => return outcome,
        };
        let received_at = Utc::now();

        match serde_json::from_str::<Value>(&text) {
            Ok(json) => match detect_envelope(&json) {
                Some(envelope) => RawOutcome::ErrorEnvelope { status, envelope },
                None => RawOutcome::Response {
                    status,
                    body: RawBody::Json(json),
                    received_at,
                },
            },
            Err(_) => RawOutcome::Response {
                status,
                body: RawBody::Text(text.chars().take(MAX_TEXT_BODY).collect()),
                received_at,
            },
        }
    }
}

impl HttpTransport {
    /// Read the body in chunks, giving up once it passes `max_body_bytes`.
    async fn read_body(&self, mut response: reqwest::Response) -> Result<String, RawOutcome> {
        let limit = self.max_body_bytes;
        let too_large =
            || RawOutcome::transport(TransportErrorKind::Body, format!("response body exceeds {} bytes", limit));

        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(too_large());
        }

        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.len() + chunk.len() > limit {
                        return Err(too_large());
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => return Err(transport_error(e)),
            }
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Map a reqwest error, dropping the URL so query-string keys never reach
/// logs.
fn transport_error(e: reqwest::Error) -> RawOutcome {
    let kind = if e.is_timeout() {
        TransportErrorKind::Timeout
    } else if e.is_connect() {
        TransportErrorKind::Connect
    } else if e.is_body() || e.is_decode() {
        TransportErrorKind::Body
    } else {
        TransportErrorKind::Request
    };
    RawOutcome::transport(kind, e.without_url().to_string())
}

/// Envelope detector for providers that report errors only via status.
pub fn no_envelope(_: &Value) -> Option<ErrorEnvelope> {
    None
}

/// Read a string message at `key`.
pub(crate) fn message_at(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Read a numeric code at `key` (number or numeric string).
pub(crate) fn code_at(body: &Value, key: &str) -> Option<u16> {
    match body.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|c| u16::try_from(c).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
