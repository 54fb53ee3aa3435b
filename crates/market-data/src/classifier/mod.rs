//! Rate-limit and error classification.
//!
//! Turns every [`RawOutcome`] into either a payload to normalize or a
//! [`FailureKind`]. Rules are evaluated in order, first match wins:
//!
//! | # | Condition                                   | Result              |
//! |---|---------------------------------------------|---------------------|
//! | 1 | adapter reported missing key                | `MissingCredential` |
//! | 2 | timeout / connection / transport error      | `Transient`         |
//! | 3 | HTTP 429                                    | `RateLimited`       |
//! | 4 | HTTP 401, 403                               | `InvalidCredential` |
//! | 5 | HTTP 5xx                                    | `Transient`         |
//! | 6 | error envelope (code, then message keywords)| see [`classify_envelope`] |
//! | 7 | HTTP 404                                    | `NoData`            |
//! | 8 | any other non-2xx                           | `Transient`         |
//! | 9 | 2xx with null, empty or non-JSON body       | `NoData`            |
//! |10 | anything else                               | success             |
//!
//! Anything ambiguous lands on `Transient`, never on a permanent kind.

use serde_json::Value;

use crate::errors::FailureKind;
use crate::provider::{ErrorEnvelope, Payload, RawBody, RawOutcome};

/// Result of classifying one adapter call.
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    Success(Payload),
    Failure { kind: FailureKind, detail: String },
}

impl Classification {
    fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

const RATE_LIMIT_HINTS: &[&str] = &[
    "rate limit",
    "api call frequency",
    "api credits",
    "calls per",
    "limit reach",
    "exceeded",
    "quota",
    "too many",
];

const CREDENTIAL_HINTS: &[&str] = &[
    "api key",
    "apikey",
    "api_key",
    "token",
    "unauthorized",
    "authoriz",
    "authent",
    "subscription",
    "premium",
    "access",
];

const NO_DATA_HINTS: &[&str] = &[
    "not found",
    "invalid api call",
    "no data",
    "unknown symbol",
    "invalid symbol",
    "not available",
];

/// Classify one raw adapter result.
pub fn classify(outcome: RawOutcome) -> Classification {
    match outcome {
        RawOutcome::MissingCredential => {
            Classification::failure(FailureKind::MissingCredential, "no API key configured")
        }
        RawOutcome::Transport { kind, detail } => {
            Classification::failure(FailureKind::Transient, format!("{}: {}", kind, detail))
        }
        RawOutcome::ErrorEnvelope { status, envelope } => match classify_status(status) {
            Some(kind) => Classification::failure(kind, envelope.message),
            None => {
                let kind = classify_envelope(&envelope);
                Classification::failure(kind, envelope.message)
            }
        },
        RawOutcome::Response {
            status,
            body,
            received_at,
        } => {
            if let Some(kind) = classify_status(status) {
                return Classification::failure(kind, format!("HTTP {}", status));
            }
            if status == 404 {
                return Classification::failure(FailureKind::NoData, "HTTP 404");
            }
            if !(200..300).contains(&status) {
                return Classification::failure(FailureKind::Transient, format!("HTTP {}", status));
            }
            match body {
                RawBody::Json(body) if has_content(&body) => {
                    Classification::Success(Payload { body, received_at })
                }
                RawBody::Json(_) => Classification::failure(FailureKind::NoData, "empty response"),
                RawBody::Text(text) => Classification::failure(
                    FailureKind::NoData,
                    format!("non-JSON response: {}", text),
                ),
            }
        }
    }
}

/// Statuses that decide the outcome regardless of the body.
fn classify_status(status: u16) -> Option<FailureKind> {
    match status {
        429 => Some(FailureKind::RateLimited),
        401 | 403 => Some(FailureKind::InvalidCredential),
        500..=599 => Some(FailureKind::Transient),
        _ => None,
    }
}

/// Classify a provider error envelope.
///
/// A numeric code is read like an HTTP status. Otherwise the message is
/// matched against keywords: rate/quota/limit means `RateLimited`,
/// key/auth/subscription means `InvalidCredential`, not-found/invalid-call
/// means `NoData`. Anything else is `Transient`.
pub fn classify_envelope(envelope: &ErrorEnvelope) -> FailureKind {
    if let Some(code) = envelope.code {
        if let Some(kind) = classify_status(code) {
            return kind;
        }
        if code == 404 {
            return FailureKind::NoData;
        }
    }

    let message = envelope.message.to_lowercase();
    let mentions = |hints: &[&str]| hints.iter().any(|h| message.contains(h));

    if mentions(RATE_LIMIT_HINTS) {
        FailureKind::RateLimited
    } else if mentions(CREDENTIAL_HINTS) {
        FailureKind::InvalidCredential
    } else if mentions(NO_DATA_HINTS) {
        FailureKind::NoData
    } else {
        FailureKind::Transient
    }
}

fn has_content(body: &Value) -> bool {
    match body {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}
