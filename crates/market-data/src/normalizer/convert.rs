//! Unit and format conversions applied while normalizing.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::models::FieldValue;

/// Strings providers use instead of leaving a value out.
const PLACEHOLDERS: &[&str] = &["", "-", "None", "none", "null", "N/A", "n/a", "NaN"];

/// Conversion from a provider-native value to a canonical one.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Conversion {
    /// Number or numeric string, unchanged.
    Number,
    /// Like `Number`, but zero and negatives are rejected. Some providers
    /// answer unknown symbols with an all-zero quote.
    PositiveNumber,
    /// Value reported in millions.
    Millions,
    /// `12.5` (percent) to `0.125`.
    PercentToFraction,
    /// `0.0123` (fraction) to `1.23` percentage points.
    FractionToPercent,
    /// `"1.23%"` to `1.23` percentage points.
    Percent,
    /// Non-empty string.
    Text,
    /// Unix seconds.
    UnixSeconds,
    /// Unix milliseconds.
    UnixMillis,
    /// `2024-01-05`, midnight UTC.
    Date,
    /// RFC 3339, `2024-01-05 13:30:00` (UTC), or a bare date.
    DateTime,
    /// `20240105T133000` (UTC).
    CompactDateTime,
}

impl Conversion {
    /// Convert a raw value into a canonical field value.
    ///
    /// Returns `None` when the value cannot be parsed.
    pub fn apply(self, value: &Value) -> Option<FieldValue> {
        match self {
            Self::Text => text(value).map(FieldValue::Text),
            Self::UnixSeconds
            | Self::UnixMillis
            | Self::Date
            | Self::DateTime
            | Self::CompactDateTime => self.timestamp(value).map(FieldValue::Timestamp),
            _ => self.number(value).map(FieldValue::Number),
        }
    }

    /// Numeric conversions; `None` for non-numeric variants.
    pub fn number(self, value: &Value) -> Option<Decimal> {
        match self {
            Self::Number => decimal(value),
            Self::PositiveNumber => decimal(value).filter(|d| *d > Decimal::ZERO),
            Self::Millions => decimal(value)?.checked_mul(Decimal::from(1_000_000)),
            Self::PercentToFraction => decimal(value)?.checked_div(Decimal::ONE_HUNDRED),
            Self::FractionToPercent => decimal(value)?.checked_mul(Decimal::ONE_HUNDRED),
            Self::Percent => match value {
                Value::String(s) => parse_decimal(s.trim().trim_end_matches('%')),
                other => decimal(other),
            },
            _ => None,
        }
    }

    /// Timestamp conversions; `None` for non-time variants.
    pub fn timestamp(self, value: &Value) -> Option<DateTime<Utc>> {
        match self {
            Self::UnixSeconds => integer(value)
                .filter(|s| *s > 0)
                .and_then(|s| Utc.timestamp_opt(s, 0).single()),
            Self::UnixMillis => integer(value)
                .filter(|ms| *ms > 0)
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            Self::Date => value.as_str().and_then(|s| parse_date(s.trim())),
            Self::DateTime => value.as_str().and_then(|s| parse_date_time(s.trim())),
            Self::CompactDateTime => value.as_str().and_then(|s| {
                NaiveDateTime::parse_from_str(s.trim(), "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive))
            }),
            _ => None,
        }
    }
}

/// Parse a JSON number or numeric string into a decimal.
pub fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if PLACEHOLDERS.contains(&s) {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-placeholder string, trimmed.
pub fn text(value: &Value) -> Option<String> {
    let s = value.as_str()?.trim();
    if PLACEHOLDERS.contains(&s) {
        None
    } else {
        Some(s.to_string())
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_date_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    parse_date(s)
}
