//! Normalization of provider payloads into canonical records.
//!
//! This module provides:
//! - [`Schema`] and friends: declarative per-provider field mappings
//! - [`Conversion`]: unit and format conversions
//! - [`BarValidator`]: OHLC checks for historical bars
//! - [`Normalizer`]: applies a schema to a payload
//!
//! Normalization is a pure function of `(category, provider, payload)`.
//! Values that cannot be parsed are left out and counted in
//! [`NormalizedRecord::dropped`]; they never become zero.

mod convert;
mod schema;
pub mod sentiment;
mod validator;

pub use convert::Conversion;
pub use schema::{BarKeys, FieldRule, NewsLayout, Schema, SeriesLayout};
pub use validator::{BarValidator, ValidationSeverity, ValidatorConfig};

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    Bar, DataCategory, Field, FieldValue, Headline, NormalizedRecord, ProviderId, SentimentSource,
};
use crate::provider::Payload;

/// Why a payload could not be normalized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("no schema registered for {provider} {category}")]
    MissingSchema {
        provider: String,
        category: DataCategory,
    },

    #[error("no usable fields ({dropped} unparseable)")]
    NoUsableFields { dropped: u32 },
}

/// Applies registered schemas to provider payloads.
#[derive(Debug, Default)]
pub struct Normalizer {
    schemas: HashMap<DataCategory, HashMap<String, Schema>>,
    validator: BarValidator,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(mut self, validator: BarValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Register (or replace) the schema for one provider and category.
    pub fn register(&mut self, category: DataCategory, provider: &str, schema: Schema) {
        self.schemas
            .entry(category)
            .or_default()
            .insert(provider.to_string(), schema);
    }

    pub fn has_schema(&self, category: DataCategory, provider: &str) -> bool {
        self.schema(category, provider).is_some()
    }

    fn schema(&self, category: DataCategory, provider: &str) -> Option<&Schema> {
        self.schemas.get(&category)?.get(provider)
    }

    /// Map `payload` onto canonical fields.
    ///
    /// Succeeds when at least one canonical field could be populated.
    pub fn normalize(
        &self,
        category: DataCategory,
        provider: &ProviderId,
        payload: &Payload,
    ) -> Result<NormalizedRecord, NormalizeError> {
        let schema = self
            .schema(category, provider)
            .ok_or_else(|| NormalizeError::MissingSchema {
                provider: provider.to_string(),
                category,
            })?;

        let mut fields = BTreeMap::new();
        let mut dropped = 0u32;

        match schema {
            Schema::Fields(rules) => {
                map_fields(rules, &payload.body, &mut fields, &mut dropped);
                if category == DataCategory::LivePrice {
                    derive_price_change(&mut fields);
                }
            }
            Schema::Series(layout) => {
                let bars = self.collect_bars(layout, &payload.body, &mut dropped);
                if !bars.is_empty() {
                    fields.insert(Field::Bars, FieldValue::Bars(bars));
                }
            }
            Schema::News(layout) => {
                let headlines = collect_headlines(layout, &payload.body, &mut dropped);
                if !headlines.is_empty() {
                    insert_sentiment_summary(headlines, &mut fields);
                }
            }
        }

        if fields.is_empty() {
            return Err(NormalizeError::NoUsableFields { dropped });
        }
        if dropped > 0 {
            debug!(
                "{} {}: {} fields mapped, {} dropped",
                provider,
                category,
                fields.len(),
                dropped
            );
        }

        Ok(NormalizedRecord {
            category,
            provider: provider.clone(),
            symbol: None,
            retrieved_at: payload.received_at,
            fields,
            dropped,
        })
    }

    fn collect_bars(&self, layout: &SeriesLayout, body: &Value, dropped: &mut u32) -> Vec<Bar> {
        let mut raw = Vec::new();

        match layout {
            SeriesLayout::Columns {
                timestamps,
                time,
                columns,
            } => {
                let Some(stamps) = body.pointer(timestamps).and_then(Value::as_array) else {
                    return Vec::new();
                };
                let column = |pointer: &str, i: usize| {
                    body.pointer(pointer)
                        .and_then(Value::as_array)
                        .and_then(|values| values.get(i))
                };
                for (i, stamp) in stamps.iter().enumerate() {
                    raw.push(build_bar(
                        time.timestamp(stamp),
                        column(columns.open, i),
                        column(columns.high, i),
                        column(columns.low, i),
                        column(columns.close, i),
                        column(columns.volume, i),
                    ));
                }
            }
            SeriesLayout::Rows {
                rows,
                timestamp,
                time,
                keys,
            } => {
                let Some(rows) = body.pointer(rows).and_then(Value::as_array) else {
                    return Vec::new();
                };
                for row in rows {
                    raw.push(bar_from_row(
                        row.pointer(timestamp).and_then(|v| time.timestamp(v)),
                        row,
                        keys,
                    ));
                }
            }
            SeriesLayout::Keyed { map, time, keys } => {
                let Some(map) = body.pointer(map).and_then(Value::as_object) else {
                    return Vec::new();
                };
                for (key, row) in map {
                    let stamp = time.timestamp(&Value::String(key.clone()));
                    raw.push(bar_from_row(stamp, row, keys));
                }
            }
        }

        // Sorted by time, one bar per timestamp (the last one wins).
        let mut bars = BTreeMap::new();
        for bar in raw {
            let Some(bar) = bar else {
                *dropped += 1;
                continue;
            };
            if let Err(reason) = self.validator.validate(&bar) {
                debug!("Rejected bar at {}: {}", bar.timestamp, reason);
                *dropped += 1;
                continue;
            }
            bars.insert(bar.timestamp, bar);
        }
        bars.into_values().collect()
    }
}

fn map_fields(
    rules: &[FieldRule],
    body: &Value,
    fields: &mut BTreeMap<Field, FieldValue>,
    dropped: &mut u32,
) {
    for rule in rules {
        if fields.contains_key(&rule.field) {
            continue;
        }
        let Some(raw) = body.pointer(rule.pointer) else {
            continue;
        };
        if raw.is_null() {
            continue;
        }
        match rule.conversion.apply(raw) {
            Some(value) => {
                fields.insert(rule.field, value);
            }
            None => *dropped += 1,
        }
    }
}

/// Fill in change and change percent from price and previous close when the
/// provider did not supply them.
fn derive_price_change(fields: &mut BTreeMap<Field, FieldValue>) {
    let price = fields.get(&Field::Price).and_then(FieldValue::as_number);
    let previous = fields.get(&Field::PreviousClose).and_then(FieldValue::as_number);
    let (Some(price), Some(previous)) = (price, previous) else {
        return;
    };

    let Some(change) = price.checked_sub(previous) else {
        return;
    };
    fields
        .entry(Field::Change)
        .or_insert(FieldValue::Number(change));

    if !previous.is_zero() {
        if let Some(percent) = change
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|c| c.checked_div(previous))
        {
            fields
                .entry(Field::ChangePercent)
                .or_insert(FieldValue::Number(percent.round_dp(4)));
        }
    }
}

fn bar_from_row(stamp: Option<DateTime<Utc>>, row: &Value, keys: &BarKeys) -> Option<Bar> {
    build_bar(
        stamp,
        row.pointer(keys.open),
        row.pointer(keys.high),
        row.pointer(keys.low),
        row.pointer(keys.close),
        row.pointer(keys.volume),
    )
}

/// A bar needs a timestamp and a close; everything else is optional.
fn build_bar(
    stamp: Option<DateTime<Utc>>,
    open: Option<&Value>,
    high: Option<&Value>,
    low: Option<&Value>,
    close: Option<&Value>,
    volume: Option<&Value>,
) -> Option<Bar> {
    let number = |v: Option<&Value>| v.and_then(convert::decimal);
    Some(Bar {
        timestamp: stamp?,
        open: number(open),
        high: number(high),
        low: number(low),
        close: number(close)?,
        volume: number(volume),
    })
}

fn collect_headlines(layout: &NewsLayout, body: &Value, dropped: &mut u32) -> Vec<Headline> {
    let Some(rows) = body.pointer(layout.rows).and_then(Value::as_array) else {
        return Vec::new();
    };

    let text_at = |row: &Value, pointer: Option<&str>| {
        pointer
            .and_then(|p| row.pointer(p))
            .and_then(convert::text)
    };

    let mut headlines = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(title) = text_at(row, Some(layout.title)) else {
            *dropped += 1;
            continue;
        };
        let summary = text_at(row, layout.summary);
        let published_at = row
            .pointer(layout.published)
            .and_then(|v| layout.published_time.timestamp(v));

        let provider_score = layout
            .score
            .and_then(|p| row.pointer(p))
            .and_then(convert::decimal);
        let (sentiment, scored_by) = match provider_score {
            Some(score) => (sentiment::clamp_score(score), SentimentSource::Provider),
            None => {
                let text = match &summary {
                    Some(summary) => format!("{} {}", title, summary),
                    None => title.clone(),
                };
                (sentiment::lexicon_score(&text), SentimentSource::Lexicon)
            }
        };

        headlines.push(Headline {
            url: text_at(row, layout.url),
            source: text_at(row, layout.source),
            title,
            summary,
            published_at,
            sentiment,
            scored_by,
        });
    }

    // Newest first, undated last.
    headlines.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    headlines
}

fn insert_sentiment_summary(headlines: Vec<Headline>, fields: &mut BTreeMap<Field, FieldValue>) {
    let count = Decimal::from(headlines.len());
    let total: Decimal = headlines.iter().map(|h| h.sentiment).sum();
    let score = (total / count).round_dp(4);

    fields.insert(Field::ArticleCount, FieldValue::Number(count));
    fields.insert(Field::SentimentScore, FieldValue::Number(score));
    fields.insert(
        Field::SentimentLabel,
        FieldValue::Text(sentiment::label(score).to_string()),
    );
    fields.insert(Field::Headlines, FieldValue::Headlines(headlines));
}

#[cfg(test)]
pub(crate) fn normalize_sample(
    adapter: &dyn crate::provider::ProviderAdapter,
    category: DataCategory,
    body: Value,
) -> Result<NormalizedRecord, NormalizeError> {
    let mut normalizer = Normalizer::new();
    if let Some(schema) = adapter.schema(category) {
        normalizer.register(category, adapter.id(), schema);
    }
    let payload = Payload {
        body,
        received_at: Utc::now(),
    };
    normalizer.normalize(category, &ProviderId::Borrowed(adapter.id()), &payload)
}
