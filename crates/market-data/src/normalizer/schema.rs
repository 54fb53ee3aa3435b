//! Field-mapping tables.
//!
//! Every `(category, provider)` pair gets a [`Schema`] describing where the
//! provider keeps each canonical field and how its units convert. Locations
//! are JSON pointers (RFC 6901): `/Global Quote/05. price`,
//! `/chart/result/0/meta/regularMarketPrice`. A `/` inside a key is written
//! `~1`.

use super::convert::Conversion;
use crate::models::Field;

/// How one provider lays out one category.
#[derive(Clone, Copy, Debug)]
pub enum Schema {
    /// Flat or nested scalar fields (live price, statistics).
    Fields(&'static [FieldRule]),
    /// Daily OHLCV bars.
    Series(SeriesLayout),
    /// News articles.
    News(NewsLayout),
}

/// Maps one provider-native location onto a canonical field.
///
/// Several rules may target the same field; the first one that yields a
/// parseable value wins.
#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    pub pointer: &'static str,
    pub field: Field,
    pub conversion: Conversion,
}

impl FieldRule {
    pub const fn new(pointer: &'static str, field: Field, conversion: Conversion) -> Self {
        Self {
            pointer,
            field,
            conversion,
        }
    }
}

/// Locations of the OHLCV values of a bar.
#[derive(Clone, Copy, Debug)]
pub struct BarKeys {
    pub open: &'static str,
    pub high: &'static str,
    pub low: &'static str,
    pub close: &'static str,
    pub volume: &'static str,
}

/// Shape of a provider's historical series.
#[derive(Clone, Copy, Debug)]
pub enum SeriesLayout {
    /// Parallel arrays: one array of timestamps, one per OHLCV value.
    /// `columns` hold absolute pointers to the arrays.
    Columns {
        timestamps: &'static str,
        time: Conversion,
        columns: BarKeys,
    },
    /// An array of bar objects. `timestamp` and `keys` are relative to a row.
    Rows {
        rows: &'static str,
        timestamp: &'static str,
        time: Conversion,
        keys: BarKeys,
    },
    /// An object keyed by date, each value a bar object.
    Keyed {
        map: &'static str,
        time: Conversion,
        keys: BarKeys,
    },
}

/// Shape of a provider's news feed. All keys except `rows` are relative to
/// an article.
#[derive(Clone, Copy, Debug)]
pub struct NewsLayout {
    pub rows: &'static str,
    pub title: &'static str,
    pub summary: Option<&'static str>,
    pub url: Option<&'static str>,
    pub source: Option<&'static str>,
    pub published: &'static str,
    pub published_time: Conversion,
    /// Provider-computed sentiment in -1..1, when the provider has one
    pub score: Option<&'static str>,
}
