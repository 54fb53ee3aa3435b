//! Market data models
//!
//! This module contains the core data types for market data operations:
//! - `types` - Type aliases for common identifiers (ProviderId, Ticker)
//! - `symbol` - Ticker plus market (Symbol, Market)
//! - `category` - What is being fetched and over which window (DataCategory, Period)
//! - `request` - A single fetch request (FetchRequest)
//! - `record` - Canonical, provider-independent result (NormalizedRecord and friends)

mod category;
mod record;
mod request;
mod symbol;
mod types;

pub use category::{DataCategory, Period};
pub use record::{Bar, Field, FieldValue, Headline, NormalizedRecord, SentimentSource};
pub use request::FetchRequest;
pub use symbol::{Market, Symbol};
pub use types::{ProviderId, Ticker};
