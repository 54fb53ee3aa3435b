//! Provider adapters and the plumbing they share.
//!
//! This module contains:
//! - The `ProviderAdapter` trait every upstream implements
//! - `ProviderSpec`, the immutable per-(provider, category) endpoint description
//! - Shared HTTP dispatch with credential injection
//! - Concrete adapters (Yahoo, Alpha Vantage, Twelve Data, Finnhub, ...)
//!
//! Adapters only perform the call and report what happened as a
//! [`RawOutcome`]. Classifying failures and mapping payloads onto canonical
//! fields happen elsewhere, so an adapter never decides whether to fail over.

mod spec;
mod traits;

pub mod http;

pub mod alpha_vantage;
pub mod finnhub;
pub mod fmp;
pub mod iex_cloud;
pub mod news_api;
pub mod polygon;
pub mod twelve_data;
pub mod yahoo;

pub use http::{HttpRequest, HttpTransport};
pub use spec::{AuthRule, ProviderSpec};
pub use traits::{ErrorEnvelope, Payload, ProviderAdapter, RawBody, RawOutcome, TransportErrorKind};

pub use alpha_vantage::AlphaVantageAdapter;
pub use finnhub::FinnhubAdapter;
pub use fmp::FmpAdapter;
pub use iex_cloud::IexCloudAdapter;
pub use news_api::NewsApiAdapter;
pub use polygon::PolygonAdapter;
pub use twelve_data::TwelveDataAdapter;
pub use yahoo::YahooAdapter;
