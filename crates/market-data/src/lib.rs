//! MarketLens Market Data Crate
//!
//! Multi-provider market data retrieval with failover and normalization.
//!
//! # Overview
//!
//! The crate answers four kinds of requests for a stock symbol:
//! - Live price
//! - Historical daily bars
//! - Key statistics (valuation, margins, dividends)
//! - News headlines with sentiment
//!
//! Each category has an ordered list of upstream providers (Yahoo Finance,
//! Alpha Vantage, Twelve Data, Finnhub, Polygon.io, Financial Modeling Prep,
//! IEX Cloud, NewsAPI). A request walks that list once, stopping at the first
//! provider that returns usable data.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  FetchRequest    |  (symbol, category, period)
//! +------------------+
//!          |
//!          v
//! +----------------------+     +------------------+
//! | FailoverOrchestrator | --> | ProviderRegistry |  (ordered providers)
//! +----------------------+     +------------------+
//!          |
//!          v   for each provider, in order
//! +------------------+
//! | ProviderAdapter  |  -> RawOutcome
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   Classifier     |  -> Success(payload) | FailureKind
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   Normalizer     |  -> NormalizedRecord (canonical fields)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`FailoverOrchestrator`] - Runs the per-request provider sweep
//! - [`FetchRequest`] - Symbol, category, period, optional preferred provider
//! - [`NormalizedRecord`] - Provider-independent result
//! - [`FetchError`] / [`AggregateFailure`] - Request failure with every attempt
//! - [`FailureKind`] - Why a single provider declined
//! - [`EngineConfig`] - Keys, timeout and overrides from the environment
//!
//! # Example
//!
//! ```no_run
//! use marketlens_market_data::{DataCategory, FailoverOrchestrator, Field};
//!
//! # async fn run() {
//! let orchestrator = FailoverOrchestrator::from_env();
//! match orchestrator.fetch("SHOP.TO", DataCategory::LivePrice).await {
//!     Ok(fetched) => println!("{:?}", fetched.record.number(Field::Price)),
//!     Err(e) => eprintln!("{}", e),
//! }
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod errors;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod provider;
pub mod registry;

// Re-export all public types from models
pub use models::{
    Bar, DataCategory, FetchRequest, Field, FieldValue, Headline, Market, NormalizedRecord,
    Period, ProviderId, SentimentSource, Symbol, Ticker,
};

pub use config::{EngineConfig, ProviderKeys};
pub use errors::{AggregateFailure, FailureKind, FetchError, ProviderFailure, RetryClass};

// Re-export pipeline stages
pub use classifier::{classify, Classification};
pub use normalizer::{NormalizeError, Normalizer};
pub use orchestrator::{FailoverOrchestrator, Fetched, Outcome};

// Re-export provider types
pub use provider::{
    AlphaVantageAdapter, AuthRule, ErrorEnvelope, FinnhubAdapter, FmpAdapter, HttpTransport,
    IexCloudAdapter, NewsApiAdapter, Payload, PolygonAdapter, ProviderAdapter, ProviderSpec,
    RawBody, RawOutcome, TransportErrorKind, TwelveDataAdapter, YahooAdapter,
};

// Re-export registry types
pub use registry::{FetchDiagnostics, ProviderAttempt, ProviderRegistry, RegisteredProvider};
