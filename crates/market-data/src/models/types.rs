use std::borrow::Cow;
use std::sync::Arc;

/// Provider identifier - mostly static constants ("YAHOO", "FINNHUB", ...)
pub type ProviderId = Cow<'static, str>;

/// Ticker string after parsing, shared between requests and records
pub type Ticker = Arc<str>;
