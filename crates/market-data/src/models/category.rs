use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind of market data requested.
///
/// Selects both the ordered provider list and the canonical schema
/// the response is normalized into.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    LivePrice,
    HistoricalSeries,
    Statistics,
    NewsSentiment,
}

impl DataCategory {
    pub const ALL: [DataCategory; 4] = [
        Self::LivePrice,
        Self::HistoricalSeries,
        Self::Statistics,
        Self::NewsSentiment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LivePrice => "live_price",
            Self::HistoricalSeries => "historical_series",
            Self::Statistics => "statistics",
            Self::NewsSentiment => "news_sentiment",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time window for historical bars and news lookback.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Period {
    /// Default window for a category: 3 months of bars, one week of news.
    pub fn default_for(category: DataCategory) -> Self {
        match category {
            DataCategory::NewsSentiment => Self::OneWeek,
            _ => Self::ThreeMonths,
        }
    }

    /// Calendar days covered by the window.
    pub fn days(&self) -> i64 {
        match self {
            Self::OneWeek => 7,
            Self::OneMonth => 31,
            Self::ThreeMonths => 92,
            Self::SixMonths => 183,
            Self::OneYear => 366,
            Self::TwoYears => 731,
            Self::FiveYears => 1827,
        }
    }

    /// Approximate number of daily bars (five trading days per week).
    pub fn trading_days(&self) -> usize {
        (self.days() as usize * 5).div_ceil(7)
    }

    /// Start of the window ending at `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneWeek => "1w",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
        }
    }

    /// Yahoo chart `range` parameter.
    pub fn yahoo_range(&self) -> &'static str {
        match self {
            Self::OneWeek => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_period_per_category() {
        assert_eq!(Period::default_for(DataCategory::HistoricalSeries), Period::ThreeMonths);
        assert_eq!(Period::default_for(DataCategory::NewsSentiment), Period::OneWeek);
        assert_eq!(Period::default_for(DataCategory::LivePrice), Period::ThreeMonths);
    }

    #[test]
    fn test_trading_days() {
        assert_eq!(Period::OneWeek.trading_days(), 5);
        assert_eq!(Period::ThreeMonths.trading_days(), 66);
        assert!(Period::FiveYears.trading_days() > 1000);
    }

    #[test]
    fn test_period_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap();
        let start = Period::OneWeek.start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 24, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(DataCategory::LivePrice.to_string(), "live_price");
        assert_eq!(DataCategory::NewsSentiment.to_string(), "news_sentiment");
    }
}
