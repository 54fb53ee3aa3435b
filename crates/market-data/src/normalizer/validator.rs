//! Bar validation.
//!
//! Checks each historical bar before it enters a record:
//! - OHLC invariants (high >= low)
//! - Non-negative prices and volume
//! - Sanity ceiling on prices
//!
//! Hard issues reject the bar (counted as dropped); soft issues are logged.

use log::debug;
use rust_decimal::Decimal;

use crate::models::Bar;

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Reject the bar.
    Hard,
    /// Keep the bar but log it.
    Soft,
}

#[derive(Clone, Debug)]
struct ValidationIssue {
    severity: ValidationSeverity,
    message: String,
}

/// Bar validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Whether to reject bars with negative prices.
    pub reject_negative_prices: bool,
    /// Whether to reject bars where high < low.
    pub reject_invalid_ohlc: bool,
    /// Prices above this are rejected.
    pub max_price: Option<Decimal>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            reject_negative_prices: true,
            reject_invalid_ohlc: true,
            max_price: Some(Decimal::from(1_000_000_000i64)),
        }
    }
}

/// Validates OHLCV bars.
#[derive(Clone, Debug, Default)]
pub struct BarValidator {
    config: ValidatorConfig,
}

impl BarValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a bar.
    ///
    /// Returns `Err` with the joined hard-issue messages if the bar must be
    /// rejected.
    pub fn validate(&self, bar: &Bar) -> Result<(), String> {
        let mut issues = Vec::new();

        self.check_prices(bar, &mut issues);
        self.check_ohlc(bar, &mut issues);
        self.check_volume(bar, &mut issues);

        let hard: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();
        if !hard.is_empty() {
            return Err(hard.join("; "));
        }

        for issue in &issues {
            debug!("Bar at {} accepted with warning: {}", bar.timestamp, issue.message);
        }
        Ok(())
    }

    fn check_prices(&self, bar: &Bar, issues: &mut Vec<ValidationIssue>) {
        let prices = [Some(bar.close), bar.open, bar.high, bar.low];

        if self.config.reject_negative_prices {
            for price in prices.iter().flatten() {
                if *price < Decimal::ZERO {
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Hard,
                        message: format!("Negative price: {}", price),
                    });
                }
            }
        }

        if let Some(max) = self.config.max_price {
            if prices.iter().flatten().any(|p| *p > max) {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!("Price exceeds sanity limit {}", max),
                });
            }
        }
    }

    fn check_ohlc(&self, bar: &Bar, issues: &mut Vec<ValidationIssue>) {
        if !self.config.reject_invalid_ohlc {
            return;
        }
        let (Some(high), Some(low)) = (bar.high, bar.low) else {
            return;
        };

        if high < low {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("High ({}) is less than Low ({})", high, low),
            });
            return;
        }

        if bar.close < low || bar.close > high {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: format!("Close ({}) is outside High/Low range ({}-{})", bar.close, low, high),
            });
        }
        if let Some(open) = bar.open {
            if open < low || open > high {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Soft,
                    message: format!("Open ({}) is outside High/Low range ({}-{})", open, low, high),
                });
            }
        }
    }

    fn check_volume(&self, bar: &Bar, issues: &mut Vec<ValidationIssue>) {
        if let Some(volume) = bar.volume {
            if volume < Decimal::ZERO {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!("Negative volume: {}", volume),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn make_bar(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
        Bar {
            timestamp: Utc::now(),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close,
            volume: Some(dec!(1000)),
        }
    }

    #[test]
    fn test_valid_bar() {
        let validator = BarValidator::new();
        assert!(validator
            .validate(&make_bar(dec!(100), dec!(105), dec!(95), dec!(102)))
            .is_ok());
    }

    #[test]
    fn test_close_only_bar() {
        let validator = BarValidator::new();
        let bar = Bar {
            timestamp: Utc::now(),
            open: None,
            high: None,
            low: None,
            close: dec!(10),
            volume: None,
        };
        assert!(validator.validate(&bar).is_ok());
    }

    #[test]
    fn test_high_less_than_low_rejected() {
        let validator = BarValidator::new();
        let result = validator.validate(&make_bar(dec!(100), dec!(90), dec!(95), dec!(92)));
        assert!(result.unwrap_err().contains("less than Low"));
    }

    #[test]
    fn test_negative_price_rejected() {
        let validator = BarValidator::new();
        let result = validator.validate(&make_bar(dec!(100), dec!(105), dec!(95), dec!(-1)));
        assert!(result.unwrap_err().contains("Negative price"));
    }

    #[test]
    fn test_close_outside_range_is_soft() {
        let validator = BarValidator::new();
        assert!(validator
            .validate(&make_bar(dec!(100), dec!(105), dec!(95), dec!(105.01)))
            .is_ok());
    }

    #[test]
    fn test_sanity_limit() {
        let validator = BarValidator::with_config(ValidatorConfig {
            max_price: Some(dec!(1000)),
            ..Default::default()
        });
        assert!(validator
            .validate(&make_bar(dec!(100), dec!(2000), dec!(95), dec!(100)))
            .is_err());
    }

    #[test]
    fn test_negative_volume_rejected() {
        let validator = BarValidator::new();
        let mut bar = make_bar(dec!(100), dec!(105), dec!(95), dec!(102));
        bar.volume = Some(dec!(-5));
        assert!(validator.validate(&bar).is_err());
    }
}
