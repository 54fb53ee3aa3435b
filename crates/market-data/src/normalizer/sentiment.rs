//! Keyword sentiment for providers that return articles without a score.

use std::collections::HashSet;

use num_traits::FromPrimitive;
use rust_decimal::Decimal;

const POSITIVE: &[&str] = &[
    "gain", "profit", "surge", "rise", "growth", "boost", "up", "increase", "positive", "beat",
    "strong", "outperform", "bullish", "rally", "soar", "success", "record", "high", "upgrade",
    "buy", "optimistic",
];

const NEGATIVE: &[&str] = &[
    "loss", "decline", "fall", "drop", "plunge", "crash", "down", "decrease", "negative", "miss",
    "weak", "underperform", "bearish", "sell", "downgrade", "concern", "risk", "low", "poor",
    "worst", "cut", "pessimistic",
];

/// Largest magnitude a keyword score can reach.
const MAX_LEXICON_SCORE: f64 = 0.8;

/// Scores at or inside this band are labelled neutral.
const NEUTRAL_BAND: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Score `text` in -0.8..0.8 from the distinct positive and negative
/// keywords it contains.
pub fn lexicon_score(text: &str) -> Decimal {
    let lowered = text.to_lowercase();
    let words: HashSet<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let pos = POSITIVE.iter().filter(|w| words.contains(*w)).count();
    let neg = NEGATIVE.iter().filter(|w| words.contains(*w)).count();

    let magnitude = |n: usize| (n as f64 / (pos + neg + 1) as f64).min(MAX_LEXICON_SCORE);
    let score = match pos.cmp(&neg) {
        std::cmp::Ordering::Greater => magnitude(pos),
        std::cmp::Ordering::Less => -magnitude(neg),
        std::cmp::Ordering::Equal => 0.0,
    };

    Decimal::from_f64(score)
        .map(|d| d.round_dp(4))
        .unwrap_or(Decimal::ZERO)
}

/// Clamp a provider score into -1..1.
pub fn clamp_score(score: Decimal) -> Decimal {
    score.clamp(Decimal::NEGATIVE_ONE, Decimal::ONE)
}

/// `positive`, `negative` or `neutral`.
pub fn label(score: Decimal) -> &'static str {
    if score > NEUTRAL_BAND {
        "positive"
    } else if score < -NEUTRAL_BAND {
        "negative"
    } else {
        "neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_headline() {
        // two positive words, no negative: 2 / 3
        let score = lexicon_score("Apple shares surge after strong quarter");
        assert_eq!(score, dec!(0.6667));
    }

    #[test]
    fn test_negative_headline() {
        let score = lexicon_score("Analysts downgrade stock on weak guidance");
        assert_eq!(score, dec!(-0.6667));
    }

    #[test]
    fn test_score_is_capped() {
        let score = lexicon_score("Record profit, strong growth, bullish rally, upgrade");
        assert_eq!(score, dec!(0.8));
    }

    #[test]
    fn test_balanced_and_empty_text_is_neutral() {
        assert_eq!(lexicon_score("Profit offset by loss"), Decimal::ZERO);
        assert_eq!(lexicon_score(""), Decimal::ZERO);
    }

    #[test]
    fn test_matches_whole_words_only() {
        // "upbeat" and "download" must not count as "up" and "down"
        assert_eq!(lexicon_score("Upbeat download numbers"), Decimal::ZERO);
    }

    #[test]
    fn test_labels() {
        assert_eq!(label(dec!(0.35)), "positive");
        assert_eq!(label(dec!(0.1)), "neutral");
        assert_eq!(label(dec!(-0.05)), "neutral");
        assert_eq!(label(dec!(-0.2)), "negative");
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(dec!(1.7)), dec!(1));
        assert_eq!(clamp_score(dec!(-3)), dec!(-1));
        assert_eq!(clamp_score(dec!(0.25)), dec!(0.25));
    }
}
