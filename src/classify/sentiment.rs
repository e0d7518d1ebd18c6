// Lexicon-based sentiment scoring.
//
// Whitespace tokens are compared exactly against a positive and a negative
// word list. The net count per token is scaled by 10 and clamped, so a
// single emotive word in a short post saturates the score.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Scores outside this band around zero get a positive/negative label.
const NEUTRAL_BAND: f64 = 0.1;

/// Positive and negative word lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentLexicon {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        let words = |list: &[&str]| -> Vec<String> { list.iter().map(|w| w.to_string()).collect() };
        Self {
            positive: words(&[
                "safe", "rescued", "help", "support", "recovery", "relief", "update",
            ]),
            negative: words(&[
                "danger",
                "emergency",
                "disaster",
                "damage",
                "destroy",
                "evacuate",
                "warning",
                "alert",
                "devastating",
                "crisis",
                "breaking",
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// -1.0 (negative) to 1.0 (positive)
    pub score: f64,
}

impl SentimentResult {
    pub fn neutral() -> Self {
        Self { score: 0.0 }
    }

    pub fn label(&self) -> SentimentLabel {
        if self.score > NEUTRAL_BAND {
            SentimentLabel::Positive
        } else if self.score < -NEUTRAL_BAND {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentimentScorer {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new(&SentimentLexicon::default())
    }
}

impl SentimentScorer {
    pub fn new(lexicon: &SentimentLexicon) -> Self {
        let normalize = |words: &[String]| -> HashSet<String> {
            words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            positive: normalize(&lexicon.positive),
            negative: normalize(&lexicon.negative),
        }
    }

    /// Score a text. Empty or whitespace-only text is neutral (0.0).
    pub fn score(&self, text: &str) -> SentimentResult {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        if tokens.is_empty() {
            return SentimentResult::neutral();
        }

        let net: i64 = tokens
            .iter()
            .map(|token| {
                let mut delta = 0;
                if self.positive.contains(*token) {
                    delta += 1;
                }
                if self.negative.contains(*token) {
                    delta -= 1;
                }
                delta
            })
            .sum();

        let score = (net as f64 / tokens.len() as f64 * 10.0).clamp(-1.0, 1.0);
        SentimentResult { score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_words_saturate() {
        let scorer = SentimentScorer::default();
        assert_eq!(scorer.score("help safe rescued").score, 1.0);
    }

    #[test]
    fn test_negative_words_saturate() {
        let scorer = SentimentScorer::default();
        assert_eq!(scorer.score("danger emergency disaster").score, -1.0);
    }

    #[test]
    fn test_long_text_is_diluted() {
        let scorer = SentimentScorer::default();
        // one negative word in 20 tokens: -1/20 * 10 = -0.5
        let text = format!("damage {}", vec!["calm"; 19].join(" "));
        assert!((scorer.score(&text).score + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_punctuation_blocks_exact_match() {
        let scorer = SentimentScorer::default();
        assert_eq!(scorer.score("danger!").score, 0.0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(SentimentResult { score: 0.5 }.label(), SentimentLabel::Positive);
        assert_eq!(SentimentResult { score: 0.1 }.label(), SentimentLabel::Neutral);
        assert_eq!(SentimentResult { score: -0.11 }.label(), SentimentLabel::Negative);
    }

    #[test]
    fn test_custom_lexicon() {
        let lexicon = SentimentLexicon {
            positive: vec!["Calm".to_string()],
            negative: vec![],
        };
        let scorer = SentimentScorer::new(&lexicon);
        assert_eq!(scorer.score("CALM seas").score, 1.0);
        assert_eq!(scorer.score("danger").score, 0.0);
    }
}
