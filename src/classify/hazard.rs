// Keyword-weighted hazard classification.
//
// Every rule is scored against the lower-cased text (plus hashtags) by
// counting distinct keyword and urgency-keyword substring matches. The rule
// with the strictly highest confidence wins, so ties keep the rule declared
// first and identical input always yields identical output.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::rules::{HazardCategoryRule, ScoringConstants, GENERAL_CATEGORY};

/// Coarse escalation level for a classified post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }

    /// Parse "low" / "medium" / "high" (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of text to classify, with optional auxiliary signals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationInput {
    pub text: String,
    /// Hashtags or other tags, appended to the text before matching
    #[serde(default)]
    pub auxiliary_tags: Vec<String>,
    /// Where the text came from (subreddit, channel, platform)
    #[serde(default)]
    pub source_context: Option<String>,
}

impl ClassificationInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auxiliary_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_context = Some(source.into());
        self
    }

    /// Lower-cased text followed by the space-joined tags.
    pub fn normalized(&self) -> String {
        let mut combined = self.text.clone();
        if !self.auxiliary_tags.is_empty() {
            combined.push(' ');
            combined.push_str(&self.auxiliary_tags.join(" "));
        }
        combined.to_lowercase()
    }
}

/// The winning category for a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// A rule name, or "General" when nothing matched
    pub category: String,
    /// 0.0 to 1.0
    pub confidence: f64,
    pub urgency: Urgency,
    /// Distinct keywords of the winning rule found in the text
    pub keyword_matches: usize,
    /// Distinct urgency keywords of the winning rule found in the text
    pub urgency_matches: usize,
}

impl ClassificationResult {
    /// The unmatched result: General, zero confidence, low urgency.
    pub fn general() -> Self {
        Self {
            category: GENERAL_CATEGORY.to_string(),
            confidence: 0.0,
            urgency: Urgency::Low,
            keyword_matches: 0,
            urgency_matches: 0,
        }
    }

    pub fn is_general(&self) -> bool {
        self.category == GENERAL_CATEGORY
    }
}

/// Rule-based hazard classifier for one deployment profile.
///
/// Vocabulary is lower-cased and de-duplicated at construction, so `classify`
/// is a pure function of its input.
#[derive(Debug, Clone)]
pub struct HazardClassifier {
    rules: Vec<HazardCategoryRule>,
    constants: ScoringConstants,
}

impl HazardClassifier {
    pub fn new(rules: Vec<HazardCategoryRule>, constants: ScoringConstants) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| HazardCategoryRule {
                keywords: normalize_phrases(&rule.keywords),
                urgency_keywords: normalize_phrases(&rule.urgency_keywords),
                ..rule
            })
            .collect();
        let constants = ScoringConstants {
            emergency_markers: normalize_phrases(&constants.emergency_markers),
            ..constants
        };
        Self { rules, constants }
    }

    pub fn rules(&self) -> &[HazardCategoryRule] {
        &self.rules
    }

    pub fn constants(&self) -> &ScoringConstants {
        &self.constants
    }

    /// Classify a single input. Total: any string, including empty, yields a result.
    pub fn classify(&self, input: &ClassificationInput) -> ClassificationResult {
        let text = input.normalized();
        if text.trim().is_empty() {
            return ClassificationResult::general();
        }

        let prior = self
            .constants
            .context_prior(input.source_context.as_deref());

        let mut best: Option<(&HazardCategoryRule, f64, usize, usize)> = None;
        let mut best_confidence = 0.0;

        for rule in &self.rules {
            let keyword_matches = count_matches(&text, &rule.keywords);
            if keyword_matches == 0 && self.constants.require_keyword_match {
                continue;
            }
            let urgency_matches = count_matches(&text, &rule.urgency_keywords);

            let mut raw = keyword_matches as f64 * self.constants.keyword_weight
                + urgency_matches as f64 * self.constants.urgency_weight;
            if keyword_matches > 0 {
                raw += prior;
            }
            let confidence = (raw * rule.weight).clamp(0.0, 1.0);

            // Strictly greater: an equal score never displaces an earlier rule
            if confidence > best_confidence {
                best_confidence = confidence;
                best = Some((rule, confidence, keyword_matches, urgency_matches));
            }
        }

        match best {
            Some((rule, confidence, keyword_matches, urgency_matches)) => ClassificationResult {
                category: rule.name.clone(),
                confidence,
                urgency: self.derive_urgency(&text, urgency_matches),
                keyword_matches,
                urgency_matches,
            },
            None => ClassificationResult::general(),
        }
    }

    /// Convenience wrapper for plain text with no tags or source context.
    pub fn classify_text(&self, text: &str) -> ClassificationResult {
        self.classify(&ClassificationInput::new(text))
    }

    /// Classify each input independently. Output order matches input order.
    pub fn classify_batch(&self, inputs: &[ClassificationInput]) -> Vec<ClassificationResult> {
        inputs.iter().map(|input| self.classify(input)).collect()
    }

    fn derive_urgency(&self, text: &str, urgency_matches: usize) -> Urgency {
        let has_marker = self
            .constants
            .emergency_markers
            .iter()
            .any(|marker| text.contains(marker.as_str()));

        if urgency_matches > self.constants.high_urgency_threshold || has_marker {
            Urgency::High
        } else if urgency_matches > 0 {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }
}

/// Number of distinct phrases that occur as substrings of `text`.
fn count_matches(text: &str, phrases: &[String]) -> usize {
    phrases
        .iter()
        .filter(|phrase| text.contains(phrase.as_str()))
        .count()
}

/// Lower-case, trim, drop empties and duplicates (first occurrence wins).
fn normalize_phrases(phrases: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    phrases
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tsunami_only() -> HazardClassifier {
        HazardClassifier::new(
            vec![HazardCategoryRule::new(
                "Tsunami",
                &["tsunami", "tidal wave"],
                &["evacuation"],
                1.0,
            )],
            ScoringConstants::default(),
        )
    }

    #[test]
    fn test_tsunami_warning_is_high_urgency() {
        let result = tsunami_only().classify_text("Tsunami warning: evacuation ordered now");
        assert_eq!(result.category, "Tsunami");
        // 1 keyword * 0.4 + 1 urgency * 0.2 = 0.6
        assert!((result.confidence - 0.6).abs() < 1e-9, "got {}", result.confidence);
        assert_eq!(result.urgency, Urgency::High);
    }

    #[test]
    fn test_no_match_is_general() {
        let result = tsunami_only().classify_text("Nice sunny day at the beach");
        assert_eq!(result, ClassificationResult::general());
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        let classifier = tsunami_only();
        assert_eq!(classifier.classify_text(""), ClassificationResult::general());
        assert_eq!(classifier.classify_text("   \n\t"), ClassificationResult::general());
    }

    #[test]
    fn test_duplicate_keywords_count_once() {
        let classifier = HazardClassifier::new(
            vec![HazardCategoryRule::new("Tsunami", &["tsunami", "TSUNAMI", " "], &[], 1.0)],
            ScoringConstants::default(),
        );
        assert_eq!(classifier.rules()[0].keywords, vec!["tsunami".to_string()]);
        let result = classifier.classify_text("tsunami tsunami tsunami");
        assert_eq!(result.keyword_matches, 1);
        assert!((result.confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_hashtags_participate_in_matching() {
        let input = ClassificationInput::new("Waves everywhere today").with_tags(["TidalWave", "tsunami"]);
        let result = tsunami_only().classify(&input);
        assert_eq!(result.category, "Tsunami");
        assert_eq!(result.keyword_matches, 1);
    }

    #[test]
    fn test_normalized_appends_tags() {
        let input = ClassificationInput::new("Storm NOW").with_tags(["Alert", "Chennai"]);
        assert_eq!(input.normalized(), "storm now alert chennai");
    }

    #[test]
    fn test_urgency_parse_round_trip() {
        for urgency in [Urgency::Low, Urgency::Medium, Urgency::High] {
            assert_eq!(Urgency::parse(urgency.as_str()), Some(urgency));
        }
        assert_eq!(Urgency::parse("HIGH"), Some(Urgency::High));
        assert_eq!(Urgency::parse("severe"), None);
    }
}
