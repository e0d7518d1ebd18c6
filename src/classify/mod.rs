// Hazard classification: rule table, keyword classifier, sentiment scorer,
// text cleaning, and the risk-estimation seam.

pub mod clean;
pub mod hazard;
pub mod risk;
pub mod rules;
pub mod sentiment;

pub use hazard::{ClassificationInput, ClassificationResult, HazardClassifier, Urgency};
pub use rules::{HazardCategoryRule, RuleTable, ScoringConstants, DEFAULT_PROFILE, GENERAL_CATEGORY};
pub use sentiment::{SentimentLabel, SentimentLexicon, SentimentResult, SentimentScorer};
