// Hazard rule table: category vocabulary plus per-deployment scoring profiles.
//
// One table of hazard categories is shared by every deployment. Each named
// profile (twitter, instagram, reddit, default) carries its own scoring
// constants and may add vocabulary on top of the shared categories, so the
// platform-specific variants are configuration rather than separate code.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::hazard::HazardClassifier;
use super::sentiment::SentimentLexicon;

/// Category reported when no rule matches.
pub const GENERAL_CATEGORY: &str = "General";

/// Profile used when nothing more specific is configured.
pub const DEFAULT_PROFILE: &str = "default";

/// A single hazard category and the vocabulary that signals it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardCategoryRule {
    pub name: String,
    /// Primary keywords/phrases, matched as lower-case substrings
    pub keywords: Vec<String>,
    /// Phrases that indicate the situation is escalating
    #[serde(default)]
    pub urgency_keywords: Vec<String>,
    /// Severity prior in (0, 1]
    pub weight: f64,
}

impl HazardCategoryRule {
    pub fn new(name: &str, keywords: &[&str], urgency_keywords: &[&str], weight: f64) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            urgency_keywords: urgency_keywords.iter().map(|k| k.to_string()).collect(),
            weight,
        }
    }
}

/// Scoring constants for one deployment profile.
///
/// `confidence = min((keyword_matches * keyword_weight
///     + urgency_matches * urgency_weight + context prior) * rule.weight, 1.0)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConstants {
    /// Contribution of each matched keyword (K1)
    pub keyword_weight: f64,
    /// Contribution of each matched urgency keyword (K2)
    pub urgency_weight: f64,
    /// Urgency matches strictly above this count escalate to high
    pub high_urgency_threshold: usize,
    /// Any of these anywhere in the text escalates a matched hazard to high
    pub emergency_markers: Vec<String>,
    /// When true, a rule needs at least one keyword match to be a candidate
    pub require_keyword_match: bool,
    /// Multiplier applied to the source-context prior (0 disables priors)
    pub context_weight: f64,
    /// Source context (subreddit, channel) to prior, keys lower-case
    pub context_priors: BTreeMap<String, f64>,
    /// Prior for a source context missing from `context_priors`
    pub default_context_prior: f64,
    /// Risk estimate above which a post counts as verified
    pub verify_threshold: f64,
    /// Extra keywords per category name for this deployment
    pub extra_keywords: BTreeMap<String, Vec<String>>,
    /// Extra urgency keywords added to every category
    pub shared_urgency_keywords: Vec<String>,
}

impl Default for ScoringConstants {
    fn default() -> Self {
        Self {
            keyword_weight: 0.4,
            urgency_weight: 0.2,
            high_urgency_threshold: 2,
            emergency_markers: strings(&[
                "emergency",
                "immediate",
                "urgent",
                "breaking",
                "evacuate",
                "evacuation",
            ]),
            require_keyword_match: true,
            context_weight: 0.0,
            context_priors: BTreeMap::new(),
            default_context_prior: 0.0,
            verify_threshold: 0.7,
            extra_keywords: BTreeMap::new(),
            shared_urgency_keywords: Vec::new(),
        }
    }
}

impl ScoringConstants {
    /// Twitter/X: keyword-heavy scoring, escalation on "emergency"/"immediate".
    pub fn twitter() -> Self {
        Self {
            emergency_markers: strings(&["emergency", "immediate"]),
            ..Self::default()
        }
    }

    /// Instagram: short captions and hashtags, so single-word vocabulary and
    /// urgency that only affects the level, never the confidence.
    pub fn instagram() -> Self {
        let extra_keywords = [
            ("Tsunami", &["seismic", "wave", "earthquake"][..]),
            ("Cyclone", &["winds"][..]),
            ("Flooding", &["water", "inundation", "surge"][..]),
            ("Oil Spill", &["oil", "spill", "pollution", "contamination"][..]),
            ("Coastal Erosion", &["beach", "shoreline", "damage"][..]),
        ]
        .into_iter()
        .map(|(name, words)| (name.to_string(), strings(words)))
        .collect();

        Self {
            keyword_weight: 0.3,
            urgency_weight: 0.0,
            emergency_markers: strings(&["emergency", "urgent"]),
            verify_threshold: 0.6,
            extra_keywords,
            shared_urgency_keywords: strings(&["warning", "alert"]),
            ..Self::default()
        }
    }

    /// Reddit: the subreddit a post came from acts as a prior.
    pub fn reddit() -> Self {
        let context_priors = [
            ("weather", 0.8),
            ("naturaldisasters", 0.9),
            ("tsunami", 1.0),
            ("hurricane", 0.9),
            ("flooding", 0.8),
            ("environment", 0.6),
            ("india", 0.5),
            ("mumbai", 0.6),
            ("chennai", 0.6),
            ("kerala", 0.6),
        ]
        .into_iter()
        .map(|(sub, prior)| (sub.to_string(), prior))
        .collect();

        Self {
            keyword_weight: 0.25,
            urgency_weight: 0.2,
            emergency_markers: strings(&["emergency", "breaking"]),
            context_weight: 0.5,
            context_priors,
            default_context_prior: 0.3,
            shared_urgency_keywords: strings(&["warning", "alert"]),
            ..Self::default()
        }
    }

    /// Prior contributed by the post's source context, already scaled by
    /// `context_weight`. Zero when priors are disabled.
    pub fn context_prior(&self, source_context: Option<&str>) -> f64 {
        if self.context_weight <= 0.0 {
            return 0.0;
        }
        let prior = source_context
            .map(context_key)
            .and_then(|key| self.context_priors.get(&key).copied())
            .unwrap_or(self.default_context_prior);
        prior * self.context_weight
    }

    /// Rewrite `context_priors` keys into the form `context_prior` looks up.
    /// Two keys that normalize to the same context are rejected.
    fn normalize_context_keys(&mut self, profile: &str) -> Result<()> {
        let mut normalized = BTreeMap::new();
        for (context, prior) in std::mem::take(&mut self.context_priors) {
            let key = context_key(&context);
            if key.is_empty() {
                anyhow::bail!("Profile '{profile}': context prior with an empty key");
            }
            if normalized.insert(key.clone(), prior).is_some() {
                anyhow::bail!("Profile '{profile}': context '{context}' is defined more than once as '{key}'");
            }
        }
        self.context_priors = normalized;
        Ok(())
    }

    fn validate(&self, profile: &str, rules: &[HazardCategoryRule]) -> Result<()> {
        let non_negative = [
            ("keyword_weight", self.keyword_weight),
            ("urgency_weight", self.urgency_weight),
            ("context_weight", self.context_weight),
            ("default_context_prior", self.default_context_prior),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("Profile '{profile}': {field} must be a non-negative number, got {value}");
            }
        }

        if !(0.0..=1.0).contains(&self.verify_threshold) {
            anyhow::bail!(
                "Profile '{profile}': verify_threshold must be within [0, 1], got {}",
                self.verify_threshold
            );
        }

        for (context, prior) in &self.context_priors {
            if !prior.is_finite() || *prior < 0.0 {
                anyhow::bail!("Profile '{profile}': context prior for '{context}' must be non-negative");
            }
        }

        if self.emergency_markers.iter().any(|m| m.trim().is_empty())
            || self.shared_urgency_keywords.iter().any(|k| k.trim().is_empty())
        {
            anyhow::bail!("Profile '{profile}': marker and keyword lists cannot contain empty strings");
        }

        for (category, words) in &self.extra_keywords {
            // Built-in profiles carry vocabulary for the built-in categories;
            // a custom table without them simply never uses it.
            if !rules.iter().any(|r| r.name.eq_ignore_ascii_case(category)) {
                debug!(profile, category = %category, "Extra keywords for unknown category ignored");
            }
            if words.iter().any(|w| w.trim().is_empty()) {
                anyhow::bail!("Profile '{profile}': extra keywords for '{category}' contain an empty string");
            }
        }

        Ok(())
    }
}

/// The full classification configuration: categories, profiles, and the
/// sentiment lexicon. Loaded once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTable {
    /// Hazard categories in declaration order (earlier wins ties)
    pub rules: Vec<HazardCategoryRule>,
    #[serde(default = "builtin_profiles")]
    pub profiles: BTreeMap<String, ScoringConstants>,
    #[serde(default)]
    pub sentiment: SentimentLexicon,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleTable {
    /// The built-in table covering the five coastal hazard categories.
    pub fn builtin() -> Self {
        Self {
            rules: builtin_rules(),
            profiles: builtin_profiles(),
            sentiment: SentimentLexicon::default(),
        }
    }

    /// Load a rule table from a JSON file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule table at {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid rule table in {}", path.display()))
    }

    /// Parse and validate a rule table. A missing `default` profile is filled
    /// in with the built-in default constants.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut table: RuleTable =
            serde_json::from_str(json).context("Failed to parse rule table JSON")?;

        let mut profiles = BTreeMap::new();
        for (name, mut constants) in std::mem::take(&mut table.profiles) {
            let key = name.trim().to_lowercase();
            constants.normalize_context_keys(&key)?;
            if profiles.insert(key.clone(), constants).is_some() {
                anyhow::bail!("Profile '{name}' is defined more than once as '{key}'");
            }
        }
        table.profiles = profiles;
        table
            .profiles
            .entry(DEFAULT_PROFILE.to_string())
            .or_default();
        table.validate()?;
        Ok(table)
    }

    /// Check the invariants the classifier relies on.
    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            anyhow::bail!("Rule table has no hazard categories");
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            let name = rule.name.trim();
            if name.is_empty() {
                anyhow::bail!("Hazard category with an empty name");
            }
            if name.eq_ignore_ascii_case(GENERAL_CATEGORY) {
                anyhow::bail!("'{GENERAL_CATEGORY}' is reserved for unmatched text");
            }
            if !seen.insert(name.to_lowercase()) {
                anyhow::bail!("Duplicate hazard category '{name}'");
            }
            if rule.keywords.is_empty() {
                anyhow::bail!("Hazard category '{name}' has no keywords");
            }
            if rule
                .keywords
                .iter()
                .chain(&rule.urgency_keywords)
                .any(|k| k.trim().is_empty())
            {
                anyhow::bail!("Hazard category '{name}' has an empty keyword");
            }
            if !(rule.weight > 0.0 && rule.weight <= 1.0) {
                anyhow::bail!(
                    "Hazard category '{name}' weight must be within (0, 1], got {}",
                    rule.weight
                );
            }
        }

        for (profile, constants) in &self.profiles {
            constants.validate(profile, &self.rules)?;
        }

        Ok(())
    }

    /// Look up a profile by name (case-insensitive).
    pub fn profile(&self, name: &str) -> Result<&ScoringConstants> {
        let key = name.trim().to_lowercase();
        match self.profiles.get(&key) {
            Some(constants) => Ok(constants),
            None => anyhow::bail!(
                "Unknown profile '{name}'. Available profiles: {}",
                self.profile_names().join(", ")
            ),
        }
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Rules as seen by one profile: the shared vocabulary plus that
    /// profile's extra keywords and shared urgency keywords.
    pub fn rules_for(&self, constants: &ScoringConstants) -> Vec<HazardCategoryRule> {
        self.rules
            .iter()
            .map(|rule| {
                let mut rule = rule.clone();
                if let Some((_, extra)) = constants
                    .extra_keywords
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(&rule.name))
                {
                    rule.keywords.extend(extra.iter().cloned());
                }
                rule.urgency_keywords
                    .extend(constants.shared_urgency_keywords.iter().cloned());
                rule
            })
            .collect()
    }

    /// Build a classifier for the named profile.
    pub fn classifier(&self, profile: &str) -> Result<HazardClassifier> {
        let constants = self.profile(profile)?;
        Ok(HazardClassifier::new(
            self.rules_for(constants),
            constants.clone(),
        ))
    }
}

fn builtin_rules() -> Vec<HazardCategoryRule> {
    vec![
        HazardCategoryRule::new(
            "Tsunami",
            &[
                "tsunami",
                "tidal wave",
                "seismic wave",
                "underwater earthquake",
                "wave surge",
            ],
            &["warning", "alert", "evacuation", "immediate", "emergency"],
            1.0,
        ),
        HazardCategoryRule::new(
            "Cyclone",
            &[
                "cyclone",
                "hurricane",
                "typhoon",
                "storm",
                "wind speed",
                "landfall",
                "eye wall",
                "gale",
            ],
            &["category", "mph", "kmph", "evacuation", "shelter"],
            0.9,
        ),
        HazardCategoryRule::new(
            "Flooding",
            &[
                "flood",
                "flooding",
                "storm surge",
                "ocean flooding",
                "coastal inundation",
                "high tide",
                "waterlogging",
            ],
            &["rising water", "evacuate", "emergency", "rescue"],
            0.8,
        ),
        HazardCategoryRule::new(
            "Oil Spill",
            &[
                "oil spill",
                "marine pollution",
                "crude oil",
                "tanker accident",
                "environmental disaster",
            ],
            &["cleanup", "wildlife", "contamination", "emergency response"],
            0.7,
        ),
        HazardCategoryRule::new(
            "Coastal Erosion",
            &[
                "erosion",
                "coastal damage",
                "shoreline retreat",
                "beach erosion",
                "cliff collapse",
            ],
            &["infrastructure", "property damage", "immediate"],
            0.6,
        ),
    ]
}

fn builtin_profiles() -> BTreeMap<String, ScoringConstants> {
    [
        (DEFAULT_PROFILE, ScoringConstants::default()),
        ("twitter", ScoringConstants::twitter()),
        ("instagram", ScoringConstants::instagram()),
        ("reddit", ScoringConstants::reddit()),
    ]
    .into_iter()
    .map(|(name, constants)| (name.to_string(), constants))
    .collect()
}

/// Lower-case, trimmed, without a leading "r/".
fn context_key(context: &str) -> String {
    let lower = context.trim().to_lowercase();
    lower.strip_prefix("r/").unwrap_or(&lower).to_string()
}

fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
