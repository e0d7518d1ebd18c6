// Batch extraction pipeline: clean -> classify -> sentiment -> risk.
//
// Takes raw social posts supplied by the caller (no live ingestion), runs
// each one through the classifier for its platform's profile, and builds
// summary statistics over the batch. Processing is synchronous and pure;
// output order always equals input order.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::clean::clean_text;
use crate::classify::risk::{ConfidenceEstimator, RiskEstimator};
use crate::classify::{
    ClassificationInput, ClassificationResult, HazardClassifier, RuleTable, SentimentResult,
    SentimentScorer, Urgency, DEFAULT_PROFILE,
};

/// Posts above this confidence count as hazard-related.
pub const HAZARD_THRESHOLD: f64 = 0.5;
/// Posts above this confidence count as high-confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;
/// High-urgency posts at or above this confidence are high priority.
pub const HIGH_PRIORITY_CONFIDENCE: f64 = 0.7;
/// Interactions at which a post's virality index saturates.
const VIRALITY_SATURATION: f64 = 1000.0;

/// Source platform of a post. Unknown platforms deserialize as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Instagram,
    Reddit,
    #[default]
    #[serde(other)]
    Other,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Instagram => "instagram",
            Platform::Reddit => "reddit",
            Platform::Other => "other",
        }
    }

    /// The scoring profile named after this platform.
    pub fn default_profile(&self) -> &'static str {
        match self {
            Platform::Other => DEFAULT_PROFILE,
            platform => platform.as_str(),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    /// Accepts `lng` as well, the spelling most map widgets use
    #[serde(alias = "lng")]
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Engagement {
    pub likes: u64,
    #[serde(alias = "retweets")]
    pub shares: u64,
    #[serde(alias = "comments")]
    pub replies: u64,
}

impl Engagement {
    pub fn total(&self) -> u64 {
        self.likes + self.shares + self.replies
    }

    /// Reach proxy in [0, 1]: total interactions over 1000, capped.
    pub fn virality_index(&self) -> f64 {
        (self.total() as f64 / VIRALITY_SATURATION).min(1.0)
    }
}

/// A social post as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    /// Generated as `{platform}_{millis}_{n}` when empty
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default, alias = "user", alias = "username")]
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Subreddit, channel, or other origin hint
    #[serde(default, alias = "subreddit", skip_serializing_if = "Option::is_none")]
    pub source_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub engagement: Engagement,
}

impl RawPost {
    pub fn new(platform: Platform, text: impl Into<String>) -> Self {
        Self {
            platform,
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Triage level derived from classification confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Low,
    Medium,
    High,
}

impl Criticality {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > HIGH_CONFIDENCE_THRESHOLD {
            Criticality::High
        } else if confidence > HAZARD_THRESHOLD {
            Criticality::Medium
        } else {
            Criticality::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Criticality::Low => "low",
            Criticality::Medium => "medium",
            Criticality::High => "high",
        }
    }
}

/// A post with everything the pipeline derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPost {
    #[serde(flatten)]
    pub post: RawPost,
    pub cleaned_text: String,
    /// Scoring profile that classified this post
    pub profile: String,
    pub classification: ClassificationResult,
    pub sentiment: SentimentResult,
    /// RiskEstimator output, 0.0 to 1.0
    pub risk: f64,
    pub verified: bool,
    pub criticality: Criticality,
    /// Engagement-based reach, 0.0 to 1.0
    pub virality: f64,
}

impl ClassifiedPost {
    pub fn is_hazard(&self) -> bool {
        self.classification.confidence > HAZARD_THRESHOLD
    }

    /// High urgency backed by a confident classification.
    pub fn is_high_priority(&self) -> bool {
        self.classification.urgency == Urgency::High
            && self.classification.confidence >= HIGH_PRIORITY_CONFIDENCE
    }
}

/// Summary counts over one extraction batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_posts: usize,
    pub hazard_posts: usize,
    pub high_confidence: usize,
    pub high_priority: usize,
    pub verified: usize,
    pub geotagged: usize,
    pub average_confidence: f64,
    pub average_virality: f64,
    pub by_category: BTreeMap<String, usize>,
    pub by_urgency: BTreeMap<String, usize>,
    pub by_platform: BTreeMap<String, usize>,
    /// Counts per sentiment label (positive / neutral / negative)
    pub by_sentiment: BTreeMap<String, usize>,
}

impl ExtractionStats {
    pub fn from_posts(posts: &[ClassifiedPost]) -> Self {
        let mut stats = Self {
            total_posts: posts.len(),
            ..Self::default()
        };
        let mut confidence_sum = 0.0;
        let mut virality_sum = 0.0;

        for post in posts {
            let confidence = post.classification.confidence;
            confidence_sum += confidence;
            virality_sum += post.virality;
            if post.is_hazard() {
                stats.hazard_posts += 1;
            }
            if confidence > HIGH_CONFIDENCE_THRESHOLD {
                stats.high_confidence += 1;
            }
            if post.is_high_priority() {
                stats.high_priority += 1;
            }
            if post.verified {
                stats.verified += 1;
            }
            if post.post.location.is_some() {
                stats.geotagged += 1;
            }
            *stats
                .by_category
                .entry(post.classification.category.clone())
                .or_default() += 1;
            *stats
                .by_urgency
                .entry(post.classification.urgency.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_platform
                .entry(post.post.platform.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_sentiment
                .entry(post.sentiment.label().as_str().to_string())
                .or_default() += 1;
        }

        if !posts.is_empty() {
            stats.average_confidence = confidence_sum / posts.len() as f64;
            stats.average_virality = virality_sum / posts.len() as f64;
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub posts: Vec<ClassifiedPost>,
    pub stats: ExtractionStats,
}

static POST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn generate_post_id(platform: Platform) -> String {
    let n = POST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}_{}", platform, Utc::now().timestamp_millis(), n)
}

/// Classifies batches of posts using per-platform profiles from a rule table.
#[derive(Clone)]
pub struct ExtractionPipeline {
    classifiers: HashMap<String, HazardClassifier>,
    scorer: SentimentScorer,
    estimator: Arc<dyn RiskEstimator>,
    /// When set, every post uses this profile regardless of platform
    forced_profile: Option<String>,
}

impl ExtractionPipeline {
    /// Build one classifier per profile in the table.
    pub fn new(table: &RuleTable) -> Result<Self> {
        let mut classifiers = HashMap::new();
        for name in table.profile_names() {
            classifiers.insert(name.to_string(), table.classifier(name)?);
        }
        if !classifiers.contains_key(DEFAULT_PROFILE) {
            let constants = crate::classify::ScoringConstants::default();
            classifiers.insert(
                DEFAULT_PROFILE.to_string(),
                HazardClassifier::new(table.rules_for(&constants), constants),
            );
        }

        Ok(Self {
            classifiers,
            scorer: SentimentScorer::new(&table.sentiment),
            estimator: Arc::new(ConfidenceEstimator::default()),
            forced_profile: None,
        })
    }

    /// Force a single profile for every post. Fails on an unknown name.
    pub fn with_profile(mut self, profile: &str) -> Result<Self> {
        let key = profile.trim().to_lowercase();
        if !self.classifiers.contains_key(&key) {
            let mut names: Vec<&str> = self.classifiers.keys().map(String::as_str).collect();
            names.sort_unstable();
            anyhow::bail!(
                "Unknown profile '{profile}'. Available profiles: {}",
                names.join(", ")
            );
        }
        self.forced_profile = Some(key);
        Ok(self)
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn RiskEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Classifier for a named profile (case-insensitive).
    pub fn classifier(&self, profile: &str) -> Option<&HazardClassifier> {
        self.classifiers.get(&profile.trim().to_lowercase())
    }

    pub fn scorer(&self) -> &SentimentScorer {
        &self.scorer
    }

    /// Profile a post will be classified with: the forced profile, else the
    /// platform's profile if the table has one, else `default`.
    fn profile_for(&self, platform: Platform) -> &str {
        if let Some(ref forced) = self.forced_profile {
            return forced;
        }
        let name = platform.default_profile();
        if self.classifiers.contains_key(name) {
            name
        } else {
            DEFAULT_PROFILE
        }
    }

    /// Classify a single post.
    pub fn process(&self, mut post: RawPost) -> ClassifiedPost {
        if post.id.trim().is_empty() {
            post.id = generate_post_id(post.platform);
        }

        let profile = self.profile_for(post.platform).to_string();
        let classifier = &self.classifiers[&profile];

        let cleaned_text = clean_text(&post.text);
        let input = ClassificationInput {
            text: cleaned_text.clone(),
            auxiliary_tags: post.hashtags.clone(),
            source_context: post.source_context.clone(),
        };
        let classification = classifier.classify(&input);
        let sentiment = self.scorer.score(&cleaned_text);

        let risk = self
            .estimator
            .estimate(&classification, &sentiment)
            .clamp(0.0, 1.0);
        let verified = risk > classifier.constants().verify_threshold;
        let criticality = Criticality::from_confidence(classification.confidence);
        let virality = post.engagement.virality_index();

        debug!(
            id = %post.id,
            profile = %profile,
            category = %classification.category,
            confidence = classification.confidence,
            "Post classified"
        );

        ClassifiedPost {
            post,
            cleaned_text,
            profile,
            classification,
            sentiment,
            risk,
            verified,
            criticality,
            virality,
        }
    }

    /// Classify a batch. Output order equals input order.
    pub fn run(&self, posts: Vec<RawPost>) -> ExtractionReport {
        self.run_with_progress(posts, |_| {})
    }

    /// Like `run`, calling `on_post` after each post is classified.
    pub fn run_with_progress<F>(&self, posts: Vec<RawPost>, mut on_post: F) -> ExtractionReport
    where
        F: FnMut(&ClassifiedPost),
    {
        let posts: Vec<ClassifiedPost> = posts
            .into_iter()
            .map(|p| {
                let classified = self.process(p);
                on_post(&classified);
                classified
            })
            .collect();
        let stats = ExtractionStats::from_posts(&posts);

        info!(
            total = stats.total_posts,
            hazard = stats.hazard_posts,
            high_confidence = stats.high_confidence,
            high_priority = stats.high_priority,
            verified = stats.verified,
            "Extraction complete"
        );

        ExtractionReport { posts, stats }
    }

    /// Run a batch with an optional one-off profile override.
    pub fn run_as(&self, posts: Vec<RawPost>, profile: Option<&str>) -> Result<ExtractionReport> {
        match profile {
            Some(name) => Ok(self.clone().with_profile(name)?.run(posts)),
            None => Ok(self.run(posts)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> ExtractionPipeline {
        ExtractionPipeline::new(&RuleTable::builtin()).unwrap()
    }

    #[test]
    fn test_output_order_matches_input() {
        let posts = vec![
            RawPost::new(Platform::Twitter, "Nice beach day"),
            RawPost::new(Platform::Twitter, "Tsunami warning issued, evacuation now"),
            RawPost::new(Platform::Reddit, "Oil spill near the harbor"),
        ];
        let report = pipeline().run(posts.clone());
        assert_eq!(report.posts.len(), 3);
        for (raw, classified) in posts.iter().zip(&report.posts) {
            assert_eq!(raw.text, classified.post.text);
        }
        assert_eq!(report.posts[0].classification.category, "General");
        assert_eq!(report.posts[1].classification.category, "Tsunami");
        assert_eq!(report.posts[2].classification.category, "Oil Spill");
    }

    #[test]
    fn test_platform_selects_profile() {
        let report = pipeline().run(vec![
            RawPost::new(Platform::Twitter, "flood"),
            RawPost::new(Platform::Instagram, "flood"),
            RawPost::new(Platform::Reddit, "flood"),
            RawPost::new(Platform::Other, "flood"),
        ]);
        let profiles: Vec<&str> = report.posts.iter().map(|p| p.profile.as_str()).collect();
        assert_eq!(profiles, vec!["twitter", "instagram", "reddit", "default"]);
    }

    #[test]
    fn test_forced_profile_overrides_platform() {
        let pipeline = pipeline().with_profile("Reddit").unwrap();
        let post = pipeline.process(RawPost::new(Platform::Twitter, "flood"));
        assert_eq!(post.profile, "reddit");
        assert!(self::pipeline().with_profile("mastodon").is_err());
    }

    #[test]
    fn test_missing_id_is_generated() {
        let post = pipeline().process(RawPost::new(Platform::Twitter, "calm seas"));
        assert!(post.post.id.starts_with("twitter_"));

        let mut raw = RawPost::new(Platform::Twitter, "calm seas");
        raw.id = "keep-me".to_string();
        assert_eq!(pipeline().process(raw).post.id, "keep-me");
    }

    #[test]
    fn test_cleaning_feeds_classification() {
        let post = pipeline().process(RawPost::new(
            Platform::Twitter,
            "RT @coastguard Tsunami alert!!! https://t.co/x",
        ));
        assert_eq!(post.cleaned_text, "Tsunami alert!");
        assert_eq!(post.classification.category, "Tsunami");
    }

    #[test]
    fn test_general_post_is_never_verified() {
        let post = pipeline().process(RawPost::new(Platform::Twitter, "lovely sunset"));
        assert!(post.classification.is_general());
        assert_eq!(post.risk, 0.0);
        assert!(!post.verified);
        assert_eq!(post.criticality, Criticality::Low);
    }

    #[test]
    fn test_custom_estimator_drives_verification() {
        struct AlwaysRisky;
        impl RiskEstimator for AlwaysRisky {
            fn estimate(&self, _: &ClassificationResult, _: &SentimentResult) -> f64 {
                1.0
            }
        }
        let pipeline = pipeline().with_estimator(Arc::new(AlwaysRisky));
        let post = pipeline.process(RawPost::new(Platform::Twitter, "lovely sunset"));
        assert!(post.verified);
    }

    #[test]
    fn test_criticality_thresholds() {
        assert_eq!(Criticality::from_confidence(0.81), Criticality::High);
        assert_eq!(Criticality::from_confidence(0.8), Criticality::Medium);
        assert_eq!(Criticality::from_confidence(0.51), Criticality::Medium);
        assert_eq!(Criticality::from_confidence(0.5), Criticality::Low);
    }

    #[test]
    fn test_stats_counts() {
        let mut geotagged = RawPost::new(Platform::Twitter, "tsunami tidal wave seismic wave alert");
        geotagged.location = Some(GeoPoint {
            lat: 13.08,
            lon: 80.27,
            address: None,
        });
        let report = pipeline().run(vec![
            geotagged,
            RawPost::new(Platform::Twitter, "quiet day"),
        ]);
        let stats = &report.stats;
        assert_eq!(stats.total_posts, 2);
        assert_eq!(stats.geotagged, 1);
        assert_eq!(stats.hazard_posts, 1);
        assert_eq!(stats.by_category.get("Tsunami"), Some(&1));
        assert_eq!(stats.by_category.get("General"), Some(&1));
        assert_eq!(stats.by_urgency.values().sum::<usize>(), 2);
    }

    #[test]
    fn test_stats_breakdowns() {
        let mut viral = RawPost::new(Platform::Twitter, "tsunami warning: evacuation ordered");
        viral.engagement = Engagement {
            likes: 900,
            shares: 500,
            replies: 100,
        };
        let mut quiet = RawPost::new(Platform::Reddit, "help arrived, everyone safe");
        quiet.engagement.likes = 250;

        let report = pipeline().run(vec![viral, quiet]);
        let stats = &report.stats;

        // tsunami + warning, evacuation: 0.4 + 2 * 0.2 = 0.8, but only medium urgency
        assert_eq!(stats.high_priority, 0);
        assert_eq!(stats.by_platform.get("twitter"), Some(&1));
        assert_eq!(stats.by_platform.get("reddit"), Some(&1));
        assert_eq!(stats.by_sentiment.get("positive"), Some(&1));
        assert_eq!(stats.by_sentiment.values().sum::<usize>(), 2);

        assert_eq!(report.posts[0].virality, 1.0);
        assert!((report.posts[1].virality - 0.25).abs() < 1e-9);
        assert!((stats.average_virality - 0.625).abs() < 1e-9);
    }

    #[test]
    fn test_high_priority_needs_urgency_and_confidence() {
        let post = pipeline().process(RawPost::new(
            Platform::Twitter,
            "tsunami tidal wave warning: emergency evacuation",
        ));
        assert_eq!(post.classification.urgency, Urgency::High);
        assert!(post.classification.confidence >= HIGH_PRIORITY_CONFIDENCE);
        assert!(post.is_high_priority());
        assert_eq!(ExtractionStats::from_posts(&[post]).high_priority, 1);

        let calm = pipeline().process(RawPost::new(Platform::Twitter, "tidal wave"));
        assert!(!calm.is_high_priority());
    }

    #[test]
    fn test_progress_callback_sees_every_post() {
        let mut seen = Vec::new();
        let report = pipeline().run_with_progress(
            vec![
                RawPost::new(Platform::Twitter, "flood"),
                RawPost::new(Platform::Reddit, "calm"),
            ],
            |post| seen.push(post.post.text.clone()),
        );
        assert_eq!(seen, vec!["flood".to_string(), "calm".to_string()]);
        assert_eq!(report.stats.total_posts, 2);
    }

    #[test]
    fn test_virality_index_saturates() {
        let mut engagement = Engagement::default();
        assert_eq!(engagement.virality_index(), 0.0);
        engagement.likes = 400;
        engagement.replies = 100;
        assert!((engagement.virality_index() - 0.5).abs() < 1e-9);
        engagement.shares = 10_000;
        assert_eq!(engagement.virality_index(), 1.0);
    }

    #[test]
    fn test_raw_post_accepts_aliases() {
        let json = r#"{
            "platform": "reddit",
            "user": "u/coastie",
            "text": "Flooding on the promenade",
            "subreddit": "r/weather",
            "location": {"lat": 19.07, "lng": 72.87},
            "engagement": {"likes": 3, "comments": 2}
        }"#;
        let post: RawPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.platform, Platform::Reddit);
        assert_eq!(post.author, "u/coastie");
        assert_eq!(post.source_context.as_deref(), Some("r/weather"));
        assert_eq!(post.location.unwrap().lon, 72.87);
        assert_eq!(post.engagement.replies, 2);

        let other: RawPost = serde_json::from_str(r#"{"platform": "facebook", "text": "x"}"#).unwrap();
        assert_eq!(other.platform, Platform::Other);
    }
}
