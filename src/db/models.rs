// Data models: Rust structs that map to database rows.
//
// Kept separate from the queries so the pipeline and web layers can use
// them without depending on rusqlite.

use serde::{Deserialize, Serialize};

use crate::pipeline::extract::ClassifiedPost;

/// A classified post as persisted in `classified_posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: String,
    pub platform: String,
    pub author: String,
    pub text: String,
    pub cleaned_text: String,
    pub hashtags: Vec<String>,
    pub source_context: Option<String>,
    pub profile: String,
    pub category: String,
    pub confidence: f64,
    pub urgency: String,
    pub sentiment: f64,
    pub risk: f64,
    pub verified: bool,
    pub criticality: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub posted_at: Option<String>,
    pub stored_at: String,
}

impl StoredPost {
    /// Flatten a pipeline result into a row. `stored_at` is filled by the DB.
    pub fn from_classified(post: &ClassifiedPost) -> Self {
        let location = post.post.location.as_ref();
        Self {
            id: post.post.id.clone(),
            platform: post.post.platform.as_str().to_string(),
            author: post.post.author.clone(),
            text: post.post.text.clone(),
            cleaned_text: post.cleaned_text.clone(),
            hashtags: post.post.hashtags.clone(),
            source_context: post.post.source_context.clone(),
            profile: post.profile.clone(),
            category: post.classification.category.clone(),
            confidence: post.classification.confidence,
            urgency: post.classification.urgency.as_str().to_string(),
            sentiment: post.sentiment.score,
            risk: post.risk,
            verified: post.verified,
            criticality: post.criticality.as_str().to_string(),
            latitude: location.map(|l| l.lat),
            longitude: location.map(|l| l.lon),
            posted_at: post.post.timestamp.clone(),
            stored_at: String::new(),
        }
    }
}

/// Filters for listing stored posts. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostFilter {
    pub category: Option<String>,
    pub platform: Option<String>,
    pub min_confidence: Option<f64>,
    pub limit: Option<u32>,
}

/// Number of stored posts with a given label (category or urgency).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// One recorded extraction batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRun {
    pub id: i64,
    pub profile: Option<String>,
    pub total_posts: i64,
    pub hazard_posts: i64,
    pub verified: i64,
    pub stored: i64,
    pub failed: i64,
    pub created_at: String,
}
