// PostStore trait: backend-agnostic async interface for persistence.
//
// The storage client is built by the entry point (CLI or web server) and
// handed to whatever needs it as `Arc<dyn PostStore>`. Methods are async
// so a sync backend (rusqlite behind a Mutex) and a native async one fit
// the same interface.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{ExtractionRun, LabelCount, PostFilter, StoredPost};
use crate::pipeline::extract::{ClassifiedPost, ExtractionStats};
use crate::pipeline::store::StorageSummary;

#[async_trait]
pub trait PostStore: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Classified posts ---

    /// Save a classified post. Re-storing the same id replaces the row.
    async fn insert_post(&self, post: &ClassifiedPost) -> Result<()>;

    /// List stored posts, highest confidence first.
    async fn get_posts(&self, filter: &PostFilter) -> Result<Vec<StoredPost>>;

    /// Look up one stored post by id.
    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>>;

    /// Total number of stored posts.
    async fn post_count(&self) -> Result<i64>;

    /// Stored posts per hazard category, most frequent first.
    async fn category_counts(&self) -> Result<Vec<LabelCount>>;

    /// Stored posts per urgency level, most frequent first.
    async fn urgency_counts(&self) -> Result<Vec<LabelCount>>;

    // --- Extraction runs ---

    /// Record a finished extraction batch and return its ID.
    async fn insert_run(
        &self,
        profile: Option<&str>,
        stats: &ExtractionStats,
        storage: &StorageSummary,
    ) -> Result<i64>;

    /// Most recent extraction runs, newest first.
    async fn get_recent_runs(&self, limit: u32) -> Result<Vec<ExtractionRun>>;
}
