// SqliteStore: rusqlite backend implementing the PostStore trait.
//
// Connection is !Sync, so it sits behind a tokio::sync::Mutex. Trait methods
// lock, do synchronous rusqlite work, and return; the lock is never held
// across an .await point.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{ExtractionRun, LabelCount, PostFilter, StoredPost};
use super::traits::PostStore;
use crate::pipeline::extract::{ClassifiedPost, ExtractionStats};
use crate::pipeline::store::StorageSummary;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// In-memory store with the schema applied.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl PostStore for SqliteStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn insert_post(&self, post: &ClassifiedPost) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::insert_post(&conn, post)
    }

    async fn get_posts(&self, filter: &PostFilter) -> Result<Vec<StoredPost>> {
        let conn = self.conn.lock().await;
        super::queries::get_posts(&conn, filter)
    }

    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>> {
        let conn = self.conn.lock().await;
        super::queries::get_post(&conn, id)
    }

    async fn post_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::post_count(&conn)
    }

    async fn category_counts(&self) -> Result<Vec<LabelCount>> {
        let conn = self.conn.lock().await;
        super::queries::category_counts(&conn)
    }

    async fn urgency_counts(&self) -> Result<Vec<LabelCount>> {
        let conn = self.conn.lock().await;
        super::queries::urgency_counts(&conn)
    }

    async fn insert_run(
        &self,
        profile: Option<&str>,
        stats: &ExtractionStats,
        storage: &StorageSummary,
    ) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_run(&conn, profile, stats, storage)
    }

    async fn get_recent_runs(&self, limit: u32) -> Result<Vec<ExtractionRun>> {
        let conn = self.conn.lock().await;
        super::queries::get_recent_runs(&conn, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RuleTable;
    use crate::pipeline::extract::{ExtractionPipeline, Platform, RawPost};

    fn classified(id: &str, text: &str) -> ClassifiedPost {
        let pipeline = ExtractionPipeline::new(&RuleTable::builtin()).unwrap();
        let mut raw = RawPost::new(Platform::Twitter, text);
        raw.id = id.to_string();
        pipeline.process(raw)
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.table_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_trait_post_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert_post(&classified("x1", "Cyclone landfall expected tonight"))
            .await
            .unwrap();
        assert_eq!(store.post_count().await.unwrap(), 1);

        let posts = store.get_posts(&PostFilter::default()).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].category, "Cyclone");
        assert_eq!(posts[0].platform, "twitter");
        assert_eq!(posts[0].profile, "twitter");

        let post = store.get_post("x1").await.unwrap().unwrap();
        assert_eq!(post.category, "Cyclone");
        assert!(store.get_post("x2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trait_counts() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_post(&classified("a", "oil spill")).await.unwrap();
        store.insert_post(&classified("b", "calm")).await.unwrap();

        let categories = store.category_counts().await.unwrap();
        assert_eq!(categories.len(), 2);
        let urgency = store.urgency_counts().await.unwrap();
        assert_eq!(urgency[0].label, "low");
        assert_eq!(urgency[0].count, 2);
    }

    #[tokio::test]
    async fn test_trait_runs() {
        let store = SqliteStore::in_memory().unwrap();
        let id = store
            .insert_run(
                Some("instagram"),
                &ExtractionStats::default(),
                &StorageSummary::default(),
            )
            .await
            .unwrap();
        assert!(id > 0);
        let runs = store.get_recent_runs(5).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].profile.as_deref(), Some("instagram"));
    }
}
