// Best-effort storage of classified posts.
//
// Storage never affects classification output. Each post is written through
// the PostStore trait with bounded concurrency; failures are logged and
// counted, and the caller always gets a summary rather than an error.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::extract::ClassifiedPost;
use crate::db::PostStore;

/// Default number of concurrent writes.
pub const DEFAULT_STORE_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSummary {
    pub attempted: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Write every post, logging and counting failures.
///
/// Takes owned posts and a shared store so the returned future is `'static`
/// and can be handed to `tokio::spawn`.
pub async fn store_posts(
    store: Arc<dyn PostStore>,
    posts: Vec<ClassifiedPost>,
    concurrency: usize,
) -> StorageSummary {
    let attempted = posts.len();
    let results: Vec<(String, anyhow::Result<()>)> =
        stream::iter(posts.into_iter().map(move |post| {
            let store = Arc::clone(&store);
            async move {
                let result = store.insert_post(&post).await;
                (post.post.id, result)
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut summary = StorageSummary {
        attempted,
        ..StorageSummary::default()
    };
    for (id, result) in results {
        match result {
            Ok(()) => summary.successful += 1,
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to store classified post, skipping");
                summary.failed += 1;
            }
        }
    }

    info!(
        attempted = summary.attempted,
        successful = summary.successful,
        failed = summary.failed,
        "Storage complete"
    );
    summary
}

/// Fire-and-forget variant: storage runs on a detached tokio task. The
/// handle may be awaited for the summary or simply dropped.
pub fn spawn_store(
    store: Arc<dyn PostStore>,
    posts: Vec<ClassifiedPost>,
    concurrency: usize,
) -> JoinHandle<StorageSummary> {
    tokio::spawn(store_posts(store, posts, concurrency))
}
