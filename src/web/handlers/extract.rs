// POST /api/extract: classify a batch of posts, optionally storing them.
//
// Body: { posts: [RawPost], profile?, store? (default true) }
// Response: { success, data, stats, storage: { queued, posts } }
//
// Storage runs on a detached task after the response is built. Its outcome
// is logged and recorded as an extraction run; it never changes `data`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use crate::pipeline::extract::RawPost;
use crate::pipeline::store::store_posts;
use crate::web::{api_error, AppState};

#[derive(Deserialize)]
pub struct ExtractRequest {
    pub posts: Vec<RawPost>,
    pub profile: Option<String>,
    #[serde(default = "default_store")]
    pub store: bool,
}

fn default_store() -> bool {
    true
}

pub async fn extract(State(state): State<AppState>, Json(body): Json<ExtractRequest>) -> Response {
    let report = match state.pipeline.run_as(body.posts, body.profile.as_deref()) {
        Ok(report) => report,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let queued = body.store && !report.posts.is_empty();
    if queued {
        let store = state.store.clone();
        let posts = report.posts.clone();
        let stats = report.stats.clone();
        let profile = body.profile.clone();
        let concurrency = state.config.store_concurrency;
        tokio::spawn(async move {
            let summary = store_posts(store.clone(), posts, concurrency).await;
            if let Err(e) = store.insert_run(profile.as_deref(), &stats, &summary).await {
                warn!(error = %e, "Failed to record extraction run");
            }
        });
    }

    Json(serde_json::json!({
        "success": true,
        "data": report.posts,
        "stats": report.stats,
        "storage": {
            "queued": queued,
            "posts": if queued { report.posts.len() } else { 0 },
        },
    }))
    .into_response()
}
