// GET /api/stats: stored post counts by category and urgency.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::web::{api_error, AppState};

pub async fn get_stats(State(state): State<AppState>) -> Response {
    let counts = async {
        let total = state.store.post_count().await?;
        let categories = state.store.category_counts().await?;
        let urgency = state.store.urgency_counts().await?;
        let runs = state.store.get_recent_runs(10).await?;
        anyhow::Ok((total, categories, urgency, runs))
    };

    match counts.await {
        Ok((total, categories, urgency, runs)) => {
            let by_category: serde_json::Map<String, serde_json::Value> = categories
                .into_iter()
                .map(|c| (c.label, c.count.into()))
                .collect();
            let by_urgency: serde_json::Map<String, serde_json::Value> = urgency
                .into_iter()
                .map(|c| (c.label, c.count.into()))
                .collect();
            Json(serde_json::json!({
                "total_posts": total,
                "by_category": by_category,
                "by_urgency": by_urgency,
                "recent_runs": runs,
            }))
            .into_response()
        }
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}
