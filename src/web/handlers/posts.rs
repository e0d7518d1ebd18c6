// GET /api/posts: stored posts, highest confidence first.
// GET /api/posts/{id}: one stored post.
//
// Optional ?category=, ?platform=, ?min_confidence=, ?limit= (default 50, max 500).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::db::models::PostFilter;
use crate::web::{api_error, AppState};

#[derive(Deserialize, Default)]
pub struct PostsQuery {
    pub category: Option<String>,
    pub platform: Option<String>,
    pub min_confidence: Option<f64>,
    pub limit: Option<u32>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PostsQuery>,
) -> Response {
    let filter = PostFilter {
        category: params.category.filter(|c| !c.trim().is_empty()),
        platform: params.platform.filter(|p| !p.trim().is_empty()),
        min_confidence: params.min_confidence,
        limit: Some(params.limit.unwrap_or(50).min(500)),
    };

    match state.store.get_posts(&filter).await {
        Ok(posts) => Json(serde_json::json!({
            "total": posts.len(),
            "posts": posts,
        }))
        .into_response(),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

pub async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get_post(&id).await {
        Ok(Some(post)) => Json(post).into_response(),
        Ok(None) => api_error(StatusCode::NOT_FOUND, &format!("No stored post with id '{id}'")),
        Err(e) => api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}
