// Web server: Axum JSON API over the classifier and the post store.
//
// Classification is synchronous and pure, so handlers call it inline.
// Storage requested by POST /api/extract runs on a detached task and never
// delays or alters the response.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::classify::RuleTable;
use crate::config::Config;
use crate::db::PostStore;
use crate::pipeline::extract::ExtractionPipeline;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostStore>,
    pub table: Arc<RuleTable>,
    pub pipeline: Arc<ExtractionPipeline>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, table: RuleTable, store: Arc<dyn PostStore>) -> Result<Self> {
        let pipeline = ExtractionPipeline::new(&table)?;
        Ok(Self {
            store,
            table: Arc::new(table),
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        })
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(state: AppState, port: u16, bind: &str) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("coastwatch API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/classify", post(handlers::classify::classify))
        .route("/api/extract", post(handlers::extract::extract))
        .route("/api/posts", get(handlers::posts::list_posts))
        .route("/api/posts/{id}", get(handlers::posts::get_post))
        .route("/api/stats", get(handlers::stats::get_stats))
        .route("/api/rules", get(handlers::rules::get_rules))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check, always 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
