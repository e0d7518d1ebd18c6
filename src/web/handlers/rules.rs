// GET /api/rules: the loaded rule table and the server's default profile.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::web::AppState;

pub async fn get_rules(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "active_profile": state.config.profile,
        "rules": state.table.rules,
        "profiles": state.table.profiles,
        "sentiment": state.table.sentiment,
    }))
}
