// POST /api/classify: classify one piece of text.
//
// Body: { text, hashtags?, sourceContext?, profile? }
// Response: { category, confidence, urgency, score, profile }
// `score` is the sentiment score of the text.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::classify::ClassificationInput;
use crate::web::{api_error, AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    pub text: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub source_context: Option<String>,
    pub profile: Option<String>,
}

pub async fn classify(State(state): State<AppState>, Json(body): Json<ClassifyRequest>) -> Response {
    let profile = body
        .profile
        .as_deref()
        .unwrap_or(&state.config.profile)
        .trim()
        .to_lowercase();

    let Some(classifier) = state.pipeline.classifier(&profile) else {
        return api_error(
            StatusCode::BAD_REQUEST,
            &format!("Unknown profile '{profile}'"),
        );
    };

    let input = ClassificationInput {
        text: body.text,
        auxiliary_tags: body.hashtags,
        source_context: body.source_context,
    };
    let result = classifier.classify(&input);
    let sentiment = state.pipeline.scorer().score(&input.text);

    Json(serde_json::json!({
        "category": result.category,
        "confidence": result.confidence,
        "urgency": result.urgency,
        "score": sentiment.score,
        "profile": profile,
    }))
    .into_response()
}
