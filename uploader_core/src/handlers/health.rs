use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "app": state.app_name,
        "version": state.version,
        "image_backend": state.image_backend.name(),
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}
