//! Route table for the editor endpoints

use axum::{
    routing::{get, post},
    Router,
};

use super::{browse, health, upload};
use crate::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload::upload_file))
        .route("/browse", get(browse::browse_page).post(browse::browse_search))
        .route("/health", get(health::handle_health))
}
