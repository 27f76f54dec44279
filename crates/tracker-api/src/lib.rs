//! HTTP handlers for the timeline tracker.

pub mod comments;
pub mod error;
pub mod state;
pub mod timelines;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/timelines",
            get(timelines::list_timelines).post(timelines::create_timeline),
        )
        .route("/timelines/view", get(timelines::view_timelines))
        .route("/timelines/facets", get(timelines::facets))
        .route(
            "/timelines/{id}",
            get(timelines::get_timeline).patch(timelines::update_timeline),
        )
        .route("/timelines/{id}/claim", post(timelines::claim_timeline))
        .route(
            "/timelines/{id}/comments",
            get(comments::list_comments).post(comments::post_comment),
        )
        .route("/comments", get(comments::user_comments))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
