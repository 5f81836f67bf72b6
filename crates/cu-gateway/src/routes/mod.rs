mod error;
mod processes;
mod types;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route("/debug/healthz", get(|| async { StatusCode::NO_CONTENT }))
        .route("/processes/{id}/state", get(processes::read_state))
        .route("/processes/{id}/interactions", post(processes::write_interaction))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone())
}
