use axum::{extract::DefaultBodyLimit, Router};

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use state::AppState;

/// The full HTTP application over a started core.
pub fn app(state: AppState) -> Router {
    let body_limit = state.core.config.max_upload_bytes;

    routes::api_routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
