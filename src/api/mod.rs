use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/simulations", post(handlers::post_simulation))
        .route("/api/simulations/latest", get(handlers::get_latest))
        .route("/api/health", get(handlers::get_health))
        .with_state(state)
}
