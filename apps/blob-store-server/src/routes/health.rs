//! Health check route

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    backend: &'static str,
    algorithm: &'static str,
    records: usize,
    total_bytes: u64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.store();
    let stats = store.stats().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        backend: store.backend_name(),
        algorithm: store.hasher().algorithm().as_str(),
        records: stats.records,
        total_bytes: stats.total_bytes,
    })
}
