//! Blob Store Server Library
//!
//! A content-addressed blob store. Uploaded files are keyed by the digest of
//! their bytes and stored once per unique digest.
//!
//! # Modules
//!
//! - `hasher`: Streaming content digests (SHA-1 or SHA-256)
//! - `store`: The deduplicating hash -> location index
//! - `storage`: Byte storage backends (local, memory, S3)
//! - `routes`: HTTP endpoints over the store

pub mod config;
pub mod error;
pub mod hasher;
pub mod routes;
pub mod state;
pub mod storage;
pub mod store;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use state::AppState;
pub use store::ContentStore;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config().max_upload_bytes;

    Router::new()
        .merge(routes::health::router())
        .merge(routes::files::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
