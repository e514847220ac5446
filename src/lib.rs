//! Pantry Server Library
//!
//! Recipe and ingredient store behind an axum HTTP surface. Exposes the router
//! builder and shared state so the binary and the integration tests wire up the
//! same app.

pub mod blobs;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod routes;
pub mod security;
pub mod store;

pub use blobs::{BlobStore, ImageUrls};
pub use config::Config;
pub use db::{Db, open_database};
pub use error::{AppError, Result};
pub use identity::SessionKeys;
pub use store::Store;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub store: Store,
    pub blobs: BlobStore,
    pub sessions: SessionKeys,
}

impl AppState {
    /// Create a new AppState with the given database and configuration
    pub fn new(db: Db, config: Config) -> Self {
        let urls = ImageUrls::new(config.public_base_url.clone());

        Self {
            store: Store::new(db.clone(), urls.clone(), config.user_id_pepper.clone()),
            blobs: BlobStore::new(db.clone(), urls, config.max_image_bytes),
            sessions: SessionKeys::new(config.session_secret.clone(), config.session_ttl_secs),
            db,
            config,
        }
    }
}

/// Build the application router
///
/// CORS is left to the caller since it depends on the deployment.
pub fn build_router(state: AppState) -> Router {
    use routes::*;

    let max_image_bytes = state.config.max_image_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
        .route(
            "/api/ingredients",
            post(create_ingredient).get(list_ingredients),
        )
        .route("/api/recipes", post(create_recipe).get(list_user_recipes))
        .route("/api/recipes/:id", get(get_recipe).delete(delete_recipe))
        .route(
            "/api/images",
            post(upload_image).layer(DefaultBodyLimit::max(max_image_bytes)),
        )
        .route("/api/images/:storage_id", get(get_image))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
