pub mod auth;
pub mod config;
pub mod dao;
pub mod error;
pub mod model;
pub mod pages;
pub mod routes;
pub mod storage;
pub mod utils;

use crate::auth::auth;
use crate::config::Config;
use crate::dao::{JsonFileStore, RecordStore};
use crate::error::InitError;
use crate::pages::Pages;
use crate::routes::{
    delete_document, download_pdf, get_all_stats, get_pdf, get_stats, health, index,
    log_download, track_page, track_session, upload_document, view_document,
};
use crate::storage::FileStorage;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub files: FileStorage,
    pub pages: Arc<Pages>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Opens the JSON record store and upload directory named by `config`.
    pub async fn new(config: Config) -> Result<Self, InitError> {
        let store = JsonFileStore::open(&config.data_file).await?;
        let files = FileStorage::open(&config.upload_dir).await?;
        Ok(Self {
            store: Arc::new(store),
            files,
            pages: Arc::new(Pages::new()?),
            config: Arc::new(config),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/stats", get(get_all_stats))
        .route("/api/stats/:tracking_id", get(get_stats))
        .route("/api/delete/:tracking_id", delete(delete_document))
        .route_layer(from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/upload", post(upload_document))
        .route("/v/:short_id", get(view_document))
        .route("/get-pdf/:tracking_id", get(get_pdf))
        .route("/download/:tracking_id", get(download_pdf))
        .route("/api/log-download", post(log_download))
        .route("/api/track-page", post(track_page))
        .route("/api/track-session", post(track_session))
        .merge(admin)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
