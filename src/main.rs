use axum::serve;
use dotenvy::dotenv;
use pdf_tracker::config::Config;
use pdf_tracker::{create_router, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_TRACING_LEVEL: &str = "pdf_tracker=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    _ = dotenv();
    configure_tracing();
    let config = Config::from_env().expect("PUBLIC_BASE_URL is not a valid url");
    let listener = create_listener(&config.server_address).await;
    tracing::info!(
        "Records in {}, uploads in {}",
        config.data_file.display(),
        config.upload_dir.display()
    );
    let state = AppState::new(config)
        .await
        .expect("Initializing application state failed");
    let router = create_router(state);
    serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server failed to start");
}

fn configure_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or(DEFAULT_TRACING_LEVEL.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn create_listener(server_address: &str) -> TcpListener {
    let listener = TcpListener::bind(&server_address)
        .await
        .expect("Creating tcp listener failed");
    tracing::info!("Listening on address: {}", server_address);
    listener
}
