mod api;
mod config;
mod detection;
mod error;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use api::rest::AppState;
use config::Config;
use detection::{classifier::Classifier, fallback};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // Initialize logging; RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::info!("Free Proton VPN handle API starting...");
    match &config.source {
        Some(path) => tracing::info!("Loaded configuration from: {}", path.display()),
        None => tracing::info!("No config file found, using defaults"),
    }

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    let table = Arc::new(config.prefix_table.clone());
    tracing::info!(
        "Loaded {} prefixes in {} buckets",
        table.prefix_count(),
        table.buckets().len()
    );
    tracing::info!("Fallback mode for unmatched addresses: {:?}", config.fallback);

    let state = Arc::new(AppState::new(
        Classifier::new(table),
        fallback::build(config.fallback, &config.fallback_countries),
        config.server_name.clone(),
        hostname,
    ));

    let bind_ip: IpAddr = config.bind_address.parse()?;
    let addr = SocketAddr::new(bind_ip, config.port);

    let app = api::rest::create_api_router(state)
        .into_make_service_with_connect_info::<SocketAddr>();

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  http://{}/dc", addr);
    tracing::info!("  GET  http://{}/check?ip=<ip>", addr);
    tracing::info!("  GET  http://{}/stats", addr);
    tracing::info!("  GET  http://{}/test", addr);
    tracing::info!("  GET  http://{}/health", addr);
    tracing::info!("Dashboard: http://{}/", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
