//! Aurum price server entry point.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aurum_engine::PriceEngineBuilder;
use aurum_ext_file::{create_empty_sources, create_file_sources};
use aurum_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,aurum=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Aurum Price Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/aurum.toml".to_string());

    let server_config = if Path::new(&config_path).exists() {
        info!("Loading configuration from {}", config_path);
        ServerConfig::from_file(&config_path)?
    } else {
        info!("Using default configuration");
        ServerConfig::default()
    };

    // Upstream sources
    let sources = match &server_config.data_file {
        Some(data_file) => create_file_sources(
            data_file,
            server_config.fallback_data_file.as_deref().map(Path::new),
        )?,
        None => {
            warn!("No data_file configured, upstream sources will answer with nothing");
            create_empty_sources()
        }
    };

    // Build engine
    let engine = PriceEngineBuilder::new()
        .with_config(server_config.engine.clone())
        .with_sources(sources)
        .build()?;

    let engine = Arc::new(engine);
    engine.start().await?;

    // Start server
    let server = Server::new(server_config, engine);
    server.start().await?;

    Ok(())
}
