//! # Aurum Server
//!
//! REST server for the Aurum gold price cache.
//!
//! ## Features
//!
//! - Current, historical and per-date gold prices served through the cache
//! - Cache statistics and clearing
//! - Configuration via TOML file
//!
//! ## Usage
//!
//! ```ignore
//! use aurum_server::Server;
//!
//! let server = Server::new(config, engine);
//! server.start().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod handlers;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use aurum_engine::PriceEngine;

pub use config::ServerConfig;

/// The Aurum server.
pub struct Server {
    config: ServerConfig,
    engine: Arc<PriceEngine>,
}

impl Server {
    /// Create a new server.
    pub fn new(config: ServerConfig, engine: Arc<PriceEngine>) -> Self {
        Self { config, engine }
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        routes::create_router(self.engine.clone()).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
    }

    /// Serve until ctrl-c, then stop the engine's background tasks.
    pub async fn start(&self) -> Result<(), std::io::Error> {
        let addr = SocketAddr::new(
            self.config.host.parse().unwrap_or([0, 0, 0, 0].into()),
            self.config.port,
        );

        info!("Starting Aurum server on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.engine.shutdown().await;
        info!("Aurum server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
