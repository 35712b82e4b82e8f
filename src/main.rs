mod database;
mod media;
mod picker;
mod server;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::database::Database;
use crate::picker::RfdPicker;
use crate::server::AppState;
use crate::utils::config::{AppConfig, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "media_library=info,tower_http=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    let config = AppConfig::resolve(&args)?;

    // Schema problems abort start-up before anything listens.
    let db = Database::initialize(&config.db_path)?;
    info!("DB: {}", db.path().display());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received");
                ctrl_c.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let state = AppState {
        db,
        picker: Arc::new(RfdPicker),
        shutdown: shutdown.clone(),
        templates_dir: config.templates_dir.clone(),
    };
    let app = server::router(state, config.static_dir.clone());

    info!("Media library started");
    info!("Open in a browser: {}", config.base_url());
    info!("Use the exit button on the page (POST /shutdown) or Ctrl-C to stop.");

    if config.open_browser {
        server::open_browser_later(config.base_url(), server::BROWSER_DELAY);
    }

    server::serve(listener, app, shutdown, server::SHUTDOWN_GRACE).await
}
