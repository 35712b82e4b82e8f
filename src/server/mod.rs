mod error;
mod files;
mod media;
mod system;
mod tags;

use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::database::Database;
use crate::picker::PathPicker;

pub use error::ApiError;

/// Delay between the listener coming up and the browser tab opening.
pub const BROWSER_DELAY: Duration = Duration::from_millis(1250);
/// How long open connections (a paused video stream, say) may hold up shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub picker: Arc<dyn PathPicker>,
    /// Cancelled by `POST /shutdown`; the serve loop drains and exits.
    pub shutdown: CancellationToken,
    pub templates_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}

impl StatusBody {
    pub fn success() -> Json<Self> {
        Json(Self { status: "success" })
    }
}

pub fn router(state: AppState, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/", get(system::index_page))
        .route("/manage", get(system::manage_page))
        .route("/tags-management", get(system::tags_page))
        .route("/api/media", get(media::list_media).post(media::create_media))
        .route("/api/media/:id", delete(media::delete_media))
        .route("/api/view/:id", post(media::record_view))
        .route("/api/select-file", get(system::select_file))
        .route("/api/tags", get(tags::list_tags).post(tags::add_tag))
        .route("/api/tags/:name", delete(tags::delete_tag))
        .route("/files/*encoded_path", get(files::serve_file))
        .route("/shutdown", post(system::shutdown))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until the shutdown token is cancelled. Connections still open
/// `grace` after that are dropped.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
    grace: Duration,
) -> anyhow::Result<()> {
    let drain = shutdown.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { drain.cancelled().await })
        .into_future();

    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!("Connections still open after {:?}, stopping anyway", grace);
        }
    }
    info!("Server stopped");
    Ok(())
}

/// One-shot, fire-and-forget: opens `url` in the default browser after `delay`.
pub fn open_browser_later(url: String, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let target = url.clone();
        match tokio::task::spawn_blocking(move || webbrowser::open(&target)).await {
            Ok(Ok(())) => info!("Opened browser at {}", url),
            Ok(Err(e)) => warn!("Could not open browser at {}: {}", url, e),
            Err(e) => warn!("Browser launcher task failed: {}", e),
        }
    });
}
