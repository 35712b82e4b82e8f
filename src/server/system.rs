use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::picker::{PickKind, PickRequest};
use crate::server::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SelectFileQuery {
    pub filename: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SelectFileBody {
    /// Empty when the user cancelled the dialog.
    pub filepath: String,
}

pub async fn select_file(
    State(state): State<AppState>,
    Query(query): Query<SelectFileQuery>,
) -> Result<Json<SelectFileBody>, ApiError> {
    let request = PickRequest {
        kind: PickKind::from_hint(query.kind.as_deref()),
        filename: query.filename,
    };

    // The dialog is modal: this request stays suspended until the user answers.
    let picker = state.picker.clone();
    let picked = tokio::task::spawn_blocking(move || picker.pick(&request))
        .await
        .map_err(|e| ApiError::Internal(format!("file picker task failed: {}", e)))?;

    debug!(?picked, "File picker closed");
    Ok(Json(SelectFileBody {
        filepath: picked.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default(),
    }))
}

pub async fn shutdown(State(state): State<AppState>) -> &'static str {
    info!("Shutdown requested, stopping server...");
    state.shutdown.cancel();
    "Server is shutting down..."
}

async fn render_page(state: &AppState, template: &str) -> Result<Html<String>, ApiError> {
    let path = state.templates_dir.join(template);
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Ok(Html(page)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ApiError::NotFound(format!("Template not found: {}", template)))
        }
        Err(e) => Err(ApiError::Internal(format!("reading {:?}: {}", path, e))),
    }
}

pub async fn index_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render_page(&state, "index.html").await
}

pub async fn manage_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render_page(&state, "manage.html").await
}

pub async fn tags_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render_page(&state, "tags.html").await
}
