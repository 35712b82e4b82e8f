use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::database::tags as vocabulary;
use crate::server::{ApiError, AppState, StatusBody};

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TagBody {
    pub status: &'static str,
    pub name: String,
}

pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let names = state.db.call(|conn| vocabulary::list_tags(conn)).await?;
    Ok(Json(names))
}

pub async fn add_tag(
    State(state): State<AppState>,
    payload: Result<Json<TagRequest>, JsonRejection>,
) -> Result<Json<TagBody>, ApiError> {
    let Json(request) = payload?;
    let name = state
        .db
        .call(move |conn| vocabulary::add_tag(conn, &request.name))
        .await?;
    Ok(Json(TagBody { status: "success", name }))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusBody>, ApiError> {
    state.db.call(move |conn| vocabulary::delete_tag(conn, &name)).await?;
    Ok(StatusBody::success())
}
