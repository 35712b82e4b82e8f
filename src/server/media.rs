use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::database::media::{self as catalog, MediaFilter, MediaItem, NewMedia};
use crate::database::DbError;
use crate::server::{ApiError, AppState, StatusBody};

#[derive(Debug, Default, Deserialize)]
pub struct ListMediaQuery {
    pub title: Option<String>,
    pub tags: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

impl From<ListMediaQuery> for MediaFilter {
    fn from(query: ListMediaQuery) -> Self {
        MediaFilter {
            title: query.title,
            media_type: query.media_type,
            tags: query.tags,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMediaRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub filepath: String,
    #[serde(default)]
    pub media_type: String,
    pub tags: Option<String>,
    pub cover_path: Option<String>,
}

impl From<CreateMediaRequest> for NewMedia {
    fn from(req: CreateMediaRequest) -> Self {
        NewMedia {
            title: req.title,
            filepath: req.filepath,
            media_type: req.media_type,
            tags: req.tags,
            cover_path: req.cover_path.filter(|c| !c.is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedBody {
    pub status: &'static str,
    pub id: i64,
    pub item: Option<MediaItem>,
}

pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<ListMediaQuery>,
) -> Result<Json<Vec<MediaItem>>, ApiError> {
    let filter = MediaFilter::from(query);
    let items = state.db.call(move |conn| catalog::list_media(conn, &filter)).await?;
    Ok(Json(items))
}

pub async fn create_media(
    State(state): State<AppState>,
    payload: Result<Json<CreateMediaRequest>, JsonRejection>,
) -> Result<Json<CreatedBody>, ApiError> {
    let Json(request) = payload?;
    let media = NewMedia::from(request);

    let (id, item) = state
        .db
        .call(move |conn| {
            let id = catalog::add_media(conn, &media)?;
            Ok((id, catalog::get_media(conn, id)?))
        })
        .await
        .map_err(|e| match e {
            // The catalog API reports duplicate paths as a plain bad request.
            DbError::Conflict(msg) => ApiError::BadRequest(msg),
            other => ApiError::from(other),
        })?;

    Ok(Json(CreatedBody { status: "success", id, item }))
}

pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusBody>, ApiError> {
    state.db.call(move |conn| catalog::delete_media(conn, id)).await?;
    Ok(StatusBody::success())
}

pub async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusBody>, ApiError> {
    state.db.call(move |conn| catalog::record_view(conn, id)).await?;
    Ok(StatusBody::success())
}
