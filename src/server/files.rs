use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use crate::media::files::{decode_path, open_media, FileError};

const PREFIX: &str = "/files/";

/// Streams a file named by the percent-encoded remainder of the URL.
///
/// The raw request path is decoded exactly once, so `%2F`-encoded absolute
/// paths and Windows drive paths both survive the trip.
pub async fn serve_file(uri: Uri, headers: HeaderMap) -> Response {
    let encoded = uri.path().strip_prefix(PREFIX).unwrap_or_default();
    match stream_file(encoded, &headers).await {
        Ok(response) => response,
        Err(e) => error_response(encoded, e),
    }
}

fn error_response(encoded: &str, err: FileError) -> Response {
    match err {
        FileError::NotFound(path) => {
            warn!("File not found at path: {:?}", path);
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
        FileError::RangeNotSatisfiable(len) => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{}", len))],
        )
            .into_response(),
        e => {
            error!("Failed to serve {:?}: {}", encoded, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

async fn stream_file(encoded: &str, headers: &HeaderMap) -> Result<Response, FileError> {
    let path = decode_path(encoded)?;
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    let media = open_media(&path, range).await?;
    info!("Serving file: {:?}", media.path);

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, media.content_type.as_str())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, media.body_len());

    builder = match media.span {
        Some(span) => builder.status(StatusCode::PARTIAL_CONTENT).header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", span.start, span.end, media.total_len),
        ),
        None => builder.status(StatusCode::OK),
    };

    let reader = media.into_reader().await?;
    builder
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| FileError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
}
