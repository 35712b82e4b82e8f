use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use crate::media::mimetype::detect_mimetype;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found: {0:?}")]
    NotFound(PathBuf),
    #[error("Range not satisfiable for length {0}")]
    RangeNotSatisfiable(u64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Mimetype detection failed: {0}")]
    Mime(#[from] anyhow::Error),
    #[error("File worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Inclusive byte span selected by a `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    pub start: u64,
    pub end: u64,
}

impl ByteSpan {
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// A file that passed the existence check, ready to stream.
#[derive(Debug)]
pub struct MediaFile {
    pub path: PathBuf,
    pub content_type: String,
    pub total_len: u64,
    /// `None` means the whole file.
    pub span: Option<ByteSpan>,
    file: File,
}

impl MediaFile {
    pub fn body_len(&self) -> u64 {
        self.span.map_or(self.total_len, |s| s.byte_count())
    }

    /// Reader limited to the selected span.
    pub async fn into_reader(mut self) -> Result<impl AsyncRead + Send + Unpin, FileError> {
        let (start, len) = match self.span {
            Some(span) => (span.start, span.byte_count()),
            None => (0, self.total_len),
        };
        if start > 0 {
            self.file.seek(SeekFrom::Start(start)).await?;
        }
        Ok(self.file.take(len))
    }
}

/// Turns the percent-encoded tail of a `/files/` URL back into a filesystem path.
pub fn decode_path(encoded: &str) -> Result<PathBuf, FileError> {
    urlencoding::decode(encoded)
        .map(|decoded| PathBuf::from(decoded.into_owned()))
        .map_err(|_| FileError::NotFound(PathBuf::from(encoded)))
}

/// Parses a single `bytes=` range. Malformed or multi-range headers yield
/// `Ok(None)` so the caller serves the whole file.
pub fn parse_range(header: &str, total_len: u64) -> Result<Option<ByteSpan>, FileError> {
    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return Ok(None);
    };
    if spec.contains(',') {
        return Ok(None);
    }
    let Some((start, end)) = spec.trim().split_once('-') else {
        return Ok(None);
    };

    let span = match (start.trim(), end.trim()) {
        ("", "") => return Ok(None),
        ("", suffix) => {
            let Ok(suffix) = suffix.parse::<u64>() else {
                return Ok(None);
            };
            if suffix == 0 || total_len == 0 {
                return Err(FileError::RangeNotSatisfiable(total_len));
            }
            ByteSpan { start: total_len.saturating_sub(suffix), end: total_len - 1 }
        }
        (start, end) => {
            let Ok(start) = start.parse::<u64>() else {
                return Ok(None);
            };
            let end = if end.is_empty() {
                u64::MAX
            } else {
                match end.parse::<u64>() {
                    Ok(end) if end >= start => end,
                    _ => return Ok(None),
                }
            };
            if start >= total_len {
                return Err(FileError::RangeNotSatisfiable(total_len));
            }
            ByteSpan { start, end: end.min(total_len - 1) }
        }
    };

    Ok(Some(span))
}

/// Checks the path, sniffs its content type and opens it for streaming.
pub async fn open_media(path: &Path, range: Option<&str>) -> Result<MediaFile, FileError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(FileError::NotFound(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FileError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let total_len = metadata.len();
    let span = range.map(|r| parse_range(r, total_len)).transpose()?.flatten();

    let sniff_path = path.to_path_buf();
    let content_type = tokio::task::spawn_blocking(move || detect_mimetype(&sniff_path)).await??;
    let file = File::open(path).await?;

    debug!(?path, %content_type, total_len, ?span, "Opened media file");
    Ok(MediaFile {
        path: path.to_path_buf(),
        content_type,
        total_len,
        span,
        file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_path() {
        let path = decode_path("%2Fhome%2Fme%2FMy%20Clips%2F%E6%B8%B8%E6%88%8F.mp4").unwrap();
        assert_eq!(path, PathBuf::from("/home/me/My Clips/游戏.mp4"));

        let path = decode_path("C%3A%5CVideos%5Cclip.mp4").unwrap();
        assert_eq!(path, PathBuf::from("C:\\Videos\\clip.mp4"));
    }

    #[test]
    fn test_parse_range_forms() {
        assert_eq!(parse_range("bytes=0-9", 100).unwrap(), Some(ByteSpan { start: 0, end: 9 }));
        assert_eq!(parse_range("bytes=90-", 100).unwrap(), Some(ByteSpan { start: 90, end: 99 }));
        assert_eq!(parse_range("bytes=-10", 100).unwrap(), Some(ByteSpan { start: 90, end: 99 }));
        assert_eq!(parse_range("bytes=-500", 100).unwrap(), Some(ByteSpan { start: 0, end: 99 }));
        assert_eq!(parse_range("bytes=50-5000", 100).unwrap(), Some(ByteSpan { start: 50, end: 99 }));
    }

    #[test]
    fn test_parse_range_ignores_malformed() {
        assert_eq!(parse_range("items=0-9", 100).unwrap(), None);
        assert_eq!(parse_range("bytes=0-1,5-6", 100).unwrap(), None);
        assert_eq!(parse_range("bytes=x-9", 100).unwrap(), None);
        assert_eq!(parse_range("bytes=9-2", 100).unwrap(), None);
        assert_eq!(parse_range("bytes=-", 100).unwrap(), None);
    }

    #[test]
    fn test_parse_range_unsatisfiable() {
        assert!(matches!(parse_range("bytes=100-", 100), Err(FileError::RangeNotSatisfiable(100))));
        assert!(matches!(parse_range("bytes=-0", 100), Err(FileError::RangeNotSatisfiable(_))));
        assert!(matches!(parse_range("bytes=0-", 0), Err(FileError::RangeNotSatisfiable(0))));
    }

    #[tokio::test]
    async fn test_open_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.mp4");
        assert!(matches!(open_media(&missing, None).await, Err(FileError::NotFound(_))));
        // Directories are not servable either.
        assert!(matches!(open_media(dir.path(), None).await, Err(FileError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_open_reads_requested_span() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbers.txt");
        std::fs::write(&path, "0123456789").unwrap();

        let media = open_media(&path, Some("bytes=3-5")).await.unwrap();
        assert_eq!(media.total_len, 10);
        assert_eq!(media.body_len(), 3);
        assert_eq!(media.content_type, "text/plain; charset=utf-8");

        let mut body = String::new();
        media.into_reader().await.unwrap().read_to_string(&mut body).await.unwrap();
        assert_eq!(body, "345");
    }
}
