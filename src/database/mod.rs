pub mod media;
pub mod schema;
pub mod tags;

use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::{Connection, ErrorCode};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Storage worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

pub type DbResult<T> = Result<T, DbError>;

/// True when SQLite rejected a write because of a UNIQUE (or other) constraint.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Handle to the library database file.
///
/// Holds only the path: every operation opens its own connection and drops it
/// when the operation returns, so no connection outlives a request.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Creates the parent directory if needed and runs schema initialization.
    pub fn initialize(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let db = Self { path: path.to_path_buf() };
        let mut conn = db.connect().context("Failed to open database")?;
        schema::init_schema(&mut conn).context("Failed to initialize schema")?;

        info!("Database '{}' checked and initialized", path.display());
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> DbResult<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Runs `op` on the blocking pool with a fresh connection.
    pub async fn call<F, T>(&self, op: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.connect()?;
            op(&conn)
        })
        .await?
    }
}
