use rusqlite::{params, Connection};
use tracing::info;

use crate::database::DbResult;

pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS media (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        filepath TEXT NOT NULL UNIQUE,
        media_type TEXT NOT NULL,
        tags TEXT,
        cover_path TEXT,
        view_count INTEGER DEFAULT 0,
        add_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS tags_config (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );
";

/// Vocabulary a fresh library starts with (food, travel, games).
pub const DEFAULT_TAGS: [&str; 3] = ["美食", "旅游", "游戏"];

/// Creates both tables if absent and seeds the tag vocabulary when it is empty.
/// Safe to run on every start.
pub fn init_schema(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch(SCHEMA)?;

    let tag_count: i64 = conn.query_row("SELECT COUNT(*) FROM tags_config", [], |row| row.get(0))?;
    if tag_count == 0 {
        info!("Tag vocabulary is empty, seeding {} default tags", DEFAULT_TAGS.len());
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO tags_config (name) VALUES (?1)")?;
            for name in DEFAULT_TAGS {
                stmt.execute(params![name])?;
            }
        }
        tx.commit()?;
    }

    Ok(())
}
