use rusqlite::{params, Connection};

use crate::database::{is_constraint_violation, DbError, DbResult};

pub fn list_tags(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM tags_config ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Adds a tag to the vocabulary and returns the stored (trimmed) name.
pub fn add_tag(conn: &Connection, name: &str) -> DbResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DbError::Validation("Tag name must not be empty".to_string()));
    }

    match conn.execute("INSERT INTO tags_config (name) VALUES (?1)", params![name]) {
        Ok(_) => Ok(name.to_string()),
        Err(e) if is_constraint_violation(&e) => {
            Err(DbError::Conflict(format!("Tag already exists: {}", name)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes by exact name. Media rows that mention the tag are left as they are.
pub fn delete_tag(conn: &Connection, name: &str) -> DbResult<()> {
    conn.execute("DELETE FROM tags_config WHERE name = ?1", params![name])?;
    Ok(())
}
