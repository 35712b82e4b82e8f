use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Serialize, Serializer};

use crate::database::{is_constraint_violation, DbError, DbResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItem {
    pub id: i64,
    pub title: String,
    pub filepath: String,
    pub media_type: String,
    pub tags: Option<String>,
    pub cover_path: Option<String>,
    pub view_count: i64,
    #[serde(serialize_with = "serialize_sqlite_timestamp")]
    pub add_date: NaiveDateTime,
}

/// Same text SQLite's CURRENT_TIMESTAMP stores, e.g. `2024-01-01 12:00:00`.
fn serialize_sqlite_timestamp<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format("%Y-%m-%d %H:%M:%S"))
}

impl MediaItem {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            filepath: row.get(2)?,
            media_type: row.get(3)?,
            tags: row.get(4)?,
            cover_path: row.get(5)?,
            view_count: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
            add_date: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewMedia {
    pub title: String,
    pub filepath: String,
    pub media_type: String,
    pub tags: Option<String>,
    pub cover_path: Option<String>,
}

impl NewMedia {
    fn validate(&self) -> DbResult<()> {
        for (field, value) in [
            ("title", &self.title),
            ("filepath", &self.filepath),
            ("media_type", &self.media_type),
        ] {
            if value.trim().is_empty() {
                return Err(DbError::Validation(format!("{} is required", field)));
            }
        }
        Ok(())
    }
}

/// Listing filters. Blank values behave as if absent.
#[derive(Debug, Clone, Default)]
pub struct MediaFilter {
    pub title: Option<String>,
    pub media_type: Option<String>,
    /// Comma separated; every entry must occur somewhere in the tags text.
    pub tags: Option<String>,
}

impl MediaFilter {
    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::from(
            "SELECT id, title, filepath, media_type, tags, cover_path, view_count, add_date
             FROM media WHERE 1=1",
        );
        let mut values = Vec::new();

        if let Some(title) = non_blank(&self.title) {
            sql.push_str(" AND title LIKE ?");
            values.push(Value::Text(format!("%{}%", title)));
        }

        if let Some(media_type) = non_blank(&self.media_type) {
            sql.push_str(" AND media_type = ?");
            values.push(Value::Text(media_type.to_string()));
        }

        if let Some(tags) = non_blank(&self.tags) {
            for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                sql.push_str(" AND tags LIKE ?");
                values.push(Value::Text(format!("%{}%", tag)));
            }
        }

        // add_date has second resolution; id keeps inserts within a second newest-first.
        sql.push_str(" ORDER BY add_date DESC, id DESC");
        (sql, values)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub fn list_media(conn: &Connection, filter: &MediaFilter) -> DbResult<Vec<MediaItem>> {
    let (sql, values) = filter.to_sql();
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params_from_iter(values), MediaItem::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

pub fn get_media(conn: &Connection, id: i64) -> DbResult<Option<MediaItem>> {
    let item = conn
        .query_row(
            "SELECT id, title, filepath, media_type, tags, cover_path, view_count, add_date
             FROM media WHERE id = ?1",
            params![id],
            MediaItem::from_row,
        )
        .optional()?;
    Ok(item)
}

/// Inserts a catalog entry and returns its id. A filepath already in the
/// catalog yields [`DbError::Conflict`] and leaves the table untouched.
pub fn add_media(conn: &Connection, media: &NewMedia) -> DbResult<i64> {
    media.validate()?;

    let inserted = conn.execute(
        "INSERT INTO media (title, filepath, media_type, tags, cover_path) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            media.title,
            media.filepath,
            media.media_type,
            media.tags,
            media.cover_path
        ],
    );

    match inserted {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_constraint_violation(&e) => Err(DbError::Conflict(format!(
            "File path already exists: {}",
            media.filepath
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Removes the entry if present. Missing ids are not an error.
pub fn delete_media(conn: &Connection, id: i64) -> DbResult<()> {
    conn.execute("DELETE FROM media WHERE id = ?1", params![id])?;
    Ok(())
}

/// Bumps view_count by one. Unknown ids are silently ignored.
pub fn record_view(conn: &Connection, id: i64) -> DbResult<()> {
    conn.execute(
        "UPDATE media SET view_count = view_count + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::init_schema;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&mut conn).unwrap();
        conn
    }

    fn new_media(title: &str, filepath: &str, media_type: &str, tags: &str) -> NewMedia {
        NewMedia {
            title: title.to_string(),
            filepath: filepath.to_string(),
            media_type: media_type.to_string(),
            tags: Some(tags.to_string()),
            cover_path: None,
        }
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0)).unwrap()
    }

    fn titles(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_list_returns_newest_first() {
        let conn = setup();
        add_media(&conn, &new_media("First", "/m/1.mp4", "video", "")).unwrap();
        add_media(&conn, &new_media("Second", "/m/2.mp4", "video", "")).unwrap();
        add_media(&conn, &new_media("Third", "/m/3.jpg", "image", "")).unwrap();

        let items = list_media(&conn, &MediaFilter::default()).unwrap();
        assert_eq!(titles(&items), vec!["Third", "Second", "First"]);
    }

    #[test]
    fn test_list_orders_by_add_date_before_id() {
        let conn = setup();
        add_media(&conn, &new_media("Old", "/m/old.mp4", "video", "")).unwrap();
        add_media(&conn, &new_media("New", "/m/new.mp4", "video", "")).unwrap();
        conn.execute("UPDATE media SET add_date = '2001-01-01 00:00:00' WHERE title = 'New'", [])
            .unwrap();

        let items = list_media(&conn, &MediaFilter::default()).unwrap();
        assert_eq!(titles(&items), vec!["Old", "New"]);
    }

    #[test]
    fn test_create_assigns_storage_defaults() {
        let conn = setup();
        let mut media = new_media("Clip", "/m/clip.mp4", "video", "travel");
        media.cover_path = Some("/m/clip.jpg".to_string());
        let id = add_media(&conn, &media).unwrap();

        let item = get_media(&conn, id).unwrap().unwrap();
        assert_eq!(item.view_count, 0);
        assert_eq!(item.tags.as_deref(), Some("travel"));
        assert_eq!(item.cover_path.as_deref(), Some("/m/clip.jpg"));
    }

    #[test]
    fn test_duplicate_filepath_is_conflict() {
        let conn = setup();
        add_media(&conn, &new_media("A", "/m/same.mp4", "video", "")).unwrap();

        let err = add_media(&conn, &new_media("B", "/m/same.mp4", "image", "")).unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        assert_eq!(count(&conn), 1);
        let items = list_media(&conn, &MediaFilter::default()).unwrap();
        assert_eq!(items[0].title, "A");
    }

    #[test]
    fn test_missing_required_field_is_validation() {
        let conn = setup();
        let err = add_media(&conn, &new_media("  ", "/m/x.mp4", "video", "")).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        let err = add_media(&conn, &new_media("X", "/m/x.mp4", "", "")).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn test_record_view_increments_only_view_count() {
        let conn = setup();
        let id = add_media(&conn, &new_media("Clip", "/m/clip.mp4", "video", "fun")).unwrap();
        let before = get_media(&conn, id).unwrap().unwrap();

        record_view(&conn, id).unwrap();
        let once = get_media(&conn, id).unwrap().unwrap();
        assert_eq!(once.view_count, before.view_count + 1);

        record_view(&conn, id).unwrap();
        let twice = get_media(&conn, id).unwrap().unwrap();
        assert_eq!(twice.view_count, before.view_count + 2);
        assert_eq!(MediaItem { view_count: before.view_count, ..twice }, before);
    }

    #[test]
    fn test_record_view_unknown_id_is_noop() {
        let conn = setup();
        record_view(&conn, 404).unwrap();
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn test_delete_removes_one_and_ignores_missing() {
        let conn = setup();
        let keep = add_media(&conn, &new_media("Keep", "/m/keep.mp4", "video", "")).unwrap();
        let drop = add_media(&conn, &new_media("Drop", "/m/drop.mp4", "video", "")).unwrap();

        delete_media(&conn, drop).unwrap();
        assert_eq!(count(&conn), 1);
        assert!(get_media(&conn, keep).unwrap().is_some());

        delete_media(&conn, drop).unwrap();
        delete_media(&conn, 9999).unwrap();
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_title_filter_is_substring() {
        let conn = setup();
        add_media(&conn, &new_media("Concatenate", "/m/c.mp4", "video", "")).unwrap();
        add_media(&conn, &new_media("Dog", "/m/d.mp4", "video", "")).unwrap();

        let filter = MediaFilter { title: Some("cat".to_string()), ..Default::default() };
        let items = list_media(&conn, &filter).unwrap();
        assert_eq!(titles(&items), vec!["Concatenate"]);
    }

    #[test]
    fn test_type_filter_is_exact() {
        let conn = setup();
        add_media(&conn, &new_media("Clip", "/m/c.mp4", "video", "")).unwrap();
        add_media(&conn, &new_media("Photo", "/m/p.jpg", "image", "")).unwrap();

        let filter = MediaFilter { media_type: Some("image".to_string()), ..Default::default() };
        assert_eq!(titles(&list_media(&conn, &filter).unwrap()), vec!["Photo"]);

        let filter = MediaFilter { media_type: Some("imag".to_string()), ..Default::default() };
        assert!(list_media(&conn, &filter).unwrap().is_empty());
    }

    #[test]
    fn test_tag_filter_requires_every_substring() {
        let conn = setup();
        add_media(&conn, &new_media("Both", "/m/1.mp4", "video", "alpha,beta")).unwrap();
        add_media(&conn, &new_media("OnlyA", "/m/2.mp4", "video", "alpha")).unwrap();
        add_media(&conn, &new_media("None", "/m/3.mp4", "video", "gamma")).unwrap();

        let filter = MediaFilter { tags: Some("alpha, beta".to_string()), ..Default::default() };
        assert_eq!(titles(&list_media(&conn, &filter).unwrap()), vec!["Both"]);

        // Substring semantics: "a" matches anything containing the letter.
        let filter = MediaFilter { tags: Some("a,b".to_string()), ..Default::default() };
        assert_eq!(titles(&list_media(&conn, &filter).unwrap()), vec!["Both"]);
    }

    #[test]
    fn test_tag_filter_matches_inside_longer_tags() {
        let conn = setup();
        add_media(&conn, &new_media("Kitten", "/m/kitten.mp4", "video", "cat")).unwrap();
        add_media(&conn, &new_media("Puppy", "/m/puppy.mp4", "video", "dog")).unwrap();

        // Tags are plain text, so "a" is found inside "cat".
        let filter = MediaFilter { tags: Some("a".to_string()), ..Default::default() };
        assert_eq!(titles(&list_media(&conn, &filter).unwrap()), vec!["Kitten"]);
    }

    #[test]
    fn test_add_date_serializes_like_sqlite() {
        let conn = setup();
        let id = add_media(&conn, &new_media("Clip", "/m/clip.mp4", "video", "")).unwrap();
        conn.execute("UPDATE media SET add_date = '2024-01-01 12:00:00' WHERE id = ?1", params![id])
            .unwrap();

        let item = get_media(&conn, id).unwrap().unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["add_date"], "2024-01-01 12:00:00");
    }

    #[test]
    fn test_blank_filters_return_everything() {
        let conn = setup();
        add_media(&conn, &new_media("One", "/m/1.mp4", "video", "x")).unwrap();
        add_media(&conn, &new_media("Two", "/m/2.jpg", "image", "y")).unwrap();

        let filter = MediaFilter {
            title: Some(String::new()),
            media_type: Some(String::new()),
            tags: Some(" , ,".to_string()),
        };
        assert_eq!(list_media(&conn, &filter).unwrap().len(), 2);
    }
}
