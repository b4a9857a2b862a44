//! Catalog persistence. Scripts are keyed by file path, groups by name;
//! tags and group memberships live in join tables and are rewritten
//! wholesale on save.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::catalog::{ScriptCatalogEntry, ScriptGroup};
use crate::error::{AutoshellError, Result};

pub struct CatalogStore {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl CatalogStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AutoshellError::storage("create database dir", e))?;
        }

        let conn = Connection::open(&db_path)
            .map_err(|e| AutoshellError::storage("open database", e))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| AutoshellError::storage("enable foreign keys", e))?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS scripts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                file_path TEXT NOT NULL UNIQUE,
                last_modified TEXT,
                executable INTEGER NOT NULL DEFAULT 1,
                content TEXT
            );
            CREATE TABLE IF NOT EXISTS script_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS group_scripts (
                group_id INTEGER NOT NULL,
                script_id INTEGER NOT NULL,
                PRIMARY KEY (group_id, script_id),
                FOREIGN KEY (group_id) REFERENCES script_groups(id) ON DELETE CASCADE,
                FOREIGN KEY (script_id) REFERENCES scripts(id) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS script_tags (
                script_id INTEGER NOT NULL,
                tag TEXT NOT NULL,
                PRIMARY KEY (script_id, tag),
                FOREIGN KEY (script_id) REFERENCES scripts(id) ON DELETE CASCADE
            );
            ",
        )
        .map_err(|e| AutoshellError::storage("init schema", e))?;

        Ok(())
    }

    /// Insert or update a script, keyed by its file path. Tags are
    /// replaced with the entry's current set.
    pub fn save_script(&self, entry: &ScriptCatalogEntry) -> Result<i64> {
        let conn = self.conn.lock();
        let path = entry.file_path.display().to_string();
        let last_modified = entry.last_modified.map(|dt| dt.to_rfc3339());

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM scripts WHERE file_path = ?1",
                params![&path],
                |row| row.get(0),
            )
            .ok();

        let script_id = match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE scripts SET name = ?1, description = ?2, last_modified = ?3,
                     executable = ?4, content = ?5 WHERE id = ?6",
                    params![
                        &entry.name,
                        &entry.description,
                        &last_modified,
                        entry.executable,
                        &entry.content,
                        id,
                    ],
                )
                .map_err(|e| AutoshellError::storage("update script", e))?;
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO scripts (name, description, file_path, last_modified, executable, content)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        &entry.name,
                        &entry.description,
                        &path,
                        &last_modified,
                        entry.executable,
                        &entry.content,
                    ],
                )
                .map_err(|e| AutoshellError::storage("insert script", e))?;
                conn.last_insert_rowid()
            }
        };

        conn.execute(
            "DELETE FROM script_tags WHERE script_id = ?1",
            params![script_id],
        )
        .map_err(|e| AutoshellError::storage("clear tags", e))?;
        for tag in &entry.tags {
            conn.execute(
                "INSERT OR IGNORE INTO script_tags (script_id, tag) VALUES (?1, ?2)",
                params![script_id, tag],
            )
            .map_err(|e| AutoshellError::storage("insert tag", e))?;
        }

        debug!(script = %entry.name, script_id, "Script saved");
        Ok(script_id)
    }

    /// Save a batch of entries, typically the result of a scan.
    pub fn save_all(&self, entries: &[ScriptCatalogEntry]) -> Result<usize> {
        for entry in entries {
            self.save_script(entry)?;
        }
        Ok(entries.len())
    }

    pub fn all_scripts(&self) -> Result<Vec<ScriptCatalogEntry>> {
        let conn = self.conn.lock();
        let mut rows = {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, description, file_path, last_modified, executable, content
                     FROM scripts ORDER BY name",
                )
                .map_err(|e| AutoshellError::storage("prepare query", e))?;

            let mapped = stmt
                .query_map([], row_to_entry)
                .map_err(|e| AutoshellError::storage("query scripts", e))?;

            mapped
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| AutoshellError::storage("read scripts", e))?
        };

        for (script_id, entry) in &mut rows {
            entry.tags = load_tags(&conn, *script_id)
                .map_err(|e| AutoshellError::storage("load tags", e))?;
        }

        Ok(rows.into_iter().map(|(_, entry)| entry).collect())
    }

    /// Look up one script, by exact name first, then by file path.
    pub fn find_script(&self, query: &str) -> Result<Option<ScriptCatalogEntry>> {
        for column in ["name", "file_path"] {
            let sql = format!(
                "SELECT id, name, description, file_path, last_modified, executable, content
                 FROM scripts WHERE {} = ?1 LIMIT 1",
                column
            );
            let conn = self.conn.lock();
            let found = conn
                .query_row(&sql, params![query], row_to_entry)
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })
                .map_err(|e| AutoshellError::storage("find script", e))?;

            if let Some((script_id, mut entry)) = found {
                entry.tags = load_tags(&conn, script_id)
                    .map_err(|e| AutoshellError::storage("load tags", e))?;
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Create a group with a unique name.
    pub fn create_group(&self, name: &str, description: &str) -> Result<ScriptGroup> {
        let conn = self.conn.lock();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM script_groups WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .ok();
        if exists.is_some() {
            return Err(AutoshellError::GroupAlreadyExists(name.to_string()));
        }

        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO script_groups (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![name, description, created_at.to_rfc3339()],
        )
        .map_err(|e| AutoshellError::storage("create group", e))?;
        let id = conn.last_insert_rowid();

        debug!(group = %name, group_id = id, "Group created");
        Ok(ScriptGroup {
            id,
            name: name.to_string(),
            description: description.to_string(),
            created_at,
            scripts: Vec::new(),
        })
    }

    pub fn all_groups(&self) -> Result<Vec<ScriptGroup>> {
        let groups = {
            let conn = self.conn.lock();
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, description, created_at FROM script_groups ORDER BY name",
                )
                .map_err(|e| AutoshellError::storage("prepare query", e))?;

            let mapped = stmt
                .query_map([], row_to_group)
                .map_err(|e| AutoshellError::storage("query groups", e))?;

            mapped
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| AutoshellError::storage("read groups", e))?
        };

        groups
            .into_iter()
            .map(|mut group| {
                group.scripts = self.scripts_in_group(group.id)?;
                Ok(group)
            })
            .collect()
    }

    pub fn find_group(&self, name: &str) -> Result<Option<ScriptGroup>> {
        let found = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT id, name, description, created_at FROM script_groups WHERE name = ?1",
                params![name],
                row_to_group,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })
            .map_err(|e| AutoshellError::storage("find group", e))?
        };

        match found {
            Some(mut group) => {
                group.scripts = self.scripts_in_group(group.id)?;
                Ok(Some(group))
            }
            None => Ok(None),
        }
    }

    /// Group members, ordered by script name.
    pub fn scripts_in_group(&self, group_id: i64) -> Result<Vec<ScriptCatalogEntry>> {
        let conn = self.conn.lock();
        let mut rows = {
            let mut stmt = conn
                .prepare(
                    "SELECT s.id, s.name, s.description, s.file_path, s.last_modified,
                            s.executable, s.content
                     FROM scripts s
                     JOIN group_scripts gs ON s.id = gs.script_id
                     WHERE gs.group_id = ?1
                     ORDER BY s.name",
                )
                .map_err(|e| AutoshellError::storage("prepare query", e))?;

            let mapped = stmt
                .query_map(params![group_id], row_to_entry)
                .map_err(|e| AutoshellError::storage("query group scripts", e))?;

            mapped
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| AutoshellError::storage("read group scripts", e))?
        };

        for (script_id, entry) in &mut rows {
            entry.tags = load_tags(&conn, *script_id)
                .map_err(|e| AutoshellError::storage("load tags", e))?;
        }

        Ok(rows.into_iter().map(|(_, entry)| entry).collect())
    }

    /// Add a cataloged script to a group. The script must already be saved.
    pub fn add_script_to_group(&self, group_id: i64, script_path: &Path) -> Result<()> {
        let conn = self.conn.lock();
        let path = script_path.display().to_string();
        let script_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM scripts WHERE file_path = ?1",
                params![&path],
                |row| row.get(0),
            )
            .ok();
        let Some(script_id) = script_id else {
            return Err(AutoshellError::NotInCatalog(path));
        };

        conn.execute(
            "INSERT OR IGNORE INTO group_scripts (group_id, script_id) VALUES (?1, ?2)",
            params![group_id, script_id],
        )
        .map_err(|e| AutoshellError::storage("add script to group", e))?;

        debug!(group_id, script_id, "Script added to group");
        Ok(())
    }

    pub fn remove_script_from_group(&self, group_id: i64, script_path: &Path) -> Result<()> {
        let conn = self.conn.lock();
        let path = script_path.display().to_string();
        let script_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM scripts WHERE file_path = ?1",
                params![&path],
                |row| row.get(0),
            )
            .ok();
        let Some(script_id) = script_id else {
            return Ok(());
        };

        conn.execute(
            "DELETE FROM group_scripts WHERE group_id = ?1 AND script_id = ?2",
            params![group_id, script_id],
        )
        .map_err(|e| AutoshellError::storage("remove script from group", e))?;

        Ok(())
    }

    /// Delete a group and its memberships. Scripts themselves stay.
    pub fn remove_group(&self, group_id: i64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM group_scripts WHERE group_id = ?1",
            params![group_id],
        )
        .map_err(|e| AutoshellError::storage("clear group memberships", e))?;
        conn.execute(
            "DELETE FROM script_groups WHERE id = ?1",
            params![group_id],
        )
        .map_err(|e| AutoshellError::storage("remove group", e))?;

        debug!(group_id, "Group removed");
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl Clone for CatalogStore {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            db_path: self.db_path.clone(),
        }
    }
}

fn row_to_entry(row: &Row) -> rusqlite::Result<(i64, ScriptCatalogEntry)> {
    let script_id: i64 = row.get(0)?;
    let file_path: String = row.get(3)?;
    let last_modified: Option<String> = row.get(4)?;
    let description: Option<String> = row.get(2)?;
    let content: Option<String> = row.get(6)?;

    let mut entry = ScriptCatalogEntry::new(PathBuf::from(file_path));
    entry.name = row.get(1)?;
    entry.description = description.unwrap_or_default();
    entry.last_modified = last_modified
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    entry.executable = row.get(5)?;
    entry.content = content.unwrap_or_default();
    Ok((script_id, entry))
}

fn row_to_group(row: &Row) -> rusqlite::Result<ScriptGroup> {
    let created_at: String = row.get(3)?;
    let description: Option<String> = row.get(2)?;
    Ok(ScriptGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        description: description.unwrap_or_default(),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        scripts: Vec::new(),
    })
}

fn load_tags(conn: &Connection, script_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT tag FROM script_tags WHERE script_id = ?1 ORDER BY tag")?;
    let rows = stmt.query_map(params![script_id], |row| row.get(0))?;
    rows.collect()
}
