//! Local sheet cache.
//!
//! Parsed sheet rows are cached in a small SQLite database so the curator
//! does not have to re-pick the spreadsheets on every launch. The cache is
//! keyed by source name and stores the originating file name, a load
//! timestamp, and the mapped rows as JSON.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;

use crate::sheets::SheetRow;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sheets (
    name TEXT PRIMARY KEY,
    file_name TEXT NOT NULL,
    loaded_at TEXT NOT NULL,
    rows TEXT NOT NULL
);
"#;

/// A cached sheet with its provenance.
#[derive(Debug, Clone)]
pub struct CachedSheet {
    pub file_name: String,
    pub loaded_at: DateTime<Utc>,
    pub rows: Vec<SheetRow>,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Store (or replace) the cached rows for a source.
    pub fn put_sheet(&self, source: &str, file_name: &str, rows: &[SheetRow]) -> Result<()> {
        let json = serde_json::to_string(rows)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO sheets (name, file_name, loaded_at, rows) VALUES (?, ?, ?, ?)",
            rusqlite::params![source, file_name, Utc::now().to_rfc3339(), json],
        )?;
        Ok(())
    }

    pub fn get_sheet(&self, source: &str) -> Result<Option<CachedSheet>> {
        let mut stmt = self
            .conn
            .prepare("SELECT file_name, loaded_at, rows FROM sheets WHERE name = ?")?;
        let mut rows = stmt.query([source])?;

        match rows.next()? {
            Some(row) => {
                let file_name: String = row.get(0)?;
                let loaded_at: String = row.get(1)?;
                let data: String = row.get(2)?;

                let loaded_at = DateTime::parse_from_rfc3339(&loaded_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());
                let rows: Vec<SheetRow> =
                    serde_json::from_str(&data).context("corrupt cached sheet rows")?;

                Ok(Some(CachedSheet {
                    file_name,
                    loaded_at,
                    rows,
                }))
            }
            None => Ok(None),
        }
    }

    pub fn clear_sheet(&self, source: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sheets WHERE name = ?", [source])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::{FieldValue, SheetRow};
    use std::collections::BTreeMap;

    fn sample_rows() -> Vec<SheetRow> {
        vec![SheetRow {
            line_number: 2,
            values: BTreeMap::from([(
                "notes".to_string(),
                FieldValue::Text("flowering".to_string()),
            )]),
        }]
    }

    #[test]
    fn test_put_get_clear_round_trip() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();

        assert!(db.get_sheet("field_notes").unwrap().is_none());

        db.put_sheet("field_notes", "notes.csv", &sample_rows())
            .unwrap();
        let cached = db.get_sheet("field_notes").unwrap().unwrap();
        assert_eq!(cached.file_name, "notes.csv");
        assert_eq!(cached.rows, sample_rows());

        db.clear_sheet("field_notes").unwrap();
        assert!(db.get_sheet("field_notes").unwrap().is_none());
    }

    #[test]
    fn test_put_replaces_existing_entry() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();

        db.put_sheet("checklist", "old.csv", &sample_rows()).unwrap();
        db.put_sheet("checklist", "new.csv", &[]).unwrap();

        let cached = db.get_sheet("checklist").unwrap().unwrap();
        assert_eq!(cached.file_name, "new.csv");
        assert!(cached.rows.is_empty());
    }
}
