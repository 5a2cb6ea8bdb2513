use crate::fix::AggregateFix;
use crate::store::{FixStore, StoreError};
use log::info;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed fix history using the `intersects` table.
pub struct SqliteFixStore {
    conn: Connection,
}

impl SqliteFixStore {
    /// Opens (creating if needed) the database and its table.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!(
                    "cannot create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(db_path)?;
        Self::with_connection(conn).map(|store| {
            info!("fix store ready at {}", db_path.display());
            store
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS intersects (
                time INTEGER,
                latitude REAL,
                longitude REAL
            )",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl FixStore for SqliteFixStore {
    fn append(&mut self, fix: &AggregateFix) -> Result<(), StoreError> {
        // autocommit: durable once execute returns
        self.conn.execute(
            "INSERT INTO intersects (time, latitude, longitude) VALUES (?1, ?2, ?3)",
            params![fix.time, fix.latitude, fix.longitude],
        )?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<AggregateFix>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT time, latitude, longitude FROM intersects ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(AggregateFix {
                time: row.get(0)?,
                latitude: row.get(1)?,
                longitude: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM intersects", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_fixes() -> Vec<AggregateFix> {
        vec![
            AggregateFix {
                time: 1_700_000_000,
                latitude: 40.123_456_789,
                longitude: -74.987_654_321,
            },
            AggregateFix {
                time: 1_700_000_001,
                latitude: -0.000_001,
                longitude: 179.999_999,
            },
            AggregateFix {
                time: 1_699_999_999,
                latitude: 12.5,
                longitude: 0.0,
            },
        ]
    }

    #[test]
    fn fixes_read_back_unmodified_and_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("fixes.db");

        let mut store = SqliteFixStore::open(&path).unwrap();
        for fix in sample_fixes() {
            store.append(&fix).unwrap();
        }
        drop(store);

        let reopened = SqliteFixStore::open(&path).unwrap();
        assert_eq!(reopened.read_all().unwrap(), sample_fixes());
        assert_eq!(reopened.len().unwrap(), 3);
    }

    #[test]
    fn append_is_visible_to_next_read() {
        let mut store = SqliteFixStore::open_in_memory().unwrap();
        assert!(store.read_all().unwrap().is_empty());
        let fix = sample_fixes()[0];
        store.append(&fix).unwrap();
        assert_eq!(store.read_all().unwrap(), vec![fix]);
    }

    #[test]
    fn open_fails_when_parent_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let result = SqliteFixStore::open(blocker.join("fixes.db"));
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
