use crate::error::Result;
use crate::types::Reading;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Storage contract for readings, keyed uniquely by the recognized
/// `last_update` string.
///
/// `insert` must guarantee at most one stored row per timestamp even when
/// inserts race; the `exists` check is an optimization, not the correctness
/// mechanism.
#[async_trait]
pub trait FlowStore: Send + Sync {
    async fn exists(&self, last_update: &str) -> Result<bool>;

    /// Returns `true` if the reading was written, `false` if a row with the
    /// same timestamp was already present.
    async fn insert(&self, reading: &Reading) -> Result<bool>;

    /// All stored readings in insertion order.
    async fn all_readings(&self) -> Result<Vec<Reading>>;
}

/// SQLite-backed store. The UNIQUE constraint on `last_update` serializes
/// racing inserts for the same key; `INSERT OR IGNORE` reports whether a row
/// was actually written.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::initialize(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS water_flow (
                id                 INTEGER PRIMARY KEY AUTOINCREMENT,
                last_update        TEXT NOT NULL UNIQUE,
                through_turbine    REAL NOT NULL,
                through_pond_hatch REAL NOT NULL,
                total              REAL NOT NULL,
                created_at         TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;
        debug!("database initialized");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl FlowStore for SqliteStore {
    async fn exists(&self, last_update: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let row: Option<i64> = conn
            .query_row(
                "SELECT id FROM water_flow WHERE last_update = ?1",
                params![last_update],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    async fn insert(&self, reading: &Reading) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO water_flow (last_update, through_turbine, through_pond_hatch, total)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                reading.last_update,
                reading.through_turbine,
                reading.through_pond_hatch,
                reading.total
            ],
        )?;
        Ok(inserted > 0)
    }

    async fn all_readings(&self) -> Result<Vec<Reading>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT last_update, through_turbine, through_pond_hatch, total
             FROM water_flow ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Reading {
                last_update: row.get(0)?,
                through_turbine: row.get(1)?,
                through_pond_hatch: row.get(2)?,
                total: row.get(3)?,
            })
        })?;
        let mut readings = Vec::new();
        for row in rows {
            readings.push(row?);
        }
        Ok(readings)
    }
}

/// In-memory store for development and tests. The single lock makes the
/// check-then-push in `insert` atomic.
#[derive(Default)]
pub struct MemoryStore {
    readings: Mutex<Vec<Reading>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStore for MemoryStore {
    async fn exists(&self, last_update: &str) -> Result<bool> {
        let readings = self.readings.lock().unwrap();
        Ok(readings.iter().any(|r| r.last_update == last_update))
    }

    async fn insert(&self, reading: &Reading) -> Result<bool> {
        let mut readings = self.readings.lock().unwrap();
        if readings.iter().any(|r| r.last_update == reading.last_update) {
            return Ok(false);
        }
        readings.push(reading.clone());
        Ok(true)
    }

    async fn all_readings(&self) -> Result<Vec<Reading>> {
        Ok(self.readings.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_timestamp_keeps_exactly_one_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        let reading = Reading::new("2024-05-01 10:00", 15.2, 3.8);

        assert!(store.insert(&reading).await.unwrap());
        assert!(!store.insert(&reading).await.unwrap());

        let stored = store.all_readings().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], reading);
    }

    #[tokio::test]
    async fn exists_reflects_inserted_keys() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.exists("2024-05-01 10:00").await.unwrap());

        store
            .insert(&Reading::new("2024-05-01 10:00", 1.0, 2.0))
            .await
            .unwrap();
        assert!(store.exists("2024-05-01 10:00").await.unwrap());
        assert!(!store.exists("2024-05-01 11:00").await.unwrap());
    }

    #[tokio::test]
    async fn readings_come_back_in_insertion_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (ts, flow) in [("10:00", 1.0), ("11:00", 2.0), ("09:00", 3.0)] {
            store.insert(&Reading::new(ts, flow, 0.0)).await.unwrap();
        }

        let stored = store.all_readings().await.unwrap();
        let order: Vec<&str> = stored.iter().map(|r| r.last_update.as_str()).collect();
        assert_eq!(order, vec!["10:00", "11:00", "09:00"]);
    }

    #[tokio::test]
    async fn empty_store_returns_empty_list() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.all_readings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("flow.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store
                .insert(&Reading::new("2024-05-01 10:00", 15.2, 3.8))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let stored = store.all_readings().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].total, 19.0);
    }

    #[tokio::test]
    async fn memory_store_dedups_like_sqlite() {
        let store = MemoryStore::new();
        let reading = Reading::new("2024-05-01 10:00", 15.2, 3.8);

        assert!(store.insert(&reading).await.unwrap());
        assert!(!store.insert(&reading).await.unwrap());
        assert_eq!(store.all_readings().await.unwrap().len(), 1);
    }
}
