use super::models::{FeedbackUpdate, HistoryEntry, NewHistoryEntry, SortOrder};
use super::schema::VERSIONED_SCHEMAS;
use crate::sqlite_persistence::validate_and_migrate;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::info;

pub trait HistoryStore: Send + Sync {
    fn insert_entry(&self, entry: NewHistoryEntry) -> Result<HistoryEntry>;
    fn get_entry(&self, id: i64) -> Result<Option<HistoryEntry>>;

    /// Returns `None` when no entry has the given id.
    fn update_feedback(&self, id: i64, update: &FeedbackUpdate) -> Result<Option<HistoryEntry>>;

    fn list_entries(&self, order: SortOrder) -> Result<Vec<HistoryEntry>>;
    fn count_entries(&self) -> Result<usize>;
}

const SELECT_ENTRY: &str = "SELECT id, timestamp, mood_pred, confidence, track_path, image_path, rating, relabel FROM history";

fn entry_from_row(row: &Row) -> rusqlite::Result<HistoryEntry> {
    let micros: i64 = row.get(1)?;
    let timestamp = DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(1, micros))?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        timestamp,
        mood_pred: row.get(2)?,
        confidence: row.get(3)?,
        track_path: row.get(4)?,
        image_path: row.get(5)?,
        rating: row.get(6)?,
        relabel: row.get(7)?,
    })
}

#[derive(Clone)]
pub struct SqliteHistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteHistoryStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = if db_path.exists() {
            let conn = Connection::open(db_path)
                .with_context(|| format!("Failed to open history database {:?}", db_path))?;
            let version = validate_and_migrate(&conn, VERSIONED_SCHEMAS)?;
            info!("Opened history database {:?} at version {}", db_path, version);
            conn
        } else {
            let conn = Connection::open(db_path)
                .with_context(|| format!("Failed to create history database {:?}", db_path))?;
            Self::create_latest(&conn)?;
            info!("Created history database {:?}", db_path);
            conn
        };

        Ok(SqliteHistoryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::create_latest(&conn)?;
        Ok(SqliteHistoryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn create_latest(conn: &Connection) -> Result<()> {
        VERSIONED_SCHEMAS
            .last()
            .context("No history schema defined")?
            .create(conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("History database lock is poisoned"))
    }

    fn get_with_conn(conn: &Connection, id: i64) -> Result<Option<HistoryEntry>> {
        let entry = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_ENTRY),
                params![id],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn insert_entry(&self, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        let micros = entry.timestamp.timestamp_micros();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO history (timestamp, mood_pred, confidence, track_path, image_path) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                micros,
                entry.mood_pred,
                entry.confidence,
                entry.track_path,
                entry.image_path
            ],
        )
        .context("Failed to insert history entry")?;
        let id = conn.last_insert_rowid();

        Ok(HistoryEntry {
            id,
            timestamp: DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or(entry.timestamp),
            mood_pred: entry.mood_pred,
            confidence: entry.confidence,
            track_path: entry.track_path,
            image_path: entry.image_path,
            rating: None,
            relabel: None,
        })
    }

    fn get_entry(&self, id: i64) -> Result<Option<HistoryEntry>> {
        let conn = self.lock()?;
        Self::get_with_conn(&conn, id)
    }

    fn update_feedback(&self, id: i64, update: &FeedbackUpdate) -> Result<Option<HistoryEntry>> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE history SET rating = COALESCE(?1, rating), relabel = COALESCE(?2, relabel) WHERE id = ?3",
                params![update.rating, update.relabel, id],
            )
            .with_context(|| format!("Failed to update feedback of entry {}", id))?;
        if changed == 0 {
            return Ok(None);
        }
        Self::get_with_conn(&conn, id)
    }

    fn list_entries(&self, order: SortOrder) -> Result<Vec<HistoryEntry>> {
        let ordering = match order {
            SortOrder::OldestFirst => "ORDER BY timestamp ASC, id ASC",
            SortOrder::NewestFirst => "ORDER BY timestamp DESC, id DESC",
        };
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{} {}", SELECT_ENTRY, ordering))?;
        let entries = stmt
            .query_map([], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read history entries")?;
        Ok(entries)
    }

    fn count_entries(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
