use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params_from_iter, types::Value, Connection};
use tracing::{debug, warn};

pub mod migrations;

use crate::models::reading::{column_for_label, ReadingSet, StoredSample};
use migrations::{init_schema, metric_columns, TABLE};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only time-series store for reading sets
pub trait Store {
    /// Persist one reading set as one row, stamped with the write time
    fn append(&self, readings: &ReadingSet) -> Result<()>;

    /// Up to `limit` rows, newest first
    fn recent(&self, limit: usize) -> Result<Vec<StoredSample>>;
}

fn now_timestamp() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// SQLite-backed store. A connection is opened per operation and closed
/// when it returns; there is no pool and no long-lived handle.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create the database file and base table if needed
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let store = Self { db_path };
        let conn = store.open()?;
        init_schema(&conn).context("failed to initialize schema")?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("failed to open database {}", self.db_path.display()))
    }
}

impl Store for SqliteStore {
    fn append(&self, readings: &ReadingSet) -> Result<()> {
        let conn = self.open()?;
        let available = metric_columns(&conn)?;

        let mut columns = vec!["\"timestamp\"".to_string()];
        let mut values = vec![Value::Text(now_timestamp())];
        let mut used: Vec<String> = Vec::new();

        for (label, value) in readings.iter() {
            let column = column_for_label(label);
            if !available.contains(&column) {
                warn!(label, column = %column, "no column for label, value not stored");
                continue;
            }
            if used.contains(&column) {
                warn!(label, column = %column, "column already filled by another label");
                continue;
            }

            columns.push(format!("\"{}\"", column));
            values.push(value.map_or(Value::Null, Value::Real));
            used.push(column);
        }

        let placeholders = (1..=values.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            TABLE,
            columns.join(", "),
            placeholders
        );

        conn.execute(&sql, params_from_iter(values.iter()))
            .context("failed to insert reading set")?;
        debug!(row_id = conn.last_insert_rowid(), "reading set stored");
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredSample>> {
        let conn = self.open()?;
        let columns = metric_columns(&conn)?;

        let select = std::iter::once("id".to_string())
            .chain(std::iter::once("\"timestamp\"".to_string()))
            .chain(columns.iter().map(|c| format!("\"{}\"", c)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {} ORDER BY \"timestamp\" DESC, id DESC LIMIT ?1",
            select, TABLE
        );

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([limit], |row| {
            let mut values = Vec::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                values.push((column.clone(), row.get::<_, Option<f64>>(i + 2)?));
            }
            Ok(StoredSample {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                values,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read recent samples")
    }
}

/// In-process store used for dry runs and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StoredSample>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

impl Store for MemoryStore {
    fn append(&self, readings: &ReadingSet) -> Result<()> {
        let mut rows = self.rows.lock();
        let id = rows.len() as i64 + 1;
        rows.push(StoredSample {
            id,
            timestamp: now_timestamp(),
            values: readings
                .iter()
                .map(|(label, value)| (column_for_label(label), value))
                .collect(),
        });
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredSample>> {
        Ok(self.rows.lock().iter().rev().take(limit).cloned().collect())
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn append(&self, readings: &ReadingSet) -> Result<()> {
        (**self).append(readings)
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredSample>> {
        (**self).recent(limit)
    }
}
