use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use tracing::info;

pub const TABLE: &str = "aqi_data";

/// Columns that are not metric values
const RESERVED_COLUMNS: [&str; 2] = ["id", "timestamp"];

/// Extra columns for water-quality panels
pub const WATER_COLUMNS: [(&str, &str); 3] = [
    ("ph", "REAL"),
    ("turbidity", "REAL"),
    ("water_level", "REAL"),
];

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS aqi_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    pm25 REAL,
    pm10 REAL,
    co REAL,
    so2 REAL,
    no2 REAL,
    o3 REAL
);
CREATE INDEX IF NOT EXISTS idx_aqi_data_timestamp ON aqi_data (timestamp);";

/// Whether `add_column` changed the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStatus {
    Added,
    AlreadyPresent,
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("failed to create aqi_data table")
}

/// All column names of the table, in declaration order
pub fn table_columns(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", TABLE))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to read table info")?;
    Ok(names)
}

/// Metric value columns, in declaration order
pub fn metric_columns(conn: &Connection) -> Result<Vec<String>> {
    Ok(table_columns(conn)?
        .into_iter()
        .filter(|c| !RESERVED_COLUMNS.contains(&c.as_str()))
        .collect())
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

/// Add a column unless it already exists. Safe to run repeatedly.
pub fn add_column(conn: &Connection, name: &str, sql_type: &str) -> Result<ColumnStatus> {
    if !is_identifier(name) || !is_identifier(sql_type) {
        bail!("invalid column definition '{} {}'", name, sql_type);
    }

    if table_columns(conn)?.iter().any(|c| c.eq_ignore_ascii_case(name)) {
        info!(column = name, "column already exists");
        return Ok(ColumnStatus::AlreadyPresent);
    }

    conn.execute_batch(&format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        TABLE, name, sql_type
    ))
    .with_context(|| format!("failed to add column {}", name))?;
    info!(column = name, "added column");
    Ok(ColumnStatus::Added)
}

/// Ensure the base table and every requested column exist
pub fn upgrade(
    conn: &mut Connection,
    columns: &[(&str, &str)],
) -> Result<Vec<(String, ColumnStatus)>> {
    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    init_schema(&tx)?;
    let mut report = Vec::with_capacity(columns.len());
    for (name, sql_type) in columns {
        let status = add_column(&tx, name, sql_type)?;
        report.push((name.to_string(), status));
    }

    tx.commit().context("failed to commit migration")?;
    Ok(report)
}
