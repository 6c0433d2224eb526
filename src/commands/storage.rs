use anyhow::Result;
use crate::db::migrations::{self, ColumnStatus, WATER_COLUMNS};
use crate::db::SqliteStore;
use crate::models::config::StorageConfig;

/// Add the water-quality columns; prints one line per column
pub fn migrate(config: &StorageConfig) -> Result<Vec<(String, ColumnStatus)>> {
    let store = SqliteStore::new(&config.db_path)?;
    let mut conn = store.open()?;
    let report = migrations::upgrade(&mut conn, &WATER_COLUMNS)?;

    for (column, status) in &report {
        match status {
            ColumnStatus::Added => println!("added column {}", column),
            ColumnStatus::AlreadyPresent => println!("column {} already exists", column),
        }
    }

    Ok(report)
}
