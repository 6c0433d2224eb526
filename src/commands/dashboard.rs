use anyhow::Result;
use crate::db::SqliteStore;
use crate::models::config::AppConfig;
use crate::models::reading::column_for_label;
use crate::services::dashboard;

/// Serve the dashboard over the configured database; blocks forever
pub fn serve(config: &AppConfig, bind: Option<String>) -> Result<()> {
    let store = SqliteStore::new(&config.storage.db_path)?;

    let mut dashboard_config = config.dashboard.clone();
    if let Some(bind) = bind {
        dashboard_config.bind = bind;
    }

    let columns: Vec<String> = config.rois.iter().map(|r| column_for_label(&r.label)).collect();
    dashboard::serve(&store, &dashboard_config, &columns)
}
