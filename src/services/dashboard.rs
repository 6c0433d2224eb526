use anyhow::{anyhow, Result};
use serde_json::{json, Map, Value};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{info, warn};

use crate::db::Store;
use crate::models::config::DashboardConfig;
use crate::models::reading::StoredSample;

const INDEX_HTML: &str = include_str!("../../assets/dashboard.html");

/// Chart payload: `timestamps` plus one array per metric column, oldest first.
///
/// Absent values become `0` here and nowhere else.
pub fn chart_data(rows_newest_first: &[StoredSample], default_columns: &[String]) -> Value {
    let columns: Vec<String> = match rows_newest_first.first() {
        Some(row) => row.values.iter().map(|(c, _)| c.clone()).collect(),
        None => default_columns.to_vec(),
    };

    let mut body = Map::new();
    body.insert(
        "timestamps".to_string(),
        rows_newest_first
            .iter()
            .rev()
            .map(|r| Value::from(r.timestamp.clone()))
            .collect(),
    );

    for column in columns {
        let series: Vec<Value> = rows_newest_first
            .iter()
            .rev()
            .map(|r| json!(r.value(&column).flatten().unwrap_or(0.0)))
            .collect();
        body.insert(column, Value::Array(series));
    }

    Value::Object(body)
}

/// HTTP status, content type and body for one request
pub fn route<S: Store>(
    method: &Method,
    url: &str,
    store: &S,
    limit: usize,
    default_columns: &[String],
) -> (u16, &'static str, String) {
    if *method != Method::Get {
        return (405, "text/plain", "method not allowed".to_string());
    }

    let path = url.split('?').next().unwrap_or(url);
    match path {
        "/" | "/index.html" => (200, "text/html; charset=utf-8", INDEX_HTML.to_string()),
        "/data" => match store.recent(limit) {
            Ok(rows) => (
                200,
                "application/json",
                chart_data(&rows, default_columns).to_string(),
            ),
            Err(e) => {
                warn!("failed to load dashboard rows: {:#}", e);
                (500, "text/plain", "failed to load data".to_string())
            }
        },
        _ => (404, "text/plain", "not found".to_string()),
    }
}

fn respond<S: Store>(
    request: Request,
    store: &S,
    config: &DashboardConfig,
    default_columns: &[String],
) -> Result<()> {
    let (status, content_type, body) = route(
        request.method(),
        request.url(),
        store,
        config.recent_limit,
        default_columns,
    );
    let header = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
        .map_err(|_| anyhow!("invalid content type header"))?;

    let response = Response::from_string(body)
        .with_status_code(StatusCode(status))
        .with_header(header);
    request
        .respond(response)
        .map_err(|e| anyhow!("failed to send response: {}", e))
}

/// Serve the dashboard until the process is stopped
pub fn serve<S: Store>(
    store: &S,
    config: &DashboardConfig,
    default_columns: &[String],
) -> Result<()> {
    let server = Server::http(config.bind.as_str())
        .map_err(|e| anyhow!("failed to bind dashboard on {}: {}", config.bind, e))?;
    info!(bind = %config.bind, "dashboard listening");

    for request in server.incoming_requests() {
        if let Err(e) = respond(request, store, config, default_columns) {
            warn!("{:#}", e);
        }
    }

    Ok(())
}
