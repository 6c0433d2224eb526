use anyhow::{anyhow, Context, Result};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn};
use crate::db::SqliteStore;
use crate::models::config::AppConfig;
use crate::models::reading::ReadingSet;
use crate::services::capture_orchestrator::CaptureOrchestrator;
use crate::services::frame_source::{open_frame_source, FrameSource};
use crate::services::ocr::{OcrEngine, OcrService, PreprocessingService, TesseractEngine};
use crate::services::preview::FilePreview;
use crate::services::trigger_input::{spawn_ctrl_c_listener, spawn_stdin_listener};

pub type DefaultOrchestrator =
    CaptureOrchestrator<Box<dyn FrameSource>, TesseractEngine, SqliteStore>;

/// Wire up the configured frame source, Tesseract and the SQLite store
pub fn build_orchestrator(config: &AppConfig) -> Result<DefaultOrchestrator> {
    let frames = open_frame_source(&config.source).map_err(|e| anyhow!(e))?;

    let engine = TesseractEngine::new(&config.ocr);
    if !engine.is_available() {
        warn!(
            cmd = %config.ocr.tesseract_cmd.display(),
            "tesseract not found, every reading will be absent"
        );
    }
    let ocr = OcrService::new(PreprocessingService::new(config.preprocessing.clone()), engine);

    let store = SqliteStore::new(&config.storage.db_path)?;
    info!(db = %store.path().display(), "using database");

    let mut orchestrator = CaptureOrchestrator::new(
        config.rois.clone(),
        frames,
        ocr,
        store,
        Duration::from_secs(config.capture.interval_secs),
        Instant::now(),
    );
    if let Some(path) = &config.preview.path {
        info!(path = %path.display(), "writing alignment preview");
        orchestrator = orchestrator.with_preview(Box::new(FilePreview::new(path.clone())));
    }

    Ok(orchestrator)
}

/// Run the capture loop until `q`, Ctrl-C or a frame failure
pub fn run(config: &AppConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let result = runtime.block_on(async {
        let mut orchestrator = build_orchestrator(config)?;

        let (tx, mut rx) = unbounded_channel();
        let stdin = spawn_stdin_listener(tx.clone());
        let ctrl_c = spawn_ctrl_c_listener(tx);

        let result = orchestrator
            .run(&mut rx, Duration::from_millis(config.capture.poll_interval_ms))
            .await;

        stdin.abort();
        ctrl_c.abort();
        result
    });

    // The stdin reader sits in a blocking read; don't wait for it.
    runtime.shutdown_background();
    info!("stopped");
    result
}

/// Capture one reading set and print it
pub fn once(config: &AppConfig) -> Result<ReadingSet> {
    let mut orchestrator = build_orchestrator(config)?;
    let readings = orchestrator.capture_once()?;

    for (label, value) in readings.iter() {
        match value {
            Some(v) => println!("{}: {}", label, v),
            None => println!("{}: -", label),
        }
    }

    Ok(readings)
}
