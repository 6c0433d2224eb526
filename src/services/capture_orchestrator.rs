//! Capture loop.
//!
//! The orchestrator sits in *Watching* (acquiring frames, waiting for a
//! trigger) and switches to *Capturing* for one cycle when the cadence timer
//! expires or a manual trigger arrives. A cycle reads every ROI from the same
//! frozen frame, persists the reading set and returns to *Watching*.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::db::Store;
use crate::models::reading::{ReadingSet, RoiReading};
use crate::models::roi::RoiDefinition;
use crate::services::frame_source::FrameSource;
use crate::services::ocr::{OcrEngine, OcrService};
use crate::services::preview::{NoPreview, Preview};
use crate::services::trigger_input::{drain, TickInput, Trigger};

/// Time of the last successful save and the automatic capture interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval: Duration,
    last_save: Instant,
}

impl Cadence {
    pub fn new(interval: Duration, last_save: Instant) -> Self {
        Self {
            interval,
            last_save,
        }
    }

    /// Due once at least `interval` has elapsed since the last save
    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_save) >= self.interval
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.saturating_duration_since(self.last_save))
    }

    pub fn last_save(&self) -> Instant {
        self.last_save
    }

    fn mark_saved(&mut self, at: Instant) {
        self.last_save = at;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureReason {
    Timer,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    Quit,
    Capture(CaptureReason),
    Watch,
}

/// Decide what one tick does. Quit beats any capture trigger, and at most
/// one capture happens per tick even when timer and manual coincide.
pub fn decide(input: &TickInput, cadence: &Cadence, now: Instant) -> TickDecision {
    if input.quit_requested {
        TickDecision::Quit
    } else if cadence.is_due(now) {
        TickDecision::Capture(CaptureReason::Timer)
    } else if input.capture_requested {
        TickDecision::Capture(CaptureReason::Manual)
    } else {
        TickDecision::Watch
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Quit,
    Watched,
    Captured(ReadingSet),
    /// Recognition ran but the store rejected the row
    PersistFailed,
}

pub struct CaptureOrchestrator<F: FrameSource, E: OcrEngine, S: Store> {
    rois: Vec<RoiDefinition>,
    frames: F,
    ocr: OcrService<E>,
    store: S,
    preview: Box<dyn Preview>,
    cadence: Cadence,
}

impl<F: FrameSource, E: OcrEngine, S: Store> CaptureOrchestrator<F, E, S> {
    /// The cadence starts at `started_at`, so the first timer capture comes
    /// one full interval later.
    pub fn new(
        rois: Vec<RoiDefinition>,
        frames: F,
        ocr: OcrService<E>,
        store: S,
        interval: Duration,
        started_at: Instant,
    ) -> Self {
        Self {
            rois,
            frames,
            ocr,
            store,
            preview: Box::new(NoPreview),
            cadence: Cadence::new(interval, started_at),
        }
    }

    pub fn with_preview(mut self, preview: Box<dyn Preview>) -> Self {
        self.preview = preview;
        self
    }

    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Recognize every ROI on a frozen frame. Never fails; unreadable
    /// regions come back as absent values.
    pub fn capture_cycle(&self, frame: &DynamicImage) -> ReadingSet {
        let readings: Vec<RoiReading> = self
            .rois
            .iter()
            .map(|roi| {
                if !roi.fits_within(frame.width(), frame.height()) {
                    warn!(label = %roi.label, "ROI extends past the frame edge");
                }
                let crop = roi.crop(frame);
                let reading = self.ocr.read_roi(&roi.label, &crop);
                info!(
                    label = %roi.label,
                    value = ?reading.value,
                    polarity = ?reading.polarity,
                    raw = reading.raw_text.as_deref().map(str::trim).unwrap_or(""),
                    "read"
                );
                reading
            })
            .collect();

        ReadingSet::from_readings(&readings)
    }

    /// Run the cycle on `frame`, persist it and reset the cadence.
    ///
    /// On a store error the cadence is left untouched so the timer retries.
    fn capture_and_store(&mut self, frame: &DynamicImage, now: Instant) -> Result<ReadingSet> {
        let started = Instant::now();
        let readings = self.capture_cycle(frame);

        self.store
            .append(&readings)
            .context("failed to persist reading set")?;
        self.cadence.mark_saved(now + started.elapsed());

        info!(
            recognized = readings.recognized_count(),
            total = readings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reading set saved"
        );
        Ok(readings)
    }

    /// One iteration of the loop.
    ///
    /// Returns an error only when no frame can be obtained.
    pub fn tick(&mut self, input: TickInput, now: Instant) -> Result<TickOutcome> {
        let capture = match decide(&input, &self.cadence, now) {
            TickDecision::Quit => {
                info!("quit requested");
                return Ok(TickOutcome::Quit);
            }
            TickDecision::Watch => None,
            TickDecision::Capture(reason) => Some(reason),
        };

        let frame = self
            .frames
            .acquire()
            .map_err(|e| anyhow!("frame acquisition failed: {}", e))?;

        if let Err(e) = self.preview.show(&frame, &self.rois) {
            debug!("preview update failed: {}", e);
        }

        let Some(reason) = capture else {
            return Ok(TickOutcome::Watched);
        };

        info!(?reason, "capturing");
        match self.capture_and_store(&frame, now) {
            Ok(readings) => Ok(TickOutcome::Captured(readings)),
            Err(e) => {
                error!("{:#}", e);
                Ok(TickOutcome::PersistFailed)
            }
        }
    }

    /// Acquire one frame and run a single capture cycle regardless of cadence
    pub fn capture_once(&mut self) -> Result<ReadingSet> {
        let frame = self
            .frames
            .acquire()
            .map_err(|e| anyhow!("frame acquisition failed: {}", e))?;

        self.capture_and_store(&frame, Instant::now())
    }

    /// Poll triggers every `poll_interval` until quit or a frame failure
    pub async fn run(
        &mut self,
        triggers: &mut UnboundedReceiver<Trigger>,
        poll_interval: Duration,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            rois = self.rois.len(),
            next_capture_secs = self.cadence.remaining(Instant::now()).as_secs(),
            "watching, enter 's' to capture now or 'q' to quit"
        );

        loop {
            ticker.tick().await;
            let input = drain(triggers);
            if let TickOutcome::Quit = self.tick(input, Instant::now())? {
                break;
            }
        }

        Ok(())
    }
}
