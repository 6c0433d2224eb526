use image::GrayImage;
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tracing::warn;
use super::engine::OcrEngine;
use crate::models::config::OcrConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Tesseract OCR engine driven through the `tesseract` executable
pub struct TesseractEngine {
    command: PathBuf,
    page_seg_mode: u8,
    whitelist: String,
    timeout: Option<Duration>,
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            page_seg_mode: config.page_seg_mode,
            whitelist: config.whitelist.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Arguments after the input path: print to stdout, single line, whitelist
    fn args(&self) -> Vec<String> {
        vec![
            "stdout".to_string(),
            "--psm".to_string(),
            self.page_seg_mode.to_string(),
            "-c".to_string(),
            format!("tessedit_char_whitelist={}", self.whitelist),
        ]
    }

    fn wait(&self, mut child: Child) -> Result<Output, String> {
        let Some(timeout) = self.timeout else {
            return child
                .wait_with_output()
                .map_err(|e| format!("Failed to wait for tesseract: {}", e));
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => {
                    return child
                        .wait_with_output()
                        .map_err(|e| format!("Failed to read tesseract output: {}", e));
                }
                Ok(None) if Instant::now() >= deadline => {
                    if let Err(e) = child.kill() {
                        warn!("failed to kill hung tesseract process: {}", e);
                    }
                    let _ = child.wait();
                    return Err(format!("Tesseract timed out after {:?}", timeout));
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(format!("Failed to poll tesseract: {}", e)),
            }
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &GrayImage) -> Result<String, String> {
        let input = NamedTempFile::with_suffix(".png")
            .map_err(|e| format!("Failed to create temp file: {}", e))?;
        image
            .save(input.path())
            .map_err(|e| format!("Failed to encode image: {}", e))?;

        let child = Command::new(&self.command)
            .arg(input.path())
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("Failed to start {}: {}", self.command.display(), e))?;

        let output = self.wait(child)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}
