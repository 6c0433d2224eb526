use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use crate::models::roi::{default_rois, RoiDefinition};

/// Capture cadence configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Seconds between automatic captures
    pub interval_secs: u64,
    /// Milliseconds between trigger checks
    pub poll_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            poll_interval_ms: 500,
        }
    }
}

/// Where frames come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FrameSourceConfig {
    /// Capture a monitor; `None` selects the primary one
    Screen {
        #[serde(default)]
        monitor: Option<usize>,
    },
    /// Read an image file that an external camera tool keeps refreshing
    File { path: PathBuf },
}

impl Default for FrameSourceConfig {
    fn default() -> Self {
        Self::Screen { monitor: None }
    }
}

/// Image preprocessing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Gaussian blur kernel size (odd)
    pub blur_kernel: u32,
    /// Adaptive threshold neighbourhood size (odd)
    pub block_size: u32,
    /// Constant subtracted from the local mean
    pub offset: i32,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            block_size: 11,
            offset: 2,
        }
    }
}

/// Tesseract invocation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    pub tesseract_cmd: PathBuf,
    pub page_seg_mode: u8,
    pub whitelist: String,
    /// Kill a recognition that runs longer than this; `None` waits forever
    pub timeout_secs: Option<u64>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: PathBuf::from("tesseract"),
            page_seg_mode: 7,
            whitelist: "0123456789.".to_string(),
            timeout_secs: None,
        }
    }
}

/// Database location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("aqi.db"),
        }
    }
}

/// Dashboard HTTP endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind: String,
    pub recent_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            recent_limit: 50,
        }
    }
}

/// Live alignment preview
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PreviewConfig {
    /// PNG written every tick with the ROI rectangles drawn on it
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub rois: Vec<RoiDefinition>,
    pub capture: CaptureConfig,
    pub source: FrameSourceConfig,
    pub preprocessing: PreprocessingConfig,
    pub ocr: OcrConfig,
    pub storage: StorageConfig,
    pub dashboard: DashboardConfig,
    pub preview: PreviewConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rois: default_rois(),
            capture: CaptureConfig::default(),
            source: FrameSourceConfig::default(),
            preprocessing: PreprocessingConfig::default(),
            ocr: OcrConfig::default(),
            storage: StorageConfig::default(),
            dashboard: DashboardConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reject configurations the capture loop cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.rois.is_empty() {
            return Err("At least one ROI must be configured".to_string());
        }

        let mut seen = HashSet::new();
        for roi in &self.rois {
            if roi.label.trim().is_empty() {
                return Err("ROI labels must not be empty".to_string());
            }
            if !seen.insert(roi.label.as_str()) {
                return Err(format!("Duplicate ROI label: {}", roi.label));
            }
        }

        if self.capture.interval_secs == 0 {
            return Err("capture.interval_secs must be greater than 0".to_string());
        }
        if self.capture.poll_interval_ms == 0 {
            return Err("capture.poll_interval_ms must be greater than 0".to_string());
        }

        let p = &self.preprocessing;
        if p.blur_kernel == 0 || p.blur_kernel % 2 == 0 {
            return Err(format!("Blur kernel must be odd, got {}", p.blur_kernel));
        }
        if p.block_size < 3 || p.block_size % 2 == 0 {
            return Err(format!("Block size must be odd and >= 3, got {}", p.block_size));
        }

        if self.ocr.timeout_secs == Some(0) {
            return Err("ocr.timeout_secs must be greater than 0 when set".to_string());
        }

        Ok(())
    }
}
