use image::DynamicImage;
use std::path::PathBuf;
use crate::models::config::FrameSourceConfig;
use crate::services::screen_capture::ScreenCapture;

/// Supplies raw frames on demand.
///
/// Failing to produce a frame is fatal to the capture loop.
pub trait FrameSource {
    fn acquire(&mut self) -> Result<DynamicImage, String>;
}

/// Reads the latest frame from an image file that an external camera tool
/// keeps overwriting
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSource for ImageFileSource {
    fn acquire(&mut self) -> Result<DynamicImage, String> {
        image::open(&self.path)
            .map_err(|e| format!("Failed to read frame {}: {}", self.path.display(), e))
    }
}

/// Build the frame source selected in the configuration
pub fn open_frame_source(config: &FrameSourceConfig) -> Result<Box<dyn FrameSource>, String> {
    match config {
        FrameSourceConfig::Screen { monitor: None } => Ok(Box::new(ScreenCapture::new()?)),
        FrameSourceConfig::Screen {
            monitor: Some(index),
        } => Ok(Box::new(ScreenCapture::with_monitor(*index)?)),
        FrameSourceConfig::File { path } => Ok(Box::new(ImageFileSource::new(path.clone()))),
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn acquire(&mut self) -> Result<DynamicImage, String> {
        (**self).acquire()
    }
}
