use image::DynamicImage;
use tracing::debug;
use xcap::Monitor;
use crate::services::frame_source::FrameSource;

/// Screen capture frame source using xcap.
///
/// Frames are returned in physical pixels, so ROI coordinates must be given
/// in physical pixels as well.
pub struct ScreenCapture {
    monitor: Monitor,
}

impl ScreenCapture {
    /// Create a new screen capture instance using the primary monitor
    pub fn new() -> Result<Self, String> {
        let monitor = Monitor::all()
            .map_err(|e| format!("Failed to get monitors: {}", e))?
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .ok_or("No primary monitor found")?;

        Self::log_monitor(&monitor);
        Ok(Self { monitor })
    }

    /// Create screen capture for a specific monitor by index
    pub fn with_monitor(monitor_index: usize) -> Result<Self, String> {
        let monitors = Monitor::all().map_err(|e| format!("Failed to get monitors: {}", e))?;

        let monitor = monitors
            .get(monitor_index)
            .ok_or(format!("Monitor index {} not found", monitor_index))?
            .clone();

        Self::log_monitor(&monitor);
        Ok(Self { monitor })
    }

    fn log_monitor(monitor: &Monitor) {
        debug!(
            width = monitor.width().unwrap_or(0),
            height = monitor.height().unwrap_or(0),
            scale_factor = monitor.scale_factor().unwrap_or(1.0),
            "screen capture initialized"
        );
    }
}

impl FrameSource for ScreenCapture {
    fn acquire(&mut self) -> Result<DynamicImage, String> {
        let rgba_image = self
            .monitor
            .capture_image()
            .map_err(|e| format!("Failed to capture screen: {}", e))?;

        Ok(DynamicImage::ImageRgba8(rgba_image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_full_screen() {
        let mut capture = match ScreenCapture::new() {
            Ok(c) => c,
            Err(_) => {
                println!("Skipping test - no display available");
                return;
            }
        };

        let image = match capture.acquire() {
            Ok(image) => image,
            Err(e) => {
                println!("Skipping test - capture not permitted: {}", e);
                return;
            }
        };

        assert!(image.width() > 0);
        assert!(image.height() > 0);
    }

    #[test]
    fn test_invalid_monitor_index() {
        let result = ScreenCapture::with_monitor(usize::MAX);
        assert!(result.is_err());
    }
}
