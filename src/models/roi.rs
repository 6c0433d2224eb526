use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Named rectangular region over the frame coordinate space.
///
/// Rectangles are not checked against the frame size. A rectangle that runs
/// past the frame edge yields a smaller (possibly empty) crop; keeping the
/// table aligned with the camera/screen is a configuration responsibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoiDefinition {
    pub label: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RoiDefinition {
    /// Create a new ROI from coordinates
    pub fn new(label: impl Into<String>, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// Validate ROI dimensions
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn x2(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn y2(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// True when the rectangle lies entirely inside a frame of the given size
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.x2() <= frame_width && self.y2() <= frame_height
    }

    /// Crop this region out of a frame.
    ///
    /// The crop is clamped to the frame, so an out-of-bounds rectangle
    /// silently produces a smaller or empty image.
    pub fn crop(&self, frame: &DynamicImage) -> DynamicImage {
        frame.crop_imm(self.x, self.y, self.width, self.height)
    }
}

/// The configured air-quality panel layout.
pub fn default_rois() -> Vec<RoiDefinition> {
    vec![
        RoiDefinition::new("PM2.5", 50, 100, 100, 100),
        RoiDefinition::new("PM10", 250, 100, 100, 100),
        RoiDefinition::new("CO", 50, 250, 100, 100),
        RoiDefinition::new("NO2", 250, 250, 100, 100),
        RoiDefinition::new("SO2", 50, 400, 100, 100),
        RoiDefinition::new("O3", 250, 400, 100, 100),
    ]
}
