use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::PathBuf;
use crate::models::roi::RoiDefinition;

const ROI_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BORDER: u32 = 2;

/// Live alignment view, purely cosmetic
pub trait Preview {
    fn show(&mut self, frame: &DynamicImage, rois: &[RoiDefinition]) -> Result<(), String>;
}

/// Draw every ROI outline onto a copy of the frame.
///
/// Outlines are clipped to the frame; a ROI starting outside it is skipped.
pub fn annotate(frame: &DynamicImage, rois: &[RoiDefinition]) -> RgbaImage {
    let mut canvas = frame.to_rgba8();
    let (frame_width, frame_height) = canvas.dimensions();

    for roi in rois.iter().filter(|r| r.is_valid()) {
        if roi.x >= frame_width || roi.y >= frame_height {
            continue;
        }
        let width = roi.width.min(frame_width - roi.x);
        let height = roi.height.min(frame_height - roi.y);

        for inset in 0..BORDER {
            let inset_width = width.saturating_sub(inset * 2);
            let inset_height = height.saturating_sub(inset * 2);
            if inset_width == 0 || inset_height == 0 {
                break;
            }
            let (Ok(left), Ok(top)) = (
                i32::try_from(roi.x.saturating_add(inset)),
                i32::try_from(roi.y.saturating_add(inset)),
            ) else {
                break;
            };
            let rect = Rect::at(left, top).of_size(inset_width, inset_height);
            draw_hollow_rect_mut(&mut canvas, rect, ROI_COLOR);
        }
    }

    canvas
}

/// Writes the annotated frame to a PNG on every tick
pub struct FilePreview {
    path: PathBuf,
}

impl FilePreview {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Preview for FilePreview {
    fn show(&mut self, frame: &DynamicImage, rois: &[RoiDefinition]) -> Result<(), String> {
        annotate(frame, rois)
            .save(&self.path)
            .map_err(|e| format!("Failed to write preview {}: {}", self.path.display(), e))
    }
}

/// Preview that does nothing, for headless runs
pub struct NoPreview;

impl Preview for NoPreview {
    fn show(&mut self, _frame: &DynamicImage, _rois: &[RoiDefinition]) -> Result<(), String> {
        Ok(())
    }
}

impl<T: Preview + ?Sized> Preview for Box<T> {
    fn show(&mut self, frame: &DynamicImage, rois: &[RoiDefinition]) -> Result<(), String> {
        (**self).show(frame, rois)
    }
}
