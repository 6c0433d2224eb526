use image::GrayImage;

/// OCR Engine trait - abstraction for different OCR implementations
pub trait OcrEngine: Send + Sync {
    /// Transcribe a binarized image.
    ///
    /// Implementations are expected to restrict recognition to a single line
    /// of numeric characters. Any output, however garbled, is returned as-is.
    fn recognize(&self, image: &GrayImage) -> Result<String, String>;

    /// Check if the OCR engine is available
    fn is_available(&self) -> bool;
}
