pub mod engine;
pub mod parser;
pub mod preprocessing;
pub mod service;
pub mod tesseract;

// Re-export main types
pub use engine::OcrEngine;
pub use parser::parse_reading;
pub use preprocessing::PreprocessingService;
pub use service::OcrService;
pub use tesseract::TesseractEngine;
