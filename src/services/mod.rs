pub mod capture_orchestrator;
pub mod config;
pub mod dashboard;
pub mod frame_source;
pub mod ocr;
pub mod preview;
pub mod screen_capture;
pub mod trigger_input;
