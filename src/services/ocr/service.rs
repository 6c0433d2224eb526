use image::DynamicImage;
use tracing::{debug, info, warn};
use super::engine::OcrEngine;
use super::parser::parse_reading;
use super::preprocessing::PreprocessingService;
use crate::models::reading::{Polarity, RoiReading};

/// Attempts tried in order on the same crop until one yields a value
pub const ATTEMPTS: [Polarity; 2] = [Polarity::Standard, Polarity::Inverted];

/// Preprocess → recognize → parse, with polarity fallback
pub struct OcrService<E: OcrEngine> {
    preprocessing: PreprocessingService,
    engine: E,
}

impl<E: OcrEngine> OcrService<E> {
    pub fn new(preprocessing: PreprocessingService, engine: E) -> Self {
        Self {
            preprocessing,
            engine,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run a single attempt. Engine errors count as "no value".
    fn attempt(
        &self,
        label: &str,
        crop: &DynamicImage,
        polarity: Polarity,
    ) -> (Option<f64>, Option<String>) {
        let binary = self.preprocessing.preprocess(crop, polarity);

        match self.engine.recognize(&binary) {
            Ok(text) => {
                let value = parse_reading(&text);
                debug!(label, ?polarity, raw = text.trim(), ?value, "ocr attempt");
                (value, Some(text))
            }
            Err(e) => {
                warn!(label, ?polarity, "OCR engine failed: {}", e);
                (None, None)
            }
        }
    }

    /// Read one ROI, falling back to inverted polarity when the standard pass
    /// yields nothing. Both passes failing records the value as absent.
    pub fn read_roi(&self, label: &str, crop: &DynamicImage) -> RoiReading {
        let mut last_text = None;

        for (index, polarity) in ATTEMPTS.iter().copied().enumerate() {
            let (value, text) = self.attempt(label, crop, polarity);
            if let Some(value) = value {
                if index > 0 {
                    info!(label, ?polarity, "fallback pass recognized the display");
                }
                return RoiReading {
                    label: label.to_string(),
                    value: Some(value),
                    polarity: Some(polarity),
                    raw_text: text,
                };
            }
            if text.is_some() {
                last_text = text;
            }
        }

        RoiReading {
            raw_text: last_text,
            ..RoiReading::absent(label)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{GrayImage, Rgb, RgbImage};
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Engine that replays canned responses and counts invocations
    pub(crate) struct ScriptedEngine {
        responses: Mutex<VecDeque<Result<String, String>>>,
        pub(crate) calls: Mutex<usize>,
    }

    impl ScriptedEngine {
        pub(crate) fn new(responses: Vec<Result<&str, &str>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                calls: Mutex::new(0),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            *self.calls.lock()
        }
    }

    impl OcrEngine for ScriptedEngine {
        fn recognize(&self, _image: &GrayImage) -> Result<String, String> {
            *self.calls.lock() += 1;
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn crop() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([200, 200, 200])))
    }

    fn service(responses: Vec<Result<&str, &str>>) -> OcrService<ScriptedEngine> {
        OcrService::new(PreprocessingService::default(), ScriptedEngine::new(responses))
    }

    #[test]
    fn test_standard_pass_wins_without_fallback() {
        let service = service(vec![Ok("42.5\n")]);
        let reading = service.read_roi("PM2.5", &crop());

        assert_eq!(reading.value, Some(42.5));
        assert_eq!(reading.polarity, Some(Polarity::Standard));
        assert_eq!(service.engine().call_count(), 1);
    }

    #[test]
    fn test_inverted_result_recorded_when_standard_fails() {
        let service = service(vec![Ok("--"), Ok("17.0")]);
        let reading = service.read_roi("CO", &crop());

        assert_eq!(reading.value, Some(17.0));
        assert_eq!(reading.polarity, Some(Polarity::Inverted));
        assert_eq!(service.engine().call_count(), 2);
    }

    #[test]
    fn test_both_passes_failing_is_absent_not_zero() {
        let service = service(vec![Ok(""), Ok("1.2.3")]);
        let reading = service.read_roi("O3", &crop());

        assert_eq!(reading.value, None);
        assert_eq!(reading.polarity, None);
        assert_eq!(reading.raw_text.as_deref(), Some("1.2.3"));
        assert_eq!(service.engine().call_count(), 2);
    }

    #[test]
    fn test_engine_error_falls_through_to_next_attempt() {
        let service = service(vec![Err("tesseract crashed"), Ok("8")]);
        let reading = service.read_roi("NO2", &crop());

        assert_eq!(reading.value, Some(8.0));
        assert_eq!(reading.polarity, Some(Polarity::Inverted));
    }

    #[test]
    fn test_empty_crop_is_absent() {
        let service = service(vec![]);
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let reading = service.read_roi("SO2", &empty);

        assert_eq!(reading.value, None);
        assert!(service.engine().call_count() <= ATTEMPTS.len());
    }
}
