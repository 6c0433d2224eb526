use image::{imageops, DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;
use crate::models::config::PreprocessingConfig;
use crate::models::reading::Polarity;

type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Image preprocessing service for seven-segment / LCD digit displays
pub struct PreprocessingService {
    config: PreprocessingConfig,
    blur_kernel: Vec<f32>,
    mean_kernel: Vec<f32>,
}

impl PreprocessingService {
    /// Create a new preprocessing service with custom configuration
    pub fn new(config: PreprocessingConfig) -> Self {
        let blur_kernel = gaussian_kernel(config.blur_kernel);
        let mean_kernel = gaussian_kernel(config.block_size);
        Self {
            config,
            blur_kernel,
            mean_kernel,
        }
    }

    /// Full preprocessing pipeline: intensity → (invert) → blur → adaptive threshold
    pub fn preprocess(&self, image: &DynamicImage, polarity: Polarity) -> GrayImage {
        let gray = self.to_intensity(image, polarity);
        if gray.width() == 0 || gray.height() == 0 {
            return gray;
        }

        let blurred = self.blur(&gray);
        self.adaptive_threshold(&blurred)
    }

    /// Single-channel intensity, inverted for light-on-dark displays
    pub fn to_intensity(&self, image: &DynamicImage, polarity: Polarity) -> GrayImage {
        let mut gray = image.to_luma8();
        if polarity == Polarity::Inverted {
            imageops::invert(&mut gray);
        }
        gray
    }

    /// Gaussian blur to suppress sensor noise before thresholding
    pub fn blur(&self, gray: &GrayImage) -> GrayImage {
        smooth(gray, &self.blur_kernel)
    }

    /// Binarize against a Gaussian-weighted local mean.
    ///
    /// A pixel becomes white when it is brighter than the mean of its
    /// neighbourhood minus the configured offset, black otherwise.
    pub fn adaptive_threshold(&self, gray: &GrayImage) -> GrayImage {
        let local_mean = smooth(gray, &self.mean_kernel);
        let offset = self.config.offset;

        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let value = gray.get_pixel(x, y)[0] as i32;
            let threshold = local_mean.get_pixel(x, y)[0] as i32 - offset;
            if value > threshold {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }
}

impl Default for PreprocessingService {
    fn default() -> Self {
        Self::new(PreprocessingConfig::default())
    }
}

/// Separable filter computed in `f32`, rounded once back to `u8`
fn smooth(gray: &GrayImage, kernel: &[f32]) -> GrayImage {
    let float: FloatImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([gray.get_pixel(x, y)[0] as f32])
    });
    let filtered = separable_filter_equal(&float, kernel);

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([filtered.get_pixel(x, y)[0].round().clamp(0.0, 255.0) as u8])
    })
}

/// Normalized 1-D Gaussian kernel of odd `size`.
///
/// Sigma follows the usual derivation from kernel size,
/// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1);
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size as f32 - 1.0) / 2.0;

    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();

    weights.into_iter().map(|w| w / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    /// Light panel with a dark vertical stroke at x = 18..22
    fn dark_stroke_on_light() -> DynamicImage {
        let img = RgbImage::from_fn(40, 40, |x, _| {
            if (18..22).contains(&x) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    fn assert_binary(img: &GrayImage) {
        for pixel in img.pixels() {
            let val = pixel[0];
            assert!(val == 0 || val == 255, "Pixel value should be 0 or 255, got {}", val);
        }
    }

    #[test]
    fn test_gaussian_kernel_is_normalized_and_symmetric() {
        for size in [5, 11] {
            let kernel = gaussian_kernel(size);
            assert_eq!(kernel.len(), size as usize);
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
            assert!((kernel[0] - kernel[size as usize - 1]).abs() < 1e-6);
            assert!(kernel[size as usize / 2] > kernel[0]);
        }
    }

    #[test]
    fn test_intensity_inversion() {
        let service = PreprocessingService::default();
        let image = dark_stroke_on_light();

        let standard = service.to_intensity(&image, Polarity::Standard);
        let inverted = service.to_intensity(&image, Polarity::Inverted);

        assert_eq!(standard.get_pixel(20, 5)[0], 0);
        assert_eq!(inverted.get_pixel(20, 5)[0], 255);
        assert_eq!(standard.get_pixel(0, 0)[0], 255);
        assert_eq!(inverted.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_preprocess_preserves_dimensions() {
        let service = PreprocessingService::default();
        let image = dark_stroke_on_light();

        for polarity in [Polarity::Standard, Polarity::Inverted] {
            let out = service.preprocess(&image, polarity);
            assert_eq!(out.dimensions(), image.dimensions());
        }
    }

    #[test]
    fn test_preprocess_output_is_binary() {
        let service = PreprocessingService::default();
        let gradient = DynamicImage::ImageRgb8(RgbImage::from_fn(100, 50, |x, y| {
            let val = ((x * 2 + y) % 256) as u8;
            Rgb([val, val, val])
        }));

        assert_binary(&service.preprocess(&gradient, Polarity::Standard));
        assert_binary(&service.preprocess(&gradient, Polarity::Inverted));
    }

    #[test]
    fn test_standard_polarity_keeps_dark_stroke_black() {
        let service = PreprocessingService::default();
        let out = service.preprocess(&dark_stroke_on_light(), Polarity::Standard);

        assert_eq!(out.get_pixel(20, 20)[0], 0, "Stroke centre should be black");
        assert_eq!(out.get_pixel(0, 0)[0], 255, "Flat background should be white");
    }

    #[test]
    fn test_inverted_polarity_turns_stroke_white() {
        let service = PreprocessingService::default();
        let out = service.preprocess(&dark_stroke_on_light(), Polarity::Inverted);

        assert_eq!(out.get_pixel(20, 20)[0], 255);
    }

    #[test]
    fn test_uniform_image_becomes_white() {
        let service = PreprocessingService::default();
        let flat = DynamicImage::ImageRgb8(RgbImage::from_pixel(30, 30, Rgb([90, 90, 90])));

        let out = service.preprocess(&flat, Polarity::Standard);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_blur_keeps_flat_regions_exact() {
        let service = PreprocessingService::default();
        for value in [0u8, 1, 90, 127, 254, 255] {
            let flat = GrayImage::from_pixel(15, 15, Luma([value]));
            let out = service.blur(&flat);
            assert!(out.pixels().all(|p| p[0] == value), "value {}", value);
        }
    }

    #[test]
    fn test_threshold_compares_against_rounded_mean() {
        let service = PreprocessingService::new(PreprocessingConfig {
            blur_kernel: 1,
            block_size: 3,
            offset: 0,
        });
        // Local mean at the centre is about 99.62, which rounds to 100
        let gray = GrayImage::from_fn(3, 3, |x, _| if x == 1 { Luma([100]) } else { Luma([99]) });

        let out = service.adaptive_threshold(&gray);
        assert_eq!(out.get_pixel(1, 1)[0], 0);
    }

    #[test]
    fn test_empty_crop_is_passed_through() {
        let service = PreprocessingService::default();
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));

        let out = service.preprocess(&empty, Polarity::Standard);
        assert_eq!(out.dimensions(), (0, 0));
    }
}
