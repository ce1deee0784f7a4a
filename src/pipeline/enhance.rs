use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use crate::config::EnhanceConfig;

/// Intermediate and final images of the enhancement stage.
pub struct EnhancedStrip {
    pub sharpened: GrayImage,
    pub filtered: GrayImage,
}

/// Sharpens the strip, then keeps only its brightest intensity band.
pub fn enhance(strip: &GrayImage, config: &EnhanceConfig) -> EnhancedStrip {
    let sharpened = unsharp_mask(strip, config.radius, config.amount);

    let low = percentile(&sharpened, config.low_percentile);
    let high = percentile(&sharpened, config.high_percentile);
    debug!(
        "Contrast band: p{}={:.2}, p{}={:.2}",
        config.low_percentile, low, config.high_percentile, high
    );
    let filtered = rescale_intensity(&sharpened, low, high);

    EnhancedStrip {
        sharpened,
        filtered,
    }
}

/// Unsharp masking on normalized intensities:
/// `out = clip(img + amount * (img - blur(img)), 0, 1)`.
///
/// `radius` is the sigma of the Gaussian blur. Borders are replicated.
pub fn unsharp_mask(image: &GrayImage, radius: f32, amount: f32) -> GrayImage {
    let blurred = gaussian_blur_f32(image, radius);
    let mut out = GrayImage::new(image.width(), image.height());

    for ((dst, src), blur) in out.pixels_mut().zip(image.pixels()).zip(blurred.pixels()) {
        let v = src[0] as f32 / 255.0;
        let b = blur[0] as f32 / 255.0;
        let sharp = (v + amount * (v - b)).clamp(0.0, 1.0);
        *dst = Luma([(sharp * 255.0) as u8]);
    }

    out
}

/// Percentile `p` (0-100) of the pixel intensities, interpolating linearly
/// between neighbouring ranks.
pub fn percentile(image: &GrayImage, p: f64) -> f64 {
    let mut values: Vec<u8> = image.as_raw().clone();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    values[lower] as f64 + frac * (values[upper] as f64 - values[lower] as f64)
}

/// Maps `low` to 0 and `high` to 255 linearly, clipping outside the band.
///
/// A collapsed band (`high <= low`) degrades to a threshold at `high`.
pub fn rescale_intensity(image: &GrayImage, low: f64, high: f64) -> GrayImage {
    let mut out = GrayImage::new(image.width(), image.height());
    let span = high - low;

    for (dst, src) in out.pixels_mut().zip(image.pixels()) {
        let v = src[0] as f64;
        let value = if span <= 0.0 {
            if v >= high { 255 } else { 0 }
        } else {
            let t = (v.clamp(low, high) - low) / span;
            (t * 255.0) as u8
        };
        *dst = Luma([value]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsharp_mask_keeps_flat_image() {
        let image = GrayImage::from_pixel(20, 10, Luma([120]));
        let out = unsharp_mask(&image, 3.0, 2.0);
        for p in out.pixels() {
            assert!((p[0] as i32 - 120).abs() <= 3);
        }
    }

    #[test]
    fn test_unsharp_mask_amplifies_edge() {
        let image = GrayImage::from_fn(40, 10, |x, _| Luma([if x < 20 { 80 } else { 160 }]));
        let out = unsharp_mask(&image, 4.0, 2.0);

        // Next to the step the dark side gets darker and the bright side brighter.
        assert!(out.get_pixel(19, 5)[0] < 80);
        assert!(out.get_pixel(20, 5)[0] > 160);
    }

    #[test]
    fn test_percentile_interpolates() {
        let image = GrayImage::from_fn(100, 1, |x, _| Luma([x as u8]));
        assert!((percentile(&image, 82.0) - 81.18).abs() < 1e-9);
        assert_eq!(percentile(&image, 100.0), 99.0);
        assert_eq!(percentile(&image, 0.0), 0.0);
    }

    #[test]
    fn test_rescale_intensity_maps_band() {
        let image = GrayImage::from_fn(4, 1, |x, _| Luma([[50, 100, 150, 250][x as usize]]));
        let out = rescale_intensity(&image, 100.0, 200.0);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(1, 0)[0], 0);
        assert_eq!(out.get_pixel(2, 0)[0], 127);
        assert_eq!(out.get_pixel(3, 0)[0], 255);
    }

    #[test]
    fn test_rescale_intensity_collapsed_band() {
        let image = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 10 } else { 90 }]));
        let out = rescale_intensity(&image, 90.0, 90.0);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_enhance_keeps_brightest_band() {
        // Dark background with a few bright strokes.
        let strip = GrayImage::from_fn(100, 20, |x, _| {
            Luma([if x % 10 == 0 { 230 } else { 60 }])
        });
        let config = EnhanceConfig {
            radius: 5.0,
            ..EnhanceConfig::default()
        };
        let enhanced = enhance(&strip, &config);

        assert_eq!(enhanced.sharpened.dimensions(), strip.dimensions());
        assert_eq!(enhanced.filtered.dimensions(), strip.dimensions());
        assert_eq!(enhanced.filtered.get_pixel(10, 5)[0], 255);
        assert_eq!(enhanced.filtered.get_pixel(11, 5)[0], 0);
    }

    #[test]
    fn test_enhance_default_radius_on_full_strip() {
        // The default blur is wider than the strip itself.
        let strip = GrayImage::from_fn(780, 156, |x, _| {
            Luma([if x % 10 == 0 { 230 } else { 60 }])
        });
        let enhanced = enhance(&strip, &EnhanceConfig::default());

        assert_eq!(enhanced.sharpened.dimensions(), (780, 156));
        assert_eq!(enhanced.filtered.dimensions(), (780, 156));
        assert!(enhanced.filtered.pixels().any(|p| p[0] == 255));
        assert!(enhanced.filtered.pixels().any(|p| p[0] == 0));
        assert_eq!(enhanced.filtered.get_pixel(390, 78)[0], 255);
        assert!(enhanced.filtered.get_pixel(395, 78)[0] < 30);
    }
}
