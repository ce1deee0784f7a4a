use image::GrayImage;
use image::imageops::flip_horizontal;

use crate::config::CalibrationConfig;
use crate::error::ReadingError;
use crate::geometry::{rectify, Quad};

/// Mirrors the camera frame and rectifies the reading strip out of it.
///
/// The camera looks at the meter through a mirror, so the frame is flipped
/// before the calibrated corners apply.
pub fn extract_strip(
    frame: &GrayImage,
    calibration: &CalibrationConfig,
) -> Result<GrayImage, ReadingError> {
    let mirrored = flip_horizontal(frame);

    let width = calibration.strip_width as f64;
    let height = width / 5.0;
    let canvas = Quad::rectangle(0.0, 0.0, width, height);
    let placement = Quad(calibration.strip_corners);

    rectify(
        &mirrored,
        &canvas,
        &placement,
        (calibration.strip_height(), calibration.strip_width),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_strip_has_calibrated_size() {
        let frame = GrayImage::from_pixel(800, 600, Luma([90]));
        let strip = extract_strip(&frame, &CalibrationConfig::default()).unwrap();
        assert_eq!(strip.dimensions(), (780, 156));
    }

    #[test]
    fn test_strip_reads_mirrored_frame() {
        // Bright band on the right half of the raw frame lands on the left after mirroring.
        let frame = GrayImage::from_fn(800, 600, |x, _| Luma([if x >= 400 { 250 } else { 10 }]));
        let strip = extract_strip(&frame, &CalibrationConfig::default()).unwrap();

        assert!(strip.get_pixel(10, 78)[0] > 200);
        assert!(strip.get_pixel(600, 78)[0] < 50);
    }

    #[test]
    fn test_degenerate_corners_fail() {
        let frame = GrayImage::new(800, 600);
        let calibration = CalibrationConfig {
            strip_corners: [[130.0, 380.0]; 4],
            ..CalibrationConfig::default()
        };
        assert!(matches!(
            extract_strip(&frame, &calibration),
            Err(ReadingError::Geometry(_))
        ));
    }
}
