use image::GrayImage;
use std::fmt;

use crate::config::CalibrationConfig;
use crate::error::ReadingError;
use crate::geometry::{rectify, Quad};

/// Number of digit cells on the meter.
pub const DIGIT_COUNT: usize = 8;

/// 1-based position of a digit on the meter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DigitIndex(usize);

impl DigitIndex {
    pub fn new(index: usize) -> Result<Self, ReadingError> {
        if (1..=DIGIT_COUNT).contains(&index) {
            Ok(Self(index))
        } else {
            Err(ReadingError::InvalidDigitIndex(index))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// All digit positions in meter order.
    pub fn all() -> impl Iterator<Item = DigitIndex> {
        (1..=DIGIT_COUNT).map(DigitIndex)
    }
}

impl fmt::Display for DigitIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One rescaled digit crop of the enhanced strip.
#[derive(Debug, Clone)]
pub struct DigitCell {
    pub index: DigitIndex,
    pub image: GrayImage,
}

/// Extracts the cell of a single digit.
///
/// The `digit_width` slice at the digit's offset is stretched onto a canvas
/// half as wide as it is tall.
pub fn extract_digit(
    strip: &GrayImage,
    index: DigitIndex,
    calibration: &CalibrationConfig,
) -> Result<GrayImage, ReadingError> {
    let height = calibration.source_height;
    let width = calibration.cell_width();
    let offset = calibration.digit_offsets[index.get() - 1] as f64;

    let canvas = Quad::rectangle(0.0, 0.0, height as f64 / 2.0, height as f64);
    let placement = Quad::rectangle(
        offset,
        0.0,
        calibration.digit_width as f64,
        height as f64,
    );

    rectify(strip, &canvas, &placement, (height, width))
}

/// Cuts the strip into all eight digit cells, in index order.
pub fn segment(
    strip: &GrayImage,
    calibration: &CalibrationConfig,
) -> Result<Vec<DigitCell>, ReadingError> {
    DigitIndex::all()
        .map(|index| {
            extract_digit(strip, index, calibration).map(|image| DigitCell { index, image })
        })
        .collect()
}
