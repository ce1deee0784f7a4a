use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{warp_into_with, Interpolation};

use super::homography::{Homography, Quad};
use crate::error::ReadingError;

/// Resamples `image` onto a new `(height, width)` canvas.
///
/// `canvas` is a quad in output coordinates and `placement` is where that quad
/// lies in `image`. Each output pixel is sampled bilinearly from the input at
/// its mapped position; positions outside the input become black.
pub fn rectify(
    image: &GrayImage,
    canvas: &Quad,
    placement: &Quad,
    output_size: (u32, u32),
) -> Result<GrayImage, ReadingError> {
    let (height, width) = output_size;
    if height == 0 || width == 0 {
        return Err(ReadingError::Geometry(format!(
            "output size must be positive, got {height}x{width}"
        )));
    }

    let transform = Homography::estimate(canvas, placement)?;
    let mut out = GrayImage::new(width, height);
    warp_into_with(
        image,
        move |x, y| {
            let [u, v] = transform.project([x as f64, y as f64]);
            if u.is_finite() && v.is_finite() {
                (u as f32, v as f32)
            } else {
                (-1.0, -1.0)
            }
        },
        Interpolation::Bilinear,
        Luma([0u8]),
        &mut out,
    );
    Ok(out)
}
