//! Projective geometry used to rectify the meter image.
//!
//! This module provides:
//! - Corner quads (`Quad`)
//! - Four-point homography estimation (`Homography`)
//! - Image resampling through a homography (`rectify`)

pub mod homography;
pub mod rectify;

pub use homography::Quad;
pub use rectify::rectify;
