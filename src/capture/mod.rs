//! Frame capture from the meter camera.
//!
//! This module provides:
//! - The camera HTTP client (`Camera`)
//! - Payload decoding (`decode_frame`)

pub mod camera;

pub use camera::Camera;
