//! Snapshot capture from the network camera.

use image::GrayImage;
use std::time::Duration;
use tracing::info;

use crate::config::CaptureConfig;
use crate::error::ReadingError;

/// A frame as delivered by the camera, plus its grayscale decoding.
pub struct CapturedFrame {
    pub bytes: Vec<u8>,
    pub image: GrayImage,
}

/// Blocking HTTP client bound to the camera's snapshot URL.
pub struct Camera {
    client: reqwest::blocking::Client,
    url: String,
}

impl Camera {
    pub fn new(config: &CaptureConfig) -> Result<Self, ReadingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ReadingError::Capture {
                url: config.url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Downloads one snapshot and decodes it.
    pub fn fetch(&self) -> Result<CapturedFrame, ReadingError> {
        info!("Downloading image from {}", self.url);
        let capture_error = |message: String| ReadingError::Capture {
            url: self.url.clone(),
            message,
        };

        let response = self
            .client
            .get(&self.url)
            .header("User-Agent", "gas-meter-reader")
            .send()
            .map_err(|e| capture_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(capture_error(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .map_err(|e| capture_error(e.to_string()))?
            .to_vec();
        let image = decode_frame(&bytes).map_err(capture_error)?;
        info!("Captured {}x{} frame", image.width(), image.height());

        Ok(CapturedFrame { bytes, image })
    }
}

/// Decodes an encoded image payload into grayscale.
pub fn decode_frame(bytes: &[u8]) -> Result<GrayImage, String> {
    if bytes.is_empty() {
        return Err("empty payload".to_string());
    }
    image::load_from_memory(bytes)
        .map(|img| img.to_luma8())
        .map_err(|e| format!("undecodable payload: {e}"))
}
