//! Configuration for the meter reader.
//!
//! Loads settings from config.json at startup. The calibration section holds
//! the geometry of one specific camera/meter rig: where the reading strip sits
//! in the camera frame and where each digit sits inside the strip.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::paths;

/// Complete reader configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub capture: CaptureConfig,
    pub calibration: CalibrationConfig,
    pub enhance: EnhanceConfig,
    pub ocr: OcrConfig,
    pub validation: ValidationConfig,
    pub storage: StorageConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Snapshot endpoint of the camera
    pub url: String,
    /// Timeout for the whole HTTP request (milliseconds)
    pub timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            url: "http://192.168.2.106/capture".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Camera and meter geometry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Width of the rectified strip; its height is a fifth of this
    pub strip_width: u32,
    /// Strip corners in the mirrored camera frame:
    /// top-left, bottom-left, bottom-right, top-right
    pub strip_corners: [[f64; 2]; 4],
    /// Left edge of each digit inside the strip
    pub digit_offsets: [u32; 8],
    /// Width of one digit inside the strip
    pub digit_width: u32,
    /// Height of the digit cells
    pub source_height: u32,
    /// Number of leading digits that make up the reading
    pub use_digits: usize,
    /// Digit index (1-based) that follows the decimal point
    pub decimal_digit: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            strip_width: 780,
            strip_corners: [[130.0, 380.0], [130.0, 455.0], [880.0, 460.0], [880.0, 390.0]],
            digit_offsets: [0, 95, 195, 295, 390, 485, 585, 705],
            digit_width: 50,
            source_height: 156,
            use_digits: 7,
            decimal_digit: 6,
        }
    }
}

impl CalibrationConfig {
    pub fn strip_height(&self) -> u32 {
        self.strip_width / 5
    }

    /// Width of a digit cell after rescaling.
    pub fn cell_width(&self) -> u32 {
        self.source_height / 2
    }
}

/// Sharpening and contrast stretch parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Gaussian sigma of the unsharp mask blur
    pub radius: f32,
    /// Unsharp mask amount
    pub amount: f32,
    /// Percentile mapped to black
    pub low_percentile: f64,
    /// Percentile mapped to white
    pub high_percentile: f64,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            radius: 300.0,
            amount: 2.0,
            low_percentile: 82.0,
            high_percentile: 100.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Characters the recognizer may return
    pub allowed_characters: String,
    /// Explicit tesseract executable, otherwise searched
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory, otherwise searched
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            allowed_characters: "0123456789".to_string(),
            tesseract_path: None,
            tessdata_dir: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest accepted increase over the last reading
    pub max_delta: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { max_delta: 100.0 }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for debug images, defaults to `<exe_dir>/debug`
    pub artifact_dir: Option<PathBuf>,
    /// Last reading record, defaults to `<exe_dir>/last_reading.json`
    pub last_reading_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_dir.clone().unwrap_or_else(paths::get_debug_dir)
    }

    pub fn last_reading_file(&self) -> PathBuf {
        self.last_reading_file
            .clone()
            .unwrap_or_else(paths::get_last_reading_path)
    }
}

impl MeterConfig {
    /// Loads configuration from `path`, or returns defaults if it is missing or invalid.
    pub fn load(path: &Path) -> Self {
        info!("Looking for config at: {}", path.display());

        if !path.exists() {
            info!("{} not found. Using default config.", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    info!("Config loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Rejects values the pipeline cannot work with.
    pub fn check(&self) -> Result<()> {
        let cal = &self.calibration;
        if cal.strip_width < 5 || cal.source_height < 2 || cal.digit_width == 0 {
            return Err(anyhow!("calibration sizes must be positive"));
        }
        if cal.use_digits == 0 || cal.use_digits > cal.digit_offsets.len() {
            return Err(anyhow!(
                "use_digits must be in 1..={}, got {}",
                cal.digit_offsets.len(),
                cal.use_digits
            ));
        }
        if cal.decimal_digit < 2 || cal.decimal_digit > cal.use_digits {
            return Err(anyhow!(
                "decimal_digit must be in 2..={}, got {}",
                cal.use_digits,
                cal.decimal_digit
            ));
        }
        let enhance = &self.enhance;
        if enhance.radius <= 0.0 {
            return Err(anyhow!("enhance.radius must be positive"));
        }
        if !(0.0..=100.0).contains(&enhance.low_percentile)
            || !(0.0..=100.0).contains(&enhance.high_percentile)
            || enhance.low_percentile > enhance.high_percentile
        {
            return Err(anyhow!(
                "percentiles must satisfy 0 <= low <= high <= 100, got {} and {}",
                enhance.low_percentile,
                enhance.high_percentile
            ));
        }
        if self.ocr.allowed_characters.is_empty() {
            return Err(anyhow!("ocr.allowed_characters must not be empty"));
        }
        if self.validation.max_delta < 0.0 {
            return Err(anyhow!("validation.max_delta must not be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_rig() {
        let config = MeterConfig::default();
        assert_eq!(config.calibration.strip_height(), 156);
        assert_eq!(config.calibration.cell_width(), 78);
        assert_eq!(config.calibration.digit_offsets[7], 705);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "capture": { "url": "http://camera.local/snap" }, "validation": { "max_delta": 50 } }"#,
        )
        .unwrap();

        let config = MeterConfig::load(&path);
        assert_eq!(config.capture.url, "http://camera.local/snap");
        assert_eq!(config.capture.timeout_ms, 10_000);
        assert_eq!(config.validation.max_delta, 50.0);
        assert_eq!(config.calibration.digit_width, 50);
    }

    #[test]
    fn test_missing_or_broken_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let missing = MeterConfig::load(&dir.path().join("nope.json"));
        assert_eq!(missing.enhance.low_percentile, 82.0);

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let config = MeterConfig::load(&broken);
        assert_eq!(config.calibration.use_digits, 7);
    }

    #[test]
    fn test_check_rejects_bad_values() {
        let mut config = MeterConfig::default();
        config.calibration.use_digits = 9;
        assert!(config.check().is_err());

        let mut config = MeterConfig::default();
        config.calibration.decimal_digit = 8;
        assert!(config.check().is_err());

        let mut config = MeterConfig::default();
        config.enhance.low_percentile = 101.0;
        assert!(config.check().is_err());
    }
}
