//! The meter-reading pipeline.
//!
//! capture → strip rectification → enhancement → digit segmentation →
//! per-digit recognition → assembly → validation against the stored reading.
//!
//! Every stage failure aborts the reading; the stored reading only changes
//! when a new one is accepted.

pub mod enhance;
pub mod segment;
pub mod strip;

use image::GrayImage;
use tracing::info;

use crate::artifacts::{Artifact, ArtifactStore};
use crate::capture::Camera;
use crate::config::MeterConfig;
use crate::error::ReadingError;
use crate::ocr::{recognize_digit, CharacterRecognizer};
use crate::reading::{assemble_reading, MeterReading, ReadingStore};

/// Everything a reading needs, built once at startup.
pub struct MeterReader<R> {
    config: MeterConfig,
    recognizer: R,
    store: ReadingStore,
    artifacts: ArtifactStore,
}

impl<R: CharacterRecognizer> MeterReader<R> {
    pub fn new(config: MeterConfig, recognizer: R) -> Self {
        let store = ReadingStore::new(config.storage.last_reading_file());
        let artifacts = ArtifactStore::new(config.storage.artifact_dir());
        Self::with_stores(config, recognizer, store, artifacts)
    }

    pub fn with_stores(
        config: MeterConfig,
        recognizer: R,
        store: ReadingStore,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            config,
            recognizer,
            store,
            artifacts,
        }
    }

    /// Captures a snapshot and turns it into an accepted reading.
    pub fn read_current(&self, camera: &Camera) -> Result<MeterReading, ReadingError> {
        let frame = camera.fetch()?;
        self.artifacts
            .save_bytes(Artifact::RawCapture, &frame.bytes)?;
        self.read_frame(&frame.image)
    }

    /// Runs every stage after capture on an already decoded frame.
    pub fn read_frame(&self, frame: &GrayImage) -> Result<MeterReading, ReadingError> {
        let value = self.extract_value(frame)?;
        self.store
            .commit(MeterReading::taken_now(value), &self.config.validation)
    }

    /// Frame to number, without consulting or touching the stored reading.
    pub fn extract_value(&self, frame: &GrayImage) -> Result<f64, ReadingError> {
        let calibration = &self.config.calibration;

        info!("Extracting reading strip");
        let warped = strip::extract_strip(frame, calibration)?;
        self.artifacts.save_image(Artifact::Warped, &warped)?;

        info!("Enhancing strip");
        let enhanced = enhance::enhance(&warped, &self.config.enhance);
        self.artifacts
            .save_image(Artifact::Sharpened, &enhanced.sharpened)?;
        self.artifacts
            .save_image(Artifact::Filtered, &enhanced.filtered)?;

        info!("Extracting individual digit images");
        let cells = segment::segment(&enhanced.filtered, calibration)?;
        for cell in &cells {
            self.artifacts
                .save_image(Artifact::Digit(cell.index), &cell.image)?;
        }

        info!("Recognizing digits");
        let allowed = &self.config.ocr.allowed_characters;
        let digits = cells
            .iter()
            .take(calibration.use_digits)
            .map(|cell| recognize_digit(&self.recognizer, &cell.image, cell.index, allowed))
            .collect::<Result<Vec<char>, _>>()?;

        assemble_reading(&digits, calibration.decimal_digit)
    }
}
