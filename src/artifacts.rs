//! Debug images written by every pipeline stage.
//!
//! The files are overwritten on each reading and exist only for a human to
//! inspect after a failure; nothing in the pipeline reads them back.

use image::GrayImage;
use std::path::PathBuf;

use crate::error::ReadingError;
use crate::pipeline::segment::DigitIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Camera payload as received
    RawCapture,
    /// Rectified reading strip
    Warped,
    /// Strip after unsharp masking
    Sharpened,
    /// Strip after the contrast stretch
    Filtered,
    /// One rescaled digit cell
    Digit(DigitIndex),
}

impl Artifact {
    pub fn file_name(&self) -> String {
        match self {
            Artifact::RawCapture => "current_1_capture_raw.jpg".to_string(),
            Artifact::Warped => "current_2_warped.jpg".to_string(),
            Artifact::Sharpened => "current_3_sharpened.jpg".to_string(),
            Artifact::Filtered => "current_4_filtered.jpg".to_string(),
            Artifact::Digit(index) => format!("current_digit_{index}.png"),
        }
    }
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.dir.join(artifact.file_name())
    }

    /// Path of an artifact that has already been written.
    pub fn find(&self, artifact: Artifact) -> Option<PathBuf> {
        Some(self.path(artifact)).filter(|p| p.is_file())
    }

    pub fn save_bytes(&self, artifact: Artifact, bytes: &[u8]) -> Result<PathBuf, ReadingError> {
        let path = self.prepare(artifact)?;
        std::fs::write(&path, bytes).map_err(|e| ReadingError::artifact(&path, e))?;
        Ok(path)
    }

    /// Saves an image; the format follows the file extension.
    pub fn save_image(&self, artifact: Artifact, image: &GrayImage) -> Result<PathBuf, ReadingError> {
        let path = self.prepare(artifact)?;
        image.save(&path).map_err(|e| ReadingError::artifact(&path, e))?;
        Ok(path)
    }

    fn prepare(&self, artifact: Artifact) -> Result<PathBuf, ReadingError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ReadingError::artifact(&self.dir, e))?;
        Ok(self.path(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use tempfile::tempdir;

    #[test]
    fn test_file_names() {
        assert_eq!(Artifact::RawCapture.file_name(), "current_1_capture_raw.jpg");
        assert_eq!(Artifact::Filtered.file_name(), "current_4_filtered.jpg");
        let digit = DigitIndex::new(8).unwrap();
        assert_eq!(Artifact::Digit(digit).file_name(), "current_digit_8.png");
    }

    #[test]
    fn test_find_only_existing() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("debug"));
        assert!(store.find(Artifact::Warped).is_none());

        let strip = GrayImage::from_pixel(780, 156, Luma([128]));
        let saved = store.save_image(Artifact::Warped, &strip).unwrap();
        assert_eq!(store.find(Artifact::Warped), Some(saved.clone()));

        let loaded = image::open(&saved).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (780, 156));
    }

    #[test]
    fn test_save_bytes_verbatim() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let path = store.save_bytes(Artifact::RawCapture, b"\xff\xd8payload").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"\xff\xd8payload");
    }
}
