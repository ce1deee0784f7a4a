//! Failure taxonomy of the reading pipeline.
//!
//! Every variant aborts the current reading. The variants exist for logs and
//! diagnostics; callers only distinguish success from failure.

use std::path::PathBuf;

/// Errors that can occur while producing a meter reading.
#[derive(Debug, thiserror::Error)]
pub enum ReadingError {
    /// The camera could not be reached or returned an undecodable payload.
    #[error("capture from {url} failed: {message}")]
    Capture { url: String, message: String },

    /// A projective transform was estimated from degenerate correspondences.
    #[error("degenerate geometry: {0}")]
    Geometry(String),

    #[error("digit index {0} is outside 1..=8")]
    InvalidDigitIndex(usize),

    /// The recognizer returned no candidates for a digit cell.
    #[error("nothing found for digit {digit}")]
    NoDigitFound { digit: usize },

    /// The best candidate is not exactly one character.
    #[error("invalid reading '{text}' for digit {digit}")]
    AmbiguousDigit { digit: usize, text: String },

    /// The recognition engine itself failed to run.
    #[error("recognition failed for digit {digit}: {message}")]
    Recognition { digit: usize, message: String },

    /// The assembled string does not survive a parse/format round trip.
    #[error("converted '{text}' to '{formatted}' which does not match")]
    ReadingFormat { text: String, formatted: String },

    #[error("current reading of {current} is smaller than previous reading of {last} from {time}")]
    ReadingDecreased { current: f64, last: f64, time: String },

    #[error(
        "current reading of {current} is more than {max_delta} above previous reading of {last} from {time}"
    )]
    ReadingJump {
        current: f64,
        last: f64,
        max_delta: f64,
        time: String,
    },

    /// The last-reading record could not be read or written.
    #[error("last reading storage at {path} failed: {message}")]
    Storage { path: PathBuf, message: String },

    /// A debug image could not be written.
    #[error("failed to write debug artifact {path}: {message}")]
    Artifact { path: PathBuf, message: String },
}

impl ReadingError {
    pub(crate) fn storage(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn artifact(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Artifact {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = ReadingError::AmbiguousDigit {
            digit: 3,
            text: "12".to_string(),
        };
        assert_eq!(err.to_string(), "invalid reading '12' for digit 3");

        let err = ReadingError::ReadingJump {
            current: 201.0,
            last: 100.0,
            max_delta: 100.0,
            time: "01/02/2024 10:00:00".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("201"));
        assert!(msg.contains("01/02/2024 10:00:00"));
    }
}
