use image::GrayImage;
use tracing::debug;

use super::engine::{CharacterRecognizer, RecognitionCandidate};
use crate::error::ReadingError;
use crate::pipeline::segment::DigitIndex;

/// Picks the candidate with the strictly highest confidence.
///
/// Ties keep the earliest candidate, so the choice only depends on the
/// engine's output order.
pub fn select_best(candidates: &[RecognitionCandidate]) -> Option<&RecognitionCandidate> {
    let mut best: Option<&RecognitionCandidate> = None;
    for candidate in candidates {
        match best {
            Some(current) if candidate.confidence <= current.confidence => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Recognizes the single character shown in a digit cell.
pub fn recognize_digit<R: CharacterRecognizer + ?Sized>(
    recognizer: &R,
    cell: &GrayImage,
    digit: DigitIndex,
    allowed: &str,
) -> Result<char, ReadingError> {
    let candidates = recognizer
        .recognize(cell, allowed)
        .map_err(|e| ReadingError::Recognition {
            digit: digit.get(),
            message: format!("{e:#}"),
        })?;

    let Some(best) = select_best(&candidates) else {
        return Err(ReadingError::NoDigitFound { digit: digit.get() });
    };
    let b = &best.bounds;
    debug!(
        "Digit {digit}: '{}' (conf {:.1}, box {}x{}+{}+{}, {} candidates)",
        best.text,
        best.confidence,
        b.width,
        b.height,
        b.left,
        b.top,
        candidates.len()
    );

    let text: String = best.text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ReadingError::AmbiguousDigit {
            digit: digit.get(),
            text,
        }),
    }
}
