use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::trace;

use super::setup::TesseractPaths;

/// Pixel rectangle reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// One guess of the engine for an image region.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionCandidate {
    pub text: String,
    pub confidence: f32,
    pub bounds: BoundingBox,
}

/// Single-character recognition capability.
///
/// Implementations return every candidate they found, in engine order,
/// restricted to `allowed` characters. An empty list means nothing was found.
pub trait CharacterRecognizer {
    fn recognize(&self, image: &GrayImage, allowed: &str) -> Result<Vec<RecognitionCandidate>>;
}

/// Runs the tesseract executable in single-character mode.
///
/// Construct once at startup; the located paths are reused for every cell.
pub struct TesseractEngine {
    paths: TesseractPaths,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths) -> Self {
        Self { paths }
    }
}

impl CharacterRecognizer for TesseractEngine {
    fn recognize(&self, image: &GrayImage, allowed: &str) -> Result<Vec<RecognitionCandidate>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        image
            .save(temp_input.path())
            .context("Failed to write digit image for tesseract")?;

        // Tesseract adds the .tsv extension itself
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let output = Command::new(&self.paths.executable)
            .arg(temp_input.path())
            .arg(&output_base)
            .arg("--tessdata-dir")
            .arg(&self.paths.tessdata)
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg("10") // Treat the image as a single character
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={allowed}"))
            .arg("tsv")
            .output()
            .with_context(|| format!("Failed to run {}", self.paths.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        trace!("Tesseract TSV: {tsv_content:?}");
        Ok(parse_tsv_candidates(&tsv_content))
    }
}

/// Parses Tesseract TSV output into candidates, one per recognized word.
fn parse_tsv_candidates(tsv: &str) -> Vec<RecognitionCandidate> {
    let mut candidates = Vec::new();

    for line in tsv.lines().skip(1) {
        // Skip header
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let level: i32 = fields[0].parse().unwrap_or(-1);
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        let text = fields[11].trim();

        // Level 5 = word
        if level != 5 || text.is_empty() || conf < 0.0 {
            continue;
        }

        let field = |i: usize| fields[i].parse::<u32>().unwrap_or(0);
        candidates.push(RecognitionCandidate {
            text: text.to_string(),
            confidence: conf,
            bounds: BoundingBox {
                left: field(6),
                top: field(7),
                width: field(8),
                height: field(9),
            },
        });
    }

    candidates
}
