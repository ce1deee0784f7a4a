use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::config::OcrConfig;
use crate::paths;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

const COMMON_EXECUTABLES: [&str; 4] = [
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
];

const COMMON_TESSDATA: [&str; 6] = [
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
    r"C:\Program Files\Tesseract-OCR\tessdata",
];

#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

/// Returns the local directory for downloaded tessdata.
pub fn get_local_tessdata_dir() -> PathBuf {
    paths::get_data_dir().join("tessdata")
}

/// Locates tesseract and its English data. Downloads the data if necessary.
pub fn ensure_tesseract(config: &OcrConfig) -> Result<TesseractPaths> {
    let executable = match &config.tesseract_path {
        Some(path) if path.exists() => path.clone(),
        Some(path) => {
            return Err(anyhow!(
                "Configured tesseract not found at {}",
                path.display()
            ))
        }
        None => find_tesseract_executable()?,
    };

    let tessdata = match &config.tessdata_dir {
        Some(dir) if has_eng_data(dir) => dir.clone(),
        Some(dir) => {
            return Err(anyhow!(
                "Configured tessdata dir {} has no eng.traineddata",
                dir.display()
            ))
        }
        None => match find_tessdata_dir() {
            Ok(dir) => dir,
            Err(_) => {
                info!("tessdata not found, downloading...");
                let dir = get_local_tessdata_dir();
                fs::create_dir_all(&dir)?;
                download_tessdata(&dir)?;
                dir
            }
        },
    };

    info!(
        "Tesseract ready: {} (data {})",
        executable.display(),
        tessdata.display()
    );
    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

fn has_eng_data(dir: &Path) -> bool {
    dir.join("eng.traineddata").exists()
}

/// Finds the Tesseract executable on PATH or in common install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    COMMON_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory containing eng.traineddata.
pub fn find_tessdata_dir() -> Result<PathBuf> {
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if has_eng_data(&p) {
            return Ok(p);
        }
        let p = p.join("tessdata");
        if has_eng_data(&p) {
            return Ok(p);
        }
    }

    let local = get_local_tessdata_dir();
    if has_eng_data(&local) {
        return Ok(local);
    }

    COMMON_TESSDATA
        .iter()
        .map(PathBuf::from)
        .find(|p| has_eng_data(p))
        .ok_or_else(|| {
            anyhow!("tessdata directory not found. Please ensure eng.traineddata is available.")
        })
}

/// Downloads English trained data
fn download_tessdata(tessdata_dir: &Path) -> Result<()> {
    let eng_url = format!("{}/eng.traineddata", TESSDATA_REPO);
    let eng_path = tessdata_dir.join("eng.traineddata");

    info!("Downloading eng.traineddata...");

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&eng_url)
        .header("User-Agent", "gas-meter-reader")
        .send()
        .context("Failed to download eng.traineddata")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download eng.traineddata: HTTP {}",
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&eng_path)?;
    file.write_all(&bytes)?;

    info!("Downloaded eng.traineddata ({} bytes)", bytes.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_configured_paths_win() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("tesseract");
        std::fs::write(&exe, "").unwrap();
        std::fs::write(dir.path().join("eng.traineddata"), "").unwrap();

        let config = OcrConfig {
            tesseract_path: Some(exe.clone()),
            tessdata_dir: Some(dir.path().to_path_buf()),
            ..OcrConfig::default()
        };
        let paths = ensure_tesseract(&config).unwrap();
        assert_eq!(paths.executable, exe);
        assert_eq!(paths.tessdata, dir.path());
    }

    #[test]
    fn test_configured_paths_must_exist() {
        let dir = tempdir().unwrap();
        let config = OcrConfig {
            tesseract_path: Some(dir.path().join("missing")),
            ..OcrConfig::default()
        };
        assert!(ensure_tesseract(&config).is_err());

        let exe = dir.path().join("tesseract");
        std::fs::write(&exe, "").unwrap();
        let config = OcrConfig {
            tesseract_path: Some(exe),
            tessdata_dir: Some(dir.path().to_path_buf()),
            ..OcrConfig::default()
        };
        assert!(ensure_tesseract(&config).is_err());
    }
}
