//! Persisted last-reading record.
//!
//! The record is the baseline for validating the next reading. Reading it,
//! validating against it and overwriting it happen under one lock, so two
//! readings can never both pass against the same stale baseline.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{validate, MeterReading};
use crate::config::ValidationConfig;
use crate::error::ReadingError;

pub struct ReadingStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ReadingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the last accepted reading, or `None` if there is none yet.
    pub fn load(&self) -> Result<Option<MeterReading>, ReadingError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_record()
    }

    /// Validates `candidate` against the stored reading and, if accepted,
    /// makes it the new record. A rejected candidate leaves the file untouched.
    pub fn commit(
        &self,
        candidate: MeterReading,
        policy: &ValidationConfig,
    ) -> Result<MeterReading, ReadingError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let last = self.read_record()?;
        validate(candidate.value, last.as_ref(), policy)?;
        self.write_record(&candidate)?;

        info!(
            "Stored reading {} at {}",
            candidate.value,
            candidate.formatted_time()
        );
        Ok(candidate)
    }

    fn read_record(&self) -> Result<Option<MeterReading>, ReadingError> {
        if !self.path.exists() {
            debug!("No last reading at {}", self.path.display());
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| ReadingError::storage(&self.path, e))?;
        let reading = serde_json::from_str(&contents)
            .map_err(|e| ReadingError::storage(&self.path, e))?;
        Ok(Some(reading))
    }

    /// Writes a sibling temp file and renames it over the record.
    fn write_record(&self, reading: &MeterReading) -> Result<(), ReadingError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| ReadingError::storage(&self.path, e))?;

        let mut json = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
        reading
            .serialize(&mut serializer)
            .map_err(|e| ReadingError::storage(&self.path, e))?;

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| ReadingError::storage(&self.path, e))?;
        temp.write_all(&json)
            .map_err(|e| ReadingError::storage(&self.path, e))?;
        temp.persist(&self.path)
            .map_err(|e| ReadingError::storage(&self.path, e))?;
        Ok(())
    }
}
