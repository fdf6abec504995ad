//! Rotating append-only diagnostic log implementing [`DiagnosticSink`].
//!
//! Before each append the live file's size is checked; once it exceeds the
//! limit the previous backup is removed and the live file becomes the
//! backup.  At most two files ever exist.  On the device the file lives on
//! the SPIFFS partition mounted at `/spiffs`.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::warn;

use crate::app::ports::{DiagnosticSink, SinkError};

pub const DEFAULT_LOG_PATH: &str = "/spiffs/edf_log.txt";

pub struct RotatingFileLog {
    path: PathBuf,
    backup: PathBuf,
    max_bytes: u64,
}

impl RotatingFileLog {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u32) -> Self {
        let path = path.into();
        let backup = path.with_extension("bak");
        Self {
            path,
            backup,
            max_bytes: u64::from(max_bytes),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    fn rotate_if_full(&self) -> Result<(), SinkError> {
        let Ok(meta) = fs::metadata(&self.path) else {
            return Ok(());
        };
        if meta.len() <= self.max_bytes {
            return Ok(());
        }
        if self.backup.exists() {
            fs::remove_file(&self.backup).map_err(|_| SinkError::Rotate)?;
        }
        fs::rename(&self.path, &self.backup).map_err(|_| SinkError::Rotate)
    }
}

impl DiagnosticSink for RotatingFileLog {
    fn append(&mut self, record: &str) -> Result<(), SinkError> {
        if let Err(e) = self.rotate_if_full() {
            // The live file keeps growing until a rotation succeeds.
            warn!("log file: rotation failed ({e})");
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|_| SinkError::Io)?;
        writeln!(f, "{record}").map_err(|_| SinkError::Io)
    }
}
