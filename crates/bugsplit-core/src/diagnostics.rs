//! Append-only diagnostic log
//!
//! Version detection outcomes go to a plain-text file next to the host so that
//! users can attach it to bug reports. Each line is `[YYYY-MM-DD HH:MM:SS] message`
//! in local time.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    path: PathBuf,
}

impl DiagnosticLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a timestamped line, creating the file if it does not exist
    pub fn append(&self, message: &str) -> Result<()> {
        let now: DateTime<Local> = Local::now();
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", format_line(&now, message))?;
        Ok(())
    }
}

fn format_line(timestamp: &DateTime<Local>, message: &str) -> String {
    format!("[{}] {}", timestamp.format("%Y-%m-%d %H:%M:%S"), message)
}
