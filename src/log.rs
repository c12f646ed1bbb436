//! Progress log sinks.
//!
//! Each pipeline stage receives a `&mut dyn ProgressLog` and reports the row
//! counts it produced, so every dropped row is accounted for. The sink is
//! chosen by the caller:
//!
//! - `FileLog`: per-universe log file, mirrored to `tracing`
//! - `TracingLog`: `tracing` only (ad-hoc subcommands)
//! - `MemoryLog`: collects lines (tests)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::AppError;

pub trait ProgressLog {
    fn line(&mut self, message: &str);
}

/// Writes every line to a file and emits it as a `tracing` event.
pub struct FileLog {
    writer: BufWriter<File>,
    scope: String,
    failed: bool,
}

impl FileLog {
    pub fn create(path: &Path, scope: impl Into<String>) -> Result<Self, AppError> {
        let file = File::create(path)
            .map_err(|e| AppError::io(format!("Failed to create log file '{}': {e}", path.display())))?;
        Ok(Self {
            writer: BufWriter::new(file),
            scope: scope.into(),
            failed: false,
        })
    }

    pub fn flush(&mut self) -> Result<(), AppError> {
        self.writer
            .flush()
            .map_err(|e| AppError::io(format!("Failed to flush log file: {e}")))
    }
}

impl ProgressLog for FileLog {
    fn line(&mut self, message: &str) {
        tracing::info!(scope = %self.scope, "{message}");
        if self.failed {
            return;
        }
        if let Err(e) = writeln!(self.writer, "{message}") {
            // Keep running; the tracing copy still carries the message.
            tracing::warn!(scope = %self.scope, "log file write failed: {e}");
            self.failed = true;
        }
    }
}

impl Drop for FileLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl ProgressLog for TracingLog {
    fn line(&mut self, message: &str) {
        tracing::info!("{message}");
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    pub lines: Vec<String>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl ProgressLog for MemoryLog {
    fn line(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }
}
