//! Report sinks: the append-only report log and the JSON export.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fleetwatch_types::Report;
use tracing::debug;

use crate::data::render;

/// Append-only history of rendered reports.
///
/// Each run appends its rendered text; earlier runs are never rewritten.
#[derive(Debug, Clone)]
pub struct ReportLog {
    path: PathBuf,
}

impl ReportLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append already rendered report text, creating the file (and its
    /// parent directories) on first use.
    pub fn append(&self, rendered: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating log directory {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening report log {}", self.path.display()))?;
        file.write_all(rendered.as_bytes())
            .with_context(|| format!("appending to report log {}", self.path.display()))?;
        debug!(path = %self.path.display(), bytes = rendered.len(), "appended report");
        Ok(())
    }
}

/// Write the report as pretty JSON, replacing any previous export.
pub fn export_json(report: &Report, path: &Path) -> Result<()> {
    let json = render::to_json(report).context("serializing report")?;
    let mut file = fs::File::create(path)
        .with_context(|| format!("creating export file {}", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("writing export file {}", path.display()))?;
    debug!(path = %path.display(), "exported report");
    Ok(())
}
