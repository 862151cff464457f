use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use shared::report::ExportedReport;
use tracing::info;

/// Writes the report into `dir` under its fixed file name, creating `dir`
/// when needed. Returns the written path.
pub fn save_report(report: &ExportedReport, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory '{}'", dir.display()))?;
    let path = dir.join(report.file_name);
    write_report(report, &path)?;
    Ok(path)
}

/// Writes the report to an explicit path, e.g. one picked in a save dialog.
pub fn write_report(report: &ExportedReport, path: &Path) -> Result<()> {
    fs::write(path, report.contents.as_bytes())
        .with_context(|| format!("failed to write report to '{}'", path.display()))?;
    info!(path = %path.display(), bytes = report.contents.len(), "exported anomaly report");
    Ok(())
}
