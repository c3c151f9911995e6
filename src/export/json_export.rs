//! JSON snapshots of scan results.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use crate::scan::ScanFigure;

/// Full scan export structure
#[derive(Debug, Clone, Serialize)]
pub struct ScanExport<'a> {
    /// Export timestamp
    pub exported_at: String,
    /// Export version for compatibility
    pub version: &'static str,
    /// Scan series and axis metadata
    pub figure: &'a ScanFigure,
}

impl<'a> ScanExport<'a> {
    fn now(figure: &'a ScanFigure) -> Self {
        Self {
            exported_at: Local::now().to_rfc3339(),
            version: "1.0.0",
            figure,
        }
    }
}

/// Export a scan to JSON
///
/// Creates the exports directory if it doesn't exist.
/// Filename is auto-generated with timestamp:
/// `scan_<coefficient>_YYYYMMDD_HHMMSS.json`
///
/// Returns the path to the saved JSON file.
pub fn export_scan_json(figure: &ScanFigure) -> Result<PathBuf> {
    let dir = PathBuf::from("exports");
    std::fs::create_dir_all(&dir)?;

    let timestamp = Local::now();
    let path = dir.join(format!(
        "scan_{}_{}.json",
        figure.coefficient,
        timestamp.format("%Y%m%d_%H%M%S")
    ));
    export_scan_json_to(figure, &path)?;
    Ok(path)
}

/// Export a scan to a specific file
pub fn export_scan_json_to<P: AsRef<Path>>(figure: &ScanFigure, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &ScanExport::now(figure))?;

    log::info!("JSON scan exported: {}", path.display());
    Ok(())
}
