//! CSV export of scan series.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::scan::ScanFigure;

/// Write `figure` as CSV: header `x` plus one column per series, then one row
/// per scan point
pub fn write_scan_csv<W: Write>(figure: &ScanFigure, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec!["x".to_string()];
    header.extend(figure.names().into_iter().map(str::to_string));
    writer.write_record(&header)?;

    for row in figure.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// CSV exporter for scan results
pub struct ScanCsvExporter {
    path: PathBuf,
}

impl ScanCsvExporter {
    /// Exporter writing to `exports/scan_<coefficient>_YYYYMMDD_HHMMSS.csv`
    ///
    /// Creates the exports directory if it doesn't exist.
    pub fn new(coefficient: &str) -> Result<Self> {
        let dir = PathBuf::from("exports");
        std::fs::create_dir_all(&dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("scan_{}_{}.csv", coefficient, timestamp));
        Ok(Self { path })
    }

    /// Exporter writing to an explicit path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write the figure and return the output path
    pub fn export(self, figure: &ScanFigure) -> Result<PathBuf> {
        let file = File::create(&self.path)
            .with_context(|| format!("Creating {}", self.path.display()))?;
        write_scan_csv(figure, file)?;

        log::info!(
            "CSV scan export completed: {} ({} points)",
            self.path.display(),
            figure.x_data().len()
        );
        Ok(self.path)
    }

    /// Get the output path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
