//! Scan settings loaded from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::scan::{lin_space, log_space, ScanMode};

/// Top-level analysis settings container
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisParameters {
    /// Parameter scan settings
    pub scan: ScanParameters,
}

impl AnalysisParameters {
    /// Load settings from JSON files, or use defaults if files don't exist
    pub fn load_or_default() -> Self {
        let scan = ScanParameters::load_or_default("data/parameters/scan.json");

        Self { scan }
    }

    /// Load settings from specific directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let scan = ScanParameters::load_or_default(dir.as_ref().join("scan.json"));

        Self { scan }
    }
}

/// Parameter scan settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParameters {
    /// Number of scan points
    pub points: usize,
    /// First scanned value
    pub start: f64,
    /// Last scanned value
    pub end: f64,
    /// Percentage contributions or raw values
    pub mode: ScanMode,
    /// Reset the parameter after the scan
    pub restore_initial_value: bool,
    /// Space points evenly in log10 rather than linearly
    pub log_spacing: bool,
}

impl ScanParameters {
    /// Load from JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(params) => {
                    log::info!("Loaded scan parameters from {:?}", path.as_ref());
                    params
                }
                Err(e) => {
                    log::warn!("Failed to parse scan parameters: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Scan parameters file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Values to scan
    pub fn scan_range(&self) -> Vec<f64> {
        if self.log_spacing {
            log_space(self.start, self.end, self.points)
        } else {
            lin_space(self.start, self.end, self.points)
        }
    }
}

impl Default for ScanParameters {
    fn default() -> Self {
        Self {
            points: 50,
            start: 0.1,
            end: 100.0,
            mode: ScanMode::Percentage,
            restore_initial_value: true,
            log_spacing: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters() {
        let params = AnalysisParameters::default();
        assert_eq!(params.scan.points, 50);
        assert_eq!(params.scan.mode, ScanMode::Percentage);
        assert!(params.scan.restore_initial_value);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let scan: ScanParameters =
            serde_json::from_str(r#"{"points": 3, "start": 1.0, "end": 3.0, "log_spacing": false, "mode": "value"}"#)
                .unwrap();
        assert_eq!(scan.scan_range(), vec![1.0, 2.0, 3.0]);
        assert_eq!(scan.mode, ScanMode::Value);
        assert!(scan.restore_initial_value);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let scan = ScanParameters::load_or_default("does/not/exist.json");
        assert_eq!(scan, ScanParameters::default());
    }

    #[test]
    fn test_log_range_endpoints() {
        let range = ScanParameters::default().scan_range();
        assert_eq!(range.len(), 50);
        assert!((range[0] - 0.1).abs() < 1e-12);
        assert!((range[49] - 100.0).abs() < 1e-9);
    }
}
