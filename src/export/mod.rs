//! Export of parameter scan results.
//!
//! Provides CSV column export and JSON snapshots of a [`ScanFigure`](crate::scan::ScanFigure).

mod csv_export;
mod json_export;

pub use csv_export::{write_scan_csv, ScanCsvExporter};
pub use json_export::{export_scan_json, export_scan_json_to, ScanExport};
