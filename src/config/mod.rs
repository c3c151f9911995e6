//! Configuration loading: scan settings and analysis definitions.

mod definition;
mod parameters;

pub use definition::{Analysis, AnalysisDefinition, CoefficientDefinition};
pub use parameters::{AnalysisParameters, ScanParameters};
