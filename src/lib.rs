//! Symbolic control analysis: control coefficients and control patterns
//!
//! This library evaluates symbolic control coefficients of a metabolic model,
//! decomposes each into its control patterns, and caches every value against
//! a fingerprint of the model's steady state so that the expensive control
//! coefficient recomputation runs only when the steady state actually moves.

pub mod algebra;
pub mod config;
pub mod export;
pub mod model;
pub mod nodes;
pub mod scan;
pub mod state;

pub use algebra::Expr;
pub use config::{Analysis, AnalysisDefinition, AnalysisParameters};
pub use model::{Model, ModelDefinition, TableModel};
pub use nodes::{Coefficient, ExpressionNode, Node, Pattern};
pub use scan::{ParameterScanner, ScanFigure, ScanMode};
pub use state::{AnalysisContext, Fingerprint, StateKeeper};
