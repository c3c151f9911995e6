//! Steady-state bookkeeping for the control analysis.
//!
//! Contains the fingerprint used to detect a changed steady state, the
//! [`StateKeeper`] that gates the expensive control coefficient
//! recomputation, and the [`AnalysisContext`] every node is constructed with.

mod context;
mod fingerprint;
mod keeper;

pub use context::{AnalysisContext, SharedModel};
pub use fingerprint::Fingerprint;
pub use keeper::StateKeeper;
