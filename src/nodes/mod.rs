//! Cached expression nodes: the shared denominator, control coefficients and
//! their control patterns.
//!
//! Every node reads its value through a [`ValueCache`] keyed on the model's
//! steady-state fingerprint. A [`Coefficient`] owns its [`Pattern`]s; patterns
//! refer back to their coefficient by name.

mod cache;
mod coefficient;
mod node;
mod pattern;

pub use cache::ValueCache;
pub use coefficient::Coefficient;
pub use node::{ExpressionNode, Node, Operand};
pub use pattern::Pattern;
