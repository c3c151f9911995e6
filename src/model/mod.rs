//! Model collaborator interface.
//!
//! The steady-state solver is external to this crate; everything the control
//! analysis needs from it goes through the [`Model`] trait. Symbol names in
//! control coefficient expressions follow the usual naming conventions:
//! - `J_<reaction>`: steady-state flux of a declared reaction
//! - `<species>_ss`: steady-state concentration of a declared species
//! - anything else: a named model parameter (elasticities, rate constants,
//!   fixed species concentrations)

mod definition;
mod table;

pub use definition::{Assignment, ModelDefinition};
pub use table::{ModelState, SolveCounters, SteadyStateSolver, TableModel};

use anyhow::Result;

/// Steady-state model consumed by the control analysis
pub trait Model {
    /// Reaction identifiers in model order
    fn reactions(&self) -> &[String];

    /// Variable species identifiers in model order
    fn species(&self) -> &[String];

    /// Steady-state flux through `reaction`
    fn flux(&self, reaction: &str) -> Result<f64>;

    /// Steady-state concentration of `species`
    fn steady_state(&self, species: &str) -> Result<f64>;

    /// Current value of a named parameter
    fn parameter(&self, name: &str) -> Result<f64>;

    /// Set a named parameter; does not trigger any recomputation
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()>;

    /// Whether `name` is a species held fixed as a boundary condition
    fn is_fixed_species(&self, name: &str) -> bool;

    /// Re-solve the steady state
    fn recompute_steady_state(&mut self) -> Result<()>;

    /// Recompute control coefficients (and the steady state they depend on)
    fn recompute_control_coefficients(&mut self) -> Result<()>;

    /// Suppress (`true`) or restore (`false`) solver logging
    fn set_quiet(&mut self, quiet: bool);

    /// Current value of an expression symbol, resolved through the typed accessors
    fn symbol_value(&self, symbol: &str) -> Result<f64> {
        match ModelSymbol::classify(symbol, self.reactions(), self.species()) {
            ModelSymbol::Flux(reaction) => self.flux(&reaction),
            ModelSymbol::SteadyState(species) => self.steady_state(&species),
            ModelSymbol::Parameter(name) => self.parameter(&name),
        }
    }
}

/// What an expression symbol refers to in the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSymbol {
    /// Flux of the named reaction
    Flux(String),
    /// Steady-state concentration of the named species
    SteadyState(String),
    /// Named parameter
    Parameter(String),
}

impl ModelSymbol {
    /// Classify `symbol` against the declared reaction and species identifiers
    pub fn classify(symbol: &str, reactions: &[String], species: &[String]) -> Self {
        if let Some(reaction) = symbol.strip_prefix("J_") {
            if reactions.iter().any(|r| r == reaction) {
                return ModelSymbol::Flux(reaction.to_string());
            }
        }
        if let Some(name) = symbol.strip_suffix("_ss") {
            if species.iter().any(|s| s == name) {
                return ModelSymbol::SteadyState(name.to_string());
            }
        }
        ModelSymbol::Parameter(symbol.to_string())
    }

    /// Classify `symbol` against a model's declared identifiers
    pub fn resolve<M: Model + ?Sized>(model: &M, symbol: &str) -> Self {
        Self::classify(symbol, model.reactions(), model.species())
    }

    /// The symbol name this refers to in expressions
    pub fn symbol_name(&self) -> String {
        match self {
            ModelSymbol::Flux(reaction) => format!("J_{}", reaction),
            ModelSymbol::SteadyState(species) => format!("{}_ss", species),
            ModelSymbol::Parameter(name) => name.clone(),
        }
    }
}
