//! In-memory model with a pluggable steady-state solver.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use super::{Model, ModelSymbol};

/// Mutable model quantities handed to the steady-state solver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelState {
    /// Reaction identifiers in model order
    pub reactions: Vec<String>,
    /// Variable species identifiers in model order
    pub species: Vec<String>,
    /// Steady-state flux by reaction
    pub fluxes: BTreeMap<String, f64>,
    /// Steady-state concentration by species
    pub steady_state: BTreeMap<String, f64>,
    /// Named parameters (rate constants, elasticities, fixed species)
    pub parameters: BTreeMap<String, f64>,
}

impl ModelState {
    /// Flux through a declared reaction
    pub fn flux(&self, reaction: &str) -> Result<f64> {
        self.fluxes
            .get(reaction)
            .copied()
            .ok_or_else(|| anyhow!("Unknown reaction `{}`", reaction))
    }

    /// Steady-state concentration of a declared species
    pub fn steady_state(&self, species: &str) -> Result<f64> {
        self.steady_state
            .get(species)
            .copied()
            .ok_or_else(|| anyhow!("Unknown species `{}`", species))
    }

    /// Named parameter
    pub fn parameter(&self, name: &str) -> Result<f64> {
        self.parameters
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("Unknown model attribute `{}`", name))
    }

    /// Resolve an expression symbol
    pub fn get(&self, symbol: &ModelSymbol) -> Result<f64> {
        match symbol {
            ModelSymbol::Flux(reaction) => self.flux(reaction),
            ModelSymbol::SteadyState(species) => self.steady_state(species),
            ModelSymbol::Parameter(name) => self.parameter(name),
        }
    }

    /// Assign through an expression symbol.
    ///
    /// Parameters are created on first assignment so that solvers can publish
    /// derived quantities (elasticities); fluxes and species must be declared.
    pub fn set(&mut self, symbol: &ModelSymbol, value: f64) -> Result<()> {
        match symbol {
            ModelSymbol::Flux(reaction) => match self.fluxes.get_mut(reaction) {
                Some(slot) => *slot = value,
                None => bail!("Unknown reaction `{}`", reaction),
            },
            ModelSymbol::SteadyState(species) => match self.steady_state.get_mut(species) {
                Some(slot) => *slot = value,
                None => bail!("Unknown species `{}`", species),
            },
            ModelSymbol::Parameter(name) => {
                self.parameters.insert(name.clone(), value);
            }
        }
        Ok(())
    }

    /// Classify a symbol against the declared identifiers
    pub fn classify(&self, symbol: &str) -> ModelSymbol {
        ModelSymbol::classify(symbol, &self.reactions, &self.species)
    }
}

/// Steady-state solver: recomputes fluxes, concentrations and derived
/// parameters in place from the current parameter values
pub type SteadyStateSolver = Box<dyn FnMut(&mut ModelState) -> Result<()>>;

/// Number of expensive recomputations a model has performed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolveCounters {
    /// Steady-state solves, including those run for control coefficients
    pub steady_state_solves: u64,
    /// Control coefficient recomputations
    pub control_coefficient_runs: u64,
}

/// Table-backed [`Model`]
///
/// Without a solver the steady state is whatever was last written into the
/// tables; recomputation then only bumps the counters.
pub struct TableModel {
    name: String,
    state: ModelState,
    fixed_species: BTreeSet<String>,
    solver: Option<SteadyStateSolver>,
    quiet: bool,
    counters: SolveCounters,
}

impl TableModel {
    /// Create a model with declared reactions and species, all values zero
    pub fn new<R, S>(name: impl Into<String>, reactions: R, species: S) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let reactions: Vec<String> = reactions.into_iter().map(Into::into).collect();
        let species: Vec<String> = species.into_iter().map(Into::into).collect();
        let fluxes = reactions.iter().map(|r| (r.clone(), 0.0)).collect();
        let steady_state = species.iter().map(|s| (s.clone(), 0.0)).collect();

        Self {
            name: name.into(),
            state: ModelState {
                reactions,
                species,
                fluxes,
                steady_state,
                parameters: BTreeMap::new(),
            },
            fixed_species: BTreeSet::new(),
            solver: None,
            quiet: false,
            counters: SolveCounters::default(),
        }
    }

    /// Add or overwrite a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.state.parameters.insert(name.into(), value);
        self
    }

    /// Add a fixed species; its concentration is a parameter
    pub fn with_fixed_species(mut self, name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        self.fixed_species.insert(name.clone());
        self.state.parameters.insert(name, value);
        self
    }

    /// Set the initial flux of a declared reaction
    pub fn with_flux(mut self, reaction: &str, value: f64) -> Result<Self> {
        self.set_flux(reaction, value)?;
        Ok(self)
    }

    /// Set the initial steady-state concentration of a declared species
    pub fn with_steady_state(mut self, species: &str, value: f64) -> Result<Self> {
        self.set_steady_state(species, value)?;
        Ok(self)
    }

    /// Install a steady-state solver
    pub fn with_solver<F>(mut self, solver: F) -> Self
    where
        F: FnMut(&mut ModelState) -> Result<()> + 'static,
    {
        self.solver = Some(Box::new(solver));
        self
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current tables
    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Fixed species names
    pub fn fixed_species(&self) -> &BTreeSet<String> {
        &self.fixed_species
    }

    /// Overwrite a flux directly, bypassing the solver
    pub fn set_flux(&mut self, reaction: &str, value: f64) -> Result<()> {
        self.state.set(&ModelSymbol::Flux(reaction.to_string()), value)
    }

    /// Overwrite a steady-state concentration directly, bypassing the solver
    pub fn set_steady_state(&mut self, species: &str, value: f64) -> Result<()> {
        self.state
            .set(&ModelSymbol::SteadyState(species.to_string()), value)
    }

    /// Recomputations performed so far
    pub fn counters(&self) -> SolveCounters {
        self.counters
    }

    /// Reset the recomputation counters
    pub fn reset_counters(&mut self) {
        self.counters = SolveCounters::default();
    }

    /// Whether solver logging is currently suppressed
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl fmt::Debug for TableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableModel")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("fixed_species", &self.fixed_species)
            .field("has_solver", &self.solver.is_some())
            .field("quiet", &self.quiet)
            .field("counters", &self.counters)
            .finish()
    }
}

impl Model for TableModel {
    fn reactions(&self) -> &[String] {
        &self.state.reactions
    }

    fn species(&self) -> &[String] {
        &self.state.species
    }

    fn flux(&self, reaction: &str) -> Result<f64> {
        self.state.flux(reaction)
    }

    fn steady_state(&self, species: &str) -> Result<f64> {
        self.state.steady_state(species)
    }

    fn parameter(&self, name: &str) -> Result<f64> {
        self.state.parameter(name)
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        match self.state.parameters.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => bail!("Model `{}` has no parameter `{}`", self.name, name),
        }
    }

    fn is_fixed_species(&self, name: &str) -> bool {
        self.fixed_species.contains(name)
    }

    fn recompute_steady_state(&mut self) -> Result<()> {
        self.counters.steady_state_solves += 1;
        if let Some(solver) = self.solver.as_mut() {
            solver(&mut self.state)?;
        }
        if self.quiet {
            log::debug!("{}: steady state solved", self.name);
        } else {
            log::info!(
                "{}: steady state solved (solve #{})",
                self.name,
                self.counters.steady_state_solves
            );
        }
        Ok(())
    }

    fn recompute_control_coefficients(&mut self) -> Result<()> {
        self.recompute_steady_state()?;
        self.counters.control_coefficient_runs += 1;
        if !self.quiet {
            log::info!("{}: control coefficients recomputed", self.name);
        }
        Ok(())
    }

    fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }
}
