//! Serializable model definitions.
//!
//! A definition declares the identifiers and initial values of a
//! [`TableModel`] plus an ordered list of closed-form assignments that act as
//! its steady-state solver. Assignments are evaluated in order, each one
//! seeing the values written by the ones before it.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{Model, ModelState, ModelSymbol, TableModel};
use crate::algebra::{self, Expr};

/// `target = expression`, evaluated on every steady-state solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Symbol written (`J_R1`, `S1_ss`, or a parameter name)
    pub target: String,
    /// Expression over model symbols
    pub expression: String,
}

/// JSON-friendly description of a [`TableModel`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDefinition {
    /// Model name
    pub name: String,
    /// Reaction identifiers in model order
    pub reactions: Vec<String>,
    /// Variable species identifiers in model order
    pub species: Vec<String>,
    /// Fixed species and their concentrations
    #[serde(default)]
    pub fixed_species: BTreeMap<String, f64>,
    /// Parameters and their values
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    /// Initial fluxes (overwritten by the first solve when assignments exist)
    #[serde(default)]
    pub fluxes: BTreeMap<String, f64>,
    /// Initial steady-state concentrations
    #[serde(default)]
    pub steady_state: BTreeMap<String, f64>,
    /// Ordered closed-form steady-state assignments
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

fn solve_assignments(state: &mut ModelState, compiled: &[(ModelSymbol, Expr)]) -> Result<()> {
    for (target, expression) in compiled {
        let mut values = HashMap::new();
        for symbol in expression.free_symbols() {
            let value = state.get(&state.classify(&symbol))?;
            values.insert(symbol, value);
        }
        let value = expression
            .evaluate(&values)
            .with_context(|| format!("Evaluating `{}`", target.symbol_name()))?;
        state.set(target, value)?;
    }
    Ok(())
}

impl ModelDefinition {
    /// Build the model and run the initial steady-state solve.
    ///
    /// Solve counters are reset afterwards so they only count work done by
    /// the analysis.
    pub fn build(&self) -> Result<TableModel> {
        let mut model = TableModel::new(
            self.name.clone(),
            self.reactions.iter().cloned(),
            self.species.iter().cloned(),
        );
        for (name, &value) in &self.fixed_species {
            model = model.with_fixed_species(name.clone(), value);
        }
        for (name, &value) in &self.parameters {
            model = model.with_parameter(name.clone(), value);
        }
        for (reaction, &value) in &self.fluxes {
            model.set_flux(reaction, value)?;
        }
        for (species, &value) in &self.steady_state {
            model.set_steady_state(species, value)?;
        }

        if !self.assignments.is_empty() {
            let compiled = self
                .assignments
                .iter()
                .map(|a| {
                    let expression = algebra::parse(&a.expression)
                        .with_context(|| format!("Parsing assignment to `{}`", a.target))?;
                    let target = model.state().classify(&a.target);
                    Ok((target, expression))
                })
                .collect::<Result<Vec<_>>>()?;
            model = model.with_solver(move |state| solve_assignments(state, &compiled));

            model.set_quiet(true);
            let solved = model.recompute_steady_state();
            model.set_quiet(false);
            solved.with_context(|| format!("Initial steady state of `{}`", self.name))?;
            model.reset_counters();
        }

        log::info!(
            "Built model `{}`: {} reactions, {} species, {} assignments",
            self.name,
            self.reactions.len(),
            self.species.len(),
            self.assignments.len()
        );
        Ok(model)
    }

    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Parsing model definition")
    }
}
