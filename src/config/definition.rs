//! Analysis definitions: a model plus symbolic control coefficients.
//!
//! The JSON document names a model, the shared denominator `Σ`, and one
//! numerator per control coefficient:
//!
//! ```json
//! {
//!   "model": { "name": "...", "reactions": [...], "species": [...] },
//!   "sigma": "ec_R2_S*... + ...",
//!   "coefficients": [ { "name": "ccJ_R1", "numerator": "..." } ],
//!   "scan_parameter": "X0"
//! }
//! ```

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::algebra;
use crate::model::ModelDefinition;
use crate::nodes::{Coefficient, ExpressionNode, Node};
use crate::state::{AnalysisContext, SharedModel};

fn default_sigma_name() -> String {
    "Sigma".to_string()
}

/// Named control coefficient numerator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoefficientDefinition {
    pub name: String,
    pub numerator: String,
}

/// Serializable description of a complete analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDefinition {
    /// Model the coefficients are evaluated against
    pub model: ModelDefinition,
    /// Name of the shared denominator node
    #[serde(default = "default_sigma_name")]
    pub sigma_name: String,
    /// Shared denominator expression
    pub sigma: String,
    /// Control coefficient numerators
    pub coefficients: Vec<CoefficientDefinition>,
    /// Parameter scanned by default
    #[serde(default)]
    pub scan_parameter: Option<String>,
}

/// Built analysis: context, shared denominator and coefficients
#[derive(Debug)]
pub struct Analysis {
    pub context: AnalysisContext,
    pub sigma: Rc<ExpressionNode>,
    pub coefficients: Vec<Coefficient>,
    pub scan_parameter: Option<String>,
}

impl Analysis {
    /// Coefficient by name
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|cc| cc.name() == name)
    }
}

impl AnalysisDefinition {
    /// Load from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Reading analysis definition {}", path.display()))?;
        let definition = Self::from_json_str(&contents)?;
        log::info!("Loaded analysis definition from {:?}", path);
        Ok(definition)
    }

    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Parsing analysis definition")
    }

    /// Build the model, the shared denominator and every coefficient
    pub fn build(&self) -> Result<Analysis> {
        self.build_from_shared(Rc::new(RefCell::new(self.model.build()?)))
    }

    /// Build the shared denominator and coefficients against an already
    /// built model; the caller keeps its handle to the model
    pub fn build_from_shared(&self, model: SharedModel) -> Result<Analysis> {
        let context = AnalysisContext::from_shared(model)?;

        let sigma_expr = algebra::parse(&self.sigma)
            .with_context(|| format!("Parsing `{}`", self.sigma_name))?;
        let sigma = Rc::new(ExpressionNode::new(&context, self.sigma_name.clone(), sigma_expr)?);

        let coefficients = self
            .coefficients
            .iter()
            .map(|def| {
                let numerator = algebra::parse(&def.numerator)
                    .with_context(|| format!("Parsing numerator of `{}`", def.name))?;
                Coefficient::new(&context, def.name.clone(), numerator, &sigma)
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "Built analysis of `{}`: {} control coefficients, {} control patterns",
            self.model.name,
            coefficients.len(),
            coefficients
                .iter()
                .map(|cc| cc.control_patterns().len())
                .sum::<usize>()
        );

        Ok(Analysis {
            context,
            sigma,
            coefficients,
            scan_parameter: self.scan_parameter.clone(),
        })
    }
}
