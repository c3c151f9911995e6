//! Parameter scans over a control coefficient.
//!
//! A scan sets one model parameter to each value of a range in turn, forces a
//! control coefficient recomputation, and records either the percentage
//! contribution or the value of every control pattern (value scans also
//! record the coefficient itself).
//!
//! Scans mutate the shared model in place: run one at a time per model.

mod figure;
mod range;

pub use figure::{AxisProperties, AxisScale, LineData, ScanFigure};
pub use range::{lin_space, log_space};

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::nodes::{Coefficient, Node};

/// What a scan records per control pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Percentage contribution of each pattern
    #[default]
    Percentage,
    /// Value of each pattern, plus the coefficient value
    Value,
}

impl FromStr for ScanMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "percentage" => Ok(ScanMode::Percentage),
            "value" => Ok(ScanMode::Value),
            other => bail!(
                "Invalid scan type `{}`, expected `percentage` or `value`",
                other
            ),
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Percentage => write!(f, "percentage"),
            ScanMode::Value => write!(f, "value"),
        }
    }
}

/// Sweeps one model parameter and collects per-pattern series
#[derive(Debug, Clone)]
pub struct ParameterScanner {
    parameter: String,
    scan_range: Vec<f64>,
    mode: ScanMode,
    restore_initial_value: bool,
}

impl ParameterScanner {
    /// Scan `parameter` over `scan_range`; the parameter is left at the last
    /// scanned value unless [`ParameterScanner::restore_initial_value`] is set
    pub fn new(parameter: impl Into<String>, scan_range: Vec<f64>, mode: ScanMode) -> Self {
        Self {
            parameter: parameter.into(),
            scan_range,
            mode,
            restore_initial_value: false,
        }
    }

    /// Reset the parameter to its pre-scan value after the sweep
    pub fn restore_initial_value(mut self, restore: bool) -> Self {
        self.restore_initial_value = restore;
        self
    }

    /// Scanned parameter
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// Scan mode
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Run the sweep.
    ///
    /// Each step fully completes, including the forced recomputation, before
    /// the next begins. The first error aborts the scan; collected points are
    /// discarded and the parameter is not restored.
    pub fn run(&self, coefficient: &Coefficient) -> Result<ScanFigure> {
        if self.scan_range.is_empty() {
            bail!("Scan range for `{}` is empty", self.parameter);
        }

        let ctx = coefficient.context();
        let patterns = coefficient.control_patterns();
        let series_count = match self.mode {
            ScanMode::Percentage => patterns.len(),
            ScanMode::Value => patterns.len() + 1,
        };
        let mut series: Vec<Vec<f64>> = vec![Vec::with_capacity(self.scan_range.len()); series_count];

        let initial = ctx.model().parameter(&self.parameter)?;
        log::info!(
            "Scanning `{}` over {} points ({} of {})",
            self.parameter,
            self.scan_range.len(),
            self.mode,
            coefficient.name()
        );

        for (step, &value) in self.scan_range.iter().enumerate() {
            {
                let mut model = ctx.model_mut();
                model.set_parameter(&self.parameter, value)?;
                model.set_quiet(true);
                let recomputed = model.recompute_control_coefficients();
                model.set_quiet(false);
                recomputed?;
            }

            for (i, pattern) in patterns.iter().enumerate() {
                let y = match self.mode {
                    ScanMode::Percentage => pattern.percentage(coefficient)?,
                    ScanMode::Value => pattern.value()?,
                };
                series[i].push(y);
            }
            if self.mode == ScanMode::Value {
                series[patterns.len()].push(coefficient.value()?);
            }

            log::debug!(
                "Scan step {}/{}: {} = {}",
                step + 1,
                self.scan_range.len(),
                self.parameter,
                value
            );
        }

        if self.restore_initial_value {
            ctx.model_mut().set_parameter(&self.parameter, initial)?;
        }

        let figure = self.build_figure(coefficient, series);
        log::info!("Scan of `{}` complete", self.parameter);
        Ok(figure)
    }

    fn build_figure(&self, coefficient: &Coefficient, series: Vec<Vec<f64>>) -> ScanFigure {
        let pattern_names: Vec<String> = coefficient
            .control_patterns()
            .iter()
            .map(|p| p.name().to_string())
            .collect();

        let coefficient_name = coefficient.name().to_string();
        let lines: Vec<LineData> = series
            .into_iter()
            .enumerate()
            .map(|(i, y_data)| {
                // Value scans carry the coefficient after the patterns
                let (name, label) = match pattern_names.get(i) {
                    Some(name) => (name.clone(), name.clone()),
                    None => (
                        coefficient_name.clone(),
                        format!("${}$", coefficient.latex_name()),
                    ),
                };
                LineData {
                    categories: vec![name.clone()],
                    name,
                    label,
                    x_data: self.scan_range.clone(),
                    y_data,
                }
            })
            .collect();

        let x_label = if coefficient.context().model().is_fixed_species(&self.parameter) {
            format!("[{}]", self.parameter.replace('_', " "))
        } else {
            self.parameter.replace('_', " ")
        };

        let (y_label, category_classes) = match self.mode {
            ScanMode::Percentage => (
                "Percentage Contribution",
                vec![("Control Patterns".to_string(), pattern_names)],
            ),
            ScanMode::Value => {
                let mut names = pattern_names;
                names.push(coefficient_name);
                (
                    "Control coefficient/pattern value",
                    vec![("Control Coefficient/Patterns".to_string(), names)],
                )
            }
        };

        let x_min = self.scan_range.iter().copied().fold(f64::INFINITY, f64::min);
        let x_max = self.scan_range.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        ScanFigure {
            parameter: self.parameter.clone(),
            coefficient: coefficient.name().to_string(),
            lines,
            axes: AxisProperties {
                x_label,
                y_label: y_label.to_string(),
                x_scale: AxisScale::Log,
                x_limits: (x_min, x_max),
            },
            category_classes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::algebra::parse;
    use crate::model::TableModel;
    use crate::nodes::ExpressionNode;
    use crate::state::AnalysisContext;

    fn toy() -> Coefficient {
        let ctx = AnalysisContext::new(
            TableModel::new("toy", Vec::<String>::new(), Vec::<String>::new())
                .with_parameter("a", 3.0)
                .with_parameter("b", 1.0),
        )
        .unwrap();
        let sigma = Rc::new(ExpressionNode::new(&ctx, "Sigma", parse("a + b").unwrap()).unwrap());
        Coefficient::new(&ctx, "ccJ", parse("a - b").unwrap(), &sigma).unwrap()
    }

    #[test]
    fn test_scan_mode_from_str() {
        assert_eq!("percentage".parse::<ScanMode>().unwrap(), ScanMode::Percentage);
        assert_eq!("value".parse::<ScanMode>().unwrap(), ScanMode::Value);
        let err = "ratio".parse::<ScanMode>().unwrap_err();
        assert!(err.to_string().contains("ratio"));
        assert_eq!(ScanMode::default(), ScanMode::Percentage);
    }

    #[test]
    fn test_value_scan_appends_coefficient_line() {
        let cc = toy();
        let figure = ParameterScanner::new("a", vec![2.0, 3.0], ScanMode::Value)
            .run(&cc)
            .unwrap();
        assert_eq!(figure.names(), vec!["CP1", "CP2", "ccJ"]);
        let line = figure.line("ccJ").unwrap();
        assert_eq!(line.categories, vec!["ccJ".to_string()]);
        assert!(line.label.starts_with('$') && line.label.ends_with('$'));
        // a = 2: (2 - 1)/(2 + 1)
        assert!((line.y_data[0] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(figure.axes.x_limits, (2.0, 3.0));
    }

    #[test]
    fn test_empty_range_rejected() {
        let cc = toy();
        let result = ParameterScanner::new("a", Vec::new(), ScanMode::Percentage).run(&cc);
        assert!(result.is_err());
    }
}
