//! Control coefficients and their decomposition into control patterns.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};

use super::{ExpressionNode, Node, Pattern, ValueCache};
use crate::algebra::Expr;
use crate::scan::{ParameterScanner, ScanFigure, ScanMode};
use crate::state::{AnalysisContext, Fingerprint};

/// A control coefficient `numerator / Σ`, decomposed into control patterns.
///
/// The numerator is split into its additive terms exactly once, at
/// construction; pattern `CPn` is the n-th term over the shared denominator.
/// The coefficient's value is the sum of its patterns' values.
pub struct Coefficient {
    name: String,
    numerator: Expr,
    expression: Expr,
    denominator: Rc<ExpressionNode>,
    control_patterns: Vec<Pattern>,
    ctx: AnalysisContext,
    cache: ValueCache,
    latex_numerator: OnceCell<String>,
    latex_expression: OnceCell<String>,
    latex_expression_full: OnceCell<String>,
    latex_name: OnceCell<String>,
}

impl Coefficient {
    /// Build a coefficient and its control patterns
    pub fn new(
        ctx: &AnalysisContext,
        name: impl Into<String>,
        numerator: Expr,
        denominator: &Rc<ExpressionNode>,
    ) -> Result<Self> {
        let name = name.into();
        let fingerprint = ctx
            .snapshot()
            .with_context(|| format!("Creating control coefficient `{}`", name))?;
        let expression = numerator.divide(denominator.expression());

        let control_patterns = numerator
            .additive_terms()
            .into_iter()
            .enumerate()
            .map(|(i, term)| Pattern::new(ctx, format!("CP{}", i + 1), term, denominator, &name))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "{}: decomposed into {} control patterns",
            name,
            control_patterns.len()
        );

        Ok(Self {
            name,
            numerator,
            expression,
            denominator: Rc::clone(denominator),
            control_patterns,
            ctx: ctx.clone(),
            cache: ValueCache::new(fingerprint),
            latex_numerator: OnceCell::new(),
            latex_expression: OnceCell::new(),
            latex_expression_full: OnceCell::new(),
            latex_name: OnceCell::new(),
        })
    }

    /// Numerator expression
    pub fn numerator(&self) -> &Expr {
        &self.numerator
    }

    /// Shared denominator node
    pub fn denominator(&self) -> &Rc<ExpressionNode> {
        &self.denominator
    }

    /// Control patterns in numbering order
    pub fn control_patterns(&self) -> &[Pattern] {
        &self.control_patterns
    }

    /// Control pattern by name (`"CP1"`, `"CP2"`, ...)
    pub fn pattern(&self, name: &str) -> Option<&Pattern> {
        self.control_patterns.iter().find(|p| p.name() == name)
    }

    /// Context the coefficient was built with
    pub fn context(&self) -> &AnalysisContext {
        &self.ctx
    }

    /// Percentage contribution of the pattern at `index`
    pub fn percentage(&self, index: usize) -> Result<f64> {
        let pattern = self.control_patterns.get(index).ok_or_else(|| {
            anyhow!(
                "`{}` has {} control patterns, no index {}",
                self.name,
                self.control_patterns.len(),
                index
            )
        })?;
        pattern.percentage(self)
    }

    /// Percentage contributions of all patterns in numbering order
    pub fn percentages(&self) -> Result<Vec<f64>> {
        self.control_patterns
            .iter()
            .map(|p| p.percentage(self))
            .collect()
    }

    /// Whether the patterns sum back to the numerator (structural identity)
    pub fn is_decomposition_complete(&self) -> bool {
        Expr::sum(self.control_patterns.iter().map(|p| p.numerator().clone())) == self.numerator
    }

    /// Recalculate every pattern unconditionally, then this coefficient as
    /// their sum. For use after a change the caller knows invalidates all
    /// values, without relying on the fingerprint comparison.
    pub fn force_recompute(&self) -> Result<f64> {
        for pattern in &self.control_patterns {
            pattern.recalculate()?;
        }
        let value = self.sum_of_patterns()?;
        self.cache.store(value);
        Ok(value)
    }

    /// Whether all pattern values are strictly positive, or all strictly
    /// negative. Advisory only; nothing calls it automatically.
    pub fn all_patterns_same_sign(&self) -> Result<bool> {
        let values = self
            .control_patterns
            .iter()
            .map(|p| p.value())
            .collect::<Result<Vec<_>>>()?;
        Ok(values.iter().all(|&v| v > 0.0) || values.iter().all(|&v| v < 0.0))
    }

    /// Sweep `parameter` over `scan_range`, see [`ParameterScanner`]
    pub fn parscan(
        &self,
        parameter: &str,
        scan_range: &[f64],
        mode: ScanMode,
        restore_initial_value: bool,
    ) -> Result<ScanFigure> {
        ParameterScanner::new(parameter, scan_range.to_vec(), mode)
            .restore_initial_value(restore_initial_value)
            .run(self)
    }

    fn sum_of_patterns(&self) -> Result<f64> {
        let mut total = 0.0;
        for pattern in &self.control_patterns {
            total += pattern.value()?;
        }
        Ok(total)
    }

    /// Rendered numerator
    pub fn latex_numerator(&self) -> &str {
        self.latex_numerator
            .get_or_init(|| self.ctx.render(&self.numerator))
    }

    /// Numerator over the full rendered denominator
    pub fn latex_expression_full(&self) -> &str {
        self.latex_expression_full.get_or_init(|| {
            format!(
                "\\frac{{{}}}{{{}}}",
                self.latex_numerator(),
                self.denominator.latex_expression()
            )
        })
    }

    /// Rendered coefficient name
    pub fn latex_name(&self) -> &str {
        self.latex_name
            .get_or_init(|| self.ctx.render(&Expr::symbol(self.name.as_str())))
    }
}

impl Node for Coefficient {
    fn name(&self) -> &str {
        &self.name
    }

    fn expression(&self) -> &Expr {
        &self.expression
    }

    /// Sum of the control pattern values; each pattern runs its own
    /// fingerprint check
    fn value(&self) -> Result<f64> {
        self.cache
            .read(&self.ctx, &self.name, || self.sum_of_patterns())
    }

    fn cached_fingerprint(&self) -> Fingerprint {
        self.cache.fingerprint()
    }

    /// Numerator over an abbreviated `Σ`
    fn latex_expression(&self) -> &str {
        self.latex_expression
            .get_or_init(|| format!("{}/ \\,\\Sigma", self.latex_numerator()))
    }
}

impl fmt::Debug for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coefficient")
            .field("name", &self.name)
            .field("numerator", &self.numerator)
            .field("denominator", &self.denominator.name())
            .field("control_patterns", &self.control_patterns)
            .field("value", &self.cache.peek())
            .finish()
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.expression)
    }
}
