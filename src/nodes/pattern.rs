//! Control patterns: the additive terms of a control coefficient.

use std::cell::{Cell, OnceCell};
use std::fmt;
use std::rc::Rc;

use anyhow::{bail, Context, Result};

use super::{Coefficient, ExpressionNode, Node, ValueCache};
use crate::algebra::Expr;
use crate::state::{AnalysisContext, Fingerprint};

/// One signed term of a control coefficient numerator over the shared
/// denominator.
///
/// Patterns are created by [`Coefficient::new`] and owned by it; a pattern
/// refers back to its coefficient by name only.
pub struct Pattern {
    name: String,
    numerator: Expr,
    expression: Expr,
    denominator: Rc<ExpressionNode>,
    parent: String,
    ctx: AnalysisContext,
    cache: ValueCache,
    percentage: Cell<Option<f64>>,
    latex_numerator: OnceCell<String>,
    latex_expression: OnceCell<String>,
    latex_expression_full: OnceCell<String>,
}

impl Pattern {
    pub(crate) fn new(
        ctx: &AnalysisContext,
        name: String,
        numerator: Expr,
        denominator: &Rc<ExpressionNode>,
        parent: &str,
    ) -> Result<Self> {
        let fingerprint = ctx
            .snapshot()
            .with_context(|| format!("Creating control pattern `{}` of `{}`", name, parent))?;
        let expression = numerator.divide(denominator.expression());
        Ok(Self {
            name,
            numerator,
            expression,
            denominator: Rc::clone(denominator),
            parent: parent.to_string(),
            ctx: ctx.clone(),
            cache: ValueCache::new(fingerprint),
            percentage: Cell::new(None),
            latex_numerator: OnceCell::new(),
            latex_expression: OnceCell::new(),
            latex_expression_full: OnceCell::new(),
        })
    }

    /// Numerator term
    pub fn numerator(&self) -> &Expr {
        &self.numerator
    }

    /// Shared denominator node
    pub fn denominator(&self) -> &Rc<ExpressionNode> {
        &self.denominator
    }

    /// Name of the owning coefficient
    pub fn parent_name(&self) -> &str {
        &self.parent
    }

    /// Contribution to `parent` in percent: `value / parent.value * 100`.
    ///
    /// Recomputed on every call. A zero parent value yields infinity or NaN.
    /// Fails if `parent` is not the coefficient this pattern belongs to.
    pub fn percentage(&self, parent: &Coefficient) -> Result<f64> {
        if parent.name() != self.parent || !parent.context().same_analysis(&self.ctx) {
            bail!(
                "Control pattern `{}` belongs to `{}`, not `{}`",
                self.name,
                self.parent,
                parent.name()
            );
        }
        let value = self.value()?;
        let percentage = (value / parent.value()?) * 100.0;
        self.percentage.set(Some(percentage));
        Ok(percentage)
    }

    /// Result of the most recent [`Pattern::percentage`] call
    pub fn last_percentage(&self) -> Option<f64> {
        self.percentage.get()
    }

    /// Recalculate the value unconditionally, bypassing the fingerprint check.
    ///
    /// The cached fingerprint is left as it was.
    pub fn recalculate(&self) -> Result<f64> {
        let value = self.ctx.evaluate(&self.expression)?;
        self.cache.store(value);
        Ok(value)
    }

    /// Last cached value, without any freshness check
    pub fn cached_value(&self) -> Option<f64> {
        self.cache.peek()
    }

    /// Rendered numerator term
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

    /// Display name; patterns are rendered by name
    pub fn latex_name(&self) -> &str {
        &self.name
    }
}

impl Node for Pattern {
    fn name(&self) -> &str {
        &self.name
    }

    fn expression(&self) -> &Expr {
        &self.expression
    }

    fn value(&self) -> Result<f64> {
        self.cache
            .read(&self.ctx, &self.name, || self.ctx.evaluate(&self.expression))
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

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("numerator", &self.numerator)
            .field("value", &self.cache.peek())
            .field("percentage", &self.percentage.get())
            .finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.expression)
    }
}
