//! Node capability shared by expressions, coefficients and patterns.

use std::cell::OnceCell;
use std::fmt;

use anyhow::{Context, Result};

use super::ValueCache;
use crate::algebra::Expr;
use crate::state::{AnalysisContext, Fingerprint};

/// A named symbolic expression with a cached numeric value
pub trait Node {
    /// Node name (`"Sigma"`, `"ccJ_R1"`, `"CP2"`)
    fn name(&self) -> &str;

    /// Full symbolic expression
    fn expression(&self) -> &Expr;

    /// Numeric value for the model's current steady state
    fn value(&self) -> Result<f64>;

    /// Fingerprint the cached value was computed for
    fn cached_fingerprint(&self) -> Fingerprint;

    /// Memoized display rendering of the expression
    fn latex_expression(&self) -> &str;

    /// `expression + other` as a raw expression
    fn add<'a>(&self, other: impl Into<Operand<'a>>) -> Expr
    where
        Self: Sized,
    {
        self.expression().add(&other.into().into_expr())
    }

    /// `expression * other` as a raw expression
    fn multiply<'a>(&self, other: impl Into<Operand<'a>>) -> Expr
    where
        Self: Sized,
    {
        self.expression().multiply(&other.into().into_expr())
    }

    /// `expression / other` as a raw expression
    fn divide<'a>(&self, other: impl Into<Operand<'a>>) -> Expr
    where
        Self: Sized,
    {
        self.expression().divide(&other.into().into_expr())
    }

    /// `expression ^ other` as a raw expression
    fn power<'a>(&self, other: impl Into<Operand<'a>>) -> Expr
    where
        Self: Sized,
    {
        self.expression().power(&other.into().into_expr())
    }
}

/// Right-hand side of a node composition
pub enum Operand<'a> {
    /// Another node; its expression is used
    Node(&'a dyn Node),
    /// A raw expression
    Expr(Expr),
    /// A plain number
    Number(f64),
}

impl Operand<'_> {
    fn into_expr(self) -> Expr {
        match self {
            Operand::Node(node) => node.expression().clone(),
            Operand::Expr(expr) => expr,
            Operand::Number(value) => Expr::Number(value),
        }
    }
}

impl<'a, N: Node> From<&'a N> for Operand<'a> {
    fn from(node: &'a N) -> Self {
        Operand::Node(node)
    }
}

impl From<Expr> for Operand<'_> {
    fn from(expr: Expr) -> Self {
        Operand::Expr(expr)
    }
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Number(value)
    }
}

/// Plain cached expression node, e.g. the shared denominator `Σ`
pub struct ExpressionNode {
    name: String,
    expression: Expr,
    ctx: AnalysisContext,
    cache: ValueCache,
    latex_expression: OnceCell<String>,
}

impl ExpressionNode {
    /// Bind `expression` to the context's model
    pub fn new(ctx: &AnalysisContext, name: impl Into<String>, expression: Expr) -> Result<Self> {
        let name = name.into();
        let fingerprint = ctx
            .snapshot()
            .with_context(|| format!("Creating node `{}`", name))?;
        Ok(Self {
            name,
            expression,
            ctx: ctx.clone(),
            cache: ValueCache::new(fingerprint),
            latex_expression: OnceCell::new(),
        })
    }

    /// Context the node was built with
    pub fn context(&self) -> &AnalysisContext {
        &self.ctx
    }

    /// Last cached value, without any freshness check
    pub fn cached_value(&self) -> Option<f64> {
        self.cache.peek()
    }
}

impl Node for ExpressionNode {
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

    fn latex_expression(&self) -> &str {
        self.latex_expression
            .get_or_init(|| self.ctx.render(&self.expression))
    }
}

impl fmt::Debug for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionNode")
            .field("name", &self.name)
            .field("expression", &self.expression)
            .field("value", &self.cache.peek())
            .finish()
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::parse;
    use crate::model::TableModel;

    fn ctx() -> AnalysisContext {
        AnalysisContext::new(
            TableModel::new("toy", ["R1", "R2"], Vec::<String>::new())
                .with_flux("R1", 3.0)
                .unwrap()
                .with_flux("R2", 1.0)
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_value_is_evaluated_lazily() {
        let ctx = ctx();
        let node = ExpressionNode::new(&ctx, "Sigma", parse("J_R1 + J_R2").unwrap()).unwrap();
        assert_eq!(node.cached_value(), None);
        assert!((node.value().unwrap() - 4.0).abs() < 1e-12);
        assert_eq!(node.cached_value(), Some(4.0));
    }

    #[test]
    fn test_composition_returns_raw_expressions() {
        let ctx = ctx();
        let sigma = ExpressionNode::new(&ctx, "Sigma", parse("J_R1 + J_R2").unwrap()).unwrap();
        let num = ExpressionNode::new(&ctx, "N", parse("J_R1").unwrap()).unwrap();

        let ratio = num.divide(&sigma);
        assert!((ctx.evaluate(&ratio).unwrap() - 0.75).abs() < 1e-12);

        let scaled = num.multiply(2.0);
        assert!((ctx.evaluate(&scaled).unwrap() - 6.0).abs() < 1e-12);

        let shifted = sigma.add(parse("J_R2").unwrap());
        assert!((ctx.evaluate(&shifted).unwrap() - 5.0).abs() < 1e-12);

        let squared = num.power(2.0);
        assert!((ctx.evaluate(&squared).unwrap() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_latex_is_memoized() {
        let ctx = ctx();
        let node = ExpressionNode::new(&ctx, "Sigma", parse("J_R1 + J_R2").unwrap()).unwrap();
        let first = node.latex_expression().as_ptr();
        assert_eq!(node.latex_expression(), "J_{R1} + J_{R2}");
        assert_eq!(node.latex_expression().as_ptr(), first);
    }

    #[test]
    fn test_display() {
        let ctx = ctx();
        let node = ExpressionNode::new(&ctx, "Sigma", parse("J_R1 + J_R2").unwrap()).unwrap();
        assert_eq!(node.to_string(), "Sigma = J_R1 + J_R2");
    }
}
