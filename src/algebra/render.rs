//! Display renderers for expressions.
//!
//! Nodes memoize whatever a renderer returns, so renderers are pure
//! functions of the expression.

use super::Expr;

/// Expression to display string
pub trait Renderer {
    fn render(&self, expr: &Expr) -> String;
}

/// Plain-text rendering via `Display`
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, expr: &Expr) -> String {
        expr.to_string()
    }
}

/// LaTeX rendering
///
/// Symbol naming conventions map to MCA notation:
/// - `J_R1` -> `J_{R1}`
/// - `S1_ss` -> `S1_{ss}`
/// - `ec_R1_S1` -> `\varepsilon^{R1}_{S1}`
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexRenderer;

impl LatexRenderer {
    /// Render a bare name (symbol or node name)
    pub fn symbol(&self, name: &str) -> String {
        if let Some((reaction, species)) = name.strip_prefix("ec_").and_then(|r| r.split_once('_')) {
            return format!("\\varepsilon^{{{}}}_{{{}}}", reaction, species);
        }
        if let Some((head, tail)) = name.split_once('_') {
            return format!("{}_{{{}}}", head, tail.replace('_', "\\_"));
        }
        name.to_string()
    }

    fn number(&self, value: f64) -> String {
        format!("{}", value)
    }

    fn factor(&self, expr: &Expr) -> String {
        match expr {
            Expr::Sum(_) | Expr::Product(_) => format!("\\left({}\\right)", self.expr(expr)),
            Expr::Number(v) if *v < 0.0 => format!("\\left({}\\right)", self.number(*v)),
            _ => self.expr(expr),
        }
    }

    fn factors(&self, factors: &[Expr]) -> String {
        factors
            .iter()
            .map(|f| self.factor(f))
            .collect::<Vec<_>>()
            .join(" \\, ")
    }

    fn fraction(&self, factors: &[Expr]) -> String {
        let (numerator, denominator) = Expr::fraction_parts(factors);
        let top = if numerator.is_empty() {
            "1".to_string()
        } else {
            self.factors(&numerator)
        };
        if denominator.is_empty() {
            top
        } else {
            // Sums in a denominator need no brackets inside \frac
            let bottom = match denominator.as_slice() {
                [single] => self.expr(single),
                many => self.factors(many),
            };
            format!("\\frac{{{}}}{{{}}}", top, bottom)
        }
    }

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Number(v) => self.number(*v),
            Expr::Symbol(name) => self.symbol(name),
            Expr::Sum(terms) => {
                let mut out = String::new();
                for (i, term) in terms.iter().enumerate() {
                    let (negative, magnitude) = term.split_sign();
                    match (i, negative) {
                        (0, true) => out.push_str(&format!("-{}", self.expr(&magnitude))),
                        (0, false) => out.push_str(&self.expr(term)),
                        (_, true) => out.push_str(&format!(" - {}", self.expr(&magnitude))),
                        (_, false) => out.push_str(&format!(" + {}", self.expr(term))),
                    }
                }
                out
            }
            Expr::Product(factors) => {
                let (negative, magnitude) = expr.split_sign();
                if negative {
                    let rest = match &magnitude {
                        Expr::Product(rest) => self.fraction(rest),
                        other => self.factor(other),
                    };
                    return format!("-{}", rest);
                }
                self.fraction(factors)
            }
            Expr::Power(base, exponent) => {
                if expr.as_denominator().is_some() {
                    return self.fraction(std::slice::from_ref(expr));
                }
                let base = match base.as_ref() {
                    Expr::Symbol(_) => self.expr(base),
                    Expr::Number(v) if *v >= 0.0 => self.expr(base),
                    other => format!("\\left({}\\right)", self.expr(other)),
                };
                format!("{}^{{{}}}", base, self.expr(exponent))
            }
        }
    }
}

impl Renderer for LatexRenderer {
    fn render(&self, expr: &Expr) -> String {
        self.expr(expr)
    }
}
