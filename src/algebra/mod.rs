//! Symbolic expressions for control coefficient algebra.
//!
//! A small expression tree covering what the control analysis needs:
//! - free-symbol enumeration and numeric substitution
//! - decomposition of a numerator into its additive terms
//! - explicit composition (`add`, `subtract`, `multiply`, `divide`, `power`)
//!
//! Sums and products flatten nested sums/products on construction and drop
//! neutral constants (`0` in sums, `1` in products). Nothing else is
//! simplified: terms keep the order in which they were built, which is the
//! order control patterns are numbered in.

pub mod parse;
pub mod render;

pub use parse::parse;
pub use render::{LatexRenderer, PlainRenderer, Renderer};

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use anyhow::{anyhow, Result};

/// Symbolic expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric constant
    Number(f64),
    /// Named model quantity (flux, steady-state concentration, parameter)
    Symbol(String),
    /// Flattened sum, terms in canonical (construction) order
    Sum(Vec<Expr>),
    /// Flattened product, a leading numeric factor carries the sign
    Product(Vec<Expr>),
    /// Base raised to an exponent; division is a power of -1
    Power(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Numeric constant
    pub fn number(value: f64) -> Self {
        Expr::Number(value)
    }

    /// Named symbol
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// Build a sum, flattening nested sums and dropping zero constants.
    ///
    /// An empty sum is `0`, a single term is returned unwrapped.
    pub fn sum<I: IntoIterator<Item = Expr>>(terms: I) -> Self {
        let mut flat = Vec::new();
        for term in terms {
            match term {
                Expr::Sum(inner) => flat.extend(inner),
                Expr::Number(v) if v == 0.0 => {}
                other => flat.push(other),
            }
        }
        if flat.len() > 1 {
            Expr::Sum(flat)
        } else {
            flat.pop().unwrap_or(Expr::Number(0.0))
        }
    }

    /// Build a product, flattening nested products and dropping unit constants.
    ///
    /// An empty product is `1`, a single factor is returned unwrapped.
    pub fn product<I: IntoIterator<Item = Expr>>(factors: I) -> Self {
        let mut flat = Vec::new();
        for factor in factors {
            match factor {
                Expr::Product(inner) => flat.extend(inner),
                Expr::Number(v) if v == 1.0 => {}
                other => flat.push(other),
            }
        }
        if flat.len() > 1 {
            Expr::Product(flat)
        } else {
            flat.pop().unwrap_or(Expr::Number(1.0))
        }
    }

    /// `self + other`
    pub fn add(&self, other: &Expr) -> Expr {
        Expr::sum([self.clone(), other.clone()])
    }

    /// `self - other`
    pub fn subtract(&self, other: &Expr) -> Expr {
        Expr::sum([self.clone(), other.negate()])
    }

    /// `self * other`
    pub fn multiply(&self, other: &Expr) -> Expr {
        Expr::product([self.clone(), other.clone()])
    }

    /// `self / other`, represented as `self * other^-1`
    pub fn divide(&self, other: &Expr) -> Expr {
        Expr::product([self.clone(), other.reciprocal()])
    }

    /// `self ^ exponent`
    pub fn power(&self, exponent: &Expr) -> Expr {
        Expr::Power(Box::new(self.clone()), Box::new(exponent.clone()))
    }

    /// `-self`
    ///
    /// Negating a sum distributes over its terms so that the result stays in
    /// canonical sum form; negating a product folds into its leading constant.
    pub fn negate(&self) -> Expr {
        match self {
            Expr::Number(v) => Expr::Number(-v),
            Expr::Sum(terms) => Expr::sum(terms.iter().map(Expr::negate)),
            Expr::Product(factors) => match factors.split_first() {
                Some((Expr::Number(c), rest)) => {
                    Expr::product(std::iter::once(Expr::Number(-c)).chain(rest.iter().cloned()))
                }
                _ => Expr::product(
                    std::iter::once(Expr::Number(-1.0)).chain(factors.iter().cloned()),
                ),
            },
            other => Expr::product([Expr::Number(-1.0), other.clone()]),
        }
    }

    /// `1 / self`
    pub fn reciprocal(&self) -> Expr {
        match self {
            Expr::Power(base, exponent) => match exponent.as_ref() {
                Expr::Number(e) if *e == -1.0 => base.as_ref().clone(),
                Expr::Number(e) => Expr::Power(base.clone(), Box::new(Expr::Number(-e))),
                other => Expr::Power(base.clone(), Box::new(other.negate())),
            },
            other => Expr::Power(Box::new(other.clone()), Box::new(Expr::Number(-1.0))),
        }
    }

    /// All symbol names occurring in the expression, sorted
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, symbols: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Symbol(name) => {
                symbols.insert(name.clone());
            }
            Expr::Sum(items) | Expr::Product(items) => {
                for item in items {
                    item.collect_symbols(symbols);
                }
            }
            Expr::Power(base, exponent) => {
                base.collect_symbols(symbols);
                exponent.collect_symbols(symbols);
            }
        }
    }

    /// Replace every symbol found in `values` by its numeric value
    pub fn substitute(&self, values: &HashMap<String, f64>) -> Expr {
        match self {
            Expr::Symbol(name) => match values.get(name) {
                Some(&v) => Expr::Number(v),
                None => self.clone(),
            },
            Expr::Number(_) => self.clone(),
            Expr::Sum(terms) => Expr::Sum(terms.iter().map(|t| t.substitute(values)).collect()),
            Expr::Product(factors) => {
                Expr::Product(factors.iter().map(|f| f.substitute(values)).collect())
            }
            Expr::Power(base, exponent) => Expr::Power(
                Box::new(base.substitute(values)),
                Box::new(exponent.substitute(values)),
            ),
        }
    }

    /// Fold a closed expression to a number.
    ///
    /// Division by zero follows IEEE semantics (infinity or NaN). Fails only
    /// when a symbol is still unbound.
    pub fn to_number(&self) -> Result<f64> {
        match self {
            Expr::Number(v) => Ok(*v),
            Expr::Symbol(name) => Err(anyhow!("Symbol `{}` has no value", name)),
            Expr::Sum(terms) => {
                let mut total = 0.0;
                for term in terms {
                    total += term.to_number()?;
                }
                Ok(total)
            }
            Expr::Product(factors) => {
                let mut total = 1.0;
                for factor in factors {
                    total *= factor.to_number()?;
                }
                Ok(total)
            }
            Expr::Power(base, exponent) => Ok(base.to_number()?.powf(exponent.to_number()?)),
        }
    }

    /// Substitute `values` and fold to a number
    pub fn evaluate(&self, values: &HashMap<String, f64>) -> Result<f64> {
        self.substitute(values).to_number()
    }

    /// Maximal list of additive terms in canonical order.
    ///
    /// `Expr::sum(e.additive_terms()) == e` holds for any expression built
    /// through the constructors of this type.
    pub fn additive_terms(&self) -> Vec<Expr> {
        match self {
            Expr::Sum(terms) => terms.clone(),
            other => vec![other.clone()],
        }
    }

    /// Whether this is a sum of more than one term
    pub fn is_sum(&self) -> bool {
        matches!(self, Expr::Sum(_))
    }

    /// Split a leading negative sign off a term.
    ///
    /// Returns `(true, magnitude)` for negative constants and products with a
    /// negative leading constant, `(false, self)` otherwise.
    pub(crate) fn split_sign(&self) -> (bool, Expr) {
        match self {
            Expr::Number(v) if *v < 0.0 => (true, Expr::Number(-v)),
            Expr::Product(factors) => match factors.split_first() {
                Some((Expr::Number(c), rest)) if *c < 0.0 => (
                    true,
                    Expr::product(std::iter::once(Expr::Number(-c)).chain(rest.iter().cloned())),
                ),
                _ => (false, self.clone()),
            },
            _ => (false, self.clone()),
        }
    }

    /// For a factor with a negative numeric exponent, the equivalent
    /// denominator factor (`x^-1` -> `x`, `x^-2` -> `x^2`)
    pub(crate) fn as_denominator(&self) -> Option<Expr> {
        match self {
            Expr::Power(base, exponent) => match exponent.as_ref() {
                Expr::Number(e) if *e == -1.0 => Some(base.as_ref().clone()),
                Expr::Number(e) if *e < 0.0 => {
                    Some(Expr::Power(base.clone(), Box::new(Expr::Number(-e))))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Split a product into numerator and denominator factors
    pub(crate) fn fraction_parts(factors: &[Expr]) -> (Vec<Expr>, Vec<Expr>) {
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        for factor in factors {
            match factor.as_denominator() {
                Some(d) => denominator.push(d),
                None => numerator.push(factor.clone()),
            }
        }
        (numerator, denominator)
    }

    fn is_atom(&self) -> bool {
        match self {
            Expr::Symbol(_) => true,
            Expr::Number(v) => *v >= 0.0,
            _ => false,
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Number(value)
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        Expr::Symbol(name.to_string())
    }
}

fn write_factor(f: &mut fmt::Formatter, factor: &Expr) -> fmt::Result {
    match factor {
        Expr::Sum(_) | Expr::Product(_) => write!(f, "({})", factor),
        Expr::Number(v) if *v < 0.0 => write!(f, "({})", factor),
        _ => write!(f, "{}", factor),
    }
}

fn write_factors(f: &mut fmt::Formatter, factors: &[Expr]) -> fmt::Result {
    for (i, factor) in factors.iter().enumerate() {
        if i > 0 {
            write!(f, "*")?;
        }
        write_factor(f, factor)?;
    }
    Ok(())
}

fn write_fraction(f: &mut fmt::Formatter, factors: &[Expr]) -> fmt::Result {
    let (numerator, denominator) = Expr::fraction_parts(factors);
    if numerator.is_empty() {
        write!(f, "1")?;
    } else {
        write_factors(f, &numerator)?;
    }
    match denominator.as_slice() {
        [] => Ok(()),
        [single] => {
            write!(f, "/")?;
            write_factor(f, single)
        }
        _ => {
            write!(f, "/(")?;
            write_factors(f, &denominator)?;
            write!(f, ")")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Number(v) => write!(f, "{}", v),
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    let (negative, magnitude) = term.split_sign();
                    match (i, negative) {
                        (0, true) => write!(f, "-{}", magnitude)?,
                        (0, false) => write!(f, "{}", term)?,
                        (_, true) => write!(f, " - {}", magnitude)?,
                        (_, false) => write!(f, " + {}", term)?,
                    }
                }
                Ok(())
            }
            Expr::Product(factors) => {
                let (negative, magnitude) = self.split_sign();
                if negative {
                    write!(f, "-")?;
                    return match &magnitude {
                        Expr::Product(rest) => write_fraction(f, rest),
                        other => write_factor(f, other),
                    };
                }
                write_fraction(f, factors)
            }
            Expr::Power(base, exponent) => {
                if self.as_denominator().is_some() {
                    return write_fraction(f, std::slice::from_ref(self));
                }
                if base.is_atom() {
                    write!(f, "{}", base)?;
                } else {
                    write!(f, "({})", base)?;
                }
                if exponent.is_atom() {
                    write!(f, "^{}", exponent)
                } else {
                    write!(f, "^({})", exponent)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Expr {
        Expr::symbol(name)
    }

    #[test]
    fn test_sum_flattens_and_keeps_order() {
        let inner = sym("a").add(&sym("b"));
        let outer = inner.add(&sym("c"));
        assert_eq!(outer, Expr::Sum(vec![sym("a"), sym("b"), sym("c")]));
        assert_eq!(outer.additive_terms().len(), 3);
    }

    #[test]
    fn test_subtract_produces_signed_term() {
        let e = sym("a").subtract(&sym("b"));
        let terms = e.additive_terms();
        assert_eq!(terms[0], sym("a"));
        assert_eq!(terms[1], Expr::Product(vec![Expr::Number(-1.0), sym("b")]));
        assert_eq!(e.to_string(), "a - b");
    }

    #[test]
    fn test_double_negation_cancels() {
        assert_eq!(sym("x").negate().negate(), sym("x"));
    }

    #[test]
    fn test_negating_sum_distributes() {
        let e = sym("a").subtract(&sym("b")).negate();
        assert_eq!(e.additive_terms().len(), 2);
        assert_eq!(e.to_string(), "-a + b");
    }

    #[test]
    fn test_single_term_is_not_a_sum() {
        let e = sym("a").multiply(&sym("b"));
        assert!(!e.is_sum());
        assert_eq!(e.additive_terms(), vec![e.clone()]);
    }

    #[test]
    fn test_free_symbols() {
        let e = sym("J_R1").multiply(&sym("ec_R2_S")).divide(&sym("J_R1").add(&sym("k")));
        let symbols: Vec<String> = e.free_symbols().into_iter().collect();
        assert_eq!(symbols, vec!["J_R1", "ec_R2_S", "k"]);
    }

    #[test]
    fn test_evaluate_division() {
        let e = sym("a").subtract(&sym("b")).divide(&sym("a").add(&sym("b")));
        let values = HashMap::from([("a".to_string(), 3.0), ("b".to_string(), 1.0)]);
        assert!((e.evaluate(&values).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        let e = sym("a").divide(&sym("b"));
        let values = HashMap::from([("a".to_string(), 1.0), ("b".to_string(), 0.0)]);
        assert!(e.evaluate(&values).unwrap().is_infinite());
    }

    #[test]
    fn test_unbound_symbol_fails() {
        let e = sym("a").add(&sym("b"));
        let values = HashMap::from([("a".to_string(), 1.0)]);
        assert!(e.evaluate(&values).is_err());
    }

    #[test]
    fn test_reciprocal_of_reciprocal() {
        let e = sym("x").reciprocal().reciprocal();
        assert_eq!(e, sym("x"));
    }

    #[test]
    fn test_display_fraction() {
        let e = sym("a").negate().divide(&sym("a").add(&sym("b")));
        assert_eq!(e.to_string(), "-a/(a + b)");
        let p = sym("x").power(&Expr::number(2.0));
        assert_eq!(p.to_string(), "x^2");
    }
}
