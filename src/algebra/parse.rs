//! Expression parser for analysis definitions.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := number | identifier | '(' sum ')'
//! ```

use anyhow::{anyhow, bail, Result};

use super::Expr;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Caret);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Scientific notation: only when the exponent has digits
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|e| anyhow!("Invalid number `{}` in `{}`: {}", text, input, e))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => bail!("Unexpected character `{}` in expression `{}`", other, input),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    index: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn parse(mut self) -> Result<Expr> {
        let expr = self.parse_sum()?;
        if self.index != self.tokens.len() {
            bail!("Unexpected trailing tokens in expression `{}`", self.source);
        }
        Ok(expr)
    }

    fn parse_sum(&mut self) -> Result<Expr> {
        let mut expr = self.parse_product()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.consume();
                    let rhs = self.parse_product()?;
                    expr = Expr::sum([expr, rhs]);
                }
                Some(Token::Minus) => {
                    self.consume();
                    let rhs = self.parse_product()?;
                    expr = Expr::sum([expr, rhs.negate()]);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_product(&mut self) -> Result<Expr> {
        let mut expr = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.consume();
                    let rhs = self.parse_unary()?;
                    expr = Expr::product([expr, rhs]);
                }
                Some(Token::Slash) => {
                    self.consume();
                    let rhs = self.parse_unary()?;
                    expr = Expr::product([expr, rhs.reciprocal()]);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                Ok(self.parse_unary()?.negate())
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.consume();
            let exponent = self.parse_unary()?;
            return Ok(Expr::Power(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.consume() {
            Some(Token::Number(value)) => Ok(Expr::Number(value)),
            Some(Token::Ident(name)) => Ok(Expr::Symbol(name)),
            Some(Token::LParen) => {
                let expr = self.parse_sum()?;
                if !matches!(self.consume(), Some(Token::RParen)) {
                    bail!("Missing `)` in expression `{}`", self.source);
                }
                Ok(expr)
            }
            Some(token) => bail!("Unexpected token {:?} in expression `{}`", token, self.source),
            None => bail!("Unexpected end of expression `{}`", self.source),
        }
    }
}

/// Parse an arithmetic expression over model symbols
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        bail!("Empty expression");
    }
    Parser {
        source,
        tokens,
        index: 0,
    }
    .parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn values(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_parse_precedence() {
        let e = parse("a + b * c ^ 2").unwrap();
        let v = e.evaluate(&values(&[("a", 1.0), ("b", 2.0), ("c", 3.0)])).unwrap();
        assert!((v - 19.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_terms_in_source_order() {
        let e = parse("ec_R2_S1*ec_R3_S2 - ec_R1_S1*ec_R3_S2 + ec_R1_S1*ec_R2_S2").unwrap();
        let terms = e.additive_terms();
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[0].to_string(), "ec_R2_S1*ec_R3_S2");
        assert_eq!(terms[1].to_string(), "-ec_R1_S1*ec_R3_S2");
    }

    #[test]
    fn test_parse_nested_subtraction_flattens() {
        let e = parse("a - (b - c)").unwrap();
        assert_eq!(e.additive_terms().len(), 3);
        assert_eq!(e.to_string(), "a - b + c");
    }

    #[test]
    fn test_parse_python_power_and_scientific() {
        let e = parse("2.5e-1 * x**2").unwrap();
        let v = e.evaluate(&values(&[("x", 2.0)])).unwrap();
        assert!((v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_division() {
        let e = parse("k1*X0/(1 + k1r/k2)").unwrap();
        let v = e
            .evaluate(&values(&[("k1", 2.0), ("X0", 3.0), ("k1r", 1.0), ("k2", 1.0)]))
            .unwrap();
        assert!((v - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("a +").is_err());
        assert!(parse("(a + b").is_err());
        assert!(parse("a $ b").is_err());
        assert!(parse("a b").is_err());
    }
}
