//! Expression parsing and evaluation.
//!
//! Expressions appear in `rep` counts, `if`/`elif` conditions, `group`
//! ids, and shape-command arguments. Parsing and evaluation happen in a
//! single recursive-descent pass over a small token list; there is no
//! AST.
//!
//! # Binding power, tightest first
//!
//! | Level      | Operators                                |
//! |------------|------------------------------------------|
//! | unary      | `-` `+` `!`, parentheses                 |
//! | factor     | `*` `/` `%`                              |
//! | term       | `+` `-`                                  |
//! | comparison | `==` `!=` `<` `<=` `>` `>=` (one at most)|
//! | and        | `&&`                                     |
//! | or         | `\|\|`                                   |
//!
//! Comparisons do not chain: `1 < 2 < 3` leaves a trailing `<` after the
//! single permitted comparison, which is reported as an unexpected token.
//! Comparison and logical results are 0/1 floats so they can feed
//! arithmetic contexts directly. `/` and `%` follow IEEE semantics and
//! will happily produce NaN or infinity.

use std::fmt;

use crate::error::{ErrorKind, RunResult, ScriptError};
use crate::variables::Variables;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum ExprToken {
    /// A numeric literal or identifier, resolved at evaluation time.
    Atom(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,
    LeftParen,
    RightParen,
}

impl fmt::Display for ExprToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(text) => write!(f, "{text}"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Percent => write!(f, "%"),
            Self::Bang => write!(f, "!"),
            Self::EqEq => write!(f, "=="),
            Self::NotEq => write!(f, "!="),
            Self::Less => write!(f, "<"),
            Self::LessEq => write!(f, "<="),
            Self::Greater => write!(f, ">"),
            Self::GreaterEq => write!(f, ">="),
            Self::AndAnd => write!(f, "&&"),
            Self::OrOr => write!(f, "||"),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
        }
    }
}

fn lex(src: &str) -> RunResult<Vec<ExprToken>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }
        let next = chars.get(pos + 1).copied();
        let tok = match c {
            '(' => {
                pos += 1;
                ExprToken::LeftParen
            }
            ')' => {
                pos += 1;
                ExprToken::RightParen
            }
            '+' => {
                pos += 1;
                ExprToken::Plus
            }
            '-' => {
                pos += 1;
                ExprToken::Minus
            }
            '*' => {
                pos += 1;
                ExprToken::Star
            }
            '/' => {
                pos += 1;
                ExprToken::Slash
            }
            '%' => {
                pos += 1;
                ExprToken::Percent
            }
            '!' if next == Some('=') => {
                pos += 2;
                ExprToken::NotEq
            }
            '!' => {
                pos += 1;
                ExprToken::Bang
            }
            '=' if next == Some('=') => {
                pos += 2;
                ExprToken::EqEq
            }
            '<' if next == Some('=') => {
                pos += 2;
                ExprToken::LessEq
            }
            '<' => {
                pos += 1;
                ExprToken::Less
            }
            '>' if next == Some('=') => {
                pos += 2;
                ExprToken::GreaterEq
            }
            '>' => {
                pos += 1;
                ExprToken::Greater
            }
            '&' if next == Some('&') => {
                pos += 2;
                ExprToken::AndAnd
            }
            '|' if next == Some('|') => {
                pos += 2;
                ExprToken::OrOr
            }
            _ if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                let start = pos;
                while pos < chars.len()
                    && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_' || chars[pos] == '.')
                {
                    pos += 1;
                }
                ExprToken::Atom(chars[start..pos].iter().collect())
            }
            _ => {
                return Err(ScriptError::new(
                    ErrorKind::Expression,
                    format!("Unexpected token `{c}`"),
                ));
            }
        };
        tokens.push(tok);
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser / evaluator
// ---------------------------------------------------------------------------

struct Parser<'a> {
    tokens: Vec<ExprToken>,
    pos: usize,
    vars: &'a Variables,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&ExprToken> {
        self.tokens.get(self.pos)
    }

    /// `or` level: `a || b`.
    fn or_expr(&mut self) -> RunResult<f64> {
        let mut value = self.and_expr()?;
        while matches!(self.peek(), Some(ExprToken::OrOr)) {
            self.pos += 1;
            let rhs = self.and_expr()?;
            value = from_bool(truthy(value) || truthy(rhs));
        }
        Ok(value)
    }

    /// `and` level: `a && b`.
    fn and_expr(&mut self) -> RunResult<f64> {
        let mut value = self.comparison()?;
        while matches!(self.peek(), Some(ExprToken::AndAnd)) {
            self.pos += 1;
            let rhs = self.comparison()?;
            value = from_bool(truthy(value) && truthy(rhs));
        }
        Ok(value)
    }

    /// Comparison level: at most one comparison; a second one is left
    /// unconsumed and surfaces as a trailing-token error upstream.
    fn comparison(&mut self) -> RunResult<f64> {
        let lhs = self.term()?;
        let Some(op) = self.peek().and_then(comparison_op) else {
            return Ok(lhs);
        };
        self.pos += 1;
        let rhs = self.term()?;
        Ok(from_bool(op(lhs, rhs)))
    }

    /// `term` level: `+` and `-`.
    fn term(&mut self) -> RunResult<f64> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some(ExprToken::Plus) => {
                    self.pos += 1;
                    value += self.factor()?;
                }
                Some(ExprToken::Minus) => {
                    self.pos += 1;
                    value -= self.factor()?;
                }
                _ => return Ok(value),
            }
        }
    }

    /// `factor` level: `*`, `/`, `%`.
    fn factor(&mut self) -> RunResult<f64> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(ExprToken::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(ExprToken::Slash) => {
                    self.pos += 1;
                    value /= self.unary()?;
                }
                Some(ExprToken::Percent) => {
                    self.pos += 1;
                    value %= self.unary()?;
                }
                _ => return Ok(value),
            }
        }
    }

    /// Unary prefix operators.
    fn unary(&mut self) -> RunResult<f64> {
        match self.peek() {
            Some(ExprToken::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(ExprToken::Plus) => {
                self.pos += 1;
                self.unary()
            }
            Some(ExprToken::Bang) => {
                self.pos += 1;
                let value = self.unary()?;
                Ok(from_bool(!truthy(value)))
            }
            _ => self.primary(),
        }
    }

    /// Atoms and parenthesized sub-expressions.
    fn primary(&mut self) -> RunResult<f64> {
        let Some(tok) = self.peek().cloned() else {
            return Err(ScriptError::new(
                ErrorKind::Expression,
                "Unexpected end of expression",
            ));
        };
        match tok {
            ExprToken::LeftParen => {
                self.pos += 1;
                let value = self.or_expr()?;
                match self.peek() {
                    Some(ExprToken::RightParen) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    Some(other) => Err(ScriptError::new(
                        ErrorKind::Expression,
                        format!("Unexpected token `{other}` (expected `)`)"),
                    )),
                    None => Err(ScriptError::new(ErrorKind::Expression, "Unmatched `(`")),
                }
            }
            ExprToken::Atom(text) => {
                self.pos += 1;
                self.resolve_atom(&text)
            }
            other => Err(ScriptError::new(
                ErrorKind::Expression,
                format!("Unexpected token `{other}`"),
            )),
        }
    }

    /// An atom is a variable reference or a numeric literal. Variables
    /// win; the environment only ever holds validated identifiers, so
    /// the two namespaces cannot collide.
    fn resolve_atom(&self, text: &str) -> RunResult<f64> {
        if let Some(value) = self.vars.get(text) {
            return Ok(value);
        }
        text.parse::<f64>().map_err(|_| {
            ScriptError::new(
                ErrorKind::UndefinedVariable,
                format!("Undefined variable or invalid number `{text}`"),
            )
        })
    }
}

fn comparison_op(tok: &ExprToken) -> Option<fn(f64, f64) -> bool> {
    match tok {
        ExprToken::EqEq => Some(|a, b| a == b),
        ExprToken::NotEq => Some(|a, b| a != b),
        ExprToken::Less => Some(|a, b| a < b),
        ExprToken::LessEq => Some(|a, b| a <= b),
        ExprToken::Greater => Some(|a, b| a > b),
        ExprToken::GreaterEq => Some(|a, b| a >= b),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Public interface
// ---------------------------------------------------------------------------

/// Parse and evaluate `src` against the variable environment.
pub fn evaluate(src: &str, vars: &Variables) -> RunResult<f64> {
    let tokens = lex(src)?;
    if tokens.is_empty() {
        return Err(ScriptError::new(ErrorKind::Expression, "Empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        vars,
    };
    let value = parser.or_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(ScriptError::new(
            ErrorKind::Expression,
            format!("Unexpected token `{tok}`"),
        ));
    }
    Ok(value)
}

/// Nonzero is true.
#[must_use]
pub fn truthy(value: f64) -> bool {
    value != 0.0
}

const fn from_bool(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn eval(src: &str) -> f64 {
        evaluate(src, &Variables::new()).expect("evaluation should succeed")
    }

    fn eval_err(src: &str) -> ScriptError {
        evaluate(src, &Variables::new()).expect_err("evaluation should fail")
    }

    // -- literals and arithmetic --

    #[test]
    fn numeric_literals() {
        assert_eq!(eval("42"), 42.0);
        assert_eq!(eval("3.5"), 3.5);
        assert_eq!(eval(".5"), 0.5);
    }

    #[test]
    fn precedence_multiplication_over_addition() {
        assert_eq!(eval("1+2*3"), 7.0);
        assert_eq!(eval("2*3+1"), 7.0);
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(eval("(1+2)*3"), 9.0);
    }

    #[test]
    fn division_and_modulo() {
        assert_eq!(eval("7/2"), 3.5);
        assert_eq!(eval("7%2"), 1.0);
        assert_eq!(eval("7.5%2"), 1.5);
    }

    #[test]
    fn division_by_zero_is_ieee() {
        assert_eq!(eval("1/0"), f64::INFINITY);
        assert!(eval("0/0").is_nan());
        assert!(eval("1%0").is_nan());
    }

    #[test]
    fn unary_operators() {
        assert_eq!(eval("-3"), -3.0);
        assert_eq!(eval("--3"), 3.0);
        assert_eq!(eval("+3"), 3.0);
        assert_eq!(eval("-(1+2)"), -3.0);
        assert_eq!(eval("2*-3"), -6.0);
    }

    #[test]
    fn bang_is_logical_not() {
        assert_eq!(eval("!0"), 1.0);
        assert_eq!(eval("!5"), 0.0);
        assert_eq!(eval("!!7"), 1.0);
    }

    // -- comparisons --

    #[test]
    fn comparisons_yield_zero_or_one() {
        assert_eq!(eval("1 < 2"), 1.0);
        assert_eq!(eval("2 < 1"), 0.0);
        assert_eq!(eval("2 <= 2"), 1.0);
        assert_eq!(eval("3 > 2"), 1.0);
        assert_eq!(eval("2 >= 3"), 0.0);
        assert_eq!(eval("2 == 2"), 1.0);
        assert_eq!(eval("2 != 2"), 0.0);
    }

    #[test]
    fn comparison_results_feed_arithmetic() {
        assert_eq!(eval("(1 < 2) + (3 < 4)"), 2.0);
        assert_eq!(eval("(5 > 1) * 10"), 10.0);
    }

    #[test]
    fn chained_comparison_is_rejected() {
        let err = eval_err("1 < 2 < 3");
        assert_eq!(err.kind, ErrorKind::Expression);
        assert!(err.message.contains("Unexpected token"), "message: {}", err.message);
    }

    #[test]
    fn chained_comparison_in_parens_is_rejected() {
        let err = eval_err("(1 < 2 < 3)");
        assert!(err.message.contains("Unexpected token"), "message: {}", err.message);
    }

    // -- logical operators --

    #[test]
    fn and_or_truth_table() {
        assert_eq!(eval("1 && 1"), 1.0);
        assert_eq!(eval("1 && 0"), 0.0);
        assert_eq!(eval("0 || 0"), 0.0);
        assert_eq!(eval("0 || 3"), 1.0);
    }

    #[test]
    fn logical_binds_looser_than_comparison() {
        assert_eq!(eval("1 < 2 && 3 < 4"), 1.0);
        assert_eq!(eval("1 > 2 || 3 < 4"), 1.0);
    }

    // -- variables --

    #[test]
    fn variables_resolve() {
        let mut vars = Variables::new();
        vars.set("n", 10.0);
        assert_eq!(evaluate("n*2+1", &vars).unwrap(), 21.0);
    }

    #[test]
    fn undefined_variable_fails() {
        let err = eval_err("missing + 1");
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
        assert!(err.message.contains("missing"), "message: {}", err.message);
    }

    #[test]
    fn malformed_number_fails() {
        let err = eval_err("1.2.3");
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
    }

    // -- structural errors --

    #[test]
    fn empty_expression_fails() {
        let err = eval_err("");
        assert!(err.message.contains("Empty expression"), "message: {}", err.message);
        assert!(eval_err("   ").message.contains("Empty expression"));
    }

    #[test]
    fn truncated_expression_fails() {
        let err = eval_err("1 +");
        assert!(err.message.contains("Unexpected end"), "message: {}", err.message);
    }

    #[test]
    fn unmatched_paren_fails() {
        let err = eval_err("(1 + 2");
        assert!(err.message.contains("Unmatched"), "message: {}", err.message);
    }

    #[test]
    fn trailing_token_fails() {
        let err = eval_err("1 2");
        assert!(err.message.contains("Unexpected token"), "message: {}", err.message);
    }

    #[test]
    fn stray_operator_character_fails() {
        let err = eval_err("1 = 2");
        assert!(err.message.contains("Unexpected token"), "message: {}", err.message);
    }

    // -- truthiness --

    #[test]
    fn truthiness_is_nonzero() {
        assert!(truthy(1.0));
        assert!(truthy(-0.5));
        assert!(!truthy(0.0));
        assert!(!truthy(-0.0));
    }
}
