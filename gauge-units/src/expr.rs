//! Unit expression parsing - products and ratios like "mi/h" or "(ft*in)/h"
//!
//! Grammar:
//! - expr    := term (('*' | '/') term)*      (left associative)
//! - term    := name | '(' expr ')'
//! - name    := letters, digits, '_', '$' or '.'
//!
//! Tokens longer than `MAX_EXPR_LEN` characters or nested deeper than
//! `MAX_NESTING` are rejected.
//!
//! The result is a binary tree: leaves hold unit names, internal nodes hold
//! the operator.

use std::fmt;
use serde::Serialize;
use thiserror::Error;

/// Operator of an internal node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitOp {
    Mul,
    Div,
}

/// Algebraic unit expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UnitExpr {
    Unit(String),
    Binary(Box<UnitExpr>, UnitOp, Box<UnitExpr>),
}

/// Longest token accepted, in characters
pub const MAX_EXPR_LEN: usize = 256;

/// Deepest parenthesis nesting accepted
pub const MAX_NESTING: usize = 16;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("empty unit expression")]
    Empty,

    #[error("unbalanced parentheses in '{0}'")]
    UnbalancedParens(String),

    #[error("invalid unit name '{0}'")]
    InvalidName(String),

    #[error("unit expression of {0} characters exceeds the limit of {max}", max = MAX_EXPR_LEN)]
    TooLong(usize),

    #[error("parentheses nested deeper than {max}", max = MAX_NESTING)]
    TooDeep,
}

impl UnitExpr {
    /// True if the tree has at least one operator node
    pub fn is_combined(&self) -> bool {
        matches!(self, UnitExpr::Binary(..))
    }

    /// Leaf names, left to right
    pub fn units(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_units(&mut out);
        out
    }

    fn collect_units<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            UnitExpr::Unit(name) => out.push(name),
            UnitExpr::Binary(left, _, right) => {
                left.collect_units(out);
                right.collect_units(out);
            }
        }
    }
}

impl fmt::Display for UnitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitExpr::Unit(name) => write!(f, "{}", name),
            UnitExpr::Binary(left, op, right) => {
                let sym = match op {
                    UnitOp::Mul => '*',
                    UnitOp::Div => '/',
                };
                let wrap = |e: &UnitExpr| if e.is_combined() { format!("({})", e) } else { e.to_string() };
                write!(f, "{}{}{}", wrap(left), sym, wrap(right))
            }
        }
    }
}

/// Parse a unit expression
pub fn parse_unit_expr(input: &str) -> Result<UnitExpr, ExprError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ExprError::Empty);
    }
    let len = input.chars().count();
    if len > MAX_EXPR_LEN {
        return Err(ExprError::TooLong(len));
    }
    if !balanced(input) {
        return Err(ExprError::UnbalancedParens(input.to_string()));
    }

    let tokens = tokenize(input)?;
    let mut parser = Parser { input, tokens: &tokens, pos: 0 };
    let expr = parser.expr(0)?;
    if parser.pos != tokens.len() {
        return Err(parser.invalid());
    }
    Ok(expr)
}

fn balanced(input: &str) -> bool {
    let mut depth: i32 = 0;
    for c in input.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Name(&'a str),
    Op(UnitOp),
    Open,
    Close,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '.'
}

fn tokenize(input: &str) -> Result<Vec<Token<'_>>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '*' => tokens.push(Token::Op(UnitOp::Mul)),
            '/' => tokens.push(Token::Op(UnitOp::Div)),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            c if c.is_whitespace() => {}
            c if is_name_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(pos, next)) = chars.peek() {
                    if !is_name_char(next) {
                        break;
                    }
                    end = pos + next.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Name(&input[start..end]));
            }
            _ => return Err(ExprError::InvalidName(input.to_string())),
        }
    }

    Ok(tokens)
}

/// Operators fold left in a loop; only parentheses recurse, bounded by
/// `MAX_NESTING`.
struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token<'a>],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn invalid(&self) -> ExprError {
        ExprError::InvalidName(self.input.to_string())
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn expr(&mut self, depth: usize) -> Result<UnitExpr, ExprError> {
        let mut left = self.term(depth)?;
        while let Some(Token::Op(op)) = self.peek() {
            self.pos += 1;
            let right = self.term(depth)?;
            left = UnitExpr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn term(&mut self, depth: usize) -> Result<UnitExpr, ExprError> {
        match self.peek() {
            Some(Token::Name(name)) => {
                self.pos += 1;
                Ok(UnitExpr::Unit(name.to_string()))
            }
            Some(Token::Open) => {
                if depth >= MAX_NESTING {
                    return Err(ExprError::TooDeep);
                }
                self.pos += 1;
                if self.peek() == Some(Token::Close) {
                    return Err(ExprError::Empty);
                }
                let inner = self.expr(depth + 1)?;
                if self.peek() != Some(Token::Close) {
                    return Err(self.invalid());
                }
                self.pos += 1;
                Ok(inner)
            }
            _ => Err(self.invalid()),
        }
    }
}

/// True if the token parses to an expression with an operator node.
/// Unparseable tokens are not combined.
pub fn is_combined(token: &str) -> bool {
    parse_unit_expr(token).map_or(false, |e| e.is_combined())
}

/// Every leaf unit name in the token. An unparseable token is returned
/// whole, so the caller's validity check reports it.
pub fn extract_units(token: &str) -> Vec<String> {
    match parse_unit_expr(token) {
        Ok(expr) => expr.units().into_iter().map(String::from).collect(),
        Err(_) => vec![token.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(s: &str) -> Box<UnitExpr> {
        Box::new(UnitExpr::Unit(s.to_string()))
    }

    #[test]
    fn test_parse_leaf() {
        assert_eq!(parse_unit_expr("km").unwrap(), UnitExpr::Unit("km".to_string()));
        assert_eq!(parse_unit_expr(" (mi) ").unwrap(), UnitExpr::Unit("mi".to_string()));
        assert!(!is_combined("km"));
    }

    #[test]
    fn test_parse_ratio() {
        let e = parse_unit_expr("mi/h").unwrap();
        assert_eq!(e, UnitExpr::Binary(unit("mi"), UnitOp::Div, unit("h")));
        assert!(is_combined("mi / h"));
    }

    #[test]
    fn test_left_associative() {
        let e = parse_unit_expr("a*b/c").unwrap();
        let expected = UnitExpr::Binary(
            Box::new(UnitExpr::Binary(unit("a"), UnitOp::Mul, unit("b"))),
            UnitOp::Div,
            unit("c"),
        );
        assert_eq!(e, expected);
    }

    #[test]
    fn test_parenthesized_group() {
        let e = parse_unit_expr("(ft*in)/h").unwrap();
        let expected = UnitExpr::Binary(
            Box::new(UnitExpr::Binary(unit("ft"), UnitOp::Mul, unit("in"))),
            UnitOp::Div,
            unit("h"),
        );
        assert_eq!(e, expected);

        let e = parse_unit_expr("m/(s*s)").unwrap();
        let expected = UnitExpr::Binary(
            unit("m"),
            UnitOp::Div,
            Box::new(UnitExpr::Binary(unit("s"), UnitOp::Mul, unit("s"))),
        );
        assert_eq!(e, expected);
    }

    #[test]
    fn test_parse_reserved_looking_names() {
        // "in" and currency markers need no escaping
        let e = parse_unit_expr("$usd/in").unwrap();
        assert_eq!(e, UnitExpr::Binary(unit("$usd"), UnitOp::Div, unit("in")));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_unit_expr("   "), Err(ExprError::Empty));
        assert!(matches!(parse_unit_expr("(mi/h"), Err(ExprError::UnbalancedParens(_))));
        assert!(matches!(parse_unit_expr("mi/"), Err(ExprError::InvalidName(_))));
        assert!(matches!(parse_unit_expr("mi h"), Err(ExprError::InvalidName(_))));
        assert!(matches!(parse_unit_expr("()"), Err(ExprError::Empty)));
        assert!(matches!(parse_unit_expr("mi)(h"), Err(ExprError::UnbalancedParens(_))));
        assert!(matches!(parse_unit_expr("(mi)(h)"), Err(ExprError::InvalidName(_))));
        assert!(matches!(parse_unit_expr("mi-h"), Err(ExprError::InvalidName(_))));
        assert!(!is_combined("mi/"));
    }

    #[test]
    fn test_extract_units() {
        assert_eq!(extract_units("(ft*in)/h"), vec!["ft", "in", "h"]);
        assert_eq!(extract_units("km"), vec!["km"]);
        assert_eq!(extract_units("mi//h"), vec!["mi//h"]);
    }

    #[test]
    fn test_long_chain_is_rejected_without_overflow() {
        let long = vec!["m"; 20_000].join("*");
        assert_eq!(parse_unit_expr(&long), Err(ExprError::TooLong(39_999)));
        assert!(!is_combined(&long));
        assert_eq!(extract_units(&long), vec![long.clone()]);

        // Within the limit a flat chain folds left
        let chain = vec!["s"; 100].join("/");
        let e = parse_unit_expr(&chain).unwrap();
        assert_eq!(e.units().len(), 100);
        assert!(matches!(e, UnitExpr::Binary(ref left, UnitOp::Div, _) if left.is_combined()));
    }

    #[test]
    fn test_nesting_limit() {
        let ok = format!("{}m{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(parse_unit_expr(&ok).unwrap(), UnitExpr::Unit("m".to_string()));

        let deep = format!("{}m{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(parse_unit_expr(&deep), Err(ExprError::TooDeep));
    }

    #[test]
    fn test_display() {
        let e = parse_unit_expr("(ft * in) / h").unwrap();
        assert_eq!(e.to_string(), "(ft*in)/h");
    }
}
