//! Arithmetic calculator tool.
//!
//! Expressions are tokenized, parsed into a small tree, and evaluated. Only
//! numbers, operators, parentheses, and an allow-listed set of constants and
//! functions are accepted; nothing is ever executed as code.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := number | name | name '(' args ')' | '(' expr ')'
//! ```

use serde_json::{json, Value};
use std::fmt;

use super::args;
use crate::types::ToolResult;

pub(super) const NAME: &str = "calculate";

/// Longest expression accepted, in bytes.
const MAX_EXPRESSION_LEN: usize = 1024;
/// Nesting guard for parentheses and unary chains.
const MAX_DEPTH: usize = 64;

pub(super) fn execute(arguments: &Value) -> ToolResult {
    let args = match args::object(NAME, arguments) {
        Ok(args) => args,
        Err(msg) => return ToolResult::failure(msg),
    };
    let expression = args::string(args, "expression", "");
    match evaluate(&expression) {
        Ok(result) => ToolResult::Success(json!({
            "expression": expression,
            "result": number_value(result),
            "resultType": "number",
        })),
        Err(err) => ToolResult::failure(format!("Cannot evaluate expression `{expression}`: {err}")),
    }
}

/// Render integral results without a trailing `.0`.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CalcError {
    Empty,
    TooLong,
    Syntax(String),
    UnknownName(String),
    Arity { name: String, expected: &'static str, got: usize },
    DivisionByZero,
    NonFinite,
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "expression is empty"),
            Self::TooLong => write!(f, "expression exceeds {MAX_EXPRESSION_LEN} characters"),
            Self::Syntax(msg) => write!(f, "syntax error: {msg}"),
            Self::UnknownName(name) => write!(f, "`{name}` is not an allowed constant or function"),
            Self::Arity {
                name,
                expected,
                got,
            } => write!(f, "`{name}` takes {expected} argument(s), got {got}"),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::NonFinite => write!(f, "result is not a finite number"),
        }
    }
}

impl std::error::Error for CalcError {}

/// Evaluate one arithmetic expression.
pub(crate) fn evaluate(expression: &str) -> Result<f64, CalcError> {
    if expression.len() > MAX_EXPRESSION_LEN {
        return Err(CalcError::TooLong);
    }
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let tree = parser.expr()?;
    if let Some(tok) = parser.peek() {
        return Err(CalcError::Syntax(format!("unexpected {tok}")));
    }
    let value = eval(&tree)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NonFinite)
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Name(String),
    Op(char),
    Pow,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Name(name) => write!(f, "`{name}`"),
            Self::Op(c) => write!(f, "`{c}`"),
            Self::Pow => write!(f, "`^`"),
            Self::LParen => write!(f, "`(`"),
            Self::RParen => write!(f, "`)`"),
            Self::Comma => write!(f, "`,`"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Optional exponent: 1e3, 2.5E-4
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| CalcError::Syntax(format!("malformed number `{text}`")))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                // `Math.sqrt` and friends are accepted as plain `sqrt`.
                let name = raw.strip_prefix("Math.").unwrap_or(&raw);
                if name.contains('.') {
                    return Err(CalcError::UnknownName(raw));
                }
                tokens.push(Token::Name(name.to_ascii_lowercase()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '+' | '-' | '*' | '/' | '%' => {
                tokens.push(Token::Op(c));
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
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => {
                return Err(CalcError::Syntax(format!("disallowed symbol `{other}`")));
            }
        }
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parse tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Neg(Box<Expr>),
    Binary(char, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Sqrt,
    Abs,
    Pow,
    Min,
    Max,
    Round,
    Floor,
    Ceil,
    Sin,
    Cos,
    Tan,
    Ln,
    Log10,
    Exp,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "pow" => Self::Pow,
            "min" => Self::Min,
            "max" => Self::Max,
            "round" => Self::Round,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "ln" | "log" => Self::Ln,
            "log10" => Self::Log10,
            "exp" => Self::Exp,
            _ => return None,
        })
    }

    /// Accepted argument counts as `(min, max, label)`.
    fn arity(self) -> (usize, usize, &'static str) {
        match self {
            Self::Pow => (2, 2, "2"),
            Self::Min | Self::Max => (1, usize::MAX, "1 or more"),
            _ => (1, 1, "1"),
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        match self {
            Self::Sqrt => args[0].sqrt(),
            Self::Abs => args[0].abs(),
            Self::Pow => args[0].powf(args[1]),
            Self::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Round => round_half_up(args[0]),
            Self::Floor => args[0].floor(),
            Self::Ceil => args[0].ceil(),
            Self::Sin => args[0].sin(),
            Self::Cos => args[0].cos(),
            Self::Tan => args[0].tan(),
            Self::Ln => args[0].ln(),
            Self::Log10 => args[0].log10(),
            Self::Exp => args[0].exp(),
        }
    }
}

/// Halves round toward positive infinity, so `round(-2.5)` is `-2`.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::Syntax("expression is nested too deeply".into()));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr, CalcError> {
        let mut lhs = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(*op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, CalcError> {
        let mut lhs = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(*op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, CalcError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                self.descend()?;
                let inner = self.unary()?;
                self.depth -= 1;
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.descend()?;
                let inner = self.unary()?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, CalcError> {
        let base = self.primary()?;
        if let Some(Token::Pow) = self.peek() {
            self.pos += 1;
            // Right-associative; binds tighter than a leading minus on the base.
            self.descend()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Binary('^', Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, CalcError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(*n)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.expr()?;
                self.depth -= 1;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some(Token::Name(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let function = Function::lookup(name)
                        .ok_or_else(|| CalcError::UnknownName(name.clone()))?;
                    let args = self.call_args()?;
                    let (min, max, label) = function.arity();
                    if args.len() < min || args.len() > max {
                        return Err(CalcError::Arity {
                            name: name.clone(),
                            expected: label,
                            got: args.len(),
                        });
                    }
                    return Ok(Expr::Call(function, args));
                }
                constant(name)
                    .map(Expr::Number)
                    .ok_or_else(|| CalcError::UnknownName(name.clone()))
            }
            Some(tok) => Err(CalcError::Syntax(format!("unexpected {tok}"))),
            None => Err(CalcError::Syntax("unexpected end of expression".into())),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, CalcError> {
        self.descend()?;
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.pos += 1;
            self.depth -= 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                Some(tok) => return Err(CalcError::Syntax(format!("unexpected {tok}"))),
                None => return Err(CalcError::Syntax("missing `)`".into())),
            }
        }
        self.depth -= 1;
        Ok(args)
    }

    fn expect_rparen(&mut self) -> Result<(), CalcError> {
        match self.next() {
            Some(Token::RParen) => Ok(()),
            Some(tok) => Err(CalcError::Syntax(format!("expected `)`, found {tok}"))),
            None => Err(CalcError::Syntax("missing `)`".into())),
        }
    }
}

fn eval(expr: &Expr) -> Result<f64, CalcError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Neg(inner) => Ok(-eval(inner)?),
        Expr::Binary(op, lhs, rhs) => {
            let (a, b) = (eval(lhs)?, eval(rhs)?);
            match op {
                '+' => Ok(a + b),
                '-' => Ok(a - b),
                '*' => Ok(a * b),
                '/' | '%' if b == 0.0 => Err(CalcError::DivisionByZero),
                '/' => Ok(a / b),
                '%' => Ok(a % b),
                '^' => Ok(a.powf(b)),
                other => Err(CalcError::Syntax(format!("unknown operator `{other}`"))),
            }
        }
        Expr::Call(function, args) => {
            let values = args.iter().map(eval).collect::<Result<Vec<_>, _>>()?;
            Ok(function.apply(&values))
        }
    }
}
