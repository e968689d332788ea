// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Numeric literals and the small integer expressions allowed in bit ranges.

use crate::ConfigError;
use regforge_ir::BitRange;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A number as written in a document: either a native integer or text such as
/// `"0x40"`, `"8'hFF"` or `"W-1"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Number(u64),
    Text(String),
}

impl Literal {
    /// Resolves a plain literal. Symbols are not allowed here.
    pub fn value(&self) -> Result<u128, ConfigError> {
        match self {
            Literal::Number(n) => Ok(u128::from(*n)),
            Literal::Text(text) => parse_literal(text),
        }
    }

    /// Resolves an integer expression against the parameter table.
    pub fn eval(&self, params: &Parameters) -> Result<u128, ConfigError> {
        match self {
            Literal::Number(n) => Ok(u128::from(*n)),
            Literal::Text(text) => eval_expr(text, params),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for Literal {
    fn from(n: u64) -> Self {
        Literal::Number(n)
    }
}

/// Bit range as written in a document: `5`, `"7:0"`, `"[W-1:0]"` or `[7, 0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawBitRange {
    Bit(u64),
    Pair([Literal; 2]),
    Text(String),
}

impl RawBitRange {
    pub fn resolve(&self, params: &Parameters) -> Result<BitRange, ConfigError> {
        let (high, low) = match self {
            RawBitRange::Bit(n) => (u128::from(*n), u128::from(*n)),
            RawBitRange::Pair([high, low]) => (high.eval(params)?, low.eval(params)?),
            RawBitRange::Text(text) => {
                let inner = text.trim();
                let inner = inner
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .unwrap_or(inner);
                match inner.split_once(':') {
                    Some((high, low)) => (eval_expr(high, params)?, eval_expr(low, params)?),
                    None => {
                        let bit = eval_expr(inner, params)?;
                        (bit, bit)
                    }
                }
            }
        };
        let bit = |v: u128| u32::try_from(v).map_err(|_| self.invalid());
        BitRange::new(bit(high)?, bit(low)?).map_err(|_| self.invalid())
    }

    fn invalid(&self) -> ConfigError {
        ConfigError::InvalidBitRange(self.to_string())
    }
}

impl fmt::Display for RawBitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawBitRange::Bit(n) => write!(f, "{n}"),
            RawBitRange::Pair([high, low]) => write!(f, "[{high}, {low}]"),
            RawBitRange::Text(text) => f.write_str(text),
        }
    }
}

/// Symbol table for bit-range expressions.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    values: HashMap<String, u128>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: u128) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<u128> {
        self.values.get(name).copied()
    }
}

/// Parses `0x`/`0h`/`0b`/`0o` prefixed, decimal and Verilog sized
/// (`8'hFF`, `'d10`) literals. Underscores are ignored.
pub fn parse_literal(text: &str) -> Result<u128, ConfigError> {
    let invalid = || ConfigError::InvalidLiteral(text.to_string());
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(invalid());
    }

    if let Some((size, rest)) = cleaned.split_once('\'') {
        let mut chars = rest.chars();
        let radix = match chars.next().map(|c| c.to_ascii_lowercase()) {
            Some('h') => 16,
            Some('d') => 10,
            Some('b') => 2,
            Some('o') => 8,
            _ => return Err(invalid()),
        };
        let value = u128::from_str_radix(chars.as_str(), radix).map_err(|_| invalid())?;
        if !size.is_empty() {
            let size: u32 = size.parse().map_err(|_| invalid())?;
            if size == 0 || (size < 128 && value >> size != 0) {
                return Err(invalid());
            }
        }
        return Ok(value);
    }

    let lower = cleaned.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0h") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else {
        (lower.as_str(), 10)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid());
    }
    u128::from_str_radix(digits, radix).map_err(|_| invalid())
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(u128),
    Symbol(String),
    Op(char),
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ConfigError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if matches!(c, '+' | '-' | '*' | '/' | '(' | ')') {
            tokens.push(Token::Op(c));
            chars.next();
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '\'' {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' || c == '\'' {
                    word.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            if word.starts_with(|c: char| c.is_ascii_digit() || c == '\'') {
                tokens.push(Token::Number(parse_literal(&word)?));
            } else {
                tokens.push(Token::Symbol(word));
            }
        } else {
            return Err(ConfigError::InvalidExpression(expr.to_string()));
        }
    }
    Ok(tokens)
}

struct ExprParser<'a> {
    expr: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    params: &'a Parameters,
}

impl ExprParser<'_> {
    fn invalid(&self) -> ConfigError {
        ConfigError::InvalidExpression(self.expr.to_string())
    }

    fn peek_op(&self) -> Option<char> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn sum(&mut self) -> Result<i128, ConfigError> {
        let mut value = self.product()?;
        while let Some(op @ ('+' | '-')) = self.peek_op() {
            self.pos += 1;
            let rhs = self.product()?;
            let next = match op {
                '+' => value.checked_add(rhs),
                _ => value.checked_sub(rhs),
            };
            value = next.ok_or_else(|| self.invalid())?;
        }
        Ok(value)
    }

    fn product(&mut self) -> Result<i128, ConfigError> {
        let mut value = self.atom()?;
        while let Some(op @ ('*' | '/')) = self.peek_op() {
            self.pos += 1;
            let rhs = self.atom()?;
            let next = match op {
                '*' => value.checked_mul(rhs),
                _ => value.checked_div(rhs),
            };
            value = next.ok_or_else(|| self.invalid())?;
        }
        Ok(value)
    }

    fn atom(&mut self) -> Result<i128, ConfigError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| self.invalid())?;
        self.pos += 1;
        match token {
            Token::Number(n) => i128::try_from(n).map_err(|_| self.invalid()),
            Token::Symbol(name) => {
                let value =
                    self.params
                        .get(&name)
                        .ok_or_else(|| ConfigError::UnresolvedParameter {
                            name: name.clone(),
                            expr: self.expr.to_string(),
                        })?;
                i128::try_from(value).map_err(|_| self.invalid())
            }
            Token::Op('(') => {
                let value = self.sum()?;
                if self.peek_op() != Some(')') {
                    return Err(self.invalid());
                }
                self.pos += 1;
                Ok(value)
            }
            Token::Op('-') => Ok(-self.atom()?),
            Token::Op(_) => Err(self.invalid()),
        }
    }
}

/// Evaluates `+ - * /` and parentheses over literals and parameter names.
/// The result must be non-negative.
pub fn eval_expr(expr: &str, params: &Parameters) -> Result<u128, ConfigError> {
    let mut parser = ExprParser {
        expr,
        tokens: tokenize(expr)?,
        pos: 0,
        params,
    };
    let value = parser.sum()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.invalid());
    }
    u128::try_from(value).map_err(|_| parser.invalid())
}
