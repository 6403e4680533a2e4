//! Atom selections written as small boolean expressions.
//!
//! ```text
//! name CA CB and not resname GLY
//! mass > 12 or (charge < 0 and z <= 10.5)
//! type == "O" and index != 0
//! ```
//!
//! String selectors (`name`, `type`, `resname`) accept one or more values,
//! or a single value after `==`/`!=`. Numeric selectors (`index`, `mass`,
//! `charge`, `x`, `y`, `z`, `resid`) take a comparison and a number; a bare
//! number means equality. `not` binds tighter than `and`, which binds tighter
//! than `or`.

mod expr;
mod parser;

pub use self::expr::{Comparison, Expr, NumericField, TextField};

use crate::core::models::frame::Frame;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("empty selection")]
    EmptyInput,
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("unclosed quote starting at position {pos}")]
    UnclosedQuote { pos: usize },
    #[error("unmatched parenthesis at position {pos}")]
    UnmatchedParen { pos: usize },
    #[error("unknown selector '{name}' at position {pos}")]
    UnknownSelector { pos: usize, name: String },
    #[error("invalid number '{value}' at position {pos}")]
    InvalidNumber { pos: usize, value: String },
    #[error("expected {what} at position {pos}")]
    Expected { pos: usize, what: String },
}

/// A compiled atom selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    source: String,
    expr: Expr,
}

impl Selection {
    pub fn new(source: &str) -> Result<Self, SelectionError> {
        Ok(Self {
            source: source.trim().to_string(),
            expr: parser::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Whether atom `index` of `frame` is selected. Indices past the end of
    /// the frame are never selected.
    pub fn is_match(&self, frame: &Frame, index: usize) -> bool {
        index < frame.size() && self.expr.is_match(frame, index)
    }

    /// Indices of every selected atom, in increasing order.
    pub fn evaluate(&self, frame: &Frame) -> Vec<usize> {
        (0..frame.size())
            .filter(|&index| self.expr.is_match(frame, index))
            .collect()
    }
}

impl FromStr for Selection {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
