//! Field values and comparison operators.

use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single typed value inside a tuple
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Int(i32),
    Text(String),
}

impl Field {
    /// The type this value conforms to
    pub fn field_type(&self) -> Type {
        match self {
            Self::Int(_) => Type::Int,
            Self::Text(_) => Type::Text,
        }
    }

    /// Integer payload, if this is an integer field
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Text payload, if this is a text field
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::Text(s) => Some(s),
        }
    }

    /// Evaluate `self <op> other`.
    ///
    /// Values of different types never compare true, except under `<>`.
    pub fn compare(&self, op: CmpOp, other: &Field) -> bool {
        if self.field_type() != other.field_type() {
            return op == CmpOp::NotEquals;
        }
        match op {
            CmpOp::Equals => self == other,
            CmpOp::NotEquals => self != other,
            CmpOp::GreaterThan => self > other,
            CmpOp::GreaterThanOrEq => self >= other,
            CmpOp::LessThan => self < other,
            CmpOp::LessThanOrEq => self <= other,
            CmpOp::Like => match (self, other) {
                (Self::Text(a), Self::Text(b)) => a.contains(b.as_str()),
                _ => self == other,
            },
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Comparison operators usable in predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    /// Substring match on text; equality on integers
    Like,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "=",
            Self::NotEquals => "<>",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEq => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEq => "<=",
            Self::Like => "LIKE",
        };
        f.write_str(s)
    }
}
