//! Constant values produced by the partial evaluator

use std::fmt;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

/// A fully known runtime value of a builtin type
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Boolean(bool),
    Float(f64),
    /// Arbitrary precision, the language has no fixed-width integers
    Int(BigInt),
    Null,
    String(String),
}

impl Constant {
    pub fn int(value: i64) -> Self {
        Constant::Int(BigInt::from(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Constant::String(value.into())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Constant::Int(_) | Constant::Float(_))
    }

    /// Numeric value, with Ints converted to the nearest float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Constant::Float(value) => Some(*value),
            Constant::Int(value) => value.to_f64(),
            _ => None,
        }
    }

    /// `0`, `0.0` and `-0.0`
    pub fn is_zero(&self) -> bool {
        match self {
            Constant::Int(value) => value.is_zero(),
            Constant::Float(value) => *value == 0.0,
            _ => false,
        }
    }

    /// Text inserted for this constant into a template string
    pub fn to_interpolation_string(&self) -> String {
        match self {
            Constant::String(value) => value.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Boolean(value) => write!(f, "{}", value),
            Constant::Float(value) => write!(f, "{}", value),
            Constant::Int(value) => write!(f, "{}", value),
            Constant::Null => write!(f, "null"),
            Constant::String(value) => write!(f, "\"{}\"", value),
        }
    }
}
