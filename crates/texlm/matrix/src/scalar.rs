//! Scalar cells
//!
//! Integer literals stay integers until an operation forces them into
//! floating point (overflow, or any inverse). This keeps results such
//! as `add([[1,2]], [[3,4]])` exact.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One numeric cell of a matrix
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    /// The cell as a float
    pub fn to_f64(self) -> f64 {
        match self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }

    pub fn is_int(self) -> bool {
        matches!(self, Scalar::Int(_))
    }

    /// Addition; integer overflow promotes to float.
    pub fn add(self, other: Scalar) -> Scalar {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => match a.checked_add(b) {
                Some(v) => Scalar::Int(v),
                None => Scalar::Float(a as f64 + b as f64),
            },
            (a, b) => Scalar::Float(a.to_f64() + b.to_f64()),
        }
    }

    /// Multiplication; integer overflow promotes to float.
    pub fn mul(self, other: Scalar) -> Scalar {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => match a.checked_mul(b) {
                Some(v) => Scalar::Int(v),
                None => Scalar::Float(a as f64 * b as f64),
            },
            (a, b) => Scalar::Float(a.to_f64() * b.to_f64()),
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Int(0)
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (a, b) => a.to_f64() == b.to_f64(),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
        }
    }
}
