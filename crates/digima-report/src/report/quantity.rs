use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A metric value as it appeared in the input document.
///
/// Analytics exports mix whole counts (sessions, conversions) with fractional
/// values (rates, costs). Keeping the two apart means a count read from the
/// input is written back out as an integer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Int(i64),
    Float(f64),
}

impl Quantity {
    pub fn as_f64(self) -> f64 {
        match self {
            Quantity::Int(value) => value as f64,
            Quantity::Float(value) => value,
        }
    }

    /// `self - other`, staying integral when both sides are.
    pub fn delta(self, other: Quantity) -> Quantity {
        match (self, other) {
            (Quantity::Int(a), Quantity::Int(b)) => match a.checked_sub(b) {
                Some(diff) => Quantity::Int(diff),
                None => Quantity::Float(a as f64 - b as f64),
            },
            (a, b) => Quantity::Float(a.as_f64() - b.as_f64()),
        }
    }

    pub fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::Int(0)
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Quantity::Int(value)
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Quantity::Float(value)
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Quantity::Int(a), Quantity::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Quantity::Int(a), Quantity::Int(b)) => a.partial_cmp(b),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Int(value) => write!(f, "{value}"),
            Quantity::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            Quantity::Float(value) => write!(f, "{value}"),
        }
    }
}

impl From<Quantity> for serde_json::Value {
    fn from(value: Quantity) -> Self {
        match value {
            Quantity::Int(v) => serde_json::Value::from(v),
            Quantity::Float(v) => serde_json::Value::from(v),
        }
    }
}
