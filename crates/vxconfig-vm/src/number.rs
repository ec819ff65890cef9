//! Integer-or-double numeric value.

use serde::Serialize;
use std::fmt;

/// A numeric value that remembers whether it is an integer.
///
/// Arithmetic stays integral while both operands are integers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Double(f64),
}

impl Number {
    pub fn is_int(&self) -> bool {
        matches!(self, Number::Int(_))
    }

    /// Value widened to `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Double(d) => d,
        }
    }

    /// Integer value, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Number::Int(i) => Some(i),
            Number::Double(_) => None,
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Number::Int(i)
    }
}

impl From<f64> for Number {
    fn from(d: f64) -> Self {
        Number::Double(d)
    }
}

/// Doubles always show a decimal point or exponent so that the text reads
/// back as a double.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Double(d) => f.write_str(&format_double(d)),
        }
    }
}

/// Shortest text for `d` that reads back as a double.
pub fn format_double(d: f64) -> String {
    let text = d.to_string();
    if d.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{text}.0")
    } else {
        text
    }
}
