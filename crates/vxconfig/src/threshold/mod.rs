//! Threshold sub-language
//!
//! A threshold is a boolean expression over comparisons against a number:
//! `>=30.5`, `ge30&&le45`, `!(>0)`, `NA`. The boundary of a comparison may
//! be a percentile of a sample (`>SOP50`) resolved later with
//! [`SingleThresh::set_perc`], or of a climatological distribution
//! (`>OCDP90`) resolved on every check.
//!
//! # Design
//!
//! - [`ThreshNode`] is an owned tree. Each node carries a canonical string
//!   (`>=30&&<=45`) and an abbreviated one (`ge30.and.le45`), built
//!   bottom-up when the node is constructed and only touched again when a
//!   percentile value is resolved.
//! - [`SingleThresh`] wraps an optional tree; the empty threshold behaves
//!   like `NA`.

mod array;
mod node;
mod percentile;
mod single;

pub use array::ThreshArray;
pub use node::{Percentile, SimpleNode, ThreshNode, ThreshText};
pub use percentile::{
    compute_percentile, normal_cdf_inv, percentile, valid_sorted, ClimoPoint, PercSamples,
};
pub use single::{set_perc_pair, SingleThresh};

pub use vxconfig_lexer::{CompareOp, PercentileKind as PercThreshType};

use std::fmt;

/// Missing-value marker used by sample data.
pub const BAD_DATA: f64 = -9999.0;

/// Tolerance between requested and achieved sample percentile before a
/// warning is logged.
pub const PERC_TOLERANCE: f64 = 0.05;

const EQ_TOLERANCE: f64 = 1e-10;

/// Comparison type of a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreshType {
    /// Always true
    Na,
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
    /// A combination of simple thresholds
    Complex,
}

impl ThreshType {
    pub fn compare_op(self) -> Option<CompareOp> {
        match self {
            ThreshType::Lt => Some(CompareOp::Lt),
            ThreshType::Le => Some(CompareOp::Le),
            ThreshType::Eq => Some(CompareOp::Eq),
            ThreshType::Ne => Some(CompareOp::Ne),
            ThreshType::Gt => Some(CompareOp::Gt),
            ThreshType::Ge => Some(CompareOp::Ge),
            ThreshType::Na | ThreshType::Complex => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self.compare_op() {
            Some(op) => op.symbol(),
            None if self == ThreshType::Na => "NA",
            None => "complex",
        }
    }

    pub fn abbr(self) -> &'static str {
        match self.compare_op() {
            Some(op) => op.abbr(),
            None if self == ThreshType::Na => "NA",
            None => "complex",
        }
    }

    /// `<=`, `>=` and `==` include the boundary value.
    pub fn is_inclusive(self) -> bool {
        matches!(self, ThreshType::Le | ThreshType::Ge | ThreshType::Eq)
    }

    pub fn is_less(self) -> bool {
        matches!(self, ThreshType::Lt | ThreshType::Le)
    }

    pub fn is_greater(self) -> bool {
        matches!(self, ThreshType::Gt | ThreshType::Ge)
    }
}

impl From<CompareOp> for ThreshType {
    fn from(op: CompareOp) -> Self {
        match op {
            CompareOp::Lt => ThreshType::Lt,
            CompareOp::Le => ThreshType::Le,
            CompareOp::Eq => ThreshType::Eq,
            CompareOp::Ne => ThreshType::Ne,
            CompareOp::Gt => ThreshType::Gt,
            CompareOp::Ge => ThreshType::Ge,
        }
    }
}

impl fmt::Display for ThreshType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// True for NaN and the [`BAD_DATA`] marker.
pub fn is_bad_data(x: f64) -> bool {
    x.is_nan() || (x - BAD_DATA).abs() < 1e-4
}

pub(crate) fn is_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    is_eq(a, b, EQ_TOLERANCE)
}

/// Shortest text for a threshold value: `30`, `30.5`, `-0.25`.
pub(crate) fn value_text(x: f64) -> String {
    x.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresh_type_strings() {
        assert_eq!(ThreshType::from(CompareOp::Ge).symbol(), ">=");
        assert_eq!(ThreshType::Ge.abbr(), "ge");
        assert_eq!(ThreshType::Na.to_string(), "NA");
        assert_eq!(ThreshType::Complex.compare_op(), None);
    }

    #[test]
    fn test_inclusive() {
        assert!(ThreshType::Le.is_inclusive());
        assert!(ThreshType::Eq.is_inclusive());
        assert!(!ThreshType::Gt.is_inclusive());
        assert!(!ThreshType::Ne.is_inclusive());
    }

    #[test]
    fn test_bad_data() {
        assert!(is_bad_data(-9999.0));
        assert!(is_bad_data(f64::NAN));
        assert!(!is_bad_data(0.0));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(50.0), "50");
        assert_eq!(value_text(12.5), "12.5");
    }
}
