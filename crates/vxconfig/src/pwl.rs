//! Piecewise-linear functions.

use std::fmt;

use serde::Serialize;

use vxconfig_vm::number::format_double;

use crate::error::{EngineError, Result};

/// Breakpoints `(x, y)` with strictly increasing `x`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PiecewiseLinear {
    name: String,
    points: Vec<(f64, f64)>,
}

impl PiecewiseLinear {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Build from a full point list, validating the ordering.
    pub fn from_points(name: impl Into<String>, points: &[(f64, f64)]) -> Result<Self> {
        let mut pwl = Self::new(name);
        for &(x, y) in points {
            pwl.add_point(x, y)?;
        }
        Ok(pwl)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn add_point(&mut self, x: f64, y: f64) -> Result<()> {
        if let Some(&(last, _)) = self.points.last() {
            if x <= last {
                return Err(EngineError::BadPiecewiseLinear {
                    name: self.name.clone(),
                    reason: format!("x values must be strictly increasing, got {x} after {last}"),
                });
            }
        }
        self.points.push((x, y));
        Ok(())
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn x(&self, i: usize) -> Option<f64> {
        self.points.get(i).map(|p| p.0)
    }

    pub fn y(&self, i: usize) -> Option<f64> {
        self.points.get(i).map(|p| p.1)
    }

    /// Interpolate at `x`. Outside the breakpoints the end values are held.
    pub fn eval(&self, x: f64) -> Option<f64> {
        let (first, last) = (self.points.first()?, self.points.last()?);
        if x <= first.0 {
            return Some(first.1);
        }
        if x >= last.0 {
            return Some(last.1);
        }
        self.points.windows(2).find_map(|w| {
            let ((x0, y0), (x1, y1)) = (w[0], w[1]);
            (x >= x0 && x <= x1).then(|| y0 + (x - x0) * (y1 - y0) / (x1 - x0))
        })
    }
}

impl fmt::Display for PiecewiseLinear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (x, y) in &self.points {
            write!(
                f,
                " ({}, {})",
                format_double(*x),
                format_double(*y)
            )?;
        }
        f.write_str(" )")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> PiecewiseLinear {
        PiecewiseLinear::from_points("ramp", &[(0.0, 0.0), (10.0, 1.0), (20.0, 1.0)]).unwrap()
    }

    #[test]
    fn test_eval_interpolates_and_clamps() {
        let pwl = ramp();
        assert_eq!(pwl.eval(5.0), Some(0.5));
        assert_eq!(pwl.eval(15.0), Some(1.0));
        assert_eq!(pwl.eval(-3.0), Some(0.0));
        assert_eq!(pwl.eval(100.0), Some(1.0));
        assert_eq!(PiecewiseLinear::new("empty").eval(1.0), None);
    }

    #[test]
    fn test_points_must_increase() {
        let mut pwl = ramp();
        assert!(matches!(
            pwl.add_point(20.0, 3.0),
            Err(EngineError::BadPiecewiseLinear { .. })
        ));
        assert_eq!(pwl.n_points(), 3);
    }

    #[test]
    fn test_display() {
        let pwl = PiecewiseLinear::from_points("p", &[(0.0, 1.5), (2.0, 3.0)]).unwrap();
        assert_eq!(pwl.to_string(), "( (0.0, 1.5) (2.0, 3.0) )");
    }
}
