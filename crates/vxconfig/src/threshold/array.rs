//! Threshold lists, e.g. `cat_thresh = [ >0, >=5, >=10 ];`.

use std::ops::{Deref, DerefMut};

use serde::Serialize;

use crate::error::ThresholdError;

use super::percentile::{ClimoPoint, PercSamples};
use super::single::SingleThresh;
use super::ThreshType;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ThreshArray(Vec<SingleThresh>);

impl ThreshArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> Vec<SingleThresh> {
        self.0
    }

    /// Index of the first threshold `x` passes.
    pub fn check_all(&self, x: f64) -> Result<Option<usize>, ThresholdError> {
        self.check_all_with_climo(x, None)
    }

    pub fn check_all_with_climo(
        &self,
        x: f64,
        climo: Option<&ClimoPoint>,
    ) -> Result<Option<usize>, ThresholdError> {
        for (i, thresh) in self.0.iter().enumerate() {
            if thresh.check_with_climo(x, climo)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    pub fn get_str(&self, sep: &str) -> String {
        self.0
            .iter()
            .map(SingleThresh::get_str)
            .collect::<Vec<_>>()
            .join(sep)
    }

    pub fn get_abbr_str(&self, sep: &str) -> String {
        self.0
            .iter()
            .map(SingleThresh::get_abbr_str)
            .collect::<Vec<_>>()
            .join(sep)
    }

    pub fn need_perc(&self) -> bool {
        self.0.iter().any(SingleThresh::need_perc)
    }

    pub fn set_perc(&mut self, samples: &PercSamples<'_>) -> Result<(), ThresholdError> {
        self.0.iter_mut().try_for_each(|t| t.set_perc(samples))
    }

    pub fn multiply_by(&mut self, factor: f64) {
        for thresh in &mut self.0 {
            thresh.multiply_by(factor);
        }
    }

    /// Validate probability bins: at least three `>=` thresholds in [0, 1],
    /// starting at 0 and ending at 1.
    pub fn check_prob_thresh(&self) -> Result<(), ThresholdError> {
        let invalid = |reason: &str| ThresholdError::InvalidProbThresh {
            thresholds: self.get_str(" "),
            reason: reason.to_string(),
        };

        if self.0.len() < 3 {
            return Err(invalid("at least 3 thresholds are required"));
        }

        let mut values = Vec::with_capacity(self.0.len());
        for thresh in &self.0 {
            if thresh.get_type() != ThreshType::Ge {
                return Err(invalid("all thresholds must use >="));
            }
            match thresh.get_value() {
                Some(v) if (0.0..=1.0).contains(&v) => values.push(v),
                _ => return Err(invalid("all values must be between 0 and 1")),
            }
        }

        if values.first() != Some(&0.0) {
            return Err(invalid("the first threshold must be >=0"));
        }
        if values.last() != Some(&1.0) {
            return Err(invalid("the last threshold must be >=1"));
        }
        Ok(())
    }
}

impl Deref for ThreshArray {
    type Target = Vec<SingleThresh>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ThreshArray {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<SingleThresh> for ThreshArray {
    fn from_iter<I: IntoIterator<Item = SingleThresh>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<SingleThresh>> for ThreshArray {
    fn from(v: Vec<SingleThresh>) -> Self {
        Self(v)
    }
}
