//! Sample percentiles and climatological distributions.

use tracing::{debug, warn};

use crate::error::ThresholdError;

use super::node::SimpleNode;
use super::single::SingleThresh;
use super::{is_bad_data, is_eq, PercThreshType, ThreshType, PERC_TOLERANCE};

/// Data available when resolving sample percentile thresholds.
///
/// Frequency bias thresholds (`FBIAS`) also need the forecast and observation
/// thresholds they are paired with.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercSamples<'a> {
    pub fcst: Option<&'a [f64]>,
    pub obs: Option<&'a [f64]>,
    pub fcst_climo: Option<&'a [f64]>,
    pub obs_climo: Option<&'a [f64]>,
    pub fcst_thresh: Option<&'a SingleThresh>,
    pub obs_thresh: Option<&'a SingleThresh>,
}

/// Climatology at one point, for `FCDP` and `OCDP` thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClimoPoint {
    pub fcst_mean: Option<f64>,
    pub fcst_sd: Option<f64>,
    pub obs_mean: Option<f64>,
    pub obs_sd: Option<f64>,
}

impl ClimoPoint {
    pub fn mean_sd(&self, kind: PercThreshType) -> Option<(f64, f64)> {
        let (mean, sd) = match kind {
            PercThreshType::FcstClimoDist => (self.fcst_mean?, self.fcst_sd?),
            PercThreshType::ObsClimoDist => (self.obs_mean?, self.obs_sd?),
            _ => return None,
        };
        (!is_bad_data(mean) && !is_bad_data(sd)).then_some((mean, sd))
    }
}

/// Valid values of `data`, sorted ascending.
pub fn valid_sorted(data: &[f64]) -> Vec<f64> {
    let mut valid: Vec<f64> = data.iter().copied().filter(|x| !is_bad_data(*x)).collect();
    valid.sort_by(f64::total_cmp);
    valid
}

/// Value at fraction `p` of sorted data, interpolating between neighbors.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let (first, last) = (*sorted.first()?, *sorted.last()?);
    if p <= 0.0 {
        return Some(first);
    }
    if p >= 1.0 {
        return Some(last);
    }
    let idx = p * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = idx - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Fraction of valid values below `value` (or at it, when `inclusive`).
pub fn compute_percentile(data: &[f64], value: f64, inclusive: bool) -> Option<f64> {
    let valid: Vec<f64> = data.iter().copied().filter(|x| !is_bad_data(*x)).collect();
    if valid.is_empty() {
        return None;
    }
    let count = valid
        .iter()
        .filter(|x| if inclusive { **x <= value } else { **x < value })
        .count();
    Some(count as f64 / valid.len() as f64)
}

/// Inverse of the normal CDF at probability `p`.
///
/// Rational approximation by P. J. Acklam, relative error below 1.15e-9.
pub fn normal_cdf_inv(p: f64, mean: f64, sd: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let z = if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    mean + z * sd
}

fn sample_name(kind: PercThreshType) -> &'static str {
    match kind {
        PercThreshType::SampleFcst => "forecast percentile",
        PercThreshType::SampleObs => "observation percentile",
        PercThreshType::SampleFcstClimo => "forecast climatology percentile",
        PercThreshType::SampleObsClimo => "observation climatology percentile",
        PercThreshType::FreqBias => "frequency bias",
        _ => "percentile",
    }
}

/// A plain comparison against a literal value.
fn plain_compare(thresh: &SingleThresh) -> Option<(ThreshType, f64)> {
    let node = thresh.node()?.as_simple()?;
    if node.perc.is_some() {
        return None;
    }
    Some((node.op, node.value?))
}

fn is_freq_bias(thresh: &SingleThresh) -> bool {
    thresh.get_ptype() == Some(PercThreshType::FreqBias)
}

impl SimpleNode {
    /// Resolve a sample percentile threshold against `samples`. Other kinds
    /// are left untouched.
    pub(crate) fn set_perc(&mut self, samples: &PercSamples<'_>) -> Result<(), ThresholdError> {
        let Some(perc) = self.perc else {
            return Ok(());
        };
        let kind = perc.kind;
        let text = self.text.s.clone();
        let missing_sample = || ThresholdError::MissingSample {
            kind: sample_name(kind),
            text: text.clone(),
        };

        let (data, requested) = match kind {
            PercThreshType::SampleFcst => (samples.fcst.ok_or_else(missing_sample)?, perc.value),
            PercThreshType::SampleObs => (samples.obs.ok_or_else(missing_sample)?, perc.value),
            PercThreshType::SampleFcstClimo => {
                (samples.fcst_climo.ok_or_else(missing_sample)?, perc.value)
            }
            PercThreshType::SampleObsClimo => {
                (samples.obs_climo.ok_or_else(missing_sample)?, perc.value)
            }
            PercThreshType::FreqBias => self.freq_bias_target(perc.value, samples)?,
            PercThreshType::UserSpecified
            | PercThreshType::FcstClimoDist
            | PercThreshType::ObsClimoDist => return Ok(()),
        };

        let sorted = valid_sorted(data);
        if sorted.is_empty() {
            return Err(ThresholdError::EmptySample {
                kind: sample_name(kind),
                text: self.text.s.clone(),
            });
        }

        let value = percentile(&sorted, requested / 100.0).ok_or_else(|| {
            ThresholdError::EmptySample {
                kind: sample_name(kind),
                text: self.text.s.clone(),
            }
        })?;
        self.value = Some(value);
        self.text.strip_paren();
        self.text.append_value(value);

        if let Some(achieved) = compute_percentile(&sorted, value, self.op.is_inclusive()) {
            let target = requested / 100.0;
            if is_eq(achieved, target, PERC_TOLERANCE) {
                debug!(threshold = %self.text.s, target, achieved, "resolved percentile threshold");
            } else {
                warn!(
                    threshold = %self.text.s,
                    target,
                    achieved,
                    "achieved percentile differs from the requested one, ties in the data?"
                );
            }
        }
        Ok(())
    }

    /// Work out which sample a frequency bias threshold is drawn from and the
    /// percentile that reproduces the requested bias.
    fn freq_bias_target<'s>(
        &mut self,
        bias: f64,
        samples: &PercSamples<'s>,
    ) -> Result<(&'s [f64], f64), ThresholdError> {
        let (Some(fcst), Some(obs), Some(fthr), Some(othr)) = (
            samples.fcst,
            samples.obs,
            samples.fcst_thresh,
            samples.obs_thresh,
        ) else {
            return Err(ThresholdError::MissingInput {
                kind: "frequency bias",
                text: self.text.s.clone(),
            });
        };

        let unsupported = || ThresholdError::UnsupportedFreqBias(self.text.s.clone());
        let (data, op, pt, fcst_side) = if is_freq_bias(fthr) {
            let (op, value) = plain_compare(othr).ok_or_else(unsupported)?;
            let pt = compute_percentile(obs, value, op.is_inclusive()).ok_or_else(|| {
                ThresholdError::EmptySample {
                    kind: "observation percentile",
                    text: self.text.s.clone(),
                }
            })?;
            (fcst, op, pt, true)
        } else if is_freq_bias(othr) {
            let (op, value) = plain_compare(fthr).ok_or_else(unsupported)?;
            let pt = compute_percentile(fcst, value, op.is_inclusive()).ok_or_else(|| {
                ThresholdError::EmptySample {
                    kind: "forecast percentile",
                    text: self.text.s.clone(),
                }
            })?;
            (obs, op, pt, false)
        } else {
            return Err(unsupported());
        };

        if bias <= 0.0 {
            return Err(ThresholdError::BadFreqBias {
                text: self.text.s.clone(),
                value: bias,
            });
        }

        let pt = pt * 100.0;
        let scaled = match (op.is_less(), op.is_greater(), fcst_side) {
            (true, _, true) | (_, true, false) => pt * bias,
            (_, true, true) | (true, _, false) => pt / bias,
            _ => return Err(unsupported()),
        };
        let target = if scaled > 100.0 {
            warn!(
                threshold = %self.text.s,
                requested = scaled,
                "frequency bias percentile above 100, using 100"
            );
            100.0
        } else {
            scaled
        };

        self.op = op;
        Ok((data, target))
    }
}
