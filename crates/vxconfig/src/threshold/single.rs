//! Public threshold wrapper.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::config::Config;
use crate::dictionary::EntryValue;
use crate::error::{EngineError, ThresholdError};

use super::node::{SimpleNode, ThreshNode};
use super::percentile::{ClimoPoint, PercSamples};
use super::{approx_eq, value_text, CompareOp, PercThreshType, ThreshType};

/// One threshold expression. The empty threshold acts as `NA`.
#[derive(Debug, Clone, Default)]
pub struct SingleThresh {
    node: Option<ThreshNode>,
}

impl SingleThresh {
    pub fn new(node: ThreshNode) -> Self {
        Self { node: Some(node) }
    }

    /// `op value`, e.g. `>=30`.
    pub fn new_simple(value: f64, op: CompareOp) -> Self {
        Self::new(ThreshNode::Simple(SimpleNode::compare(
            op,
            value,
            &value_text(value),
        )))
    }

    /// Percentile threshold. With `value` it is the compound form
    /// `>SOP50(12.3)`, which needs no resolution.
    pub fn new_perc(
        pvalue: f64,
        op: CompareOp,
        ptype: PercThreshType,
        value: Option<f64>,
    ) -> Result<Self, ThresholdError> {
        let text = value.map(value_text);
        let explicit = value.zip(text.as_deref());
        SimpleNode::percentile(op, ptype, pvalue, explicit).map(|n| Self::new(ThreshNode::Simple(n)))
    }

    pub fn na() -> Self {
        Self::new(ThreshNode::Simple(SimpleNode::na()))
    }

    pub fn set_na(&mut self) {
        *self = Self::na();
    }

    pub fn clear(&mut self) {
        self.node = None;
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    pub fn node(&self) -> Option<&ThreshNode> {
        self.node.as_ref()
    }

    pub fn get_type(&self) -> ThreshType {
        self.node.as_ref().map_or(ThreshType::Na, ThreshNode::thresh_type)
    }

    fn simple(&self) -> Option<&SimpleNode> {
        self.node.as_ref()?.as_simple()
    }

    pub fn get_value(&self) -> Option<f64> {
        self.simple()?.value()
    }

    pub fn get_ptype(&self) -> Option<PercThreshType> {
        self.simple()?.ptype()
    }

    pub fn get_pvalue(&self) -> Option<f64> {
        self.simple()?.pvalue()
    }

    pub fn get_str(&self) -> String {
        self.node
            .as_ref()
            .map_or_else(|| "NA".to_string(), |n| n.get_str().to_string())
    }

    pub fn get_abbr_str(&self) -> String {
        self.node
            .as_ref()
            .map_or_else(|| "NA".to_string(), |n| n.get_abbr_str().to_string())
    }

    pub fn check(&self, x: f64) -> Result<bool, ThresholdError> {
        self.check_with_climo(x, None)
    }

    /// Check `x`, resolving climatological distribution percentiles against
    /// `climo`.
    pub fn check_with_climo(
        &self,
        x: f64,
        climo: Option<&ClimoPoint>,
    ) -> Result<bool, ThresholdError> {
        match &self.node {
            Some(node) => node.check(x, climo),
            None => Ok(true),
        }
    }

    pub fn need_perc(&self) -> bool {
        self.node.as_ref().is_some_and(ThreshNode::need_perc)
    }

    pub fn set_perc(&mut self, samples: &PercSamples<'_>) -> Result<(), ThresholdError> {
        match &mut self.node {
            Some(node) => node.set_perc(samples),
            None => Ok(()),
        }
    }

    pub fn multiply_by(&mut self, factor: f64) {
        if let Some(node) = &mut self.node {
            node.multiply_by(factor);
        }
    }

    pub fn obs_climo_prob(&self) -> Option<f64> {
        self.node.as_ref()?.obs_climo_prob()
    }

    pub fn get_simple_nodes(&self) -> Vec<SimpleNode> {
        let mut out = Vec::new();
        if let Some(node) = &self.node {
            node.simple_nodes(&mut out);
        }
        out
    }
}

/// Resolve a forecast and observation threshold pair against one sample.
///
/// Each threshold sees the other as it was before resolution, so a
/// frequency bias threshold can be defined relative to its partner.
pub fn set_perc_pair(
    fcst_thresh: &mut SingleThresh,
    obs_thresh: &mut SingleThresh,
    samples: &PercSamples<'_>,
) -> Result<(), ThresholdError> {
    let (fthr, othr) = (fcst_thresh.clone(), obs_thresh.clone());
    let paired = PercSamples {
        fcst_thresh: Some(&fthr),
        obs_thresh: Some(&othr),
        ..*samples
    };
    fcst_thresh.set_perc(&paired)?;
    obs_thresh.set_perc(&paired)
}

impl PartialEq for SingleThresh {
    fn eq(&self, other: &Self) -> bool {
        let (Some(a), Some(b)) = (&self.node, &other.node) else {
            return self.node.is_none() && other.node.is_none();
        };
        let (Some(sa), Some(sb)) = (a.as_simple(), b.as_simple()) else {
            return a.get_str() == b.get_str();
        };
        if sa.op() != sb.op() {
            return false;
        }
        if sa.need_perc() {
            return sa.ptype() == sb.ptype() && sa.pvalue() == sb.pvalue();
        }
        match (sa.value(), sb.value()) {
            (Some(x), Some(y)) => approx_eq(x, y),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SingleThresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_str())
    }
}

impl FromStr for SingleThresh {
    type Err = ThresholdError;

    /// Parse threshold text such as `>=5&&<10`. `NA` and `-9999` give the NA
    /// threshold.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text == "NA" || text == "-9999" {
            return Ok(Self::na());
        }

        let unparseable = || ThresholdError::Unparseable(text.to_string());
        let mut config = Config::new();
        config
            .read_string("config", &format!("threshold = {text};"))
            .map_err(|err| match err {
                EngineError::Threshold(err) => err,
                err => {
                    debug!("{err}");
                    unparseable()
                }
            })?;
        match config.dictionary().get("threshold").map(|e| &e.value) {
            Some(EntryValue::Threshold(t)) => Ok(t.clone()),
            _ => Err(unparseable()),
        }
    }
}

impl Serialize for SingleThresh {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.get_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> SingleThresh {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_is_na() {
        let t = SingleThresh::default();
        assert_eq!(t.get_str(), "NA");
        assert_eq!(t.get_type(), ThreshType::Na);
        assert!(t.check(123.0).unwrap());
    }

    #[test]
    fn test_from_str_round_trip() {
        for s in [">=30.5", ">0&&<10", "<=5||>=10", "!(>0)", ">SOP50", "==FBIAS1"] {
            assert_eq!(parse(s).get_str(), s);
        }
        assert_eq!(parse("ge30&&le45").get_abbr_str(), "ge30.and.le45");
    }

    #[test]
    fn test_from_str_na() {
        assert_eq!(parse("NA").get_type(), ThreshType::Na);
        assert_eq!(parse("-9999").get_str(), "NA");
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!(matches!(
            ">=".parse::<SingleThresh>(),
            Err(ThresholdError::Unparseable(_))
        ));
        assert!("\"text\"".parse::<SingleThresh>().is_err());
    }

    #[test]
    fn test_accessors() {
        let t = SingleThresh::new_simple(5.0, CompareOp::Gt);
        assert_eq!(t.get_str(), ">5");
        assert_eq!(t.get_type(), ThreshType::Gt);
        assert_eq!(t.get_value(), Some(5.0));
        assert_eq!(t.get_ptype(), None);

        let c = parse(">0&&<10");
        assert_eq!(c.get_type(), ThreshType::Complex);
        assert_eq!(c.get_value(), None);
        assert_eq!(c.get_simple_nodes().len(), 2);
    }

    #[test]
    fn test_equality() {
        assert_eq!(parse(">5"), SingleThresh::new_simple(5.0, CompareOp::Gt));
        assert_eq!(parse("gt5"), parse(">5.0"));
        assert_ne!(parse(">5"), parse(">=5"));
        assert_eq!(parse(">0&&<1"), parse(">0&&<1"));
        assert_ne!(parse(">0&&<1"), parse("gt0&&lt1"));
        assert_eq!(parse(">SOP50"), parse(">SOP50"));
        assert_ne!(parse(">SOP50"), parse(">SOP60"));
        assert_ne!(SingleThresh::default(), SingleThresh::na());
    }

    #[test]
    fn test_new_perc_compound() {
        let t = SingleThresh::new_perc(50.0, CompareOp::Ge, PercThreshType::SampleObs, Some(2.5))
            .unwrap();
        assert_eq!(t.get_str(), ">=SOP50(2.5)");
        assert!(t.check(2.5).unwrap());
    }

    #[test]
    fn test_set_perc_pair_freq_bias() {
        let mut fthr = parse("==FBIAS1");
        let mut othr = parse(">5");
        let fcst: Vec<f64> = (1..=10).map(f64::from).collect();
        let obs: Vec<f64> = (1..=10).map(f64::from).collect();
        let samples = PercSamples {
            fcst: Some(&fcst),
            obs: Some(&obs),
            ..Default::default()
        };
        set_perc_pair(&mut fthr, &mut othr, &samples).unwrap();

        // 4 of 10 observations are below 5, so the forecast threshold is the
        // 40th percentile of the forecasts, compared the same way
        assert_eq!(fthr.get_type(), ThreshType::Gt);
        let value = fthr.get_value().unwrap();
        assert!((value - 4.6).abs() < 1e-9);
        assert_eq!(fthr.get_str(), "==FBIAS1(4.6)");
        assert_eq!(othr.get_str(), ">5");
    }

    #[test]
    fn test_freq_bias_needs_pair() {
        let mut t = parse("==FBIAS1");
        assert!(matches!(
            t.set_perc(&PercSamples::default()),
            Err(ThresholdError::MissingInput { .. })
        ));
    }

    #[test]
    fn test_serialize_as_string() {
        let json = serde_json::to_string(&parse(">=1&&<5")).unwrap();
        assert_eq!(json, "\">=1&&<5\"");
    }
}
