//! Threshold expression tree.

use crate::error::ThresholdError;

use super::percentile::{normal_cdf_inv, ClimoPoint, PercSamples};
use super::{approx_eq, is_bad_data, value_text, CompareOp, PercThreshType, ThreshType};

/// Display strings of a node, kept in step with the node by its
/// constructors and resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreshText {
    pub(crate) s: String,
    pub(crate) abbr: String,
}

impl ThreshText {
    fn new(s: String, abbr: String) -> Self {
        Self { s, abbr }
    }

    /// Canonical form, e.g. `>=5&&<10`.
    pub fn as_str(&self) -> &str {
        &self.s
    }

    /// Fortran form, e.g. `ge5.and.lt10`.
    pub fn abbr(&self) -> &str {
        &self.abbr
    }

    /// Drop a trailing `(value)` left by an earlier resolution.
    pub(crate) fn strip_paren(&mut self) {
        for text in [&mut self.s, &mut self.abbr] {
            if text.ends_with(')') {
                if let Some(open) = text.rfind('(') {
                    text.truncate(open);
                }
            }
        }
    }

    pub(crate) fn append_value(&mut self, value: f64) {
        let suffix = format!("({})", value_text(value));
        self.s.push_str(&suffix);
        self.abbr.push_str(&suffix);
    }
}

/// Percentile part of a simple threshold: `SOP50` is `{ SampleObs, 50 }`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentile {
    pub kind: PercThreshType,
    pub value: f64,
}

/// A single comparison, or `NA`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleNode {
    pub(crate) op: ThreshType,
    /// Boundary value; `None` until a percentile threshold is resolved
    pub(crate) value: Option<f64>,
    pub(crate) perc: Option<Percentile>,
    pub(crate) text: ThreshText,
}

impl SimpleNode {
    pub fn na() -> Self {
        Self {
            op: ThreshType::Na,
            value: None,
            perc: None,
            text: ThreshText::new("NA".into(), "NA".into()),
        }
    }

    /// `op` against a literal. `number` is the number as written in the
    /// source and is used verbatim in the display strings.
    pub fn compare(op: CompareOp, value: f64, number: &str) -> Self {
        Self {
            op: op.into(),
            value: Some(value),
            perc: None,
            text: ThreshText::new(
                format!("{}{number}", op.symbol()),
                format!("{}{number}", op.abbr()),
            ),
        }
    }

    /// `op` against a percentile, e.g. `>SOP50`. With `explicit` the value is
    /// given up front (`>SOP50(12.3)`), with its source text.
    pub fn percentile(
        op: CompareOp,
        kind: PercThreshType,
        pvalue: f64,
        explicit: Option<(f64, &str)>,
    ) -> Result<Self, ThresholdError> {
        let mut label = format!("{}{}", kind.short_name(), value_text(pvalue));
        if let Some((_, text)) = explicit {
            label.push_str(&format!("({text})"));
        }
        let text = ThreshText::new(
            format!("{}{label}", op.symbol()),
            format!("{}{label}", op.abbr()),
        );

        if !(0.0..=100.0).contains(&pvalue) {
            return Err(ThresholdError::PercentileOutOfRange {
                text: text.s,
                value: pvalue,
            });
        }
        if kind == PercThreshType::FreqBias {
            let supported = match explicit {
                Some(_) => approx_eq(pvalue, 1.0),
                None => pvalue > 0.0,
            };
            if !supported {
                return Err(ThresholdError::UnsupportedFreqBias(text.s));
            }
        }

        Ok(Self {
            op: op.into(),
            value: explicit.map(|(v, _)| v),
            perc: Some(Percentile {
                kind,
                value: pvalue,
            }),
            text,
        })
    }

    pub fn op(&self) -> ThreshType {
        self.op
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn ptype(&self) -> Option<PercThreshType> {
        self.perc.map(|p| p.kind)
    }

    pub fn pvalue(&self) -> Option<f64> {
        self.perc.map(|p| p.value)
    }

    pub fn get_str(&self) -> &str {
        &self.text.s
    }

    pub fn get_abbr_str(&self) -> &str {
        &self.text.abbr
    }

    /// Percentile thresholds resolved from sample data.
    pub fn need_perc(&self) -> bool {
        matches!(
            self.ptype(),
            Some(
                PercThreshType::SampleFcst
                    | PercThreshType::SampleObs
                    | PercThreshType::SampleFcstClimo
                    | PercThreshType::SampleObsClimo
                    | PercThreshType::FreqBias
            )
        )
    }

    fn boundary(&self, climo: Option<&ClimoPoint>) -> Result<f64, ThresholdError> {
        let value = match self.perc {
            Some(p) if p.kind.is_climo_dist() => {
                let (mean, sd) = climo
                    .and_then(|c| c.mean_sd(p.kind))
                    .ok_or_else(|| ThresholdError::MissingClimo(self.text.s.clone()))?;
                Some(normal_cdf_inv(p.value / 100.0, mean, sd))
            }
            _ => self.value,
        };
        value
            .filter(|v| !is_bad_data(*v))
            .ok_or_else(|| ThresholdError::Unresolved(self.text.s.clone()))
    }

    fn check(&self, x: f64, climo: Option<&ClimoPoint>) -> Result<bool, ThresholdError> {
        if self.op == ThreshType::Na {
            return Ok(true);
        }
        let t = self.boundary(climo)?;
        let eq = approx_eq(x, t);
        let na = is_bad_data(x);

        Ok(match self.op {
            ThreshType::Le => !na && (eq || x <= t),
            ThreshType::Lt => !na && !eq && x < t,
            ThreshType::Ge => !na && (eq || x >= t),
            ThreshType::Gt => !na && !eq && x > t,
            ThreshType::Eq => eq,
            ThreshType::Ne => !eq,
            ThreshType::Na | ThreshType::Complex => true,
        })
    }

    fn obs_climo_prob(&self) -> Option<f64> {
        let p = self.perc.filter(|p| p.kind == PercThreshType::ObsClimoDist)?;
        match self.op {
            ThreshType::Lt | ThreshType::Le => Some(p.value / 100.0),
            ThreshType::Eq => Some(0.0),
            ThreshType::Ne => Some(1.0),
            ThreshType::Gt | ThreshType::Ge => Some(1.0 - p.value / 100.0),
            ThreshType::Na | ThreshType::Complex => None,
        }
    }
}

/// Threshold expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ThreshNode {
    Simple(SimpleNode),
    And {
        left: Box<ThreshNode>,
        right: Box<ThreshNode>,
        text: ThreshText,
    },
    Or {
        left: Box<ThreshNode>,
        right: Box<ThreshNode>,
        text: ThreshText,
    },
    Not {
        child: Box<ThreshNode>,
        text: ThreshText,
    },
}

impl ThreshNode {
    pub fn and(left: ThreshNode, right: ThreshNode) -> Self {
        let text = ThreshText::new(
            format!("{}&&{}", left.get_str(), right.get_str()),
            format!("{}.and.{}", left.get_abbr_str(), right.get_abbr_str()),
        );
        ThreshNode::And {
            left: Box::new(left),
            right: Box::new(right),
            text,
        }
    }

    pub fn or(left: ThreshNode, right: ThreshNode) -> Self {
        let text = ThreshText::new(
            format!("{}||{}", left.get_str(), right.get_str()),
            format!("{}.or.{}", left.get_abbr_str(), right.get_abbr_str()),
        );
        ThreshNode::Or {
            left: Box::new(left),
            right: Box::new(right),
            text,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: ThreshNode) -> Self {
        let text = ThreshText::new(
            format!("!{}", child.get_str()),
            format!(".not.{}", child.get_abbr_str()),
        );
        ThreshNode::Not {
            child: Box::new(child),
            text,
        }
    }

    /// Wrap the display strings in parentheses; the tree is unchanged.
    pub fn paren(mut self) -> Self {
        let text = self.text_mut();
        text.s = format!("({})", text.s);
        text.abbr = format!("({})", text.abbr);
        self
    }

    fn text(&self) -> &ThreshText {
        match self {
            ThreshNode::Simple(node) => &node.text,
            ThreshNode::And { text, .. } | ThreshNode::Or { text, .. } | ThreshNode::Not { text, .. } => text,
        }
    }

    fn text_mut(&mut self) -> &mut ThreshText {
        match self {
            ThreshNode::Simple(node) => &mut node.text,
            ThreshNode::And { text, .. } | ThreshNode::Or { text, .. } | ThreshNode::Not { text, .. } => text,
        }
    }

    pub fn get_str(&self) -> &str {
        &self.text().s
    }

    pub fn get_abbr_str(&self) -> &str {
        &self.text().abbr
    }

    pub fn thresh_type(&self) -> ThreshType {
        match self {
            ThreshNode::Simple(node) => node.op,
            _ => ThreshType::Complex,
        }
    }

    pub fn as_simple(&self) -> Option<&SimpleNode> {
        match self {
            ThreshNode::Simple(node) => Some(node),
            _ => None,
        }
    }

    /// Evaluate against `x`. `And` and `Or` short-circuit on their left child.
    pub fn check(&self, x: f64, climo: Option<&ClimoPoint>) -> Result<bool, ThresholdError> {
        match self {
            ThreshNode::Simple(node) => node.check(x, climo),
            ThreshNode::And { left, right, .. } => {
                Ok(left.check(x, climo)? && right.check(x, climo)?)
            }
            ThreshNode::Or { left, right, .. } => {
                Ok(left.check(x, climo)? || right.check(x, climo)?)
            }
            ThreshNode::Not { child, .. } => Ok(!child.check(x, climo)?),
        }
    }

    pub fn need_perc(&self) -> bool {
        match self {
            ThreshNode::Simple(node) => node.need_perc(),
            ThreshNode::And { left, right, .. } | ThreshNode::Or { left, right, .. } => {
                left.need_perc() || right.need_perc()
            }
            ThreshNode::Not { child, .. } => child.need_perc(),
        }
    }

    pub fn set_perc(&mut self, samples: &PercSamples<'_>) -> Result<(), ThresholdError> {
        match self {
            ThreshNode::Simple(node) => node.set_perc(samples),
            ThreshNode::And { left, right, .. } | ThreshNode::Or { left, right, .. } => {
                left.set_perc(samples)?;
                right.set_perc(samples)
            }
            ThreshNode::Not { child, .. } => child.set_perc(samples),
        }
    }

    /// Rescale every resolved boundary value.
    pub fn multiply_by(&mut self, factor: f64) {
        match self {
            ThreshNode::Simple(node) => {
                if let Some(v) = node.value.as_mut().filter(|v| !is_bad_data(**v)) {
                    *v *= factor;
                }
            }
            ThreshNode::And { left, right, .. } | ThreshNode::Or { left, right, .. } => {
                left.multiply_by(factor);
                right.multiply_by(factor);
            }
            ThreshNode::Not { child, .. } => child.multiply_by(factor),
        }
    }

    /// Probability implied by an observation climatology distribution
    /// threshold, if it defines one.
    pub fn obs_climo_prob(&self) -> Option<f64> {
        match self {
            ThreshNode::Simple(node) => node.obs_climo_prob(),
            ThreshNode::Or { left, right, .. } => {
                let (l, r) = (left.obs_climo_prob()?, right.obs_climo_prob()?);
                Some((l + r).min(1.0))
            }
            ThreshNode::Not { child, .. } => child.obs_climo_prob().map(|p| 1.0 - p),
            ThreshNode::And { left, right, .. } => {
                let (l, r) = (left.obs_climo_prob()?, right.obs_climo_prob()?);
                let (lt, rt) = (left.thresh_type(), right.thresh_type());
                if lt.is_greater() && rt.is_less() {
                    Some((r - (1.0 - l)).max(0.0))
                } else if lt.is_less() && rt.is_greater() {
                    Some((l - (1.0 - r)).max(0.0))
                } else {
                    None
                }
            }
        }
    }

    /// Leaves in left-to-right order.
    pub fn simple_nodes(&self, out: &mut Vec<SimpleNode>) {
        match self {
            ThreshNode::Simple(node) => out.push(node.clone()),
            ThreshNode::And { left, right, .. } | ThreshNode::Or { left, right, .. } => {
                left.simple_nodes(out);
                right.simple_nodes(out);
            }
            ThreshNode::Not { child, .. } => child.simple_nodes(out),
        }
    }
}
