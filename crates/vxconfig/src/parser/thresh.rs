//! Threshold expressions.
//!
//! `||` binds loosest, then `&&`, then `!`. Parentheses are kept in the
//! display strings.

use vxconfig_lexer::{is_number, CompareOp, PercentileKind, SpannedToken, Token};

use crate::error::Result;
use crate::threshold::{value_text, SimpleNode, ThreshNode};

use super::Parser;

impl Parser<'_> {
    pub(super) fn thresh_or(&mut self) -> Result<ThreshNode> {
        let mut left = self.thresh_and()?;
        while self.eat(&Token::Or)? {
            let right = self.thresh_and()?;
            left = ThreshNode::or(left, right);
        }
        Ok(left)
    }

    fn thresh_and(&mut self) -> Result<ThreshNode> {
        let mut left = self.thresh_unary()?;
        while self.eat(&Token::And)? {
            let right = self.thresh_unary()?;
            left = ThreshNode::and(left, right);
        }
        Ok(left)
    }

    fn thresh_unary(&mut self) -> Result<ThreshNode> {
        match self.peek()? {
            Some(Token::Not) => {
                self.advance()?;
                Ok(ThreshNode::not(self.thresh_unary()?))
            }
            Some(Token::LParen) => {
                self.advance()?;
                let inner = self.thresh_or()?;
                self.expect(&Token::RParen)?;
                Ok(inner.paren())
            }
            _ => self.thresh_simple(),
        }
    }

    fn thresh_simple(&mut self) -> Result<ThreshNode> {
        let token = self.advance()?;
        let node = match token.token {
            Token::Na => SimpleNode::na(),
            Token::FortranThreshold(op, value) => {
                SimpleNode::compare(op, value, token.text.get(2..).unwrap_or_default())
            }
            Token::Comparison(op) => return self.comparison_operand(op),
            _ => return Err(self.syntax_at(&token, "expected a threshold")),
        };
        Ok(ThreshNode::Simple(node))
    }

    /// What follows a comparison: a number or a percentile.
    fn comparison_operand(&mut self, op: CompareOp) -> Result<ThreshNode> {
        let token = self.advance()?;
        let node = match token.token {
            Token::Integer(i) => SimpleNode::compare(op, i as f64, &number_text(&token, i as f64)),
            Token::Float(d) => SimpleNode::compare(op, d, &number_text(&token, d)),
            Token::PercThreshold(kind, pvalue) => self.percentile(op, kind, pvalue)?,
            _ => return Err(self.syntax_at(&token, "expected a number or percentile after comparison")),
        };
        Ok(ThreshNode::Simple(node))
    }

    /// `SOP50`, or the compound form `SOP50(12.3)` giving the value.
    fn percentile(&mut self, op: CompareOp, kind: PercentileKind, pvalue: f64) -> Result<SimpleNode> {
        let mut explicit = None;
        if self.eat(&Token::LParen)? {
            let negative = self.eat(&Token::Minus)?;
            let token = self.advance()?;
            let value = match token.token {
                Token::Integer(i) => i as f64,
                Token::Float(d) => d,
                _ => return Err(self.syntax_at(&token, "expected a number")),
            };
            let mut text = number_text(&token, value);
            let value = if negative {
                text.insert(0, '-');
                -value
            } else {
                value
            };
            self.expect(&Token::RParen)?;
            explicit = Some((value, text));
        }

        let explicit = explicit.as_ref().map(|(v, text)| (*v, text.as_str()));
        Ok(SimpleNode::percentile(op, kind, pvalue, explicit)?)
    }
}

/// The number as written, or its canonical form when it came from a named
/// constant.
fn number_text(token: &SpannedToken, value: f64) -> String {
    if is_number(&token.text) {
        token.text.clone()
    } else {
        value_text(value)
    }
}
