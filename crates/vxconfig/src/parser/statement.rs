//! Statements, assignments, dictionaries and arrays.

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::{debug, trace};
use vxconfig_lexer::Token;
use vxconfig_vm::UserFunction;

use crate::dictionary::EntryValue;
use crate::error::{EngineError, Result};
use crate::pwl::PiecewiseLinear;
use crate::threshold::SingleThresh;

use super::context::{ArrayBuilder, ArrayElement, FunctionBuilder, ParserMode, PendingContext};
use super::expr::ParenValue;
use super::Parser;

impl Parser<'_> {
    /// Statements up to end of input, or up to the `}` closing a nested
    /// dictionary.
    pub(super) fn statements(&mut self, nested: bool) -> Result<()> {
        loop {
            match self.peek()? {
                None if !nested => return Ok(()),
                Some(Token::RBrace) if nested => return Ok(()),
                Some(Token::Print) => self.print_statement()?,
                Some(Token::Identifier(_)) => match self.peek_nth(1)? {
                    Some(Token::Assign) => self.assignment()?,
                    Some(Token::LParen) => self.function_definition()?,
                    _ => {
                        self.advance()?;
                        return Err(self.unexpected("`=` or `(`"));
                    }
                },
                _ if nested => return Err(self.unexpected("an assignment or `}`")),
                _ => return Err(self.unexpected("an assignment or `print`")),
            }
        }
    }

    fn print_statement(&mut self) -> Result<()> {
        self.advance()?;
        self.lexer.set_lhs(false);

        let mut prefix = String::new();
        if let Some(Token::QuotedString(text)) = self.peek()? {
            self.advance()?;
            prefix = text;
            self.eat(&Token::Comma)?;
        }

        let value = if self.check(&Token::Semicolon)? && !prefix.is_empty() {
            String::new()
        } else {
            let code = self.expr(0)?;
            self.ctx.machine.eval(&code, &[])?.to_string()
        };

        debug!(source = self.source_name, "print {prefix}{value}");
        writeln!(self.ctx.output, "{}: {prefix}{value}", self.source_name)
            .map_err(EngineError::Output)?;
        self.expect(&Token::Semicolon)?;
        Ok(())
    }

    /// `name = value;` in any of its forms.
    fn assignment(&mut self) -> Result<()> {
        let name = self.advance()?.text;
        self.advance()?;
        self.lexer.set_lhs(false);

        match self.peek()? {
            Some(Token::Boolean(b)) => {
                self.advance()?;
                self.store(&name, EntryValue::Bool(b));
                self.expect(&Token::Semicolon)?;
            }
            Some(Token::QuotedString(s)) => {
                self.advance()?;
                self.store(&name, EntryValue::String(s));
                self.expect(&Token::Semicolon)?;
            }
            Some(Token::LBrace) => self.dictionary(&name)?,
            Some(Token::LBracket) => self.array(&name)?,
            Some(Token::Identifier(_)) if self.peek_nth(1)? == Some(Token::Semicolon) => {
                self.alias(&name)?;
            }
            Some(token) if token.starts_threshold() => {
                let node = self.thresh_or()?;
                self.store(&name, EntryValue::Threshold(SingleThresh::new(node)));
                self.expect(&Token::Semicolon)?;
            }
            Some(Token::LParen) => {
                let (depth, threshold) = self.scan_parens()?;
                if threshold {
                    let node = self.thresh_or()?;
                    self.store(&name, EntryValue::Threshold(SingleThresh::new(node)));
                } else if depth >= 2 {
                    let value = self.paren_pair()?;
                    self.store_paren_value(&name, value)?;
                } else {
                    self.expression_value(&name)?;
                }
                self.expect(&Token::Semicolon)?;
            }
            _ => {
                self.expression_value(&name)?;
                self.expect(&Token::Semicolon)?;
            }
        }
        Ok(())
    }

    /// Number of `(` ahead, and whether the first other token starts a
    /// threshold.
    pub(super) fn scan_parens(&mut self) -> Result<(usize, bool)> {
        let mut depth = 0;
        while self.peek_nth(depth)? == Some(Token::LParen) {
            depth += 1;
        }
        let threshold = self
            .peek_nth(depth)?
            .is_some_and(|token| token.starts_threshold());
        Ok((depth, threshold))
    }

    fn expression_value(&mut self, name: &str) -> Result<()> {
        let code = self.expr(0)?;
        let value = self.ctx.machine.eval(&code, &[])?;
        self.store(name, EntryValue::from(value));
        Ok(())
    }

    fn store_paren_value(&mut self, name: &str, value: ParenValue) -> Result<()> {
        let entry = match value {
            ParenValue::Points(points) => {
                EntryValue::PiecewiseLinear(PiecewiseLinear::from_points(name, &points)?)
            }
            ParenValue::Expr(code) => EntryValue::from(self.ctx.machine.eval(&code, &[])?),
        };
        self.store(name, entry);
        Ok(())
    }

    /// `b = a;` copies a non-numeric entry under a new name.
    fn alias(&mut self, name: &str) -> Result<()> {
        let source = self.advance()?.text;
        let mut value = self
            .ctx
            .dicts
            .lookup(&source)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| EngineError::UndefinedIdentifier(source.clone()))?;
        if let EntryValue::PiecewiseLinear(pwl) = &mut value {
            pwl.set_name(name);
        }
        trace!(%name, %source, "alias");
        self.store(name, value);
        self.expect(&Token::Semicolon)?;
        Ok(())
    }

    fn dictionary(&mut self, name: &str) -> Result<()> {
        self.expect(&Token::LBrace)?;
        self.ctx.dicts.push()?;
        self.statements(true)?;
        self.expect(&Token::RBrace)?;
        self.ctx.dicts.pop_dict(name)?;
        self.eat(&Token::Semicolon)?;
        Ok(())
    }

    fn array(&mut self, name: &str) -> Result<()> {
        self.expect(&Token::LBracket)?;
        self.ctx
            .pending
            .push(PendingContext::Array(ArrayBuilder::default()));

        while !self.check(&Token::RBracket)? {
            let at = self.current("an array element")?;
            let element = self.array_element()?;
            let pushed = match self.ctx.pending.last_mut() {
                Some(PendingContext::Array(builder)) => {
                    builder.push(element).map_err(|(element, existing)| {
                        format!(
                            "{} element in an array of {} values",
                            element.kind().name(),
                            existing.name()
                        )
                    })
                }
                _ => Err("array element outside an array literal".to_string()),
            };
            pushed.map_err(|message| self.syntax_at(&at, message))?;

            if !self.eat(&Token::Comma)? {
                break;
            }
            self.lexer.set_lhs(false);
        }
        let close = self.expect(&Token::RBracket)?;

        let Some(PendingContext::Array(builder)) = self.ctx.pending.pop() else {
            return Err(self.syntax_at(&close, "`]` outside an array literal"));
        };
        trace!(%name, len = builder.len(), "array");
        let array = builder.finish(&mut self.ctx.machine)?;
        self.store(name, EntryValue::Array(array));
        self.expect(&Token::Semicolon)?;
        Ok(())
    }

    fn array_element(&mut self) -> Result<ArrayElement> {
        match self.peek()? {
            Some(Token::LBrace) => {
                self.advance()?;
                self.ctx.dicts.push()?;
                self.statements(true)?;
                self.expect(&Token::RBrace)?;
                let dict = self.ctx.dicts.pop().unwrap_or_default();
                Ok(ArrayElement::Dict(dict))
            }
            Some(Token::Boolean(b)) => {
                self.advance()?;
                Ok(ArrayElement::Icode(vxconfig_vm::IcodeVector::single(
                    vxconfig_vm::IcodeCell::Boolean(b),
                )))
            }
            Some(Token::QuotedString(s)) => {
                self.advance()?;
                Ok(ArrayElement::Icode(vxconfig_vm::IcodeVector::single(
                    vxconfig_vm::IcodeCell::StringLiteral(s),
                )))
            }
            Some(token) if token.starts_threshold() => {
                Ok(ArrayElement::Threshold(SingleThresh::new(self.thresh_or()?)))
            }
            Some(Token::LParen) if self.scan_parens()?.1 => {
                Ok(ArrayElement::Threshold(SingleThresh::new(self.thresh_or()?)))
            }
            _ => Ok(ArrayElement::Icode(self.expr(0)?)),
        }
    }

    /// `name(a, b) = body;` defines a user function, or a piecewise-linear
    /// function when the body is a point list.
    fn function_definition(&mut self) -> Result<()> {
        let name = self.advance()?.text;
        self.expect(&Token::LParen)?;
        if vxconfig_builtins::is_builtin(&name).is_some() {
            return Err(EngineError::BuiltinRedefinition(name));
        }

        let mut params = IndexSet::new();
        while !self.check(&Token::RParen)? {
            let param = self.advance()?;
            let Token::Identifier(param_name) = &param.token else {
                return Err(self.syntax_at(&param, "expected a parameter name"));
            };
            if !params.insert(param_name.clone()) {
                return Err(self.syntax_at(&param, format!("parameter \"{param_name}\" repeated")));
            }
            if !self.eat(&Token::Comma)? {
                break;
            }
        }
        let limit = self.ctx.limits.max_function_args;
        if params.len() > limit {
            return Err(EngineError::TooManyArguments {
                name,
                count: params.len(),
                limit,
            });
        }
        self.expect(&Token::RParen)?;
        self.expect(&Token::Assign)?;

        let n_args = params.len();
        self.ctx.mode = ParserMode::DeferredInto(FunctionBuilder {
            name: name.clone(),
            params,
        });
        self.lexer.set_lhs(false);

        let body = if self.scan_parens()?.0 >= 2 {
            self.paren_pair()?
        } else {
            ParenValue::Expr(self.expr(0)?)
        };
        self.ctx.mode = ParserMode::Immediate;

        let entry = match body {
            ParenValue::Expr(body) => {
                debug!(%name, n_args, cells = body.len(), "defined function");
                EntryValue::UserFunction(Arc::new(UserFunction {
                    name: name.clone(),
                    n_args,
                    body,
                }))
            }
            ParenValue::Points(points) => {
                EntryValue::PiecewiseLinear(PiecewiseLinear::from_points(&name, &points)?)
            }
        };
        self.store(&name, entry);
        self.expect(&Token::Semicolon)?;
        Ok(())
    }
}
