//! Arithmetic expressions, compiled to icode as they are parsed.

use vxconfig_lexer::Token;
use vxconfig_vm::{EvalError, IcodeCell, IcodeVector, Op};

use crate::dictionary::EntryValue;
use crate::error::{EngineError, Result};

use super::context::{CallTarget, PendingContext};
use super::Parser;

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Binding power of unary minus; tighter than every binary operator, so
/// `-2^2` is `(-2)^2`.
const UNARY_PREC: u8 = 40;

/// (precedence, associativity, op) of a binary operator token.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, Op)> {
    match token {
        Token::Plus => Some((10, Assoc::Left, Op::Add)),
        Token::Minus => Some((10, Assoc::Left, Op::Sub)),
        Token::Star => Some((20, Assoc::Left, Op::Mul)),
        Token::Slash => Some((20, Assoc::Left, Op::Div)),
        Token::Caret => Some((30, Assoc::Right, Op::Pow)),
        _ => None,
    }
}

/// Result of a construct opening with `((`: a point list or an expression.
pub(super) enum ParenValue {
    Points(Vec<(f64, f64)>),
    Expr(IcodeVector),
}

impl Parser<'_> {
    pub(super) fn expr(&mut self, min_prec: u8) -> Result<IcodeVector> {
        let lhs = self.prefix()?;
        self.expr_continue(lhs, min_prec)
    }

    /// Extend an already parsed operand with binary operators binding at
    /// least as tight as `min_prec`.
    pub(super) fn expr_continue(&mut self, mut lhs: IcodeVector, min_prec: u8) -> Result<IcodeVector> {
        while let Some(token) = self.peek()? {
            let Some((prec, assoc, op)) = binary_op_info(&token) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance()?;

            let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
            let rhs = self.expr(next_prec)?;
            if op == Op::Pow && rhs.is_literal_two() {
                lhs.push(IcodeCell::Operator(Op::Square));
            } else {
                lhs.append(rhs);
                lhs.push(IcodeCell::Operator(op));
            }
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<IcodeVector> {
        let Some(token) = self.peek()? else {
            return Err(self.unexpected("an expression"));
        };
        match token {
            Token::Integer(i) => {
                self.advance()?;
                Ok(IcodeVector::single(IcodeCell::Integer(i)))
            }
            Token::Float(d) => {
                self.advance()?;
                Ok(IcodeVector::single(IcodeCell::Float(d)))
            }
            Token::LocalVar(slot) => {
                self.advance()?;
                Ok(IcodeVector::single(IcodeCell::LocalVar(slot)))
            }
            Token::Minus => {
                self.advance()?;
                let mut operand = self.expr(UNARY_PREC)?;
                operand.push(IcodeCell::Operator(Op::Negate));
                Ok(operand)
            }
            Token::LParen => {
                self.advance()?;
                let inner = self.expr(0)?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Builtin(index) => {
                self.advance()?;
                self.call(CallTarget::Builtin(index))
            }
            Token::UserFunction(name) => {
                self.advance()?;
                let function = self
                    .ctx
                    .user_function(&name)
                    .ok_or(EngineError::UndefinedIdentifier(name))?;
                self.call(CallTarget::User(function))
            }
            Token::Identifier(name) => {
                self.advance()?;
                if self.check(&Token::LBracket)? {
                    return self.element(&name);
                }
                Err(match self.ctx.dicts.lookup(&name) {
                    None => EngineError::UndefinedIdentifier(name),
                    Some(entry) => EngineError::TypeMismatch {
                        expected: "number",
                        found: entry.kind_name(),
                        name,
                    },
                })
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// `name(args)`. Arguments collect in a pending call context; the call
    /// is folded to a constant unless a function body is being compiled.
    fn call(&mut self, target: CallTarget) -> Result<IcodeVector> {
        self.expect(&Token::LParen)?;
        self.ctx
            .pending
            .push(PendingContext::Call { target, args: Vec::new() });

        while !self.check(&Token::RParen)? {
            let arg = self.expr(0)?;
            match self.ctx.pending.last_mut() {
                Some(PendingContext::Call { args, .. }) => args.push(arg),
                _ => return Err(self.unexpected("`)`")),
            }
            if !self.eat(&Token::Comma)? {
                break;
            }
        }
        let close = self.expect(&Token::RParen)?;

        let Some(PendingContext::Call { target, args }) = self.ctx.pending.pop() else {
            return Err(self.syntax_at(&close, "`)` outside an argument list"));
        };
        if let Some(expected) = target.arity() {
            if expected != args.len() {
                return Err(EvalError::WrongArgCount {
                    name: target.name(),
                    expected,
                    found: args.len(),
                }
                .into());
            }
        }

        let mut code = IcodeVector::new();
        for arg in args {
            code.append(arg);
        }
        code.push(target.cell());
        self.ctx.fold(code)
    }

    /// `name[index]`: the element's current value, inlined as a literal.
    fn element(&mut self, name: &str) -> Result<IcodeVector> {
        let open = self.expect(&Token::LBracket)?;
        let index_code = self.expr(0)?;
        self.expect(&Token::RBracket)?;

        let Some(index) = self.ctx.machine.eval(&index_code, &[])?.as_int() else {
            return Err(self.syntax_at(&open, "array index must be an integer"));
        };
        let entry = self
            .ctx
            .dicts
            .lookup(name)
            .ok_or_else(|| EngineError::UndefinedIdentifier(name.to_string()))?;
        let EntryValue::Array(array) = &entry.value else {
            return Err(EngineError::TypeMismatch {
                name: name.to_string(),
                expected: "array",
                found: entry.kind_name(),
            });
        };
        let element = usize::try_from(index)
            .ok()
            .and_then(|i| array.array_element(i))
            .ok_or_else(|| EngineError::IndexOutOfRange {
                name: name.to_string(),
                index,
                len: array.len(),
            })?;
        let value = element.value.as_number().ok_or_else(|| EngineError::TypeMismatch {
            name: format!("{name}[{index}]"),
            expected: "number",
            found: element.kind_name(),
        })?;
        Ok(IcodeVector::single(IcodeCell::number(value)))
    }

    /// A construct opening with `((`: either a piecewise-linear point list
    /// `((x, y) (x, y) ...)` or an expression such as `((a + b) * c)`.
    pub(super) fn paren_pair(&mut self) -> Result<ParenValue> {
        self.expect(&Token::LParen)?;
        self.expect(&Token::LParen)?;
        let first = self.expr(0)?;

        if !self.eat(&Token::Comma)? {
            self.expect(&Token::RParen)?;
            let inner = self.expr_continue(first, 0)?;
            self.expect(&Token::RParen)?;
            return Ok(ParenValue::Expr(self.expr_continue(inner, 0)?));
        }

        let second = self.expr(0)?;
        self.expect(&Token::RParen)?;
        let point = (self.point_value(&first)?, self.point_value(&second)?);
        self.ctx.pending.push(PendingContext::Points(vec![point]));

        loop {
            self.eat(&Token::Comma)?;
            if self.check(&Token::RParen)? {
                break;
            }
            self.expect(&Token::LParen)?;
            let x = self.expr(0)?;
            self.expect(&Token::Comma)?;
            let y = self.expr(0)?;
            self.expect(&Token::RParen)?;
            let point = (self.point_value(&x)?, self.point_value(&y)?);
            match self.ctx.pending.last_mut() {
                Some(PendingContext::Points(points)) => points.push(point),
                _ => return Err(self.unexpected("`)`")),
            }
        }
        let close = self.expect(&Token::RParen)?;

        match self.ctx.pending.pop() {
            Some(PendingContext::Points(points)) => Ok(ParenValue::Points(points)),
            _ => Err(self.syntax_at(&close, "`)` outside a point list")),
        }
    }

    fn point_value(&mut self, code: &IcodeVector) -> Result<f64> {
        Ok(self.ctx.machine.eval(code, &[])?.as_f64())
    }
}
