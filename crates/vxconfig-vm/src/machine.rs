//! Icode executor
//!
//! Stack-based machine that evaluates compiled icode. Each top-level
//! [`Machine::run`] leaves exactly one value on the result stack.

use tracing::trace;
use vxconfig_builtins::{by_index, BuiltinImpl};

use crate::error::{EvalError, Result};
use crate::icode::{IcodeCell, IcodeVector, Op, UserFunction};
use crate::number::Number;

/// Default bound on nested user function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// The icode machine.
#[derive(Debug)]
pub struct Machine {
    results: Vec<Number>,
    max_call_depth: usize,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Execute `program` with `locals` bound to its argument slots and push
    /// the single value it produces onto the result stack.
    pub fn run(&mut self, program: &IcodeVector, locals: &[Number]) -> Result<()> {
        let value = self.execute(program, locals, 0)?;
        trace!(program = %program, %value, "icode evaluated");
        self.results.push(value);
        Ok(())
    }

    /// Take the most recent result.
    pub fn pop_result(&mut self) -> Result<Number> {
        self.results.pop().ok_or(EvalError::NoResult)
    }

    /// Number of results not yet taken.
    pub fn pending_results(&self) -> usize {
        self.results.len()
    }

    /// [`run`](Self::run) followed by [`pop_result`](Self::pop_result).
    pub fn eval(&mut self, program: &IcodeVector, locals: &[Number]) -> Result<Number> {
        self.run(program, locals)?;
        self.pop_result()
    }

    /// Call a user function with already evaluated arguments.
    pub fn call(&mut self, function: &UserFunction, args: &[Number]) -> Result<Number> {
        check_arity(&function.name, function.n_args, args.len())?;
        self.eval(&function.body, args)
    }

    fn execute(&self, program: &IcodeVector, locals: &[Number], depth: usize) -> Result<Number> {
        if depth > self.max_call_depth {
            return Err(EvalError::CallDepth(self.max_call_depth));
        }

        let mut stack: Vec<Number> = Vec::with_capacity(16);

        for cell in program.cells() {
            match cell {
                IcodeCell::Integer(i) => stack.push(Number::Int(*i)),

                IcodeCell::Float(d) => stack.push(Number::Double(*d)),

                IcodeCell::LocalVar(slot) => {
                    let value = locals.get(*slot).ok_or(EvalError::LocalOutOfRange {
                        slot: *slot,
                        available: locals.len(),
                    })?;
                    stack.push(*value);
                }

                IcodeCell::Operator(Op::Negate) => {
                    let top = stack.last_mut().ok_or(EvalError::StackUnderflow)?;
                    *top = negate(*top);
                }

                IcodeCell::Operator(Op::Square) => {
                    let v = pop(&mut stack)?;
                    stack.push(square(v));
                }

                IcodeCell::Operator(op) => {
                    let r = pop(&mut stack)?;
                    let l = pop(&mut stack)?;
                    stack.push(binary(*op, l, r)?);
                }

                IcodeCell::BuiltinCall(index) => {
                    let builtin = by_index(*index).ok_or(EvalError::UnknownBuiltin(*index))?;
                    let args = pop_n(&mut stack, builtin.arity())?;
                    stack.push(call_builtin(builtin.name, &builtin.implementation, &args)?);
                }

                IcodeCell::UserFunctionCall(function) => {
                    let args = pop_n(&mut stack, function.n_args)?;
                    stack.push(self.execute(&function.body, &args, depth + 1)?);
                }

                IcodeCell::Boolean(_) | IcodeCell::StringLiteral(_) => {
                    return Err(EvalError::NotNumeric(cell.to_string()));
                }
            }
        }

        match stack.len() {
            1 => pop(&mut stack),
            0 => Err(EvalError::StackUnderflow),
            n => Err(EvalError::UnbalancedStack(n)),
        }
    }
}

fn check_arity(name: &str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(EvalError::WrongArgCount {
            name: name.to_string(),
            expected,
            found,
        })
    }
}

fn pop(stack: &mut Vec<Number>) -> Result<Number> {
    stack.pop().ok_or(EvalError::StackUnderflow)
}

/// Pop the top `n` values, returned in push order.
fn pop_n(stack: &mut Vec<Number>, n: usize) -> Result<Vec<Number>> {
    if stack.len() < n {
        return Err(EvalError::StackUnderflow);
    }
    Ok(stack.split_off(stack.len() - n))
}

// === Arithmetic ===

fn negate(v: Number) -> Number {
    match v {
        Number::Int(i) => i
            .checked_neg()
            .map(Number::Int)
            .unwrap_or(Number::Double(-(i as f64))),
        Number::Double(d) => Number::Double(-d),
    }
}

fn square(v: Number) -> Number {
    match v {
        Number::Int(i) => i
            .checked_mul(i)
            .map(Number::Int)
            .unwrap_or(Number::Double((i as f64) * (i as f64))),
        Number::Double(d) => Number::Double(d * d),
    }
}

/// Integer operation with promotion to double on overflow.
fn int_or_promote(
    l: i64,
    r: i64,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Number {
    int_op(l, r)
        .map(Number::Int)
        .unwrap_or_else(|| Number::Double(float_op(l as f64, r as f64)))
}

fn binary(op: Op, l: Number, r: Number) -> Result<Number> {
    if let (Number::Int(a), Number::Int(b)) = (l, r) {
        return match op {
            Op::Add => Ok(int_or_promote(a, b, i64::checked_add, |x, y| x + y)),
            Op::Sub => Ok(int_or_promote(a, b, i64::checked_sub, |x, y| x - y)),
            Op::Mul => Ok(int_or_promote(a, b, i64::checked_mul, |x, y| x * y)),
            Op::Div if b == 0 => Err(EvalError::DivisionByZero),
            Op::Div => Ok(int_or_promote(a, b, i64::checked_div, |x, y| x / y)),
            Op::Pow => Ok(Number::Double((a as f64).powf(b as f64))),
            Op::Square | Op::Negate => Err(EvalError::UnexpectedCell(op.symbol().into())),
        };
    }

    let (a, b) = (l.as_f64(), r.as_f64());
    let value = match op {
        Op::Add => a + b,
        Op::Sub => a - b,
        Op::Mul => a * b,
        Op::Div if b == 0.0 => return Err(EvalError::DivisionByZero),
        Op::Div => a / b,
        Op::Pow => a.powf(b),
        Op::Square | Op::Negate => return Err(EvalError::UnexpectedCell(op.symbol().into())),
    };
    Ok(Number::Double(value))
}

// === Builtins ===

fn domain_error(name: &str, args: &[Number]) -> EvalError {
    let args = args
        .iter()
        .map(Number::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    EvalError::BuiltinDomain {
        name: name.to_string(),
        args,
    }
}

fn unsupported(name: &str, all_int: bool) -> EvalError {
    EvalError::UnsupportedBuiltin {
        name: name.to_string(),
        kind: if all_int { "integer" } else { "floating point" },
    }
}

fn call_builtin(name: &str, implementation: &BuiltinImpl, args: &[Number]) -> Result<Number> {
    let all_int = args.iter().all(Number::is_int);

    match (*implementation, args) {
        (BuiltinImpl::Unary { int, float }, [x]) => match (int, x) {
            (Some(f), Number::Int(i)) => f(*i)
                .map(Number::Int)
                .ok_or_else(|| domain_error(name, args)),
            _ => float
                .map(|f| Number::Double(f(x.as_f64())))
                .ok_or_else(|| unsupported(name, all_int)),
        },

        (BuiltinImpl::Binary { int, float }, [x, y]) => match (int, x, y) {
            (Some(f), Number::Int(a), Number::Int(b)) => f(*a, *b)
                .map(Number::Int)
                .ok_or_else(|| domain_error(name, args)),
            _ => float
                .map(|f| Number::Double(f(x.as_f64(), y.as_f64())))
                .ok_or_else(|| unsupported(name, all_int)),
        },

        (BuiltinImpl::Rounding { int, float }, [x]) => match x {
            Number::Int(i) => int(*i)
                .map(Number::Int)
                .ok_or_else(|| domain_error(name, args)),
            Number::Double(d) => float(*d)
                .map(Number::Int)
                .ok_or_else(|| domain_error(name, args)),
        },

        (BuiltinImpl::Remainder { int, float }, [x, y]) => match (x, y) {
            (_, Number::Int(0)) => Err(EvalError::DivisionByZero),
            (_, Number::Double(d)) if *d == 0.0 => Err(EvalError::DivisionByZero),
            (Number::Int(a), Number::Int(b)) => int(*a, *b)
                .map(Number::Int)
                .ok_or_else(|| domain_error(name, args)),
            _ => Ok(Number::Double(float(x.as_f64(), y.as_f64()))),
        },

        (imp, _) => Err(EvalError::WrongArgCount {
            name: name.to_string(),
            expected: imp.arity(),
            found: args.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn program(cells: Vec<IcodeCell>) -> IcodeVector {
        let mut v = IcodeVector::new();
        for cell in cells {
            v.push(cell);
        }
        v
    }

    fn builtin(name: &str) -> IcodeCell {
        IcodeCell::BuiltinCall(vxconfig_builtins::is_builtin(name).unwrap())
    }

    fn eval(cells: Vec<IcodeCell>) -> Result<Number> {
        Machine::new().eval(&program(cells), &[])
    }

    #[test]
    fn test_execute_literal() {
        assert_eq!(eval(vec![IcodeCell::Integer(42)]), Ok(Number::Int(42)));
    }

    #[test]
    fn test_execute_precedence_postfix() {
        // 2 + 3 * 4
        let result = eval(vec![
            IcodeCell::Integer(2),
            IcodeCell::Integer(3),
            IcodeCell::Integer(4),
            IcodeCell::Operator(Op::Mul),
            IcodeCell::Operator(Op::Add),
        ]);
        assert_eq!(result, Ok(Number::Int(14)));
    }

    #[test]
    fn test_integer_division_truncates() {
        for (a, b) in [(7, 2), (-7, 2), (9, -4), (0, 5)] {
            let result = eval(vec![
                IcodeCell::Integer(a),
                IcodeCell::Integer(b),
                IcodeCell::Operator(Op::Div),
            ]);
            assert_eq!(result, Ok(Number::Int(a / b)), "{a}/{b}");
        }
    }

    #[test]
    fn test_division_by_zero() {
        let int = eval(vec![
            IcodeCell::Integer(1),
            IcodeCell::Integer(0),
            IcodeCell::Operator(Op::Div),
        ]);
        assert_eq!(int, Err(EvalError::DivisionByZero));

        let float = eval(vec![
            IcodeCell::Float(1.0),
            IcodeCell::Integer(0),
            IcodeCell::Operator(Op::Div),
        ]);
        assert_eq!(float, Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_mixed_promotes_to_double() {
        let result = eval(vec![
            IcodeCell::Integer(1),
            IcodeCell::Float(0.5),
            IcodeCell::Operator(Op::Add),
        ]);
        assert_eq!(result, Ok(Number::Double(1.5)));
    }

    #[test]
    fn test_overflow_promotes_to_double() {
        let result = eval(vec![
            IcodeCell::Integer(i64::MAX),
            IcodeCell::Integer(1),
            IcodeCell::Operator(Op::Add),
        ]);
        assert_eq!(result, Ok(Number::Double(i64::MAX as f64 + 1.0)));
    }

    #[test]
    fn test_square_matches_multiply() {
        for x in [-3, 0, 7] {
            let sq = eval(vec![IcodeCell::Integer(x), IcodeCell::Operator(Op::Square)]);
            assert_eq!(sq, Ok(Number::Int(x * x)));
        }
        let sq = eval(vec![IcodeCell::Float(1.5), IcodeCell::Operator(Op::Square)]);
        assert_eq!(sq, Ok(Number::Double(2.25)));
    }

    #[test]
    fn test_pow_is_floating_point() {
        let result = eval(vec![
            IcodeCell::Integer(2),
            IcodeCell::Integer(3),
            IcodeCell::Operator(Op::Pow),
        ]);
        assert_eq!(result, Ok(Number::Double(8.0)));
    }

    #[test]
    fn test_negate_in_place() {
        let result = eval(vec![
            IcodeCell::Integer(5),
            IcodeCell::Operator(Op::Negate),
        ]);
        assert_eq!(result, Ok(Number::Int(-5)));
    }

    #[test]
    fn test_stack_underflow() {
        let result = eval(vec![IcodeCell::Integer(1), IcodeCell::Operator(Op::Add)]);
        assert_eq!(result, Err(EvalError::StackUnderflow));
        assert_eq!(eval(vec![]), Err(EvalError::StackUnderflow));
    }

    #[test]
    fn test_unbalanced_program() {
        let result = eval(vec![IcodeCell::Integer(1), IcodeCell::Integer(2)]);
        assert_eq!(result, Err(EvalError::UnbalancedStack(2)));
    }

    #[test]
    fn test_builtin_prefers_integer_impl() {
        let result = eval(vec![
            IcodeCell::Integer(3),
            IcodeCell::Integer(9),
            builtin("max"),
        ]);
        assert_eq!(result, Ok(Number::Int(9)));

        let result = eval(vec![
            IcodeCell::Integer(3),
            IcodeCell::Float(9.5),
            builtin("max"),
        ]);
        assert_eq!(result, Ok(Number::Double(9.5)));
    }

    #[test]
    fn test_builtin_float_only_widens() {
        let result = eval(vec![IcodeCell::Integer(16), builtin("sqrt")]);
        assert_eq!(result, Ok(Number::Double(4.0)));
    }

    #[test]
    fn test_builtin_domain_error() {
        let result = eval(vec![
            IcodeCell::Integer(i64::MIN),
            IcodeCell::Integer(-1),
            builtin("mod"),
        ]);
        assert!(matches!(result, Err(EvalError::BuiltinDomain { .. })));

        let result = eval(vec![IcodeCell::Float(1e300), builtin("nint")]);
        assert!(matches!(result, Err(EvalError::BuiltinDomain { .. })));
        let result = eval(vec![IcodeCell::Float(f64::NAN), builtin("nint")]);
        assert!(matches!(result, Err(EvalError::BuiltinDomain { .. })));
    }

    #[test]
    fn test_mod_by_zero() {
        for (a, b) in [
            (IcodeCell::Integer(7), IcodeCell::Integer(0)),
            (IcodeCell::Float(7.0), IcodeCell::Float(0.0)),
            (IcodeCell::Integer(7), IcodeCell::Float(-0.0)),
            (IcodeCell::Float(7.5), IcodeCell::Integer(0)),
        ] {
            let result = eval(vec![a, b, builtin("mod")]);
            assert_eq!(result, Err(EvalError::DivisionByZero));
        }

        let result = eval(vec![IcodeCell::Integer(-7), IcodeCell::Integer(3), builtin("mod")]);
        assert_eq!(result, Ok(Number::Int(-1)));
        let result = eval(vec![IcodeCell::Float(7.5), IcodeCell::Integer(2), builtin("mod")]);
        assert_eq!(result, Ok(Number::Double(1.5)));
    }

    #[test]
    fn test_rounding_builtins_return_int() {
        let result = eval(vec![IcodeCell::Float(-2.5), builtin("nint")]);
        assert_eq!(result, Ok(Number::Int(-3)));
        let result = eval(vec![IcodeCell::Float(-0.2), builtin("sign")]);
        assert_eq!(result, Ok(Number::Int(-1)));
    }

    #[test]
    fn test_unknown_builtin() {
        let result = eval(vec![IcodeCell::Integer(1), IcodeCell::BuiltinCall(10_000)]);
        assert_eq!(result, Err(EvalError::UnknownBuiltin(10_000)));
    }

    #[test]
    fn test_user_function_call() {
        // f(a, b) = a*a + b
        let f = Arc::new(UserFunction {
            name: "f".into(),
            n_args: 2,
            body: program(vec![
                IcodeCell::LocalVar(0),
                IcodeCell::LocalVar(0),
                IcodeCell::Operator(Op::Mul),
                IcodeCell::LocalVar(1),
                IcodeCell::Operator(Op::Add),
            ]),
        });

        let mut machine = Machine::new();
        assert_eq!(
            machine.call(&f, &[Number::Int(3), Number::Int(4)]),
            Ok(Number::Int(13))
        );

        let nested = program(vec![
            IcodeCell::Integer(1),
            IcodeCell::Integer(2),
            IcodeCell::UserFunctionCall(f.clone()),
            IcodeCell::Integer(10),
            IcodeCell::Operator(Op::Mul),
        ]);
        assert_eq!(machine.eval(&nested, &[]), Ok(Number::Int(30)));
    }

    #[test]
    fn test_user_function_wrong_arity() {
        let f = UserFunction {
            name: "g".into(),
            n_args: 1,
            body: program(vec![IcodeCell::LocalVar(0)]),
        };
        let result = Machine::new().call(&f, &[]);
        assert_eq!(
            result,
            Err(EvalError::WrongArgCount {
                name: "g".into(),
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn test_local_out_of_range() {
        let result = Machine::new().eval(&program(vec![IcodeCell::LocalVar(2)]), &[Number::Int(1)]);
        assert_eq!(
            result,
            Err(EvalError::LocalOutOfRange {
                slot: 2,
                available: 1
            })
        );
    }

    #[test]
    fn test_non_numeric_cell() {
        let result = eval(vec![IcodeCell::Boolean(true)]);
        assert!(matches!(result, Err(EvalError::NotNumeric(_))));
    }

    #[test]
    fn test_results_stack() {
        let mut machine = Machine::new();
        machine.run(&program(vec![IcodeCell::Integer(1)]), &[]).unwrap();
        machine.run(&program(vec![IcodeCell::Integer(2)]), &[]).unwrap();
        assert_eq!(machine.pending_results(), 2);
        assert_eq!(machine.pop_result(), Ok(Number::Int(2)));
        assert_eq!(machine.pop_result(), Ok(Number::Int(1)));
        assert_eq!(machine.pop_result(), Err(EvalError::NoResult));
    }

    #[test]
    fn test_call_depth_limit() {
        let inner = Arc::new(UserFunction {
            name: "inner".into(),
            n_args: 0,
            body: program(vec![IcodeCell::Integer(1)]),
        });
        let outer = program(vec![IcodeCell::UserFunctionCall(inner)]);
        let mut machine = Machine::new().with_max_call_depth(0);
        assert_eq!(machine.eval(&outer, &[]), Err(EvalError::CallDepth(0)));
    }
}
