//! Machine error types.

use thiserror::Error;

/// Errors raised while evaluating icode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("stack underflow")]
    StackUnderflow,

    #[error("program left {0} values on the stack")]
    UnbalancedStack(usize),

    #[error("no result available")]
    NoResult,

    #[error("division by zero")]
    DivisionByZero,

    #[error("function \"{name}\" takes {expected} argument(s), got {found}")]
    WrongArgCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("no builtin function with index {0}")]
    UnknownBuiltin(usize),

    #[error("builtin \"{name}\" is not defined for {kind} arguments")]
    UnsupportedBuiltin { name: String, kind: &'static str },

    #[error("builtin \"{name}\" is undefined for argument(s) {args}")]
    BuiltinDomain { name: String, args: String },

    #[error("non-numeric value {0} used where a number is expected")]
    NotNumeric(String),

    #[error("unexpected icode cell {0}")]
    UnexpectedCell(String),

    #[error("local variable slot {slot} out of range ({available} bound)")]
    LocalOutOfRange { slot: usize, available: usize },

    #[error("call depth limit of {0} exceeded")]
    CallDepth(usize),
}

pub type Result<T> = std::result::Result<T, EvalError>;
