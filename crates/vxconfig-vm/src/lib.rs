//! vxconfig VM - Stack-based icode machine
//!
//! Expressions in a configuration file are compiled while they are parsed
//! into flat postfix programs ([`IcodeVector`]) and evaluated here. A program
//! either runs once at load time, or is captured as the body of a
//! [`UserFunction`] and runs once per call with its arguments bound to local
//! slots.

pub mod error;
pub mod icode;
pub mod machine;
pub mod number;

pub use error::{EvalError, Result};
pub use icode::{IcodeCell, IcodeVector, Op, UserFunction};
pub use machine::Machine;
pub use number::Number;
