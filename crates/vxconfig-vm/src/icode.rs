//! Icode instruction set
//!
//! A program is a flat postfix sequence of cells: operands are pushed,
//! operators and calls pop their arguments and push one result.

use std::fmt;
use std::sync::Arc;

use crate::number::Number;

/// Arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    /// Generic power, always evaluated in floating point
    Pow,
    /// `x^2`, chosen at compile time when the exponent is the literal `2`
    Square,
    /// Unary minus
    Negate,
}

impl Op {
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Pow => "^",
            Op::Square => "^2",
            Op::Negate => "neg",
        }
    }
}

/// One instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum IcodeCell {
    Integer(i64),
    Float(f64),
    /// Boolean array element; not a number
    Boolean(bool),
    /// String array element; not a number
    StringLiteral(String),
    Operator(Op),
    /// Call of the builtin at this index of the builtin table
    BuiltinCall(usize),
    UserFunctionCall(Arc<UserFunction>),
    /// Argument slot of the running user function
    LocalVar(usize),
}

impl IcodeCell {
    pub fn number(n: Number) -> Self {
        match n {
            Number::Int(i) => IcodeCell::Integer(i),
            Number::Double(d) => IcodeCell::Float(d),
        }
    }
}

impl fmt::Display for IcodeCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcodeCell::Integer(i) => write!(f, "{i}"),
            IcodeCell::Float(d) => write!(f, "{}", Number::Double(*d)),
            IcodeCell::Boolean(b) => write!(f, "{b}"),
            IcodeCell::StringLiteral(s) => write!(f, "{s:?}"),
            IcodeCell::Operator(op) => f.write_str(op.symbol()),
            IcodeCell::BuiltinCall(index) => match vxconfig_builtins::by_index(*index) {
                Some(b) => write!(f, "call {}", b.name),
                None => write!(f, "call #{index}"),
            },
            IcodeCell::UserFunctionCall(func) => write!(f, "call {}", func.name),
            IcodeCell::LocalVar(slot) => write!(f, "local {slot}"),
        }
    }
}

/// A compiled program: an expression, a function body, or one array element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IcodeVector {
    cells: Vec<IcodeCell>,
}

impl IcodeVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(cell: IcodeCell) -> Self {
        Self { cells: vec![cell] }
    }

    pub fn push(&mut self, cell: IcodeCell) {
        self.cells.push(cell);
    }

    /// Append all cells of `other`.
    pub fn append(&mut self, other: IcodeVector) {
        self.cells.extend(other.cells);
    }

    pub fn cells(&self) -> &[IcodeCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cell if this program is exactly one cell long.
    pub fn as_single(&self) -> Option<&IcodeCell> {
        match self.cells.as_slice() {
            [cell] => Some(cell),
            _ => None,
        }
    }

    /// True when this program is the single literal `2`.
    pub fn is_literal_two(&self) -> bool {
        matches!(self.as_single(), Some(IcodeCell::Integer(2)))
    }

    /// True when the program uses argument slots of an enclosing function.
    pub fn uses_locals(&self) -> bool {
        self.cells
            .iter()
            .any(|c| matches!(c, IcodeCell::LocalVar(_)))
    }
}

impl fmt::Display for IcodeVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{cell}")?;
        }
        Ok(())
    }
}

/// A function defined in a configuration file, e.g. `f(a, b) = a * a + b;`.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFunction {
    pub name: String,
    pub n_args: usize,
    pub body: IcodeVector,
}
