//! Builtin Function Registry.
//!
//! Provides distributed registration for the math functions callable from
//! configuration expressions (`sin`, `atan2d`, `nint`, ...). Configuration
//! files may call these without defining them; defining a user function with
//! one of these names is rejected by the parser.
//!
//! # Architecture
//!
//! The registry uses [`linkme::distributed_slice`] for link-time
//! registration:
//!
//! 1. Each function registers a [`BuiltinDescriptor`] into [`BUILTINS`]
//! 2. At runtime, lookup by name returns an index into the slice
//! 3. Compiled expressions carry that index; the machine dispatches through
//!    [`by_index`]
//!
//! # Dispatch
//!
//! A descriptor carries up to two implementations for its arity: an integer
//! one and a floating point one. The integer one is used only when it exists
//! and every argument is an integer; otherwise the floating point one is used
//! with integers widened. `nint` and `sign` are [`BuiltinImpl::Rounding`]:
//! they always produce an integer whatever the argument type. `mod` is a
//! [`BuiltinImpl::Remainder`]: a zero divisor is a division by zero.
//!
//! # Example Lookup
//!
//! ```
//! use vxconfig_builtins::{by_index, is_builtin};
//!
//! let index = is_builtin("sqrt").unwrap();
//! assert_eq!(by_index(index).unwrap().name, "sqrt");
//! ```

pub use linkme;

use linkme::distributed_slice;

mod math;

/// Unary integer implementation; `None` signals a domain error.
pub type IntFn1 = fn(i64) -> Option<i64>;
/// Binary integer implementation; `None` signals a domain error.
pub type IntFn2 = fn(i64, i64) -> Option<i64>;
pub type FloatFn1 = fn(f64) -> f64;
pub type FloatFn2 = fn(f64, f64) -> f64;

/// The function pointers of a builtin, tagged by arity.
#[derive(Clone, Copy)]
pub enum BuiltinImpl {
    /// One argument
    Unary {
        int: Option<IntFn1>,
        float: Option<FloatFn1>,
    },
    /// Two arguments
    Binary {
        int: Option<IntFn2>,
        float: Option<FloatFn2>,
    },
    /// One argument, integer result whatever the argument type; `None`
    /// from `float` signals a value with no integer counterpart
    Rounding {
        int: IntFn1,
        float: fn(f64) -> Option<i64>,
    },
    /// Two arguments, division-like: the caller rejects a zero divisor
    Remainder { int: IntFn2, float: FloatFn2 },
}

impl BuiltinImpl {
    /// Number of arguments the function takes.
    pub fn arity(&self) -> usize {
        match self {
            BuiltinImpl::Unary { .. } | BuiltinImpl::Rounding { .. } => 1,
            BuiltinImpl::Binary { .. } | BuiltinImpl::Remainder { .. } => 2,
        }
    }
}

/// Descriptor for a registered builtin function
pub struct BuiltinDescriptor {
    /// Name used in configuration files (e.g., "sin", "atan2d")
    pub name: &'static str,
    /// Signature string (e.g., "atan2d(y, x)")
    pub signature: &'static str,
    /// Documentation string
    pub doc: &'static str,
    /// The implementation
    pub implementation: BuiltinImpl,
}

impl BuiltinDescriptor {
    pub fn arity(&self) -> usize {
        self.implementation.arity()
    }
}

impl std::fmt::Debug for BuiltinDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinDescriptor")
            .field("name", &self.name)
            .field("arity", &self.arity())
            .finish()
    }
}

/// Distributed slice collecting all builtin registrations.
#[distributed_slice]
pub static BUILTINS: [BuiltinDescriptor];

/// Get all registered builtin names
pub fn all_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

/// Look up a builtin by name
pub fn get(name: &str) -> Option<&'static BuiltinDescriptor> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Index of the builtin with this name, if any.
///
/// Linear scan; the table is small.
pub fn is_builtin(name: &str) -> Option<usize> {
    BUILTINS.iter().position(|b| b.name == name)
}

/// Check if a function name is a builtin
pub fn is_known(name: &str) -> bool {
    is_builtin(name).is_some()
}

/// Look up a builtin by the index returned from [`is_builtin`]
pub fn by_index(index: usize) -> Option<&'static BuiltinDescriptor> {
    BUILTINS.get(index)
}
