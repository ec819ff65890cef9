// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! # vx configuration engine
//!
//! Loads configuration files written in the vx config language into a typed
//! [`Dictionary`] and answers typed lookups against it.
//!
//! This crate ties together:
//! - `vxconfig-lexer` - tokenization
//! - `vxconfig-vm` - icode and the stack machine that evaluates expressions
//! - `vxconfig-builtins` - builtin math functions
//!
//! ## Architecture
//!
//! ```text
//! source text
//!     ↓  Lexer (asks the parser how to classify identifiers)
//! parser   - statements, expressions compiled to icode, thresholds
//!     ↓  Machine (immediate evaluation outside function bodies)
//! Dictionary - nested scopes, arrays, thresholds, functions
//!     ↓
//! Config / Lookups - layered loading and typed queries
//! ```
//!
//! ## Usage
//!
//! ```
//! use vxconfig::{Config, Lookup, Lookups};
//!
//! let mut config = Config::new();
//! config
//!     .read_string("config", "n = 2 + 3 * 4; t = ge30 && le45; f(a, b) = a * a + b;")
//!     .unwrap();
//!
//! assert_eq!(config.lookup_int("n", Lookup::Required).unwrap(), Some(14));
//! let t = config.lookup_thresh("t", Lookup::Required).unwrap().unwrap();
//! assert!(t.check(30.0).unwrap());
//! assert_eq!(t.get_abbr_str(), "ge30.and.le45");
//! ```

pub mod config;
pub mod dictionary;
pub mod error;
pub mod parser;
pub mod pwl;
pub mod threshold;

pub use config::Config;
pub use dictionary::{
    DictView, Dictionary, DictionaryEntry, DictionaryStack, EntryValue, Lookup, Lookups,
};
pub use error::{EngineError, Result, ThresholdError};
pub use parser::{ParserLimits, ParserMode, SyntaxError};
pub use pwl::PiecewiseLinear;
pub use threshold::{
    ClimoPoint, CompareOp, PercSamples, PercThreshType, SingleThresh, ThreshArray, ThreshNode,
    ThreshText, ThreshType,
};

pub use vxconfig_lexer::{EnvSource, ProcessEnv};
pub use vxconfig_vm::{EvalError, Number, UserFunction};
