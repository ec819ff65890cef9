//! Error types for loading and querying configurations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vxconfig_lexer::LexError;
use vxconfig_vm::EvalError;

use crate::parser::SyntaxError;

/// Errors raised by threshold construction, resolution and checking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("the percentile ({value}) in threshold \"{text}\" must be between 0 and 100")]
    PercentileOutOfRange { text: String, value: f64 },

    #[error("percentile threshold \"{0}\" used before it was set")]
    Unresolved(String),

    #[error("unsupported frequency bias percentile threshold \"{0}\"")]
    UnsupportedFreqBias(String),

    #[error("the requested frequency bias value ({value}) must be > 0 in threshold \"{text}\"")]
    BadFreqBias { text: String, value: f64 },

    #[error("not enough information provided to define the {kind} threshold \"{text}\"")]
    MissingInput { kind: &'static str, text: String },

    #[error("{kind} threshold \"{text}\" requested but no data provided")]
    MissingSample { kind: &'static str, text: String },

    #[error("can't compute {kind} threshold \"{text}\" because no valid data was provided")]
    EmptySample { kind: &'static str, text: String },

    #[error("climatological distribution threshold \"{0}\" requested without valid climatology mean and standard deviation")]
    MissingClimo(String),

    #[error("invalid probability thresholds \"{thresholds}\": {reason}")]
    InvalidProbThresh { thresholds: String, reason: String },

    #[error("can't parse threshold \"{0}\"")]
    Unparseable(String),
}

/// Umbrella error for every load and lookup entry point.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("lexical error in file \"{file}\": {source}")]
    Lex {
        file: String,
        #[source]
        source: LexError,
    },

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    #[error("identifier \"{0}\" not defined in this scope")]
    UndefinedIdentifier(String),

    #[error("builtin function \"{0}\" can't be redefined")]
    BuiltinRedefinition(String),

    #[error("function \"{name}\" declares {count} arguments, at most {limit} allowed")]
    TooManyArguments {
        name: String,
        count: usize,
        limit: usize,
    },

    #[error("dictionaries nested deeper than {0} levels")]
    DictionaryDepth(usize),

    #[error("index {index} out of range for array \"{name}\" of length {len}")]
    IndexOutOfRange { name: String, index: i64, len: usize },

    #[error("lookup failed for name \"{0}\"")]
    NotFound(String),

    #[error("\"{name}\" is a {found}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("piecewise linear function \"{name}\": {reason}")]
    BadPiecewiseLinear { name: String, reason: String },

    #[error("can't read config file \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't write print output: {0}")]
    Output(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
