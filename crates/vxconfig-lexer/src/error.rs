//! Lexical errors.

use thiserror::Error;

/// A fatal lexical error. There is no recovery: the parse stops here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unterminated string starting at line {line}, column {column}")]
    UnterminatedString { line: u32, column: u32 },

    #[error("unterminated comment starting at line {line}, column {column}")]
    UnterminatedComment { line: u32, column: u32 },

    #[error("can't get value of environment variable \"{name}\" (line {line}, column {column})")]
    UndefinedEnv { name: String, line: u32, column: u32 },

    #[error("malformed environment reference at line {line}, column {column}")]
    BadEnvReference { line: u32, column: u32 },

    #[error("lexeme too long at line {line}, column {column} (limit is {limit} characters)")]
    LexemeTooLong { line: u32, column: u32, limit: usize },

    #[error("can't have more than {limit} putback chars")]
    PutbackOverflow { limit: usize },

    #[error("unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedChar { ch: char, line: u32, column: u32 },

    #[error("unrecognized token \"{text}\" at line {line}, column {column}")]
    BadLexeme { text: String, line: u32, column: u32 },
}

impl LexError {
    /// 1-based line of the error, when it has one.
    pub fn line(&self) -> Option<u32> {
        match self {
            LexError::UnterminatedString { line, .. }
            | LexError::UnterminatedComment { line, .. }
            | LexError::UndefinedEnv { line, .. }
            | LexError::BadEnvReference { line, .. }
            | LexError::LexemeTooLong { line, .. }
            | LexError::UnexpectedChar { line, .. }
            | LexError::BadLexeme { line, .. } => Some(*line),
            LexError::PutbackOverflow { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LexError>;
