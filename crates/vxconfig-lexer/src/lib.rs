// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for the vx configuration language.
//!
//! Unlike a context-free tokenizer, this lexer is driven one token at a time
//! by the parser and carries state between tokens:
//!
//! - whether the next identifier sits on the left-hand side of an assignment
//! - whether a comparison operator was just seen (so `-5` lexes as one number)
//! - pending environment-variable text being re-lexed
//!
//! Identifier classification (builtins, local variables, previously defined
//! numeric constants, user functions) needs knowledge the lexer does not own;
//! it is asked through the [`SymbolScope`] trait, which the parser implements.
//!
//! # Design
//!
//! - `Token`: every token kind of the language
//! - `Lexer`: hand-written character scanner with a bounded put-back buffer
//! - `word`: logos-based classification of a completed lexeme
//! - `env`: `${NAME}` substitution against a pluggable [`EnvSource`]
//!
//! # Examples
//!
//! ```
//! use vxconfig_lexer::{Lexer, LexLimits, NoSymbols, ProcessEnv, Token};
//!
//! let env = ProcessEnv;
//! let mut lexer = Lexer::new("x = 2 + 3;", &env, LexLimits::default());
//! let first = lexer.next_token(&NoSymbols).unwrap().unwrap();
//! assert_eq!(first.token, Token::Identifier("x".to_string()));
//! ```

mod env;
mod error;
mod lexer;
mod scope;
mod token;
mod word;

pub use env::{replace_env, EnvFailure, EnvSource, ProcessEnv};
pub use error::{LexError, Result};
pub use lexer::{LexLimits, Lexer};
pub use scope::{Constant, NoSymbols, SymbolScope};
pub use token::{CompareOp, PercentileKind, Span, SpannedToken, Token};
pub use word::{is_number, parse_number, Word};
