//! Parser for the vx configuration language.
//!
//! A hand-written recursive descent parser that pulls tokens from the
//! stateful [`Lexer`] one at a time. Expressions are compiled to icode while
//! they are parsed; outside a function definition each expression is run on
//! the machine right away and only its value is stored.
//!
//! ## Architecture
//!
//! - `context` - [`ParserContext`]: dictionary stack, machine, parser mode
//!   and the stack of open list/call constructs
//! - `statement` - statements, assignments, dictionaries and arrays
//! - `expr` - arithmetic expressions (precedence climbing), calls and
//!   piecewise-linear point lists
//! - `thresh` - threshold expressions
//! - `error` - [`SyntaxError`] with the caret diagnostic
//!
//! ## Lexer coupling
//!
//! The lexer asks the context how to classify identifiers (numeric
//! constants, user functions, parameters), so the parser must store an
//! entry before it looks past the `;` that ends it. The lookahead buffer is
//! filled lazily and never holds a token beyond the statement being parsed.

mod context;
mod error;
mod expr;
mod statement;
mod thresh;

pub use context::{
    ArrayBuilder, ArrayElement, CallTarget, ElementKind, FunctionBuilder, ParserContext,
    ParserLimits, ParserMode, PendingContext,
};
pub use error::SyntaxError;

use std::collections::VecDeque;
use std::io::Write;

use vxconfig_lexer::{EnvSource, Lexer, SpannedToken, Token};

use crate::dictionary::{Dictionary, DictionaryEntry, EntryValue};
use crate::error::{EngineError, Result};

/// Parse `source` into `base`, returning the updated dictionary.
///
/// `source_name` is used in diagnostics and `print` output.
pub(crate) fn parse<'a>(
    source_name: &'a str,
    source: &'a str,
    base: Dictionary,
    env: &'a dyn EnvSource,
    limits: ParserLimits,
    output: &'a mut dyn Write,
) -> Result<Dictionary> {
    let mut parser = Parser {
        lexer: Lexer::new(source, env, limits.lex_limits()),
        lookahead: VecDeque::new(),
        at_eof: false,
        source_name,
        source,
        ctx: ParserContext::new(base, limits, output),
    };
    parser.statements(false)?;
    Ok(parser.ctx.dicts.into_base())
}

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<SpannedToken>,
    at_eof: bool,
    source_name: &'a str,
    source: &'a str,
    ctx: ParserContext<'a>,
}

impl Parser<'_> {
    /// Lex until the lookahead holds `n + 1` tokens or input runs out.
    fn fill(&mut self, n: usize) -> Result<()> {
        while self.lookahead.len() <= n && !self.at_eof {
            match self.lexer.next_token(&self.ctx) {
                Ok(Some(token)) => self.lookahead.push_back(token),
                Ok(None) => self.at_eof = true,
                Err(source) => {
                    return Err(EngineError::Lex {
                        file: self.source_name.to_string(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<Option<Token>> {
        self.peek_nth(0)
    }

    fn peek_nth(&mut self, n: usize) -> Result<Option<Token>> {
        self.fill(n)?;
        Ok(self.lookahead.get(n).map(|t| t.token.clone()))
    }

    /// The next token with its location, without consuming it.
    fn current(&mut self, expected: &str) -> Result<SpannedToken> {
        self.fill(0)?;
        match self.lookahead.front() {
            Some(token) => Ok(token.clone()),
            None => Err(self.unexpected(expected)),
        }
    }

    fn advance(&mut self) -> Result<SpannedToken> {
        self.fill(0)?;
        match self.lookahead.pop_front() {
            Some(token) => Ok(token),
            None => Err(self.unexpected("more input")),
        }
    }

    fn check(&mut self, expected: &Token) -> Result<bool> {
        Ok(matches!(self.peek()?, Some(t) if std::mem::discriminant(&t) == std::mem::discriminant(expected)))
    }

    /// Consume the next token if it is of the `expected` kind.
    fn eat(&mut self, expected: &Token) -> Result<bool> {
        if self.check(expected)? {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, expected: &Token) -> Result<SpannedToken> {
        if self.check(expected)? {
            return self.advance();
        }
        Err(self.unexpected(&expected.describe()))
    }

    /// Syntax error at the next token, or at end of input.
    fn unexpected(&mut self, expected: &str) -> EngineError {
        if let Err(err) = self.fill(0) {
            return err;
        }
        let found = self.lookahead.front();
        let message = match found {
            Some(token) => format!("expected {expected}, found {}", token.token.describe()),
            None => format!("expected {expected}, found end of input"),
        };
        SyntaxError::at(self.source_name, self.source, found, message).into()
    }

    fn syntax_at(&self, token: &SpannedToken, message: impl Into<String>) -> EngineError {
        SyntaxError::at(self.source_name, self.source, Some(token), message).into()
    }

    fn store(&mut self, name: &str, value: EntryValue) {
        self.ctx.dicts.store(DictionaryEntry::new(name, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vxconfig_lexer::ProcessEnv;

    use crate::dictionary::{Lookup, Lookups};

    fn parse_str(text: &str) -> Result<Dictionary> {
        let mut out = Vec::new();
        parse("config", text, Dictionary::new(), &ProcessEnv, ParserLimits::default(), &mut out)
    }

    fn parse_with_output(text: &str) -> (Result<Dictionary>, String) {
        let mut out = Vec::new();
        let result = parse(
            "test.conf",
            text,
            Dictionary::new(),
            &ProcessEnv,
            ParserLimits::default(),
            &mut out,
        );
        (result, String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_arithmetic_precedence() {
        let d = parse_str("x = 2 + 3 * 4; y = (2 + 3) * 4; z = 7 / 2; w = 2 ^ 3 ^ 2;").unwrap();
        assert_eq!(d.lookup_int("x", Lookup::Required).unwrap(), Some(14));
        assert_eq!(d.lookup_int("y", Lookup::Required).unwrap(), Some(20));
        assert_eq!(d.lookup_int("z", Lookup::Required).unwrap(), Some(3));
        assert_eq!(d.lookup_double("w", Lookup::Required).unwrap(), Some(512.0));
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_power() {
        let d = parse_str("a = -2 ^ 2; b = 3 - -1;").unwrap();
        assert_eq!(d.lookup_int("a", Lookup::Required).unwrap(), Some(4));
        assert_eq!(d.lookup_int("b", Lookup::Required).unwrap(), Some(4));
    }

    #[test]
    fn test_constants_substitute() {
        let d = parse_str("a = 3; b = a * 2.5; c = b + a;").unwrap();
        assert_eq!(d.lookup_double("b", Lookup::Required).unwrap(), Some(7.5));
        assert_eq!(d.lookup_double("c", Lookup::Required).unwrap(), Some(10.5));
    }

    #[test]
    fn test_scalar_kinds() {
        let d = parse_str("flag = TRUE; name = \"obs\"; t = >=5;").unwrap();
        assert_eq!(d.lookup_bool("flag", Lookup::Required).unwrap(), Some(true));
        assert_eq!(d.lookup_string("name", Lookup::Required).unwrap().as_deref(), Some("obs"));
        assert_eq!(d.lookup_thresh("t", Lookup::Required).unwrap().unwrap().get_str(), ">=5");
    }

    #[test]
    fn test_environment_from_map() {
        let env: HashMap<String, String> = [("MODEL".to_string(), "gfs".to_string())].into();
        let mut out = Vec::new();
        let d = parse(
            "config",
            "model = \"${MODEL}_v2\";",
            Dictionary::new(),
            &env,
            ParserLimits::default(),
            &mut out,
        )
        .unwrap();
        assert_eq!(d.lookup_string("model", Lookup::Required).unwrap().as_deref(), Some("gfs_v2"));
    }

    #[test]
    fn test_print_statement() {
        let (result, out) = parse_with_output("a = 4;\nprint a * 2;\nprint \"half: \", a / 8.0;\n");
        result.unwrap();
        assert_eq!(out, "test.conf: 8\ntest.conf: half: 0.5\n");
    }

    #[test]
    fn test_lex_error_carries_file() {
        let err = parse_str("s = \"open;").unwrap_err();
        assert!(matches!(err, EngineError::Lex { ref file, .. } if file == "config"));
    }

    #[test]
    fn test_missing_semicolon_is_syntax_error() {
        let err = parse_str("a = 1\nb = 2;").unwrap_err();
        let EngineError::Syntax(syntax) = err else {
            panic!("expected a syntax error, got {err:?}");
        };
        assert_eq!(syntax.line, 2);
        assert_eq!(syntax.text, "b");
    }

    #[test]
    fn test_base_entries_visible() {
        let mut base = Dictionary::new();
        base.store(DictionaryEntry::new("n", EntryValue::Int(2)));
        let mut out = Vec::new();
        let d = parse("config", "m = n + 1;", base, &ProcessEnv, ParserLimits::default(), &mut out)
            .unwrap();
        assert_eq!(d.lookup_int("m", Lookup::Required).unwrap(), Some(3));
        assert_eq!(d.len(), 2);
    }
}
