//! Character scanner.

use std::collections::VecDeque;

use tracing::trace;

use crate::env::{expand_all, EnvFailure, EnvSource};
use crate::error::{LexError, Result};
use crate::scope::{Constant, SymbolScope};
use crate::token::{strip_percentile_prefix, CompareOp, PercentileKind, Span, SpannedToken, Token};
use crate::word::{is_number, parse_number, Word};

/// Size limits enforced while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexLimits {
    /// Longest identifier, number or string accepted
    pub max_lexeme_len: usize,
    /// Depth of the put-back buffer
    pub max_putback: usize,
    /// Substitution passes before a `${}` chain is considered circular
    pub max_env_rounds: usize,
}

impl Default for LexLimits {
    fn default() -> Self {
        Self {
            max_lexeme_len: 512,
            max_putback: 10,
            max_env_rounds: 64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pos {
    offset: usize,
    line: u32,
    column: u32,
}

/// One input character and where it came from. Characters injected from an
/// environment variable all point at the `${NAME}` reference.
#[derive(Debug, Clone, Copy)]
struct Located {
    ch: char,
    pos: Pos,
    end: usize,
}

/// Stateful scanner producing one token per call.
pub struct Lexer<'a> {
    chars: Vec<char>,
    offset: usize,
    line: u32,
    column: u32,
    putback: Vec<Located>,
    injected: VecDeque<char>,
    injected_at: Option<(Pos, usize)>,
    env: &'a dyn EnvSource,
    limits: LexLimits,
    is_lhs: bool,
    need_number: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &str, env: &'a dyn EnvSource, limits: LexLimits) -> Self {
        Self {
            chars: source.chars().collect(),
            offset: 0,
            line: 1,
            column: 1,
            putback: Vec::with_capacity(limits.max_putback),
            injected: VecDeque::new(),
            injected_at: None,
            env,
            limits,
            is_lhs: true,
            need_number: false,
        }
    }

    /// Whether the next bare word is read as an assignment target.
    pub fn is_lhs(&self) -> bool {
        self.is_lhs
    }

    /// Set by the parser once an assignment target has been consumed.
    pub fn set_lhs(&mut self, lhs: bool) {
        self.is_lhs = lhs;
    }

    /// Scan the next token, or `None` at end of input.
    pub fn next_token(&mut self, scope: &dyn SymbolScope) -> Result<Option<SpannedToken>> {
        loop {
            let first = loop {
                match self.read()? {
                    None => return Ok(None),
                    Some(l) if l.ch.is_whitespace() => continue,
                    Some(l) => break l,
                }
            };

            let single = |token: Token| Some(spanned(token, first.ch.to_string(), first, first.end));

            let result = match first.ch {
                '[' => {
                    self.is_lhs = false;
                    single(Token::LBracket)
                }
                '{' => {
                    self.is_lhs = true;
                    single(Token::LBrace)
                }
                ';' => {
                    self.is_lhs = true;
                    single(Token::Semicolon)
                }
                ']' => single(Token::RBracket),
                '}' => single(Token::RBrace),
                '(' => single(Token::LParen),
                ')' => single(Token::RParen),
                '+' => single(Token::Plus),
                '*' => single(Token::Star),
                '^' => single(Token::Caret),
                ',' => single(Token::Comma),
                '-' if !self.need_number => single(Token::Minus),
                '"' => Some(self.quoted_string(first)?),
                '/' => match self.read()? {
                    Some(l) if l.ch == '*' => {
                        self.skip_block_comment(first)?;
                        None
                    }
                    Some(l) if l.ch == '/' => {
                        self.skip_line_comment();
                        None
                    }
                    Some(l) => {
                        self.putback(l)?;
                        single(Token::Slash)
                    }
                    None => single(Token::Slash),
                },
                '<' | '>' | '=' | '!' | '&' | '|' => Some(self.operator(first)?),
                c if starts_word(c, self.need_number) => Some(self.word(first, scope)?),
                c => {
                    return Err(LexError::UnexpectedChar {
                        ch: c,
                        line: first.pos.line,
                        column: first.pos.column,
                    })
                }
            };

            if let Some(token) = result {
                trace!(token = ?token.token, line = token.span.line, column = token.span.column, "lexed");
                return Ok(Some(token));
            }
        }
    }

    // === Character input ===

    fn read_source(&mut self) -> Option<Located> {
        let ch = *self.chars.get(self.offset)?;
        let pos = Pos {
            offset: self.offset,
            line: self.line,
            column: self.column,
        };
        self.offset += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(Located {
            ch,
            pos,
            end: self.offset,
        })
    }

    /// Next character without environment expansion.
    fn read_raw(&mut self) -> Option<Located> {
        if let Some(l) = self.putback.pop() {
            return Some(l);
        }
        if let Some(ch) = self.injected.pop_front() {
            let (pos, end) = self.injected_at?;
            return Some(Located { ch, pos, end });
        }
        self.injected_at = None;
        self.read_source()
    }

    /// Next character, expanding `${NAME}` references into injected text.
    fn read(&mut self) -> Result<Option<Located>> {
        if !self.putback.is_empty() || !self.injected.is_empty() {
            return Ok(self.read_raw());
        }
        let Some(l) = self.read_source() else {
            return Ok(None);
        };
        if l.ch != '$' {
            return Ok(Some(l));
        }

        let bad_ref = || LexError::BadEnvReference {
            line: l.pos.line,
            column: l.pos.column,
        };
        match self.read_source() {
            Some(open) if open.ch == '{' => {}
            _ => return Err(bad_ref()),
        }
        let mut name = String::new();
        let end = loop {
            match self.read_source() {
                Some(c) if c.ch == '}' => break c.end,
                Some(c) if c.ch != '\n' && name.len() < self.limits.max_lexeme_len => name.push(c.ch),
                _ => return Err(bad_ref()),
            }
        };

        let mut value = self.env.var(&name).ok_or_else(|| LexError::UndefinedEnv {
            name: name.clone(),
            line: l.pos.line,
            column: l.pos.column,
        })?;
        expand_all(&mut value, self.env, self.limits.max_env_rounds)
            .map_err(|failure| env_error(failure, l.pos))?;
        trace!(%name, %value, "environment substitution");

        self.injected = value.chars().collect();
        self.injected_at = Some((l.pos, end));
        self.read()
    }

    fn putback(&mut self, l: Located) -> Result<()> {
        if self.putback.len() >= self.limits.max_putback {
            return Err(LexError::PutbackOverflow {
                limit: self.limits.max_putback,
            });
        }
        self.putback.push(l);
        Ok(())
    }

    // === Token scanners ===

    fn operator(&mut self, first: Located) -> Result<SpannedToken> {
        let second = self.read()?;
        if let Some(s) = second {
            let pair = match (first.ch, s.ch) {
                ('<', '=') => Some(Token::Comparison(CompareOp::Le)),
                ('>', '=') => Some(Token::Comparison(CompareOp::Ge)),
                ('=', '=') => Some(Token::Comparison(CompareOp::Eq)),
                ('!', '=') => Some(Token::Comparison(CompareOp::Ne)),
                ('&', '&') => Some(Token::And),
                ('|', '|') => Some(Token::Or),
                _ => None,
            };
            if let Some(token) = pair {
                if matches!(token, Token::Comparison(_)) {
                    self.need_number = true;
                }
                let text: String = [first.ch, s.ch].iter().collect();
                return Ok(spanned(token, text, first, s.end));
            }
            self.putback(s)?;
        }

        let token = match first.ch {
            '<' => Token::Comparison(CompareOp::Lt),
            '>' => Token::Comparison(CompareOp::Gt),
            '=' => Token::Assign,
            '!' => Token::Not,
            ch => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    line: first.pos.line,
                    column: first.pos.column,
                })
            }
        };
        if matches!(token, Token::Comparison(_)) {
            self.need_number = true;
        }
        Ok(spanned(token, first.ch.to_string(), first, first.end))
    }

    fn quoted_string(&mut self, open: Located) -> Result<SpannedToken> {
        let unterminated = || LexError::UnterminatedString {
            line: open.pos.line,
            column: open.pos.column,
        };
        let mut text = String::new();
        let end = loop {
            let c = self.read_raw().ok_or_else(unterminated)?;
            match c.ch {
                '"' => break c.end,
                '\\' => {
                    let escaped = self.read_raw().ok_or_else(unterminated)?;
                    text.push(match escaped.ch {
                        'n' => '\n',
                        't' => '\t',
                        'b' => '\u{8}',
                        other => other,
                    });
                }
                other => text.push(other),
            }
            if text.chars().count() >= self.limits.max_lexeme_len {
                return Err(LexError::LexemeTooLong {
                    line: open.pos.line,
                    column: open.pos.column,
                    limit: self.limits.max_lexeme_len,
                });
            }
        };

        expand_all(&mut text, self.env, self.limits.max_env_rounds)
            .map_err(|failure| env_error(failure, open.pos))?;
        if text.chars().count() >= self.limits.max_lexeme_len {
            return Err(LexError::LexemeTooLong {
                line: open.pos.line,
                column: open.pos.column,
                limit: self.limits.max_lexeme_len,
            });
        }

        Ok(spanned(Token::QuotedString(text.clone()), text, open, end))
    }

    fn skip_block_comment(&mut self, open: Located) -> Result<()> {
        let mut prev = '\0';
        loop {
            let c = self.read_raw().ok_or(LexError::UnterminatedComment {
                line: open.pos.line,
                column: open.pos.column,
            })?;
            if prev == '*' && c.ch == '/' {
                return Ok(());
            }
            prev = c.ch;
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.read_raw() {
            if c.ch == '\n' {
                break;
            }
        }
    }

    /// Gather a run of word characters and classify it.
    fn word(&mut self, first: Located, scope: &dyn SymbolScope) -> Result<SpannedToken> {
        let mut text = String::from(first.ch);
        let mut end = first.end;
        loop {
            match self.read()? {
                Some(c) if continues_word(&text, c.ch) => {
                    text.push(c.ch);
                    end = c.end;
                    if text.len() > self.limits.max_lexeme_len {
                        return Err(LexError::LexemeTooLong {
                            line: first.pos.line,
                            column: first.pos.column,
                            limit: self.limits.max_lexeme_len,
                        });
                    }
                }
                Some(c) => {
                    self.putback(c)?;
                    break;
                }
                None => break,
            }
        }

        let token = match Word::classify(&text) {
            Some(Word::Int) => {
                self.need_number = false;
                match text.parse::<i64>() {
                    Ok(i) => Token::Integer(i),
                    Err(_) => Token::Float(text.parse::<f64>().unwrap_or(f64::NAN)),
                }
            }
            Some(Word::Float) => {
                self.need_number = false;
                Token::Float(text.parse::<f64>().unwrap_or(f64::NAN))
            }
            None => {
                if let Some((op, value)) = fortran_threshold(&text) {
                    self.need_number = false;
                    Token::FortranThreshold(op, value)
                } else if is_identifier(&text) {
                    self.classify_identifier(&text, scope)
                } else {
                    return Err(LexError::BadLexeme {
                        text,
                        line: first.pos.line,
                        column: first.pos.column,
                    });
                }
            }
        };

        Ok(spanned(token, text, first, end))
    }

    fn classify_identifier(&mut self, text: &str, scope: &dyn SymbolScope) -> Token {
        if text == "print" {
            return Token::Print;
        }
        if self.is_lhs {
            return Token::Identifier(text.to_string());
        }
        match text {
            "true" | "TRUE" => return Token::Boolean(true),
            "false" | "FALSE" => return Token::Boolean(false),
            "NA" => return Token::Na,
            _ => {}
        }
        if let Some(op) = CompareOp::from_abbr(text) {
            self.need_number = true;
            return Token::Comparison(op);
        }

        self.need_number = false;
        if let Some(index) = scope.builtin(text) {
            return Token::Builtin(index);
        }
        if let Some(slot) = scope.local_var(text) {
            return Token::LocalVar(slot);
        }
        if let Some(constant) = scope.constant(text) {
            return match constant {
                Constant::Int(i) => Token::Integer(i),
                Constant::Float(d) => Token::Float(d),
            };
        }
        if scope.is_user_function(text) {
            return Token::UserFunction(text.to_string());
        }
        if let Some((kind, value)) = PercentileKind::split_prefixed(text) {
            return Token::PercThreshold(kind, value);
        }
        Token::Identifier(text.to_string())
    }
}

fn spanned(token: Token, text: String, first: Located, end: usize) -> SpannedToken {
    SpannedToken {
        token,
        text,
        span: Span::new(first.pos.offset, end, first.pos.line, first.pos.column),
    }
}

fn env_error(failure: EnvFailure, pos: Pos) -> LexError {
    match failure {
        EnvFailure::Undefined(name) => LexError::UndefinedEnv {
            name,
            line: pos.line,
            column: pos.column,
        },
        EnvFailure::Unterminated => LexError::BadEnvReference {
            line: pos.line,
            column: pos.column,
        },
    }
}

fn starts_word(c: char, need_number: bool) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || (c == '-' && need_number)
}

/// A sign continues a lexeme only as the sign of an exponent (`1.5e-3`).
fn continues_word(text: &str, c: char) -> bool {
    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
        return true;
    }
    if c != '+' && c != '-' {
        return false;
    }
    match text.strip_suffix(['e', 'E']) {
        Some(mantissa) => is_number(numeric_tail(mantissa)),
        None => false,
    }
}

/// The part of a lexeme that should be numeric, after any threshold prefix.
fn numeric_tail(text: &str) -> &str {
    if let Some(rest) = text.get(2..) {
        if text.get(..2).and_then(CompareOp::from_abbr).is_some() && is_number(rest) {
            return rest;
        }
    }
    match strip_percentile_prefix(text) {
        Some((_, rest)) => rest,
        None => text,
    }
}

/// `le150` style threshold: two-letter operator immediately followed by a number.
fn fortran_threshold(text: &str) -> Option<(CompareOp, f64)> {
    let op = CompareOp::from_abbr(text.get(..2)?)?;
    let value = parse_number(text.get(2..)?)?;
    Some((op, value))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
