//! Syntax error diagnostics.

use std::fmt;

use vxconfig_lexer::{Span, SpannedToken};

/// A token the grammar can't accept, with enough context to point at it.
///
/// `Display` renders the offending source line underlined with `^` under
/// the token.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    /// File name, or `config` for text parsed from a string
    pub file: String,
    pub line: u32,
    pub column: u32,
    /// Source text of the offending token; empty at end of input
    pub text: String,
    pub source_line: String,
    /// Token location; `None` at end of input
    pub span: Option<Span>,
    /// What the parser was looking for
    pub message: String,
}

impl SyntaxError {
    /// Error at `token`, or at end of input when there is none.
    pub fn at(
        file: &str,
        source: &str,
        token: Option<&SpannedToken>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let Some(token) = token else {
            return Self::at_end(file, source, message);
        };
        let span = token.span;
        let text: String = source
            .chars()
            .skip(span.start)
            .take(span.end.saturating_sub(span.start))
            .collect();
        Self {
            file: file.to_string(),
            line: span.line,
            column: span.column,
            text,
            source_line: nth_line(source, span.line),
            span: Some(span),
            message,
        }
    }

    fn at_end(file: &str, source: &str, message: String) -> Self {
        let line = source.lines().count().max(1);
        let source_line = source.lines().last().unwrap_or_default().to_string();
        Self {
            file: file.to_string(),
            line: line as u32,
            column: source_line.chars().count() as u32 + 1,
            text: String::new(),
            source_line,
            span: None,
            message,
        }
    }

    /// `^` under the token, `_` under every other character of the line.
    pub fn marker(&self) -> String {
        let (first, len) = match self.span {
            Some(span) => (self.column as usize, span.len().max(1)),
            None => (0, 0),
        };
        (1..=self.source_line.chars().count())
            .map(|col| if col >= first && col < first + len { '^' } else { '_' })
            .collect()
    }
}

fn nth_line(source: &str, line: u32) -> String {
    source
        .lines()
        .nth((line as usize).saturating_sub(1))
        .unwrap_or_default()
        .to_string()
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "syntax error in file \"{}\"\n\n   line   = {}\n\n   column = {}\n\n   text   = \"{}\"\n\n{}\n{}",
            self.file,
            self.line,
            self.column,
            self.text,
            self.source_line,
            self.marker()
        )
    }
}

impl std::error::Error for SyntaxError {}

#[cfg(test)]
mod tests {
    use super::*;
    use vxconfig_lexer::Token;

    fn token(start: usize, end: usize, line: u32, column: u32) -> SpannedToken {
        SpannedToken {
            token: Token::Semicolon,
            text: String::new(),
            span: Span::new(start, end, line, column),
        }
    }

    #[test]
    fn test_caret_under_token() {
        let source = "a = 1;\nb = 2 3;\n";
        let err = SyntaxError::at("test.conf", source, Some(&token(13, 14, 2, 7)), "expected `;`");
        assert_eq!(err.text, "3");
        assert_eq!(err.marker(), "______^_");
        assert_eq!(
            err.to_string(),
            "syntax error in file \"test.conf\"\n\n   line   = 2\n\n   column = 7\n\n   text   = \"3\"\n\nb = 2 3;\n______^_"
        );
    }

    #[test]
    fn test_multi_char_token() {
        let source = "x = foo bar;";
        let err = SyntaxError::at("config", source, Some(&token(8, 11, 1, 9)), "");
        assert_eq!(err.text, "bar");
        assert_eq!(err.marker(), "________^^^_");
    }

    #[test]
    fn test_end_of_input() {
        let err = SyntaxError::at("config", "x = (1 + 2", None, "expected `)`");
        assert_eq!(err.text, "");
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 11);
        assert!(!err.marker().contains('^'));
        assert_eq!(err.marker().len(), 10);
    }
}
