//! Classification of a completed lexeme.
//!
//! The scanner gathers a run of digits, letters, underscores, dots and
//! exponent signs into one lexeme; logos decides whether that run is an
//! integer or a floating point literal. Anything else is an identifier
//! candidate, handled by the scanner.

use logos::Logos;

/// Numeric shape of a lexeme.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Word {
    /// Optionally signed run of digits
    #[regex(r"[+-]?[0-9]+")]
    Int,

    /// Decimal with a dot and/or an exponent; at least one mantissa digit
    #[regex(r"[+-]?([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?")]
    #[regex(r"[+-]?[0-9]+[eE][+-]?[0-9]+")]
    Float,
}

impl Word {
    /// Classify `text` as a whole. Partial matches are rejected.
    pub fn classify(text: &str) -> Option<Word> {
        let mut lex = Word::lexer(text);
        let word = lex.next()?.ok()?;
        if lex.span() != (0..text.len()) {
            return None;
        }
        Some(word)
    }
}

/// True if the whole of `text` is an integer or floating point literal.
pub fn is_number(text: &str) -> bool {
    Word::classify(text).is_some()
}

/// Parse `text` as a number of either shape.
pub fn parse_number(text: &str) -> Option<f64> {
    match Word::classify(text)? {
        Word::Int | Word::Float => text.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_int() {
        assert_eq!(Word::classify("42"), Some(Word::Int));
        assert_eq!(Word::classify("-7"), Some(Word::Int));
        assert_eq!(Word::classify("+7"), Some(Word::Int));
    }

    #[test]
    fn test_classify_float() {
        assert_eq!(Word::classify("1.5"), Some(Word::Float));
        assert_eq!(Word::classify(".5"), Some(Word::Float));
        assert_eq!(Word::classify("3."), Some(Word::Float));
        assert_eq!(Word::classify("1e10"), Some(Word::Float));
        assert_eq!(Word::classify("-2.5E-3"), Some(Word::Float));
    }

    #[test]
    fn test_classify_rejects() {
        assert_eq!(Word::classify("."), None);
        assert_eq!(Word::classify("1.2.3"), None);
        assert_eq!(Word::classify("abc"), None);
        assert_eq!(Word::classify("12abc"), None);
        assert_eq!(Word::classify(""), None);
        assert_eq!(Word::classify("1e"), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("150"), Some(150.0));
        assert_eq!(parse_number("0.25"), Some(0.25));
        assert_eq!(parse_number("x"), None);
    }
}
