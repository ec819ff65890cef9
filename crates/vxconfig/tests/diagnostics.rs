//! Error reporting tests.
//!
//! Syntax errors must reproduce the legacy diagnostic: file, line, column,
//! token text, then the source line underlined with `^` under the token.

use vxconfig::{Config, EngineError, SyntaxError};

/// Load `source` as a string and return the error it must produce.
fn expect_error(source: &str) -> EngineError {
    let mut config = Config::new();
    match config.read_string("config", source) {
        Ok(()) => panic!("Expected an error, but loading succeeded"),
        Err(err) => err,
    }
}

fn expect_syntax_error(source: &str) -> SyntaxError {
    match expect_error(source) {
        EngineError::Syntax(err) => err,
        other => panic!("Expected a syntax error, got: {other:?}"),
    }
}

// =============================================================================
// Caret Diagnostics
// =============================================================================

#[test]
fn test_caret_format_exact() {
    let err = expect_syntax_error("a = 1;\nb = 2 3;\n");
    assert_eq!(
        err.to_string(),
        "syntax error in file \"config\"\n\n   line   = 2\n\n   column = 7\n\n   text   = \"3\"\n\nb = 2 3;\n______^_"
    );
}

#[test]
fn test_marker_spans_whole_token() {
    let err = expect_syntax_error("value = 10 other;");
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 12);
    assert_eq!(err.text, "other");
    assert_eq!(err.source_line, "value = 10 other;");
    assert_eq!(err.marker(), "___________^^^^^_");
}

#[test]
fn test_file_name_in_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.conf");
    std::fs::write(&path, "x = [1, 2;\n").unwrap();

    let mut config = Config::new();
    let err = config.read(&path).unwrap_err();
    let EngineError::Syntax(err) = err else {
        panic!("Expected a syntax error, got: {err:?}");
    };
    assert_eq!(err.file, path.display().to_string());
    assert_eq!(err.text, ";");
}

#[test]
fn test_unexpected_end_of_input() {
    let err = expect_syntax_error("x = (1 + 2");
    assert_eq!(err.text, "");
    assert!(err.span.is_none());
    assert!(!err.marker().contains('^'));
}

#[test]
fn test_statement_must_start_with_name() {
    let err = expect_syntax_error("= 5;");
    assert_eq!(err.column, 1);
    assert_eq!(err.text, "=");
}

#[test]
fn test_unclosed_dictionary() {
    let err = expect_syntax_error("d = {\n  a = 1;\n");
    assert!(err.message.contains("end of input"), "got: {}", err.message);
}

// =============================================================================
// Semantic Errors
// =============================================================================

#[test]
fn test_undefined_identifier() {
    assert!(matches!(
        expect_error("x = y * 2;"),
        EngineError::UndefinedIdentifier(name) if name == "y"
    ));
}

#[test]
fn test_builtin_redefinition() {
    assert!(matches!(
        expect_error("sqrt(x) = x;"),
        EngineError::BuiltinRedefinition(name) if name == "sqrt"
    ));
}

#[test]
fn test_percentile_out_of_range() {
    assert!(matches!(
        expect_error("t = >SFP101;"),
        EngineError::Threshold(_)
    ));
}

#[test]
fn test_lexical_errors() {
    assert!(matches!(expect_error("s = \"no end;"), EngineError::Lex { .. }));
    assert!(matches!(expect_error("/* open comment\nx = 1;"), EngineError::Lex { .. }));
}

#[test]
fn test_errors_display_one_line_summary() {
    let err = expect_error("f(a) = a; x = f(1, 2);");
    assert_eq!(
        err.to_string(),
        "function \"f\" takes 1 argument(s), got 2"
    );
}
