//! Identifier classification seam between the lexer and the parser.

/// Numeric value of a previously defined dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
}

/// Answers the questions the lexer asks about a bare word.
///
/// The parser implements this over its dictionary stack and current mode.
pub trait SymbolScope {
    /// Index of a builtin function with this name.
    fn builtin(&self, name: &str) -> Option<usize>;

    /// Slot of a parameter of the function currently being defined.
    fn local_var(&self, name: &str) -> Option<usize>;

    /// Value of a numeric entry already stored under this name.
    fn constant(&self, name: &str) -> Option<Constant>;

    /// Whether a user function is stored under this name.
    fn is_user_function(&self, name: &str) -> bool;
}

/// Scope that knows no names at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbols;

impl SymbolScope for NoSymbols {
    fn builtin(&self, _name: &str) -> Option<usize> {
        None
    }

    fn local_var(&self, _name: &str) -> Option<usize> {
        None
    }

    fn constant(&self, _name: &str) -> Option<Constant> {
        None
    }

    fn is_user_function(&self, _name: &str) -> bool {
        false
    }
}
