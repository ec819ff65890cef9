//! Parser state threaded through every grammar action.

use std::io::Write;
use std::sync::Arc;

use indexmap::IndexSet;
use vxconfig_lexer::{Constant, LexLimits, SymbolScope};
use vxconfig_vm::{IcodeCell, IcodeVector, Machine, Number, UserFunction};

use crate::dictionary::{Dictionary, DictionaryEntry, DictionaryStack, EntryValue};
use crate::error::Result;
use crate::threshold::SingleThresh;

/// Tunable limits of one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    /// Longest identifier, number or string
    pub max_lexeme_len: usize,
    /// Most parameters a user function may declare
    pub max_function_args: usize,
    /// Deepest nesting of `{ }` blocks, counting the top level
    pub max_dictionary_depth: usize,
    /// Characters the lexer may push back
    pub max_putback: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_lexeme_len: 512,
            max_function_args: 10,
            max_dictionary_depth: 50,
            max_putback: 10,
        }
    }
}

impl ParserLimits {
    pub fn lex_limits(&self) -> LexLimits {
        LexLimits {
            max_lexeme_len: self.max_lexeme_len,
            max_putback: self.max_putback,
            ..LexLimits::default()
        }
    }
}

/// A user function whose body is being compiled.
#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    pub name: String,
    /// Parameter names; the index is the local slot
    pub params: IndexSet<String>,
}

/// Whether expressions are evaluated as soon as they are parsed or
/// compiled into a function body.
#[derive(Debug, Clone, Default)]
pub enum ParserMode {
    #[default]
    Immediate,
    DeferredInto(FunctionBuilder),
}

/// Function named at a call site.
#[derive(Debug, Clone)]
pub enum CallTarget {
    Builtin(usize),
    User(Arc<UserFunction>),
}

impl CallTarget {
    pub fn name(&self) -> String {
        match self {
            CallTarget::Builtin(index) => vxconfig_builtins::by_index(*index)
                .map_or_else(|| format!("builtin #{index}"), |b| b.name.to_string()),
            CallTarget::User(f) => f.name.clone(),
        }
    }

    pub fn arity(&self) -> Option<usize> {
        match self {
            CallTarget::Builtin(index) => vxconfig_builtins::by_index(*index).map(|b| b.arity()),
            CallTarget::User(f) => Some(f.n_args),
        }
    }

    pub fn cell(&self) -> IcodeCell {
        match self {
            CallTarget::Builtin(index) => IcodeCell::BuiltinCall(*index),
            CallTarget::User(f) => IcodeCell::UserFunctionCall(Arc::clone(f)),
        }
    }
}

/// One element of an array literal, before evaluation.
#[derive(Debug, Clone)]
pub enum ArrayElement {
    Icode(IcodeVector),
    Threshold(SingleThresh),
    Dict(Dictionary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Bool,
    String,
    Number,
    Threshold,
    Dict,
}

impl ElementKind {
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Bool => "boolean",
            ElementKind::String => "string",
            ElementKind::Number => "number",
            ElementKind::Threshold => "threshold",
            ElementKind::Dict => "dictionary",
        }
    }
}

impl ArrayElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            ArrayElement::Icode(code) => match code.as_single() {
                Some(IcodeCell::Boolean(_)) => ElementKind::Bool,
                Some(IcodeCell::StringLiteral(_)) => ElementKind::String,
                _ => ElementKind::Number,
            },
            ArrayElement::Threshold(_) => ElementKind::Threshold,
            ArrayElement::Dict(_) => ElementKind::Dict,
        }
    }
}

/// Elements of an array literal. All elements share one kind.
#[derive(Debug, Clone, Default)]
pub struct ArrayBuilder {
    elements: Vec<ArrayElement>,
    kind: Option<ElementKind>,
}

impl ArrayBuilder {
    /// Add an element; on a kind mismatch the element is handed back with
    /// the kind the array already has.
    pub fn push(
        &mut self,
        element: ArrayElement,
    ) -> std::result::Result<(), (ArrayElement, ElementKind)> {
        let kind = element.kind();
        match self.kind {
            Some(existing) if existing != kind => return Err((element, existing)),
            _ => self.kind = Some(kind),
        }
        self.elements.push(element);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Evaluate the elements into an array dictionary.
    pub fn finish(self, machine: &mut Machine) -> Result<Dictionary> {
        let mut array = Dictionary::new_array();
        for element in self.elements {
            let value = match element {
                ArrayElement::Icode(code) => match code.as_single() {
                    Some(IcodeCell::Boolean(b)) => EntryValue::Bool(*b),
                    Some(IcodeCell::StringLiteral(s)) => EntryValue::String(s.clone()),
                    _ => EntryValue::from(machine.eval(&code, &[])?),
                },
                ArrayElement::Threshold(t) => EntryValue::Threshold(t),
                ArrayElement::Dict(d) => EntryValue::Dict(d),
            };
            array.store(DictionaryEntry::unnamed(value));
        }
        Ok(array)
    }
}

/// An open list construct, innermost last on the pending stack.
#[derive(Debug, Clone)]
pub enum PendingContext {
    Array(ArrayBuilder),
    Call {
        target: CallTarget,
        args: Vec<IcodeVector>,
    },
    Points(Vec<(f64, f64)>),
}

/// Everything a parse mutates.
pub struct ParserContext<'a> {
    pub dicts: DictionaryStack,
    pub mode: ParserMode,
    pub pending: Vec<PendingContext>,
    pub machine: Machine,
    pub limits: ParserLimits,
    pub output: &'a mut dyn Write,
}

impl<'a> ParserContext<'a> {
    pub fn new(base: Dictionary, limits: ParserLimits, output: &'a mut dyn Write) -> Self {
        Self {
            dicts: DictionaryStack::new(base, limits.max_dictionary_depth),
            mode: ParserMode::Immediate,
            pending: Vec::new(),
            machine: Machine::new(),
            limits,
            output,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.mode, ParserMode::DeferredInto(_))
    }

    /// Evaluate `code` now, unless a function body is being compiled.
    pub fn fold(&mut self, code: IcodeVector) -> Result<IcodeVector> {
        if self.is_deferred() {
            return Ok(code);
        }
        let value: Number = self.machine.eval(&code, &[])?;
        Ok(IcodeVector::single(IcodeCell::number(value)))
    }

    pub fn user_function(&self, name: &str) -> Option<Arc<UserFunction>> {
        match self.dicts.lookup(name).map(|e| &e.value) {
            Some(EntryValue::UserFunction(f)) => Some(Arc::clone(f)),
            _ => None,
        }
    }
}

impl SymbolScope for ParserContext<'_> {
    fn builtin(&self, name: &str) -> Option<usize> {
        vxconfig_builtins::is_builtin(name)
    }

    fn local_var(&self, name: &str) -> Option<usize> {
        match &self.mode {
            ParserMode::DeferredInto(builder) => builder.params.get_index_of(name),
            ParserMode::Immediate => None,
        }
    }

    fn constant(&self, name: &str) -> Option<Constant> {
        match self.dicts.lookup(name).map(|e| &e.value) {
            Some(EntryValue::Int(i)) => Some(Constant::Int(*i)),
            Some(EntryValue::Double(d)) => Some(Constant::Float(*d)),
            _ => None,
        }
    }

    fn is_user_function(&self, name: &str) -> bool {
        self.user_function(name).is_some()
    }
}
