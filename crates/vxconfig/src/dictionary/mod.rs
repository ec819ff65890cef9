//! Typed symbol table
//!
//! A [`Dictionary`] is an ordered list of named, typed entries. Arrays are
//! dictionaries flagged `is_array` whose entries are unnamed and indexed by
//! position.
//!
//! # Design
//!
//! Dictionaries own their children and hold no back-reference to their
//! parent. Name resolution through enclosing scopes goes through a
//! [`DictView`], a borrowed chain from the innermost dictionary outward,
//! built on demand while descending.

mod dump;
mod lookup;
mod stack;
mod view;

pub use lookup::{Lookup, Lookups};
pub use stack::DictionaryStack;
pub use view::DictView;

use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use vxconfig_vm::{Number, UserFunction};

use crate::pwl::PiecewiseLinear;
use crate::threshold::SingleThresh;

/// Value of a dictionary entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
    Threshold(SingleThresh),
    PiecewiseLinear(PiecewiseLinear),
    Dict(Dictionary),
    /// A dictionary flagged as an array
    Array(Dictionary),
    UserFunction(Arc<UserFunction>),
}

impl EntryValue {
    /// Name of the value's type, as used in lookup errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            EntryValue::Int(_) => "integer",
            EntryValue::Double(_) => "double",
            EntryValue::Bool(_) => "boolean",
            EntryValue::String(_) => "string",
            EntryValue::Threshold(_) => "threshold",
            EntryValue::PiecewiseLinear(_) => "piecewise linear function",
            EntryValue::Dict(_) => "dictionary",
            EntryValue::Array(_) => "array",
            EntryValue::UserFunction(_) => "user function",
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            EntryValue::Int(i) => Some(Number::Int(*i)),
            EntryValue::Double(d) => Some(Number::Double(*d)),
            _ => None,
        }
    }

    /// The nested dictionary of a dictionary or array entry.
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            EntryValue::Dict(d) | EntryValue::Array(d) => Some(d),
            _ => None,
        }
    }
}

impl From<Number> for EntryValue {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => EntryValue::Int(i),
            Number::Double(d) => EntryValue::Double(d),
        }
    }
}

/// A named value. Array elements have an empty name.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryEntry {
    pub name: String,
    pub value: EntryValue,
}

impl DictionaryEntry {
    pub fn new(name: impl Into<String>, value: EntryValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn unnamed(value: EntryValue) -> Self {
        Self::new(String::new(), value)
    }

    pub fn kind_name(&self) -> &'static str {
        self.value.kind_name()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
    is_array: bool,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_array() -> Self {
        Self {
            entries: Vec::new(),
            is_array: true,
        }
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DictionaryEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<DictionaryEntry> {
        self.entries
    }

    /// Entry stored directly in this dictionary; parents are not searched.
    pub fn get(&self, name: &str) -> Option<&DictionaryEntry> {
        if self.is_array {
            return None;
        }
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DictionaryEntry> {
        if self.is_array {
            return None;
        }
        self.entries.iter_mut().find(|e| e.name == name)
    }

    /// Positional access, used for arrays.
    pub fn array_element(&self, index: usize) -> Option<&DictionaryEntry> {
        self.entries.get(index)
    }

    /// Add an entry. An existing entry with the same name is replaced, or,
    /// when both are dictionaries, merged into recursively. Arrays always
    /// append.
    pub fn store(&mut self, entry: DictionaryEntry) {
        if self.is_array {
            self.entries.push(DictionaryEntry::unnamed(entry.value));
            return;
        }
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => match (&mut existing.value, entry.value) {
                (EntryValue::Dict(old), EntryValue::Dict(new)) => old.merge(new),
                (slot, value) => *slot = value,
            },
            None => self.entries.push(entry),
        }
    }

    /// Store every entry of `other` into `self`.
    pub fn merge(&mut self, other: Dictionary) {
        for entry in other.entries {
            self.store(entry);
        }
    }

    /// Resolve `name` here and in nested dictionaries (`a.b.c`).
    ///
    /// A dictionary holds no link to its parent, so names are not searched
    /// outward from here; [`Lookups::lookup_dictionary`] returns a view that
    /// keeps the enclosing scopes.
    pub fn lookup(&self, name: &str) -> Option<&DictionaryEntry> {
        self.view().lookup(name)
    }
}

impl Serialize for Dictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_array {
            let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
            for entry in &self.entries {
                seq.serialize_element(&entry.value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.entries.len()))?;
            for entry in &self.entries {
                map.serialize_entry(&entry.name, &entry.value)?;
            }
            map.end()
        }
    }
}

impl Serialize for DictionaryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.value)?;
        map.end()
    }
}

impl Serialize for EntryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EntryValue::Int(i) => serializer.serialize_i64(*i),
            EntryValue::Double(d) => serializer.serialize_f64(*d),
            EntryValue::Bool(b) => serializer.serialize_bool(*b),
            EntryValue::String(s) => serializer.serialize_str(s),
            EntryValue::Threshold(t) => t.serialize(serializer),
            EntryValue::PiecewiseLinear(p) => p.serialize(serializer),
            EntryValue::Dict(d) | EntryValue::Array(d) => d.serialize(serializer),
            EntryValue::UserFunction(f) => {
                serializer.serialize_str(&format!("user function ({} args)", f.n_args))
            }
        }
    }
}
