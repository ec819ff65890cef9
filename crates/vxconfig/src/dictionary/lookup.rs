//! Typed lookups by plain or dotted name.

use std::sync::Arc;

use vxconfig_vm::UserFunction;

use crate::error::{EngineError, Result};
use crate::pwl::PiecewiseLinear;
use crate::threshold::{SingleThresh, ThreshArray};

use super::{DictView, Dictionary, DictionaryEntry, EntryValue};

/// What to do when a name is not defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lookup {
    /// Missing names are an [`EngineError::NotFound`]
    #[default]
    Required,
    /// Missing names give `Ok(None)`
    Optional,
}

fn mismatch(name: &str, expected: &'static str, entry: &EntryValue) -> EngineError {
    EngineError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: entry.kind_name(),
    }
}

fn parse_thresh(text: &str) -> Result<SingleThresh> {
    Ok(text.parse::<SingleThresh>()?)
}

/// Elements of an array entry, or the entry itself as a one-element list.
fn elements<'a>(entry: &'a DictionaryEntry) -> Vec<&'a EntryValue> {
    match &entry.value {
        EntryValue::Array(arr) => arr.iter().map(|e| &e.value).collect(),
        value => vec![value],
    }
}

fn convert_array<'a, T>(
    name: &str,
    entry: &'a DictionaryEntry,
    expected: &'static str,
    convert: impl Fn(&'a EntryValue) -> Option<Result<T>>,
) -> Result<Vec<T>> {
    elements(entry)
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            convert(value).unwrap_or_else(|| Err(mismatch(&format!("{name}[{i}]"), expected, value)))
        })
        .collect()
}

/// Typed accessors over anything that can present a [`DictView`].
///
/// Each accessor returns `Ok(None)` only for a missing name under
/// [`Lookup::Optional`]; a value of the wrong type is always an error.
pub trait Lookups {
    fn view(&self) -> DictView<'_>;

    fn lookup_entry(&self, name: &str, policy: Lookup) -> Result<Option<&DictionaryEntry>> {
        match self.view().lookup(name) {
            Some(entry) => Ok(Some(entry)),
            None if policy == Lookup::Optional => Ok(None),
            None => Err(EngineError::NotFound(name.to_string())),
        }
    }

    fn lookup_int(&self, name: &str, policy: Lookup) -> Result<Option<i64>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        match &entry.value {
            EntryValue::Int(i) => Ok(Some(*i)),
            other => Err(mismatch(name, "integer", other)),
        }
    }

    /// Integers are widened.
    fn lookup_double(&self, name: &str, policy: Lookup) -> Result<Option<f64>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        match &entry.value {
            EntryValue::Double(d) => Ok(Some(*d)),
            EntryValue::Int(i) => Ok(Some(*i as f64)),
            other => Err(mismatch(name, "double", other)),
        }
    }

    fn lookup_bool(&self, name: &str, policy: Lookup) -> Result<Option<bool>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        match &entry.value {
            EntryValue::Bool(b) => Ok(Some(*b)),
            other => Err(mismatch(name, "boolean", other)),
        }
    }

    fn lookup_string(&self, name: &str, policy: Lookup) -> Result<Option<String>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        match &entry.value {
            EntryValue::String(s) => Ok(Some(s.clone())),
            other => Err(mismatch(name, "string", other)),
        }
    }

    /// A string entry is parsed as threshold text.
    fn lookup_thresh(&self, name: &str, policy: Lookup) -> Result<Option<SingleThresh>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        match &entry.value {
            EntryValue::Threshold(t) => Ok(Some(t.clone())),
            EntryValue::String(s) => parse_thresh(s).map(Some),
            other => Err(mismatch(name, "threshold", other)),
        }
    }

    /// Entry together with the view of the scope that holds it.
    fn lookup_scoped(
        &self,
        name: &str,
        policy: Lookup,
    ) -> Result<Option<(DictView<'_>, &DictionaryEntry)>> {
        match self.view().resolve(name) {
            Some(found) => Ok(Some(found)),
            None if policy == Lookup::Optional => Ok(None),
            None => Err(EngineError::NotFound(name.to_string())),
        }
    }

    /// The returned view keeps the enclosing scopes, so names it does not
    /// hold are resolved outward.
    fn lookup_dictionary(&self, name: &str, policy: Lookup) -> Result<Option<DictView<'_>>> {
        let Some((scope, entry)) = self.lookup_scoped(name, policy)? else {
            return Ok(None);
        };
        match &entry.value {
            EntryValue::Dict(d) => Ok(Some(scope.child(d))),
            other => Err(mismatch(name, "dictionary", other)),
        }
    }

    fn lookup_array(&self, name: &str, policy: Lookup) -> Result<Option<&Dictionary>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        match &entry.value {
            EntryValue::Array(d) => Ok(Some(d)),
            other => Err(mismatch(name, "array", other)),
        }
    }

    fn lookup_pwl(&self, name: &str, policy: Lookup) -> Result<Option<&PiecewiseLinear>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        match &entry.value {
            EntryValue::PiecewiseLinear(p) => Ok(Some(p)),
            other => Err(mismatch(name, "piecewise linear function", other)),
        }
    }

    fn lookup_user_function(
        &self,
        name: &str,
        policy: Lookup,
    ) -> Result<Option<Arc<UserFunction>>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        match &entry.value {
            EntryValue::UserFunction(f) => Ok(Some(Arc::clone(f))),
            other => Err(mismatch(name, "user function", other)),
        }
    }

    fn lookup_int_array(&self, name: &str, policy: Lookup) -> Result<Option<Vec<i64>>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        convert_array(name, entry, "integer", |v| match v {
            EntryValue::Int(i) => Some(Ok(*i)),
            _ => None,
        })
        .map(Some)
    }

    fn lookup_double_array(&self, name: &str, policy: Lookup) -> Result<Option<Vec<f64>>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        convert_array(name, entry, "double", |v| match v {
            EntryValue::Double(d) => Some(Ok(*d)),
            EntryValue::Int(i) => Some(Ok(*i as f64)),
            _ => None,
        })
        .map(Some)
    }

    fn lookup_bool_array(&self, name: &str, policy: Lookup) -> Result<Option<Vec<bool>>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        convert_array(name, entry, "boolean", |v| match v {
            EntryValue::Bool(b) => Some(Ok(*b)),
            _ => None,
        })
        .map(Some)
    }

    fn lookup_string_array(&self, name: &str, policy: Lookup) -> Result<Option<Vec<String>>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        convert_array(name, entry, "string", |v| match v {
            EntryValue::String(s) => Some(Ok(s.clone())),
            _ => None,
        })
        .map(Some)
    }

    fn lookup_thresh_array(&self, name: &str, policy: Lookup) -> Result<Option<ThreshArray>> {
        let Some(entry) = self.lookup_entry(name, policy)? else {
            return Ok(None);
        };
        convert_array(name, entry, "threshold", |v| match v {
            EntryValue::Threshold(t) => Some(Ok(t.clone())),
            EntryValue::String(s) => Some(parse_thresh(s)),
            _ => None,
        })
        .map(|list| Some(ThreshArray::from(list)))
    }

    fn lookup_dictionary_array(
        &self,
        name: &str,
        policy: Lookup,
    ) -> Result<Option<Vec<DictView<'_>>>> {
        let Some((scope, entry)) = self.lookup_scoped(name, policy)? else {
            return Ok(None);
        };
        convert_array(name, entry, "dictionary", |v| match v {
            EntryValue::Dict(d) => Some(Ok(scope.child(d))),
            _ => None,
        })
        .map(Some)
    }
}

impl Lookups for Dictionary {
    fn view(&self) -> DictView<'_> {
        DictView::new(self)
    }
}

impl Lookups for DictView<'_> {
    fn view(&self) -> DictView<'_> {
        self.clone()
    }
}
