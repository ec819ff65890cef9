use tracing::trace;

use crate::error::{EngineError, Result};

use super::{DictView, Dictionary, DictionaryEntry, EntryValue};

/// Scopes opened while parsing nested `{ }` blocks. The bottom frame is the
/// top-level dictionary and is never popped.
#[derive(Debug, Clone)]
pub struct DictionaryStack {
    frames: Vec<Dictionary>,
    max_depth: usize,
}

impl DictionaryStack {
    pub fn new(base: Dictionary, max_depth: usize) -> Self {
        Self {
            frames: vec![base],
            max_depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Open a new scope.
    pub fn push(&mut self) -> Result<()> {
        if self.frames.len() >= self.max_depth {
            return Err(EngineError::DictionaryDepth(self.max_depth));
        }
        self.frames.push(Dictionary::new());
        trace!(depth = self.frames.len(), "opened scope");
        Ok(())
    }

    /// Close the innermost scope and hand it back; `None` at the bottom.
    pub fn pop(&mut self) -> Option<Dictionary> {
        if self.frames.len() < 2 {
            return None;
        }
        self.frames.pop()
    }

    /// Close the innermost scope and store it under `name` in the enclosing
    /// one, merging with a dictionary already stored there.
    pub fn pop_dict(&mut self, name: &str) -> Result<()> {
        let dict = self.pop().ok_or_else(|| EngineError::NotFound(name.to_string()))?;
        self.store(DictionaryEntry::new(name, EntryValue::Dict(dict)));
        Ok(())
    }

    /// Store into the innermost scope.
    pub fn store(&mut self, entry: DictionaryEntry) {
        trace!(name = %entry.name, kind = entry.kind_name(), "store");
        if let Some(top) = self.frames.last_mut() {
            top.store(entry);
        }
    }

    pub fn top(&self) -> Option<&Dictionary> {
        self.frames.last()
    }

    /// All open scopes, innermost first.
    pub fn view(&self) -> DictView<'_> {
        DictView::from_chain(self.frames.iter().rev().collect())
    }

    pub fn lookup(&self, name: &str) -> Option<&DictionaryEntry> {
        self.view().lookup(name)
    }

    /// Give back the bottom frame. Unclosed scopes are discarded.
    pub fn into_base(mut self) -> Dictionary {
        self.frames.truncate(1);
        self.frames.pop().unwrap_or_default()
    }
}
