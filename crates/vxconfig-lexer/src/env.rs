//! Environment-variable substitution.

use std::collections::HashMap;

/// Source of environment variable values for `${NAME}` references.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Outcome of one substitution pass that could not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFailure {
    /// Referenced variable is not set
    Undefined(String),
    /// `${` without a closing `}`
    Unterminated,
}

/// Replace the first `${NAME}` in `text`.
///
/// Returns `Ok(true)` if a substitution was made and `Ok(false)` if the text
/// contains no reference.
pub fn replace_env(text: &mut String, env: &dyn EnvSource) -> Result<bool, EnvFailure> {
    let Some(start) = text.find("${") else {
        return Ok(false);
    };
    let Some(len) = text[start + 2..].find('}') else {
        return Err(EnvFailure::Unterminated);
    };
    let name = &text[start + 2..start + 2 + len];
    let value = env
        .var(name)
        .ok_or_else(|| EnvFailure::Undefined(name.to_string()))?;
    text.replace_range(start..start + 2 + len + 1, &value);
    Ok(true)
}

/// Substitute every reference, including ones introduced by substituted
/// values, giving up after `max_rounds` passes.
pub(crate) fn expand_all(
    text: &mut String,
    env: &dyn EnvSource,
    max_rounds: usize,
) -> Result<(), EnvFailure> {
    for _ in 0..max_rounds {
        if !replace_env(text, env)? {
            return Ok(());
        }
    }
    Err(EnvFailure::Unterminated)
}
