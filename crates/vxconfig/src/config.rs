//! Layered configuration loading.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use tracing::{info, instrument};
use vxconfig_lexer::{EnvSource, ProcessEnv};
use vxconfig_vm::{EvalError, Machine, Number};

use crate::dictionary::{DictView, Dictionary, Lookup, Lookups};
use crate::error::{EngineError, Result};
use crate::parser::{self, ParserLimits};

/// A top-level dictionary built from one or more sources.
///
/// Each source is parsed on top of what is already loaded: a later source
/// overrides scalar entries of an earlier one and merges into dictionaries
/// of the same name. A source that fails to load leaves the configuration
/// unchanged.
///
/// ```
/// use vxconfig::{Config, Lookup, Lookups};
///
/// let mut config = Config::new();
/// config.read_string("defaults", "obs = { n = 1; m = 2; };").unwrap();
/// config.read_string("user", "obs = { m = 5; };").unwrap();
/// assert_eq!(config.lookup_int("obs.n", Lookup::Required).unwrap(), Some(1));
/// assert_eq!(config.lookup_int("obs.m", Lookup::Required).unwrap(), Some(5));
/// ```
pub struct Config {
    dict: Dictionary,
    env: Box<dyn EnvSource>,
    limits: ParserLimits,
    output: Box<dyn Write>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("dict", &self.dict)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Empty configuration reading the process environment and printing to
    /// stdout.
    pub fn new() -> Self {
        Self {
            dict: Dictionary::new(),
            env: Box::new(ProcessEnv),
            limits: ParserLimits::default(),
            output: Box::new(io::stdout()),
        }
    }

    /// Source of `${NAME}` values.
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn with_limits(mut self, limits: ParserLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sink for `print` statements.
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Load a configuration file.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn read(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load(&path.display().to_string(), &text)
    }

    /// Load configuration text. `name` stands in for the file name in
    /// diagnostics and `print` output.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub fn read_string(&mut self, name: &str, text: &str) -> Result<()> {
        self.load(name, text)
    }

    fn load(&mut self, name: &str, text: &str) -> Result<()> {
        let dict = parser::parse(
            name,
            text,
            self.dict.clone(),
            &*self.env,
            self.limits,
            &mut *self.output,
        )?;
        info!(source = name, entries = dict.len(), "loaded config");
        self.dict = dict;
        Ok(())
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    pub fn into_dictionary(self) -> Dictionary {
        self.dict
    }

    pub fn limits(&self) -> ParserLimits {
        self.limits
    }

    /// Run the user function `name` with `args`.
    pub fn call(&self, name: &str, args: &[Number]) -> Result<Number> {
        let function = self
            .lookup_user_function(name, Lookup::Required)?
            .ok_or_else(|| EngineError::NotFound(name.to_string()))?;
        if function.n_args != args.len() {
            return Err(EvalError::WrongArgCount {
                name: name.to_string(),
                expected: function.n_args,
                found: args.len(),
            }
            .into());
        }
        Ok(Machine::new().call(&function, args)?)
    }
}

impl Lookups for Config {
    fn view(&self) -> DictView<'_> {
        DictView::new(&self.dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// `Write` handle onto a buffer the test keeps.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_load_leaves_config_unchanged() {
        let mut config = Config::new();
        config.read_string("a", "x = 1;").unwrap();
        assert!(config.read_string("b", "x = 2; y = ;").is_err());
        assert_eq!(config.lookup_int("x", Lookup::Required).unwrap(), Some(1));
        assert_eq!(config.lookup_int("y", Lookup::Optional).unwrap(), None);
    }

    #[test]
    fn test_later_source_overrides() {
        let mut config = Config::new();
        config.read_string("defaults", "n = 1; s = \"a\";").unwrap();
        config.read_string("user", "n = 2;").unwrap();
        assert_eq!(config.lookup_int("n", Lookup::Required).unwrap(), Some(2));
        assert_eq!(config.lookup_string("s", Lookup::Required).unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn test_later_source_sees_earlier_constants() {
        let mut config = Config::new();
        config.read_string("defaults", "base = 10;").unwrap();
        config.read_string("user", "twice = base * 2;").unwrap();
        assert_eq!(config.lookup_int("twice", Lookup::Required).unwrap(), Some(20));
    }

    #[test]
    fn test_env_and_output_hooks() {
        let env: HashMap<String, String> = [("N".to_string(), "3".to_string())].into();
        let out = SharedBuf::default();
        let mut config = Config::new().with_env(env).with_output(out.clone());
        config.read_string("cfg", "n = ${N}; print n + 1;").unwrap();
        assert_eq!(config.lookup_int("n", Lookup::Required).unwrap(), Some(3));
        assert_eq!(String::from_utf8(out.0.lock().unwrap().clone()).unwrap(), "cfg: 4\n");
    }

    #[test]
    fn test_call_user_function() {
        let mut config = Config::new();
        config.read_string("config", "f(a, b) = a * a + b;").unwrap();
        assert_eq!(config.call("f", &[Number::Int(3), Number::Int(4)]).unwrap(), Number::Int(13));
        assert!(matches!(
            config.call("f", &[Number::Int(3)]),
            Err(EngineError::Eval(EvalError::WrongArgCount { expected: 2, found: 1, .. }))
        ));
        assert!(matches!(config.call("g", &[]), Err(EngineError::NotFound(_))));
    }

    #[test]
    fn test_missing_file() {
        let mut config = Config::new();
        assert!(matches!(
            config.read("/nonexistent/vxconfig/test.conf"),
            Err(EngineError::Io { .. })
        ));
    }
}
