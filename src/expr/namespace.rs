use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::expr::EvalError;

/// A caller-provided function callable from expressions by name.
pub type NativeFunction = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Shared evaluation scope for one execution call.
///
/// Free identifiers in expressions resolve against the namespace's fields, and
/// calls resolve against its functions before the built-in whitelist. The
/// namespace belongs to the caller: the engine only borrows it, and never
/// clears or allocates one on the caller's behalf. Native functions that keep
/// their own mutable state must synchronize it themselves if a namespace is
/// shared between threads.
#[derive(Clone, Default)]
pub struct Namespace {
    values: Map<String, Value>,
    functions: HashMap<String, NativeFunction>,
}

impl Namespace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a namespace whose fields are the given map's entries
    #[must_use]
    pub fn from_values(values: Map<String, Value>) -> Self {
        Self {
            values,
            functions: HashMap::new(),
        }
    }

    /// Set a field, returning the previous value if any
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Register a native function, replacing any previous one of that name.
    ///
    /// Namespace functions shadow built-ins of the same name.
    pub fn register_function<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name)
    }
}

impl From<Map<String, Value>> for Namespace {
    fn from(values: Map<String, Value>) -> Self {
        Self::from_values(values)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        functions.sort_unstable();
        f.debug_struct("Namespace")
            .field("values", &self.values)
            .field("functions", &functions)
            .finish()
    }
}
