use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::pattern::PatternMap;
use crate::matching::compiler::CompileError;
use crate::matching::tester::Matcher;

/// Constructor for a string schema: receives the text after `"<schema>:"`.
pub type StringSchema =
    Arc<dyn Fn(&Knowledge, &str) -> Result<Matcher, CompileError> + Send + Sync>;

/// Constructor for an object schema: receives the whole tagged map, `$` included.
pub type ObjectSchema =
    Arc<dyn Fn(&Knowledge, &PatternMap) -> Result<Matcher, CompileError> + Send + Sync>;

/// Schema registry consulted during compilation.
///
/// Two independent namespaces map schema names to constructors. Entries
/// registered here take precedence over the built-in schemas, so extensions
/// can both add new matcher kinds and override existing ones without touching
/// the compiler.
#[derive(Clone, Default)]
pub struct Knowledge {
    string: HashMap<String, StringSchema>,
    object: HashMap<String, ObjectSchema>,
}

impl Knowledge {
    /// Create an empty registry (built-in schemas only)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a string schema, replacing any previous entry of that name.
    pub fn register_string<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&Knowledge, &str) -> Result<Matcher, CompileError> + Send + Sync + 'static,
    {
        self.string.insert(name.into(), Arc::new(constructor));
        self
    }

    /// Register an object schema, replacing any previous entry of that name.
    pub fn register_object<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&Knowledge, &PatternMap) -> Result<Matcher, CompileError> + Send + Sync + 'static,
    {
        self.object.insert(name.into(), Arc::new(constructor));
        self
    }

    #[must_use]
    pub fn string_schema(&self, name: &str) -> Option<&StringSchema> {
        self.string.get(name)
    }

    #[must_use]
    pub fn object_schema(&self, name: &str) -> Option<&ObjectSchema> {
        self.object.get(name)
    }

    fn sorted_names<V>(map: &HashMap<String, V>) -> Vec<&str> {
        let mut names: Vec<&str> = map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered string schema names, sorted
    #[must_use]
    pub fn string_schema_names(&self) -> Vec<&str> {
        Self::sorted_names(&self.string)
    }

    /// Registered object schema names, sorted
    #[must_use]
    pub fn object_schema_names(&self) -> Vec<&str> {
        Self::sorted_names(&self.object)
    }
}

impl fmt::Debug for Knowledge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Knowledge")
            .field("string", &self.string_schema_names())
            .field("object", &self.object_schema_names())
            .finish()
    }
}
