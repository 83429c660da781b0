use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Number, Value};

use crate::matching::tester::{FnTester, Tester};

/// Keyed map of sub-patterns.
pub type PatternMap = BTreeMap<String, Pattern>;

/// Reserved key that turns a map pattern into a tagged object-schema pattern.
pub const DISCRIMINATOR_KEY: &str = "$";

/// An uncompiled pattern.
///
/// Mirrors the JSON data model, plus two shapes JSON cannot carry: an already
/// compiled regular expression and a caller-supplied tester. Patterns are pure
/// data and are never mutated by compilation.
#[derive(Clone)]
pub enum Pattern {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Pattern>),
    Map(PatternMap),
    Regex(Regex),
    Tester(Arc<dyn Tester>),
}

impl Pattern {
    /// Wrap a closure as a tester pattern.
    pub fn from_fn<F>(test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Pattern::Tester(Arc::new(FnTester::new(test)))
    }

    /// Schema name if this is a tagged map (`{"$": "<schema>", ...}`).
    #[must_use]
    pub fn discriminator(&self) -> Option<&str> {
        match self {
            Pattern::Map(map) => match map.get(DISCRIMINATOR_KEY) {
                Some(Pattern::String(schema)) => Some(schema.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// The literal value for primitive patterns, `None` for structural ones.
    #[must_use]
    pub fn as_literal(&self) -> Option<Value> {
        match self {
            Pattern::Null => Some(Value::Null),
            Pattern::Bool(b) => Some(Value::Bool(*b)),
            Pattern::Number(n) => Some(Value::Number(n.clone())),
            Pattern::String(s) => Some(Value::String(s.clone())),
            _ => None,
        }
    }

    /// Maximum nesting depth. Leaves have depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Pattern::Sequence(items) => 1 + items.iter().map(Pattern::depth).max().unwrap_or(0),
            Pattern::Map(map) => 1 + map.values().map(Pattern::depth).max().unwrap_or(0),
            _ => 1,
        }
    }
}

impl From<Value> for Pattern {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Pattern::Null,
            Value::Bool(b) => Pattern::Bool(b),
            Value::Number(n) => Pattern::Number(n),
            Value::String(s) => Pattern::String(s),
            Value::Array(items) => Pattern::Sequence(items.into_iter().map(Pattern::from).collect()),
            Value::Object(map) => {
                Pattern::Map(map.into_iter().map(|(k, v)| (k, Pattern::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for Pattern {
    fn from(value: &Value) -> Self {
        Pattern::from(value.clone())
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern::Regex(regex)
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Pattern::String(s.to_string())
    }
}

impl From<Vec<Pattern>> for Pattern {
    fn from(items: Vec<Pattern>) -> Self {
        Pattern::Sequence(items)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Null => write!(f, "null"),
            Pattern::Bool(b) => write!(f, "{b}"),
            Pattern::Number(n) => write!(f, "{n}"),
            Pattern::String(s) => write!(f, "{s:?}"),
            Pattern::Sequence(items) => f.debug_list().entries(items).finish(),
            Pattern::Map(map) => f.debug_map().entries(map).finish(),
            Pattern::Regex(regex) => write!(f, "/{}/", regex.as_str()),
            Pattern::Tester(tester) => write!(f, "{tester:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let pattern = Pattern::from(json!({"$": "Object.has", "fields": ["a"]}));
        assert_eq!(pattern.discriminator(), Some("Object.has"));

        let plain = Pattern::from(json!({"a": 1}));
        assert_eq!(plain.discriminator(), None);

        // A non-string tag is not a discriminator
        let odd = Pattern::from(json!({"$": 3}));
        assert_eq!(odd.discriminator(), None);
    }

    #[test]
    fn test_depth() {
        assert_eq!(Pattern::from(json!(1)).depth(), 1);
        assert_eq!(Pattern::from(json!([1, [2, [3]]])).depth(), 4);
        assert_eq!(Pattern::from(json!({"a": {"b": 1}})).depth(), 3);
        assert_eq!(Pattern::from(json!([])).depth(), 1);
    }

    #[test]
    fn test_as_literal() {
        assert_eq!(Pattern::from(json!("x")).as_literal(), Some(json!("x")));
        assert_eq!(Pattern::Null.as_literal(), Some(Value::Null));
        assert!(Pattern::from(json!([1])).as_literal().is_none());
    }
}
