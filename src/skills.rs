//! Extension schemas built on the expression language.
//!
//! [`knowledge`] returns a registry with the `expr` string schema, which
//! compiles its body into an expression predicate:
//!
//! ```
//! use heuristic_match::matching::{compile, Tester};
//! use heuristic_match::{skills, Pattern};
//! use serde_json::json;
//!
//! let pattern = Pattern::from(json!({"length": "expr:_ > 1000 && _ % 2 == 0"}));
//! let matcher = compile(&skills::knowledge(), &pattern).unwrap();
//! assert!(matcher.test(&json!({"length": 4096})));
//! assert!(!matcher.test(&json!({"length": 4095})));
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::core::value::is_truthy;
use crate::expr::{Expression, Namespace};
use crate::matching::{Knowledge, Matcher, Tester};
use crate::scoring::rule::SUBJECT_PARAM;

/// Name of the expression string schema
pub const EXPR_SCHEMA: &str = "expr";

/// Predicate backed by an expression over the subject.
///
/// The subject is bound to `_`; when it is a map its fields are also visible
/// as bare identifiers. Evaluation errors count as a failed match.
pub struct ExpressionTester {
    expression: Expression,
    namespace: Arc<Namespace>,
}

impl ExpressionTester {
    #[must_use]
    pub fn new(expression: Expression, namespace: Arc<Namespace>) -> Self {
        Self {
            expression,
            namespace,
        }
    }
}

impl Tester for ExpressionTester {
    fn test(&self, input: &Value) -> bool {
        let no_fields = Map::new();
        let locals = match input {
            Value::Object(fields) => fields,
            _ => &no_fields,
        };
        self.expression
            .eval_with_locals(std::slice::from_ref(input), locals, &self.namespace)
            .is_ok_and(|result| is_truthy(&result))
    }
}

impl fmt::Debug for ExpressionTester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExpressionTester")
            .field(&self.expression.source())
            .finish()
    }
}

/// Registry with the `expr` schema and an empty namespace
#[must_use]
pub fn knowledge() -> Knowledge {
    knowledge_with(Namespace::new())
}

/// Registry with the `expr` schema, resolving free identifiers and function
/// calls against `namespace`
#[must_use]
pub fn knowledge_with(namespace: Namespace) -> Knowledge {
    let namespace = Arc::new(namespace);
    let mut knowledge = Knowledge::new();
    knowledge.register_string(EXPR_SCHEMA, move |_, body| {
        match Expression::compile(body, &[SUBJECT_PARAM]) {
            Ok(expression) => Ok(Matcher::Custom(Arc::new(ExpressionTester::new(
                expression,
                Arc::clone(&namespace),
            )))),
            Err(e) => {
                warn!(body = %body, error = %e, "Unable to parse expression, it will never match");
                Ok(Matcher::Never)
            }
        }
    });
    knowledge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pattern::Pattern;
    use crate::matching::compile;
    use serde_json::json;

    fn matcher(pattern: Value) -> Matcher {
        compile(&knowledge(), &Pattern::from(pattern)).unwrap()
    }

    #[test]
    fn test_expr_schema_registered() {
        assert_eq!(knowledge().string_schema_names(), vec![EXPR_SCHEMA]);
    }

    #[test]
    fn test_fields_visible_as_identifiers() {
        let m = matcher(json!("expr:start < end && name.length > 0"));
        assert!(m.test(&json!({"start": 1, "end": 5, "name": "x"})));
        assert!(!m.test(&json!({"start": 5, "end": 1, "name": "x"})));
    }

    #[test]
    fn test_errors_count_as_no_match() {
        let m = matcher(json!("expr:missing > 1"));
        assert!(!m.test(&json!({})));
        assert!(!m.test(&json!(3)));

        let m = matcher(json!("expr:_.a.b == 1"));
        assert!(!m.test(&json!({})));
        assert!(m.test(&json!({"a": {"b": 1}})));
    }

    #[test]
    fn test_unparseable_body_never_matches() {
        let m = matcher(json!("expr:_ >"));
        assert!(matches!(m, Matcher::Never));
        assert!(!m.test(&json!(1)));
    }

    #[test]
    fn test_combines_with_builtin_patterns() {
        let m = matcher(json!({
            "name": "Regexp:/^chr/",
            "length": ["expr:_ > 100", 0]
        }));
        assert!(m.test(&json!({"name": "chr2", "length": 101})));
        assert!(m.test(&json!({"name": "chr2", "length": 0})));
        assert!(!m.test(&json!({"name": "chr2", "length": 50})));
    }

    #[test]
    fn test_namespace_is_shared() {
        let mut namespace = Namespace::new();
        namespace.insert("limit", json!(10));
        namespace.register_function("even", |args| {
            Ok(json!(args.first().and_then(Value::as_i64).is_some_and(|n| n % 2 == 0)))
        });
        let m = compile(
            &knowledge_with(namespace),
            &Pattern::from(json!("expr:_ < limit && even(_)")),
        )
        .unwrap();
        assert!(m.test(&json!(4)));
        assert!(!m.test(&json!(5)));
        assert!(!m.test(&json!(12)));
    }
}
