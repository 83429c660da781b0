use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::core::pattern::{Pattern, PatternMap};
use crate::matching::knowledge::Knowledge;
use crate::matching::regexp::RegexTester;
use crate::matching::schemas::{builtin_object, builtin_string};
use crate::matching::tester::{LiteralSet, Matcher};
use crate::utils::validation::{check_pattern_depth, ValidationError};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Invalid regular expression '{body}': {reason}")]
    InvalidRegex { body: String, reason: String },

    #[error("Unknown object schema: {0}")]
    UnknownObjectSchema(String),

    #[error("Invalid arguments for schema '{schema}': {reason}")]
    InvalidSchemaArgument { schema: String, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Compile a pattern into a reusable matcher.
///
/// Dispatches on the pattern's shape:
///
/// - `null` matches only null
/// - numbers and booleans match by strict equality
/// - strings go through string-schema resolution (`"Regexp:/x/i"`), falling back
///   to equality when no schema prefix is recognized
/// - `[[p1, p2, ...]]` fits the sub-patterns in order against an input array
/// - any other sequence is an alternation
/// - maps tagged with `"$"` resolve a named object schema; other maps match
///   sub-structures key by key
///
/// # Errors
///
/// Returns `CompileError::UnknownObjectSchema` for an unregistered `$` tag,
/// `CompileError::InvalidSchemaArgument` for ill-formed schema arguments, or
/// `CompileError::Validation` if the pattern is nested too deeply. Malformed
/// regular expressions are not errors; they compile to a matcher that never
/// matches.
pub fn compile(knowledge: &Knowledge, pattern: &Pattern) -> Result<Matcher, CompileError> {
    check_pattern_depth(pattern.depth())?;
    compile_pattern(knowledge, pattern)
}

/// Compile without the up-front depth check. Used for sub-patterns of a
/// pattern that has already been validated.
pub(crate) fn compile_pattern(
    knowledge: &Knowledge,
    pattern: &Pattern,
) -> Result<Matcher, CompileError> {
    match pattern {
        Pattern::Null => Ok(Matcher::Null),
        Pattern::Bool(b) => Ok(Matcher::Equal(Value::Bool(*b))),
        Pattern::Number(n) => Ok(Matcher::Equal(Value::Number(n.clone()))),
        Pattern::String(s) => compile_meta(knowledge, s),
        Pattern::Regex(regex) => Ok(Matcher::Regexp(RegexTester::new(regex.clone()))),
        Pattern::Tester(tester) => Ok(Matcher::Custom(Arc::clone(tester))),
        Pattern::Sequence(items) => match items.as_slice() {
            [Pattern::Sequence(points)] => compile_array_fit(knowledge, points),
            _ => compile_one_of(knowledge, items),
        },
        Pattern::Map(map) => match pattern.discriminator() {
            Some(schema) => compile_tagged(knowledge, schema, map),
            None => compile_all_of(knowledge, map),
        },
    }
}

/// `"<schema>:<body>"` resolves through the registry, then the built-ins;
/// anything else is a string literal.
fn compile_meta(knowledge: &Knowledge, pattern: &str) -> Result<Matcher, CompileError> {
    if let Some((schema, body)) = pattern.split_once(':') {
        if let Some(constructor) = knowledge.string_schema(schema) {
            return constructor(knowledge, body);
        }
        if let Some(constructor) = builtin_string(schema) {
            return constructor(knowledge, body);
        }
    }
    Ok(Matcher::Equal(Value::String(pattern.to_string())))
}

/// Literal members collapse into one set; everything else is tried in order
/// after the set.
fn compile_one_of(knowledge: &Knowledge, members: &[Pattern]) -> Result<Matcher, CompileError> {
    let mut set = LiteralSet::new();
    let mut fallback = Vec::new();

    for member in members {
        match compile_pattern(knowledge, member)? {
            Matcher::Equal(literal) if LiteralSet::can_hold(&literal) => {
                set.insert(&literal);
            }
            Matcher::Null => {
                set.insert(&Value::Null);
            }
            other => fallback.push(other),
        }
    }

    Ok(match (set.is_empty(), fallback.is_empty()) {
        (true, true) => Matcher::Never,
        (false, true) => Matcher::Set(set),
        (true, false) => Matcher::OneOf {
            set: None,
            fallback,
        },
        (false, false) => Matcher::OneOf {
            set: Some(set),
            fallback,
        },
    })
}

fn compile_array_fit(knowledge: &Knowledge, points: &[Pattern]) -> Result<Matcher, CompileError> {
    points
        .iter()
        .map(|point| compile_pattern(knowledge, point))
        .collect::<Result<Vec<_>, _>>()
        .map(Matcher::ArrayFit)
}

fn compile_all_of(knowledge: &Knowledge, map: &PatternMap) -> Result<Matcher, CompileError> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), compile_pattern(knowledge, value)?)))
        .collect::<Result<Vec<_>, CompileError>>()
        .map(Matcher::AllOf)
}

fn compile_tagged(
    knowledge: &Knowledge,
    schema: &str,
    map: &PatternMap,
) -> Result<Matcher, CompileError> {
    if let Some(constructor) = knowledge.object_schema(schema) {
        return constructor(knowledge, map);
    }
    if let Some(constructor) = builtin_object(schema) {
        return constructor(knowledge, map);
    }
    Err(CompileError::UnknownObjectSchema(schema.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::tester::Tester;
    use serde_json::json;

    fn compile_json(pattern: serde_json::Value) -> Matcher {
        compile(&Knowledge::new(), &Pattern::from(pattern)).unwrap()
    }

    #[test]
    fn test_literals_match_themselves_only() {
        for literal in [json!(42), json!(-1.5), json!("toto"), json!(true), json!(false)] {
            let matcher = compile_json(literal.clone());
            assert!(matcher.test(&literal), "{literal}");
            assert!(!matcher.test(&json!("other")), "{literal}");
            assert!(!matcher.test(&json!(null)), "{literal}");
        }
        assert!(!compile_json(json!(1)).test(&json!("1")));
    }

    #[test]
    fn test_null_pattern() {
        let matcher = compile_json(json!(null));
        assert!(matches!(matcher, Matcher::Null));
        assert!(matcher.test(&json!(null)));
        assert!(!matcher.test(&json!(0)));
    }

    #[test]
    fn test_string_meta_resolution() {
        assert!(matches!(compile_json(json!("Regexp:/a/")), Matcher::Regexp(_)));
        // Unknown schema prefix keeps the whole string as a literal
        let matcher = compile_json(json!("http://example.org"));
        assert!(matches!(matcher, Matcher::Equal(_)));
        assert!(matcher.test(&json!("http://example.org")));
        assert!(!matcher.test(&json!("//example.org")));
    }

    #[test]
    fn test_one_of_all_literals_is_a_set() {
        let matcher = compile_json(json!([1, 2, 3]));
        assert!(matches!(matcher, Matcher::Set(_)));
        assert!(matcher.test(&json!(2)));
        assert!(!matcher.test(&json!(4)));
        assert!(!matcher.test(&json!(null)));

        let with_null = compile_json(json!([1, null]));
        assert!(with_null.test(&json!(null)));
    }

    #[test]
    fn test_one_of_mixed_members() {
        let matcher = compile_json(json!([1, "toto", "Regexp:/test/i"]));
        match &matcher {
            Matcher::OneOf { set, fallback } => {
                assert_eq!(set.as_ref().map(LiteralSet::len), Some(2));
                assert_eq!(fallback.len(), 1);
            }
            other => panic!("expected one_of, got {}", other.kind()),
        }
        assert!(matcher.test(&json!("toto")));
        assert!(matcher.test(&json!("a TEST")));
        assert!(!matcher.test(&json!(2)));
    }

    #[test]
    fn test_one_of_without_literals() {
        let matcher = compile_json(json!(["Regexp:/a/", {"x": 1}]));
        assert!(matches!(matcher, Matcher::OneOf { set: None, .. }));
        assert!(matcher.test(&json!({"x": 1})));
    }

    #[test]
    fn test_empty_one_of_never_matches() {
        let matcher = compile_json(json!([]));
        assert!(matches!(matcher, Matcher::Never));
        assert!(!matcher.test(&json!(null)));
    }

    #[test]
    fn test_array_fit_dispatch() {
        let input: Vec<serde_json::Value> = (0..=100).map(|i| json!(i)).collect();
        let input = serde_json::Value::Array(input);
        assert!(compile_json(json!([[1, 15, 100]])).test(&input));
        assert!(!compile_json(json!([[15, 1, 100]])).test(&input));
        // A single non-array member is an ordinary alternation
        assert!(matches!(compile_json(json!([1])), Matcher::Set(_)));
    }

    #[test]
    fn test_all_of_nested() {
        let matcher = compile_json(json!({"a": 42, "b": "toto", "c": "Regexp:/titi/"}));
        assert!(matcher.test(&json!({"a": 42, "b": "toto", "c": "xtitix", "d": 0})));
        assert!(!matcher.test(&json!({"a": 42, "b": "toto"})));
        assert!(!matcher.test(&json!({"a": 42, "b": "toto", "c": "tata"})));
    }

    #[test]
    fn test_malformed_regexp_does_not_break_composite() {
        let matcher = compile_json(json!(["Regexp:/a(/", 3]));
        assert!(matcher.test(&json!(3)));
        assert!(!matcher.test(&json!("a(")));
    }

    #[test]
    fn test_unknown_object_schema_is_an_error() {
        let err = compile(
            &Knowledge::new(),
            &Pattern::from(json!({"$": "Nope", "x": 1})),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownObjectSchema(ref s) if s == "Nope"));
    }

    #[test]
    fn test_registry_overrides_builtins() {
        let mut knowledge = Knowledge::new();
        knowledge.register_string("Regexp", |_, body| {
            Ok(Matcher::Equal(Value::String(body.to_string())))
        });
        knowledge.register_object("Object.has", |_, _| Ok(Matcher::Never));

        let matcher = compile(&knowledge, &Pattern::from(json!("Regexp:/a/"))).unwrap();
        assert!(matcher.test(&json!("/a/")));
        assert!(!matcher.test(&json!("a")));

        let matcher = compile(
            &knowledge,
            &Pattern::from(json!({"$": "Object.has", "fields": []})),
        )
        .unwrap();
        assert!(!matcher.test(&json!({})));
    }

    #[test]
    fn test_structured_literal_in_alternation() {
        let mut knowledge = Knowledge::new();
        knowledge.register_string("Pair", |_, _| Ok(Matcher::Equal(json!([1, 2]))));

        let matcher = compile(&knowledge, &Pattern::from(json!(["Pair:x", 3]))).unwrap();
        let Matcher::OneOf { set, fallback } = &matcher else {
            panic!("expected a set with a fallback, got {matcher:?}");
        };
        assert_eq!(set.as_ref().map(LiteralSet::len), Some(1));
        assert_eq!(fallback.len(), 1);
        assert!(matcher.test(&json!([1, 2])));
        assert!(matcher.test(&json!(3)));
        assert!(!matcher.test(&json!([2, 1])));
    }

    #[test]
    fn test_callable_and_regex_patterns() {
        let knowledge = Knowledge::new();
        let matcher = compile(&knowledge, &Pattern::from_fn(|v| v.is_array())).unwrap();
        assert!(matcher.test(&json!([])));
        assert!(!matcher.test(&json!({})));

        let regex = regex::Regex::new("^b+$").unwrap();
        let matcher = compile(&knowledge, &Pattern::from(regex)).unwrap();
        assert!(matcher.test(&json!("bbb")));
        assert!(!matcher.test(&json!("abb")));
    }

    #[test]
    fn test_depth_limit() {
        let mut pattern = json!(1);
        for _ in 0..80 {
            pattern = json!({ "k": pattern });
        }
        let err = compile(&Knowledge::new(), &Pattern::from(pattern)).unwrap_err();
        assert!(matches!(err, CompileError::Validation(_)));
    }
}
