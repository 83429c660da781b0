//! Built-in string and object schemas.
//!
//! These are consulted after the caller's [`Knowledge`] registry, so any of
//! them can be overridden by registering a schema under the same name.
//!
//! | Namespace | Name            | Arguments |
//! |-----------|-----------------|-----------|
//! | string    | `Regexp`        | `/source/flags` |
//! | object    | `Object.has`    | `fields: [string]` |
//! | object    | `Object.hasNot` | `fields: [string]` |
//! | object    | `and`           | `forAll: [pattern]` |
//! | object    | `String.length` | `eq`, `min`, `max` (non-negative integers) |

use tracing::warn;

use crate::core::pattern::{Pattern, PatternMap};
use crate::matching::compiler::{compile_pattern, CompileError};
use crate::matching::knowledge::Knowledge;
use crate::matching::regexp::RegexTester;
use crate::matching::tester::Matcher;

type BuiltinString = fn(&Knowledge, &str) -> Result<Matcher, CompileError>;
type BuiltinObject = fn(&Knowledge, &PatternMap) -> Result<Matcher, CompileError>;

/// Names of the built-in string schemas
pub const STRING_SCHEMAS: &[&str] = &["Regexp"];

/// Names of the built-in object schemas
pub const OBJECT_SCHEMAS: &[&str] = &["Object.has", "Object.hasNot", "and", "String.length"];

pub(crate) fn builtin_string(name: &str) -> Option<BuiltinString> {
    match name {
        "Regexp" => Some(regexp),
        _ => None,
    }
}

pub(crate) fn builtin_object(name: &str) -> Option<BuiltinObject> {
    match name {
        "Object.has" => Some(object_has),
        "Object.hasNot" => Some(object_has_not),
        "and" => Some(and),
        "String.length" => Some(string_length),
        _ => None,
    }
}

/// `Regexp:/source/flags`
///
/// A malformed body never fails compilation: it is logged and replaced with a
/// matcher that never matches, so the rest of a composite pattern still
/// compiles.
///
/// # Errors
///
/// Never returns an error; the signature matches other schema constructors.
pub fn regexp(_knowledge: &Knowledge, body: &str) -> Result<Matcher, CompileError> {
    match RegexTester::parse(body) {
        Ok(tester) => Ok(Matcher::Regexp(tester)),
        Err(e) => {
            warn!(body = %body, error = %e, "Unable to build regular expression, it will never match");
            Ok(Matcher::Never)
        }
    }
}

fn invalid(schema: &str, reason: impl Into<String>) -> CompileError {
    CompileError::InvalidSchemaArgument {
        schema: schema.to_string(),
        reason: reason.into(),
    }
}

fn field_list(schema: &str, pattern: &PatternMap) -> Result<Vec<String>, CompileError> {
    let Some(Pattern::Sequence(items)) = pattern.get("fields") else {
        return Err(invalid(schema, "'fields' must be an array of strings"));
    };
    items
        .iter()
        .map(|item| match item {
            Pattern::String(name) => Ok(name.clone()),
            other => Err(invalid(
                schema,
                format!("'fields' entries must be strings, got {other:?}"),
            )),
        })
        .collect()
}

fn bound(schema: &str, pattern: &PatternMap, key: &str) -> Result<Option<usize>, CompileError> {
    match pattern.get(key) {
        None | Some(Pattern::Null) => Ok(None),
        Some(Pattern::Number(n)) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid(schema, format!("'{key}' must be a non-negative integer"))),
        Some(other) => Err(invalid(
            schema,
            format!("'{key}' must be a non-negative integer, got {other:?}"),
        )),
    }
}

/// `{ "$": "Object.has", "fields": ["a", "b"] }`
///
/// # Errors
///
/// Returns `CompileError::InvalidSchemaArgument` if `fields` is not a list of strings.
pub fn object_has(_knowledge: &Knowledge, pattern: &PatternMap) -> Result<Matcher, CompileError> {
    Ok(Matcher::ObjectHas(field_list("Object.has", pattern)?))
}

/// `{ "$": "Object.hasNot", "fields": ["a", "b"] }`
///
/// # Errors
///
/// Returns `CompileError::InvalidSchemaArgument` if `fields` is not a list of strings.
pub fn object_has_not(
    _knowledge: &Knowledge,
    pattern: &PatternMap,
) -> Result<Matcher, CompileError> {
    Ok(Matcher::ObjectHasNot(field_list("Object.hasNot", pattern)?))
}

/// `{ "$": "and", "forAll": [pattern, ...] }`
///
/// # Errors
///
/// Returns `CompileError::InvalidSchemaArgument` if `forAll` is not an array,
/// or any error raised while compiling its members.
pub fn and(knowledge: &Knowledge, pattern: &PatternMap) -> Result<Matcher, CompileError> {
    let Some(Pattern::Sequence(items)) = pattern.get("forAll") else {
        return Err(invalid("and", "'forAll' must be an array of patterns"));
    };
    let testers = items
        .iter()
        .map(|item| compile_pattern(knowledge, item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Matcher::ArrayAnd(testers))
}

/// `{ "$": "String.length", "eq": 6 }` or `{ "$": "String.length", "min": 2, "max": 8 }`
///
/// # Errors
///
/// Returns `CompileError::InvalidSchemaArgument` if a bound is not a
/// non-negative integer.
pub fn string_length(
    _knowledge: &Knowledge,
    pattern: &PatternMap,
) -> Result<Matcher, CompileError> {
    const SCHEMA: &str = "String.length";
    if let Some(eq) = bound(SCHEMA, pattern, "eq")? {
        return Ok(Matcher::StringLength {
            min: Some(eq),
            max: Some(eq),
        });
    }
    Ok(Matcher::StringLength {
        min: bound(SCHEMA, pattern, "min")?,
        max: bound(SCHEMA, pattern, "max")?,
    })
}
