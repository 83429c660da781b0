use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::core::value::strict_eq;
use crate::matching::regexp::RegexTester;

/// A compiled predicate over untyped values.
///
/// Testers are immutable once built and may be shared across threads and
/// reused for any number of evaluations.
pub trait Tester: fmt::Debug + Send + Sync {
    fn test(&self, input: &Value) -> bool;
}

/// Adapter turning a closure into a [`Tester`].
pub struct FnTester<F> {
    test: F,
}

impl<F> FnTester<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    pub fn new(test: F) -> Self {
        Self { test }
    }
}

impl<F> Tester for FnTester<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn test(&self, input: &Value) -> bool {
        (self.test)(input)
    }
}

impl<F> fmt::Debug for FnTester<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnTester")
    }
}

/// Hashable form of a primitive literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LiteralKey {
    Null,
    Bool(bool),
    Number(u64),
    String(String),
}

impl LiteralKey {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => {
                let f = n.as_f64()?;
                // -0.0 and 0.0 are the same member
                let f = if f == 0.0 { 0.0 } else { f };
                Some(Self::Number(f.to_bits()))
            }
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// Constant-time membership test over primitive literals.
#[derive(Debug, Clone, Default)]
pub struct LiteralSet {
    members: HashSet<LiteralKey>,
}

impl LiteralSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `value` can be a member. Arrays and maps cannot.
    #[must_use]
    pub fn can_hold(value: &Value) -> bool {
        LiteralKey::of(value).is_some()
    }

    /// Add a literal. Structured values cannot be members and are ignored.
    pub fn insert(&mut self, value: &Value) -> bool {
        LiteralKey::of(value).is_some_and(|key| self.members.insert(key))
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        LiteralKey::of(value).is_some_and(|key| self.members.contains(&key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<'a> FromIterator<&'a Value> for LiteralSet {
    fn from_iter<I: IntoIterator<Item = &'a Value>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

/// A compiled pattern.
///
/// `compile` inspects a pattern's shape and builds exactly one of these
/// variants. Composite variants own their children.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches only `null`
    Null,
    /// Strict equality with a primitive literal
    Equal(Value),
    /// Regular expression over the input's text form
    Regexp(RegexTester),
    /// Alternation: literal set first, then each fallback in order
    OneOf {
        set: Option<LiteralSet>,
        fallback: Vec<Matcher>,
    },
    /// Alternation made only of literals
    Set(LiteralSet),
    /// Ordered greedy subsequence fit over an input array
    ArrayFit(Vec<Matcher>),
    /// Every child must match the same input
    ArrayAnd(Vec<Matcher>),
    /// Input map must carry each key with a matching value
    AllOf(Vec<(String, Matcher)>),
    /// Input map must carry every listed field
    ObjectHas(Vec<String>),
    /// Input must carry none of the listed fields
    ObjectHasNot(Vec<String>),
    /// Input string's character count must fall within bounds
    StringLength {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Never matches
    Never,
    /// Caller-supplied or extension tester
    Custom(Arc<dyn Tester>),
}

impl Matcher {
    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Matcher::Null => "null",
            Matcher::Equal(_) => "equal",
            Matcher::Regexp(_) => "regexp",
            Matcher::OneOf { .. } => "one_of",
            Matcher::Set(_) => "set",
            Matcher::ArrayFit(_) => "array_fit",
            Matcher::ArrayAnd(_) => "array_and",
            Matcher::AllOf(_) => "all_of",
            Matcher::ObjectHas(_) => "object_has",
            Matcher::ObjectHasNot(_) => "object_has_not",
            Matcher::StringLength { .. } => "string_length",
            Matcher::Never => "never",
            Matcher::Custom(_) => "custom",
        }
    }
}

/// Greedy, single-pass fit of `points` against `input`, in order.
///
/// Each point consumes input elements until one matches; the next point starts
/// after that element. There is no backtracking.
fn array_fit(points: &[Matcher], input: &[Value]) -> bool {
    let mut remaining = input.iter();
    points
        .iter()
        .all(|point| remaining.by_ref().any(|item| point.test(item)))
}

impl Tester for Matcher {
    fn test(&self, input: &Value) -> bool {
        match self {
            Matcher::Null => input.is_null(),
            Matcher::Equal(expected) => strict_eq(expected, input),
            Matcher::Regexp(regex) => regex.test(input),
            Matcher::OneOf { set, fallback } => {
                set.as_ref().is_some_and(|s| s.contains(input))
                    || fallback.iter().any(|m| m.test(input))
            }
            Matcher::Set(set) => set.contains(input),
            Matcher::ArrayFit(points) => input
                .as_array()
                .is_some_and(|items| array_fit(points, items)),
            Matcher::ArrayAnd(all) => all.iter().all(|m| m.test(input)),
            Matcher::AllOf(fields) => input.as_object().is_some_and(|map| {
                fields
                    .iter()
                    .all(|(key, m)| map.get(key).is_some_and(|v| m.test(v)))
            }),
            Matcher::ObjectHas(fields) => input
                .as_object()
                .is_some_and(|map| fields.iter().all(|f| map.contains_key(f))),
            Matcher::ObjectHasNot(fields) => input
                .as_object()
                .map_or(true, |map| fields.iter().all(|f| !map.contains_key(f))),
            Matcher::StringLength { min, max } => input.as_str().is_some_and(|s| {
                let len = s.chars().count();
                min.map_or(true, |m| len >= m) && max.map_or(true, |m| len <= m)
            }),
            Matcher::Never => false,
            Matcher::Custom(tester) => tester.test(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn equal(value: Value) -> Matcher {
        Matcher::Equal(value)
    }

    #[test]
    fn test_literal_set_membership() {
        let values = [json!(1), json!("a"), json!(null), json!(true)];
        let set: LiteralSet = values.iter().collect();
        assert_eq!(set.len(), 4);
        assert!(set.contains(&json!(1.0)));
        assert!(set.contains(&json!("a")));
        assert!(set.contains(&json!(null)));
        assert!(!set.contains(&json!(false)));
        assert!(!set.contains(&json!("1")));
        assert!(!set.contains(&json!([1])));

        assert!(LiteralSet::can_hold(&json!(null)));
        assert!(!LiteralSet::can_hold(&json!([1])));
        assert!(!LiteralSet::can_hold(&json!({"a": 1})));
    }

    #[test]
    fn test_array_fit_greedy() {
        let points = vec![equal(json!(1)), equal(json!(15)), equal(json!(100))];
        let input: Vec<Value> = (0..=100).map(|i| json!(i)).collect();
        assert!(array_fit(&points, &input));

        let reordered = vec![equal(json!(15)), equal(json!(1)), equal(json!(100))];
        assert!(!array_fit(&reordered, &input));

        // Each input element is consumed at most once
        let twice = vec![equal(json!(3)), equal(json!(3))];
        assert!(!array_fit(&twice, &[json!(3)]));
        assert!(array_fit(&twice, &[json!(3), json!(0), json!(3)]));

        // No points always fits
        assert!(array_fit(&[], &[]));
    }

    #[test]
    fn test_array_fit_requires_array() {
        let m = Matcher::ArrayFit(vec![equal(json!(1))]);
        assert!(!m.test(&json!(1)));
        assert!(m.test(&json!([0, 1])));
    }

    #[test]
    fn test_all_of_is_not_exhaustive() {
        let m = Matcher::AllOf(vec![("a".to_string(), equal(json!(1)))]);
        assert!(m.test(&json!({"a": 1, "b": 2})));
        assert!(!m.test(&json!({"b": 2})));
        assert!(!m.test(&json!({"a": 2})));
        assert!(!m.test(&json!(null)));
        assert!(!m.test(&json!([1])));
    }

    #[test]
    fn test_object_has_and_has_not() {
        let has = Matcher::ObjectHas(vec!["a".into(), "b".into()]);
        assert!(has.test(&json!({"a": null, "b": 0})));
        assert!(!has.test(&json!({"a": 1})));
        assert!(!has.test(&json!("ab")));

        let has_not = Matcher::ObjectHasNot(vec!["a".into()]);
        assert!(has_not.test(&json!({"b": 1})));
        assert!(!has_not.test(&json!({"a": 1})));
        assert!(has_not.test(&json!(42)));
    }

    #[test]
    fn test_string_length_bounds() {
        let m = Matcher::StringLength {
            min: Some(2),
            max: Some(3),
        };
        assert!(m.test(&json!("ab")));
        assert!(m.test(&json!("héé")));
        assert!(!m.test(&json!("a")));
        assert!(!m.test(&json!("abcd")));
        assert!(!m.test(&json!(12)));
    }

    #[test]
    fn test_custom_tester() {
        let m = Matcher::Custom(Arc::new(FnTester::new(|v: &Value| v.is_number())));
        assert!(m.test(&json!(3)));
        assert!(!m.test(&json!("3")));
    }
}
