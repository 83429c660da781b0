//! Rule compilation.
//!
//! A [`SerializedRule`] names a criterion and carries up to three expressions:
//! an extractor applied to the left subject, an `against` extractor applied to
//! the right subject, and a scorer comparing the two extracted values. The
//! scorer is either a compact range spec (`linear:0;10;20`) or a two-parameter
//! `(l, r)` expression.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::core::types::RangeKind;
use crate::core::value::{kind_name, number_value, to_number};
use crate::expr::{EvalError, ExprError, Expression, Namespace};
use crate::scoring::normalize::{wrap_score, Score};
use crate::scoring::range::{gaussian_range, linear_range};

/// Extracts the value a rule compares from one subject
pub type ExtractFn = Arc<dyn Fn(&Value, &Namespace) -> Result<Value, EvalError> + Send + Sync>;

/// Compares two extracted values; always yields a normalized score
pub type ScoreFn = Arc<dyn Fn(&Value, &Value, &Namespace) -> Score + Send + Sync>;

/// Parameter name the subject is bound to in extractor expressions
pub const SUBJECT_PARAM: &str = "_";

/// Parameter names bound in scorer expressions
pub const SCORER_PARAMS: [&str; 2] = ["l", "r"];

/// A rule as written in a rule-set file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedRule {
    #[serde(default)]
    pub category: String,
    pub criteria: String,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub against: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer: Option<String>,
}

impl SerializedRule {
    /// A rule with only a criteria name: identity extraction, constant scorer
    #[must_use]
    pub fn new(criteria: impl Into<String>) -> Self {
        Self {
            category: String::new(),
            criteria: criteria.into(),
            context: String::new(),
            strength: None,
            extractor: None,
            against: None,
            scorer: None,
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: impl Into<String>) -> Self {
        self.extractor = Some(extractor.into());
        self
    }

    #[must_use]
    pub fn with_against(mut self, against: impl Into<String>) -> Self {
        self.against = Some(against.into());
        self
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: impl Into<String>) -> Self {
        self.scorer = Some(scorer.into());
        self
    }

    #[must_use]
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }
}

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid extractor `{expression}`: {source}")]
    Extractor {
        expression: String,
        #[source]
        source: ExprError,
    },

    #[error("Invalid against `{expression}`: {source}")]
    Against {
        expression: String,
        #[source]
        source: ExprError,
    },

    #[error("Invalid scorer `{expression}`: {source}")]
    Scorer {
        expression: String,
        #[source]
        source: ExprError,
    },
}

/// A parsed `kind:min;ref;max` range scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeSpec {
    pub kind: RangeKind,
    pub min: f64,
    pub reference: f64,
    pub max: f64,
}

impl RangeSpec {
    #[must_use]
    pub fn score(&self, l: f64, r: f64) -> f64 {
        match self.kind {
            RangeKind::Linear => linear_range(l, r, self.min, self.reference, self.max),
            RangeKind::Gaussian => gaussian_range(l, r, self.min, self.reference, self.max),
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{};{};{}", self.kind, self.min, self.reference, self.max)
    }
}

/// How a compiled rule scores, for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScorerKind {
    Range(RangeSpec),
    Expression { source: String },
    Constant,
    Custom,
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(spec) => write!(f, "{spec}"),
            Self::Expression { source } => write!(f, "{source}"),
            Self::Constant => write!(f, "0"),
            Self::Custom => write!(f, "<custom>"),
        }
    }
}

/// A rule ready to execute.
#[derive(Clone)]
pub struct CompiledRule {
    pub category: String,
    pub criteria: String,
    pub context: String,
    pub strength: f64,
    pub extractor: ExtractFn,
    pub against: ExtractFn,
    pub scorer: ScoreFn,
    pub scorer_kind: ScorerKind,
}

impl CompiledRule {
    /// Build a rule directly from callables.
    pub fn new<E, A, S>(criteria: impl Into<String>, extractor: E, against: A, scorer: S) -> Self
    where
        E: Fn(&Value, &Namespace) -> Result<Value, EvalError> + Send + Sync + 'static,
        A: Fn(&Value, &Namespace) -> Result<Value, EvalError> + Send + Sync + 'static,
        S: Fn(&Value, &Value, &Namespace) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Self {
            category: String::new(),
            criteria: criteria.into(),
            context: String::new(),
            strength: 1.0,
            extractor: Arc::new(extractor),
            against: Arc::new(against),
            scorer: Arc::new(wrap_score(scorer)),
            scorer_kind: ScorerKind::Custom,
        }
    }

    #[must_use]
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = effective_strength(Some(strength));
        self
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("category", &self.category)
            .field("criteria", &self.criteria)
            .field("context", &self.context)
            .field("strength", &self.strength)
            .field("scorer_kind", &self.scorer_kind)
            .finish_non_exhaustive()
    }
}

/// Strengths default to 1 and never drop below it
fn effective_strength(strength: Option<f64>) -> f64 {
    strength.filter(|s| *s > 1.0).unwrap_or(1.0)
}

fn range_spec_regex() -> &'static Regex {
    static RANGE_SPEC: OnceLock<Regex> = OnceLock::new();
    RANGE_SPEC.get_or_init(|| {
        Regex::new(r"^(\w+):(-?\d+(?:\.\d+)?);(-?\d+(?:\.\d+)?);(-?\d+(?:\.\d+)?)$")
            .expect("range spec pattern is valid")
    })
}

/// Parse a `kind:min;ref;max` range spec.
///
/// Returns `None` when the text is not a range spec at all. Unknown kinds
/// fall back to linear.
#[must_use]
pub fn parse_range_spec(text: &str) -> Option<RangeSpec> {
    let caps = range_spec_regex().captures(text)?;
    let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
    let name = caps.get(1)?.as_str();
    let kind = RangeKind::parse(name);
    if kind.to_string() != name {
        debug!(kind = name, "Unknown range kind, using linear");
    }
    Some(RangeSpec {
        kind,
        min: number(2)?,
        reference: number(3)?,
        max: number(4)?,
    })
}

fn compile_extractor(source: &str) -> Result<ExtractFn, ExprError> {
    let expression = Expression::compile(source, &[SUBJECT_PARAM])?;
    Ok(Arc::new(move |subject: &Value, namespace: &Namespace| {
        expression.eval(std::slice::from_ref(subject), namespace)
    }))
}

fn range_operand(value: &Value) -> Result<f64, EvalError> {
    let n = to_number(value);
    if n.is_nan() {
        Err(EvalError::NotANumber(kind_name(value).to_string()))
    } else {
        Ok(n)
    }
}

fn compile_scorer(source: Option<&str>) -> Result<(ScoreFn, ScorerKind), ExprError> {
    let Some(source) = source else {
        let scorer = wrap_score(|_: &Value, _: &Value, _: &Namespace| Ok(Value::from(0)));
        return Ok((Arc::new(scorer), ScorerKind::Constant));
    };

    if let Some(spec) = parse_range_spec(source) {
        let scorer = wrap_score(move |l: &Value, r: &Value, _: &Namespace| {
            Ok(number_value(spec.score(range_operand(l)?, range_operand(r)?)))
        });
        return Ok((Arc::new(scorer), ScorerKind::Range(spec)));
    }

    let expression = Expression::compile(source, &SCORER_PARAMS)?;
    let scorer = wrap_score(move |l: &Value, r: &Value, namespace: &Namespace| {
        expression.eval(&[l.clone(), r.clone()], namespace)
    });
    Ok((
        Arc::new(scorer),
        ScorerKind::Expression {
            source: source.to_string(),
        },
    ))
}

/// Compile a serialized rule.
///
/// A missing extractor is the identity `_`; a missing `against` reuses the
/// extractor; a missing scorer always scores `0` out of `1`.
///
/// # Errors
///
/// Returns a `RuleError` naming the expression that failed to compile.
pub fn compile_rule(rule: &SerializedRule) -> Result<CompiledRule, RuleError> {
    let extractor_source = rule.extractor.as_deref().unwrap_or(SUBJECT_PARAM);
    let extractor = compile_extractor(extractor_source).map_err(|source| RuleError::Extractor {
        expression: extractor_source.to_string(),
        source,
    })?;

    let against = match rule.against.as_deref() {
        Some(against_source) => {
            compile_extractor(against_source).map_err(|source| RuleError::Against {
                expression: against_source.to_string(),
                source,
            })?
        }
        None => Arc::clone(&extractor),
    };

    let (scorer, scorer_kind) =
        compile_scorer(rule.scorer.as_deref()).map_err(|source| RuleError::Scorer {
            expression: rule.scorer.clone().unwrap_or_default(),
            source,
        })?;

    Ok(CompiledRule {
        category: rule.category.clone(),
        criteria: rule.criteria.clone(),
        context: rule.context.clone(),
        strength: effective_strength(rule.strength),
        extractor,
        against,
        scorer,
        scorer_kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(rule: &CompiledRule, l: Value, r: Value) -> Score {
        (rule.scorer)(&l, &r, &Namespace::new())
    }

    #[test]
    fn test_deserialize_minimal_rule() {
        let rule: SerializedRule = serde_json::from_value(json!({"criteria": "name"})).unwrap();
        assert_eq!(rule, SerializedRule::new("name"));
    }

    #[test]
    fn test_defaults() {
        let rule = compile_rule(&SerializedRule::new("whole")).unwrap();
        let namespace = Namespace::new();
        assert_eq!((rule.extractor)(&json!({"a": 1}), &namespace).unwrap(), json!({"a": 1}));
        assert_eq!((rule.against)(&json!(2), &namespace).unwrap(), json!(2));
        assert_eq!(score(&rule, json!(1), json!(1)), Score::new(0.0, 1.0));
        assert_eq!(rule.scorer_kind, ScorerKind::Constant);
        assert!((rule.strength - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_against_defaults_to_extractor() {
        let rule = compile_rule(&SerializedRule::new("len").with_extractor("_.name")).unwrap();
        let value = (rule.against)(&json!({"name": "chr1"}), &Namespace::new()).unwrap();
        assert_eq!(value, json!("chr1"));
    }

    #[test]
    fn test_strength_floor() {
        for (strength, expected) in [(None, 1.0), (Some(0.2), 1.0), (Some(-3.0), 1.0), (Some(4.0), 4.0)] {
            let mut rule = SerializedRule::new("s");
            rule.strength = strength;
            let compiled = compile_rule(&rule).unwrap();
            assert!((compiled.strength - expected).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_range_spec_parsing() {
        assert_eq!(
            parse_range_spec("gaussian:-1.5;0;2"),
            Some(RangeSpec {
                kind: RangeKind::Gaussian,
                min: -1.5,
                reference: 0.0,
                max: 2.0,
            })
        );
        assert!(matches!(
            parse_range_spec("cubic:0;10;20"),
            Some(RangeSpec {
                kind: RangeKind::Linear,
                ..
            })
        ));
        assert_eq!(
            parse_range_spec("linear:0;10;20").map(|spec| spec.to_string()),
            Some("linear:0;10;20".to_string())
        );
        assert_eq!(parse_range_spec("l == r"), None);
        assert_eq!(parse_range_spec("linear:0;10"), None);
    }

    #[test]
    fn test_range_scorer() {
        let rule = compile_rule(&SerializedRule::new("n").with_scorer("linear:0;10;20")).unwrap();
        assert_eq!(score(&rule, json!(10), json!(10)), Score::new(1.0, 1.0));
        assert_eq!(score(&rule, json!(10), json!(30)), Score::new(0.0, 1.0));
        // Numeric strings are accepted
        assert_eq!(score(&rule, json!("10"), json!(10)), Score::new(1.0, 1.0));

        let bad = score(&rule, json!("ten"), json!(10));
        assert_eq!(bad.thrown(), Some(&EvalError::NotANumber("string".into())));
    }

    #[test]
    fn test_expression_scorer() {
        let rule = compile_rule(
            &SerializedRule::new("same")
                .with_extractor("_.name")
                .with_scorer("lower(l) == lower(r)"),
        )
        .unwrap();
        assert_eq!(score(&rule, json!("ChrX"), json!("chrx")), Score::new(1.0, 1.0));
        assert_eq!(
            rule.scorer_kind,
            ScorerKind::Expression {
                source: "lower(l) == lower(r)".into()
            }
        );
    }

    #[test]
    fn test_scorer_sees_namespace() {
        let rule = compile_rule(&SerializedRule::new("t").with_scorer("l * weight")).unwrap();
        let mut namespace = Namespace::new();
        namespace.insert("weight", json!(0.5));
        assert_eq!((rule.scorer)(&json!(1), &json!(0), &namespace), Score::new(0.5, 1.0));
    }

    #[test]
    fn test_compile_errors_name_the_expression() {
        let err = compile_rule(&SerializedRule::new("x").with_extractor("_.")).unwrap_err();
        assert!(matches!(err, RuleError::Extractor { ref expression, .. } if expression == "_."));

        let err = compile_rule(&SerializedRule::new("x").with_against("(")).unwrap_err();
        assert!(matches!(err, RuleError::Against { .. }));

        let err = compile_rule(&SerializedRule::new("x").with_scorer("l +")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid scorer `l +`"));
    }

    #[test]
    fn test_custom_rule() {
        let rule = CompiledRule::new(
            "custom",
            |v, _| Ok(v.clone()),
            |v, _| Ok(v.clone()),
            |l, r, _| Ok(json!([u8::from(l == r), 2])),
        )
        .with_strength(3.0);
        assert_eq!(score(&rule, json!(1), json!(1)), Score::new(1.0, 2.0));
        assert_eq!(rule.scorer_kind, ScorerKind::Custom);
        assert!((rule.strength - 3.0).abs() < f64::EPSILON);
    }
}
