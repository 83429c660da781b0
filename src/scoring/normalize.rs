//! Score normalization.
//!
//! Scorers may return almost anything: a number, a boolean, nothing, or an
//! explicit `[achieved, possible, errors]` triple. [`normalize_result`] folds
//! every shape into a [`Score`] so the executor never special-cases a scorer.

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::core::value::to_text;
use crate::expr::{EvalError, Namespace};

/// An error attached to a score.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// The scorer or extractor failed while evaluating
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("Scorer returned an unrecognized result: {0}")]
    BadResult(String),

    /// An error the scorer reported in the third slot of its result
    #[error("{0}")]
    Reported(String),
}

impl Serialize for ScoreError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A normalized `(achieved, possible, errors)` triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    pub achieved: f64,
    pub possible: f64,
    pub errors: Vec<ScoreError>,
}

impl Score {
    #[must_use]
    pub fn new(achieved: f64, possible: f64) -> Self {
        Self {
            achieved,
            possible,
            errors: Vec::new(),
        }
    }

    /// `(0, 1)` with a single error
    #[must_use]
    pub fn failed(error: ScoreError) -> Self {
        Self {
            achieved: 0.0,
            possible: 1.0,
            errors: vec![error],
        }
    }

    /// The evaluation error raised by the scorer itself, if it raised one
    #[must_use]
    pub fn thrown(&self) -> Option<&EvalError> {
        self.errors.iter().find_map(|e| match e {
            ScoreError::Eval(inner) => Some(inner),
            _ => None,
        })
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

/// Normalize whatever a scorer produced.
///
/// | Result | Score |
/// |--------|-------|
/// | number `n` | `(n, 1, [])` |
/// | boolean | `(1 or 0, 1, [])` |
/// | `null` or `[]` | `(0, 1, [])` |
/// | `[a]` | `(a, 1, [])` |
/// | `[a, p]` | `(a, p, [])` |
/// | `[a, p, errors]` | `(a, p, errors)` |
/// | error | `(0, 1, [error])` |
/// | anything else | `(0, 1, [bad result])` |
///
/// Arrays longer than three keep their first three elements. `a` and `p`
/// must be numbers and `p` must not be negative.
#[must_use]
pub fn normalize_result(result: Result<Value, EvalError>) -> Score {
    let value = match result {
        Ok(value) => value,
        Err(e) => return Score::failed(e.into()),
    };
    match &value {
        Value::Null => Score::default(),
        Value::Bool(b) => Score::new(if *b { 1.0 } else { 0.0 }, 1.0),
        Value::Number(n) => match n.as_f64() {
            Some(n) => Score::new(n, 1.0),
            None => bad_result(&value),
        },
        Value::Array(items) => normalize_triple(items).unwrap_or_else(|| bad_result(&value)),
        Value::String(_) | Value::Object(_) => bad_result(&value),
    }
}

fn normalize_triple(items: &[Value]) -> Option<Score> {
    let Some(first) = items.first() else {
        return Some(Score::default());
    };
    let achieved = first.as_f64()?;
    let possible = match items.get(1) {
        Some(p) => p.as_f64().filter(|p| *p >= 0.0)?,
        None => 1.0,
    };
    let errors = match items.get(2) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(reported)) => reported.iter().map(reported_error).collect(),
        Some(other) => vec![reported_error(other)],
    };
    Some(Score {
        achieved,
        possible,
        errors,
    })
}

fn reported_error(value: &Value) -> ScoreError {
    ScoreError::Reported(to_text(value))
}

fn bad_result(value: &Value) -> Score {
    Score::failed(ScoreError::BadResult(value.to_string()))
}

/// Wrap a raw comparison callable so that every invocation yields a [`Score`].
pub fn wrap_score<F>(scorer: F) -> impl Fn(&Value, &Value, &Namespace) -> Score + Send + Sync
where
    F: Fn(&Value, &Value, &Namespace) -> Result<Value, EvalError> + Send + Sync,
{
    move |l, r, namespace| normalize_result(scorer(l, r, namespace))
}
