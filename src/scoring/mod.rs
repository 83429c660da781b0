//! Rule-based similarity scoring.
//!
//! A rule set compares two subjects criterion by criterion. Each rule
//! extracts a value from both sides, scores the pair, and weights the result
//! by its strength. The executor sums the weighted scores into a normalized
//! similarity.
//!
//! ```
//! use heuristic_match::expr::Namespace;
//! use heuristic_match::scoring::RuleSet;
//! use serde_json::json;
//!
//! let rules = RuleSet::from_json(
//!     r#"[{"criteria": "size", "extractor": "_.size", "scorer": "linear:0;10;20"}]"#,
//! )
//! .unwrap();
//! let result = rules.execute(&json!({"size": 10}), &json!({"size": 12}), &Namespace::new());
//! assert_eq!(result.similarity(), Some(0.8));
//! ```

pub mod executor;
pub mod normalize;
pub mod range;
pub mod rule;
pub mod ruleset;

pub use executor::{execute, ExecutionResult, RuleDetail};
pub use normalize::{normalize_result, wrap_score, Score, ScoreError};
pub use range::{gaussian_range, linear_range};
pub use rule::{
    compile_rule, parse_range_spec, CompiledRule, ExtractFn, RangeSpec, RuleError, ScoreFn,
    ScorerKind, SerializedRule,
};
pub use ruleset::{RuleSet, RuleSetError};
