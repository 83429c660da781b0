//! # heuristic-match
//!
//! Declarative pattern matching and weighted rule-based similarity over JSON
//! values.
//!
//! Two engines make up the library:
//!
//! - **Patterns** describe what a value should look like. A pattern compiles
//!   once into an immutable [`matching::Matcher`] that tests any number of
//!   values.
//! - **Rule sets** describe how to compare two values. Each rule extracts a
//!   value from both sides, scores the pair, and weights the result; the
//!   executor adds everything up into a similarity with a full breakdown.
//!
//! ## Features
//!
//! - **Literal sets**: Alternations of literals collapse into constant-time
//!   set lookups
//! - **Ordered array fits**: `[[a, b, c]]` finds `a`, `b`, `c` in order within
//!   an array
//! - **Schemas**: `"Regexp:/x/i"` string schemas and `{"$": "Object.has"}`
//!   object schemas, extensible through a [`matching::Knowledge`] registry
//! - **Safe expressions**: Extractors and scorers are written in a small
//!   side-effect-free expression language
//! - **Auditable scores**: Broken rules degrade the result instead of aborting
//!   it, and every failure is reported
//!
//! ## Example
//!
//! ```rust
//! use heuristic_match::expr::Namespace;
//! use heuristic_match::matching::{compile, Knowledge, Tester};
//! use heuristic_match::scoring::RuleSet;
//! use heuristic_match::Pattern;
//! use serde_json::json;
//!
//! let contig = compile(
//!     &Knowledge::new(),
//!     &Pattern::from(json!({"name": "Regexp:/^chr\\d+$/", "topology": ["linear", "circular"]})),
//! )
//! .unwrap();
//! assert!(contig.test(&json!({"name": "chr1", "topology": "linear"})));
//! assert!(!contig.test(&json!({"name": "chrM", "topology": "linear"})));
//!
//! let rules = RuleSet::from_json(
//!     r#"[
//!         {"criteria": "name", "extractor": "_.name", "scorer": "l == r"},
//!         {"criteria": "length", "extractor": "_.length", "scorer": "linear:0;0;1000", "strength": 2}
//!     ]"#,
//! )
//! .unwrap();
//! let result = rules.execute(
//!     &json!({"name": "chr1", "length": 1000}),
//!     &json!({"name": "chr1", "length": 1500}),
//!     &Namespace::new(),
//! );
//! assert_eq!(result.similarity(), Some(2.0 / 3.0));
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Pattern and value model
//! - [`matching`]: Pattern compiler and matcher variants
//! - [`expr`]: Expression language for extractors and scorers
//! - [`scoring`]: Rule compilation, score normalization and execution
//! - [`skills`]: The `expr` schema extension
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod expr;
pub mod matching;
pub mod scoring;
pub mod skills;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::pattern::Pattern;
pub use core::types::*;
pub use expr::{Expression, Namespace};
pub use matching::{compile, CompileError, Knowledge, Matcher, Tester};
pub use scoring::{execute, CompiledRule, ExecutionResult, RuleSet, SerializedRule};
