//! Pattern compiler and matcher variants.
//!
//! This module turns declarative patterns into reusable predicates:
//!
//! - [`compile`]: Main entry point, dispatching on the pattern's shape
//! - [`Matcher`]: The closed set of compiled variants
//! - [`Tester`]: The predicate interface every variant (and extension) implements
//! - [`Knowledge`]: Schema registry for string (`"Regexp:/x/"`) and object
//!   (`{"$": "Object.has"}`) schemas
//!
//! ## Compilation
//!
//! Compilation happens once per pattern; the resulting matcher is immutable
//! and can be tested against any number of values:
//!
//! 1. **Literals** collapse to strict equality
//! 2. **Alternations** split into a literal set (constant-time lookup) and an
//!    ordered list of structural fallbacks
//! 3. **Array fits** (`[[a, b, c]]`) match sub-patterns greedily and in order
//!    against an input array, without backtracking
//! 4. **Maps** match sub-structures key by key; extra subject keys are ignored
//! 5. **Tagged maps** resolve a named object schema from the registry, then the
//!    built-ins
//!
//! ## Example
//!
//! ```rust
//! use heuristic_match::matching::{compile, Knowledge, Tester};
//! use heuristic_match::Pattern;
//! use serde_json::json;
//!
//! let pattern = Pattern::from(json!({"name": "Regexp:/^ab/i", "tags": [["x", "z"]]}));
//! let matcher = compile(&Knowledge::new(), &pattern).unwrap();
//!
//! assert!(matcher.test(&json!({"name": "Abc", "tags": ["x", "y", "z"]})));
//! assert!(!matcher.test(&json!({"name": "Abc", "tags": ["z", "x"]})));
//! ```

pub mod compiler;
pub mod knowledge;
pub mod regexp;
pub mod schemas;
pub mod tester;

pub use compiler::{compile, CompileError};
pub use knowledge::{Knowledge, ObjectSchema, StringSchema};
pub use tester::{FnTester, LiteralSet, Matcher, Tester};
