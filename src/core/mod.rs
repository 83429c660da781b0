//! Core data types shared by the matching and scoring engines.
//!
//! - [`Pattern`]: an uncompiled pattern (JSON shapes plus regexes and
//!   caller-supplied testers)
//! - [`value`]: coercion helpers over `serde_json::Value` (truthiness, strict
//!   equality, text and number conversion)
//! - [`Confidence`], [`RangeKind`]: result classification and scorer kinds
//!
//! ## Value model
//!
//! Subjects are plain `serde_json::Value`s. "Absent" and `null` are the same
//! thing: an extractor that finds nothing yields `Value::Null`.
//!
//! | Pattern shape | Compiles to |
//! |---------------|-------------|
//! | `null`        | null test |
//! | number, bool  | strict equality |
//! | string        | string schema (`Regexp:/x/i`) or equality |
//! | `[[a, b]]`    | ordered subsequence fit |
//! | `[a, b]`      | alternation |
//! | `{k: p}`      | sub-structure match |
//! | `{$: name}`   | named object schema |

pub mod pattern;
pub mod types;
pub mod value;

pub use pattern::{Pattern, PatternMap, DISCRIMINATOR_KEY};
pub use types::{Confidence, RangeKind};
