//! Regular-expression testers.
//!
//! Bodies use the delimited form `/source/flags`: the first character is the
//! delimiter and the last occurrence of it closes the source. Supported flags:
//!
//! | Flag | Effect |
//! |------|--------|
//! | `i`  | case-insensitive |
//! | `m`  | `^`/`$` match at line boundaries |
//! | `s`  | `.` matches newlines |
//! | `x`  | ignore whitespace and `#` comments in the source |
//! | `u`  | Unicode-aware classes (always on) |
//! | `g`  | accepted, no effect |
//! | `y`  | sticky: the match must start at the beginning of the input |
//!
//! Every test runs a fresh search over the input, so no scan position carries
//! over between calls and a tester can be reused or shared freely.

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::core::value::to_text;
use crate::matching::compiler::CompileError;

#[derive(Debug, Clone)]
pub struct RegexTester {
    regex: Regex,
    /// Match only at the start of the input
    sticky: bool,
}

impl RegexTester {
    /// Wrap an already compiled regular expression.
    #[must_use]
    pub fn new(regex: Regex) -> Self {
        Self {
            regex,
            sticky: false,
        }
    }

    /// Build a tester from a delimited body such as `/foo/i`.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::InvalidRegex` if the body has no closing
    /// delimiter, carries an unknown or repeated flag, or the source does not
    /// compile.
    pub fn parse(body: &str) -> Result<Self, CompileError> {
        let invalid = |reason: String| CompileError::InvalidRegex {
            body: body.to_string(),
            reason,
        };

        let delimiter = body
            .chars()
            .next()
            .ok_or_else(|| invalid("empty body".to_string()))?;
        let start = delimiter.len_utf8();
        let end = body
            .rfind(delimiter)
            .filter(|&end| end >= start)
            .ok_or_else(|| invalid(format!("missing closing delimiter '{delimiter}'")))?;

        let source = &body[start..end];
        let flags = &body[end + start..];

        let mut builder = RegexBuilder::new(source);
        let mut sticky = false;
        let mut seen = String::new();
        for flag in flags.chars() {
            if seen.contains(flag) {
                return Err(invalid(format!("repeated flag '{flag}'")));
            }
            seen.push(flag);
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                'u' | 'g' => {}
                'y' => sticky = true,
                other => return Err(invalid(format!("unknown flag '{other}'"))),
            }
        }

        let regex = builder.build().map_err(|e| invalid(e.to_string()))?;
        Ok(Self { regex, sticky })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    #[must_use]
    pub fn is_sticky(&self) -> bool {
        self.sticky
    }

    /// Test the input's text form. Non-string values are coerced to text.
    #[must_use]
    pub fn test(&self, input: &Value) -> bool {
        let text = match input {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(to_text(other)),
        };
        if self.sticky {
            // Leftmost match starts at 0 whenever any match does
            self.regex.find(&text).is_some_and(|m| m.start() == 0)
        } else {
            self.regex.is_match(&text)
        }
    }
}
