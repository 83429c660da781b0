//! Centralized limits and validation helpers.
//!
//! Patterns and rule expressions may come from untrusted rule and pattern files.
//! These limits bound recursion during compilation so a hostile file
//! cannot exhaust the stack.

/// Maximum nesting depth of a pattern (DOS protection)
pub const MAX_PATTERN_DEPTH: usize = 64;

/// Maximum length in bytes of a single rule expression
pub const MAX_EXPRESSION_LENGTH: usize = 4096;

/// Maximum nesting depth of a parsed expression
pub const MAX_EXPRESSION_DEPTH: usize = 64;

/// Maximum number of rules in a single rule set
pub const MAX_RULES: usize = 10_000;

/// Validation error types
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Pattern nesting depth {0} exceeds maximum of {MAX_PATTERN_DEPTH}")]
    PatternTooDeep(usize),
    #[error("Expression length {0} exceeds maximum of {MAX_EXPRESSION_LENGTH} bytes")]
    ExpressionTooLong(usize),
    #[error("Expression nesting exceeds maximum depth of {MAX_EXPRESSION_DEPTH}")]
    ExpressionTooDeep,
    #[error("Too many rules: {0} exceeds maximum of {MAX_RULES}")]
    TooManyRules(usize),
}

/// Check a pattern's nesting depth against [`MAX_PATTERN_DEPTH`].
///
/// # Errors
///
/// Returns `ValidationError::PatternTooDeep` if the depth exceeds the limit.
pub fn check_pattern_depth(depth: usize) -> Result<(), ValidationError> {
    if depth > MAX_PATTERN_DEPTH {
        Err(ValidationError::PatternTooDeep(depth))
    } else {
        Ok(())
    }
}

/// Check an expression source against [`MAX_EXPRESSION_LENGTH`].
///
/// # Errors
///
/// Returns `ValidationError::ExpressionTooLong` if the source is too long.
pub fn check_expression_length(source: &str) -> Result<(), ValidationError> {
    if source.len() > MAX_EXPRESSION_LENGTH {
        Err(ValidationError::ExpressionTooLong(source.len()))
    } else {
        Ok(())
    }
}

/// Check a rule count against [`MAX_RULES`].
///
/// # Errors
///
/// Returns `ValidationError::TooManyRules` if the count exceeds the limit.
pub fn check_rule_count(count: usize) -> Result<(), ValidationError> {
    if count > MAX_RULES {
        Err(ValidationError::TooManyRules(count))
    } else {
        Ok(())
    }
}
