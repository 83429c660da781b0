//! Rule expression language.
//!
//! Extractors and scorers are written as small, side-effect-free expressions
//! over JSON values: literals, identifiers, member access, arithmetic,
//! comparison, logical and conditional operators, and calls to whitelisted
//! functions. There are no assignments or loops, so every evaluation
//! terminates.
//!
//! An [`Expression`] is compiled once with a list of parameter names and then
//! evaluated many times against positional arguments and a shared
//! [`Namespace`].
//!
//! ```
//! use heuristic_match::expr::{Expression, Namespace};
//! use serde_json::json;
//!
//! let expression = Expression::compile("l.length == r.length ? 1 : 0", &["l", "r"]).unwrap();
//! let result = expression
//!     .eval(&[json!("abc"), json!("xyz")], &Namespace::new())
//!     .unwrap();
//! assert_eq!(result, json!(1));
//! ```

pub mod builtins;
mod eval;
pub mod lexer;
pub mod namespace;
pub mod parser;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::utils::validation::{check_expression_length, ValidationError};

pub use builtins::BUILTINS;
pub use namespace::{NativeFunction, Namespace};
pub use parser::Expr;

/// Errors raised while compiling an expression.
#[derive(Error, Debug)]
pub enum ExprError {
    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("Unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("Unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        offset: usize,
    },

    #[error("Unexpected end of expression, expected {0}")]
    UnexpectedEnd(String),

    #[error("Only named functions can be called (offset {0})")]
    InvalidCall(usize),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors raised while evaluating a compiled expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Cannot read property '{property}' of null")]
    NullAccess { property: String },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function}() takes {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("{function}(): {message}")]
    Function { function: String, message: String },

    #[error("Expected a number, got {0}")]
    NotANumber(String),
}

/// A compiled expression with named positional parameters.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    params: Vec<String>,
    ast: Expr,
}

impl Expression {
    /// Compile `source` with the given parameter names.
    ///
    /// # Errors
    ///
    /// Returns an `ExprError` if the source is too long, too deeply nested, or
    /// not a valid expression.
    pub fn compile(source: &str, params: &[&str]) -> Result<Self, ExprError> {
        check_expression_length(source)?;
        let tokens = lexer::tokenize(source)?;
        let ast = parser::parse(&tokens)?;
        Ok(Self {
            source: source.to_string(),
            params: params.iter().map(|p| (*p).to_string()).collect(),
            ast,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Evaluate with positional arguments bound to the parameters.
    ///
    /// Missing arguments read as `null`; extra arguments are ignored.
    ///
    /// # Errors
    ///
    /// Returns an `EvalError` for unknown identifiers or functions, member
    /// access on `null`, or a failing function call.
    pub fn eval(&self, args: &[Value], namespace: &Namespace) -> Result<Value, EvalError> {
        self.evaluate(args, None, namespace)
    }

    /// Like [`Expression::eval`], with an extra scope of local bindings
    /// resolved after the parameters and before the namespace.
    ///
    /// # Errors
    ///
    /// See [`Expression::eval`].
    pub fn eval_with_locals(
        &self,
        args: &[Value],
        locals: &Map<String, Value>,
        namespace: &Namespace,
    ) -> Result<Value, EvalError> {
        self.evaluate(args, Some(locals), namespace)
    }

    fn evaluate(
        &self,
        args: &[Value],
        locals: Option<&Map<String, Value>>,
        namespace: &Namespace,
    ) -> Result<Value, EvalError> {
        let evaluator = eval::Evaluator {
            params: &self.params,
            args,
            locals,
            namespace,
        };
        evaluator.eval(&self.ast).map(std::borrow::Cow::into_owned)
    }
}
