//! Tree-walking evaluator.
//!
//! Values flow through the evaluator as `Cow`s so that identifier and member
//! lookups can borrow straight out of the arguments or the namespace; only
//! computed results are owned.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::core::value::{is_truthy, number_value, strict_eq, to_number, to_text};
use crate::expr::builtins;
use crate::expr::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::expr::{EvalError, Namespace};

static NULL: Value = Value::Null;

/// Bindings visible to one evaluation.
///
/// Identifiers resolve against the declared parameters first, then the
/// optional locals, then the namespace fields.
pub(crate) struct Evaluator<'a> {
    pub(crate) params: &'a [String],
    pub(crate) args: &'a [Value],
    pub(crate) locals: Option<&'a Map<String, Value>>,
    pub(crate) namespace: &'a Namespace,
}

/// Result of a member lookup on a borrowed value
enum Member<'v> {
    Ref(&'v Value),
    Computed(Value),
}

impl<'a> Evaluator<'a> {
    pub(crate) fn eval(&self, expr: &'a Expr) -> Result<Cow<'a, Value>, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(Cow::Borrowed(value)),
            Expr::Identifier(name) => self.identifier(name).map(Cow::Borrowed),
            Expr::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item).map(Cow::into_owned))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Cow::Owned(Value::Array(items)))
            }
            Expr::Object(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value)?.into_owned());
                }
                Ok(Cow::Owned(Value::Object(map)))
            }
            Expr::Member { object, property } => {
                let object = self.eval(object)?;
                let property = self.eval(property)?;
                Ok(match object {
                    Cow::Borrowed(value) => match member(value, &property)? {
                        Member::Ref(found) => Cow::Borrowed(found),
                        Member::Computed(computed) => Cow::Owned(computed),
                    },
                    Cow::Owned(value) => match member(&value, &property)? {
                        Member::Ref(found) => Cow::Owned(found.clone()),
                        Member::Computed(computed) => Cow::Owned(computed),
                    },
                })
            }
            Expr::Call { function, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg).map(Cow::into_owned))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(function, &args).map(Cow::Owned)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                let result = match op {
                    UnaryOp::Not => Value::Bool(!is_truthy(&operand)),
                    UnaryOp::Neg => number_value(-to_number(&operand)),
                    UnaryOp::Plus => number_value(to_number(&operand)),
                };
                Ok(Cow::Owned(result))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(Cow::Owned(binary(*op, &left, &right)))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let take_left = match op {
                    LogicalOp::And => !is_truthy(&left),
                    LogicalOp::Or => is_truthy(&left),
                    LogicalOp::Coalesce => !left.is_null(),
                };
                if take_left {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test = self.eval(test)?;
                if is_truthy(&test) {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn identifier(&self, name: &str) -> Result<&'a Value, EvalError> {
        if let Some(index) = self.params.iter().position(|p| p == name) {
            // Missing trailing arguments read as null
            return Ok(self.args.get(index).unwrap_or(&NULL));
        }
        if let Some(value) = self.locals.and_then(|locals| locals.get(name)) {
            return Ok(value);
        }
        self.namespace
            .get(name)
            .ok_or_else(|| EvalError::UnknownIdentifier(name.to_string()))
    }

    fn call(&self, function: &str, args: &[Value]) -> Result<Value, EvalError> {
        if let Some(native) = self.namespace.function(function) {
            return native(args);
        }
        match builtins::lookup(function) {
            Some(builtin) => builtin(args),
            None => Err(EvalError::UnknownFunction(function.to_string())),
        }
    }
}

fn member<'v>(object: &'v Value, property: &Value) -> Result<Member<'v>, EvalError> {
    let is_length = property.as_str() == Some("length");
    let found = match object {
        Value::Null => {
            return Err(EvalError::NullAccess {
                property: to_text(property),
            })
        }
        Value::Object(map) => match map.get(to_text(property).as_str()) {
            None if is_length => return Ok(Member::Computed(Value::from(map.len()))),
            found => found,
        },
        Value::Array(items) if is_length => return Ok(Member::Computed(Value::from(items.len()))),
        Value::Array(items) => index(property, items.len()).and_then(|i| items.get(i)),
        Value::String(s) if is_length => {
            return Ok(Member::Computed(Value::from(s.chars().count())))
        }
        Value::String(s) => {
            let ch = index(property, usize::MAX).and_then(|i| s.chars().nth(i));
            return Ok(Member::Computed(
                ch.map_or(Value::Null, |c| Value::String(c.to_string())),
            ));
        }
        Value::Bool(_) | Value::Number(_) => None,
    };
    Ok(Member::Ref(found.unwrap_or(&NULL)))
}

/// Non-negative integral index below `len`, if the property reads as one
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
fn index(property: &Value, len: usize) -> Option<usize> {
    let n = match property {
        Value::Number(_) | Value::String(_) => to_number(property),
        _ => return None,
    };
    if n >= 0.0 && n.fract() == 0.0 && n < 9_007_199_254_740_992.0 {
        let i = n as usize;
        (i < len).then_some(i)
    } else {
        None
    }
}

fn concatenates(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Array(_) | Value::Object(_))
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let arithmetic = |f: fn(f64, f64) -> f64| number_value(f(to_number(left), to_number(right)));
    match op {
        BinaryOp::Add if concatenates(left) || concatenates(right) => {
            Value::String(to_text(left) + &to_text(right))
        }
        BinaryOp::Add => arithmetic(|a, b| a + b),
        BinaryOp::Sub => arithmetic(|a, b| a - b),
        BinaryOp::Mul => arithmetic(|a, b| a * b),
        BinaryOp::Div => arithmetic(|a, b| a / b),
        BinaryOp::Rem => arithmetic(|a, b| a % b),
        BinaryOp::Eq => Value::Bool(strict_eq(left, right)),
        BinaryOp::NotEq => Value::Bool(!strict_eq(left, right)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => to_number(left).partial_cmp(&to_number(right)),
            };
            let holds = ordering.is_some_and(|ordering| match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            });
            Value::Bool(holds)
        }
    }
}
