//! Whitelisted functions callable from expressions.
//!
//! Every built-in is a pure function of its arguments. Namespace functions of
//! the same name take precedence.

use serde_json::Value;

use crate::core::value::{kind_name, number_value, strict_eq, to_number, to_text};
use crate::expr::EvalError;
use crate::scoring::range::{gaussian_range, linear_range};

pub(crate) type Builtin = fn(&[Value]) -> Result<Value, EvalError>;

/// Names of all built-in functions, sorted
pub const BUILTINS: &[&str] = &[
    "abs",
    "ceil",
    "contains",
    "endsWith",
    "exp",
    "floor",
    "gaussian",
    "has",
    "jaccard",
    "keys",
    "len",
    "linear",
    "lower",
    "max",
    "min",
    "number",
    "pow",
    "round",
    "sqrt",
    "startsWith",
    "string",
    "trim",
    "upper",
];

pub(crate) fn lookup(name: &str) -> Option<Builtin> {
    let builtin: Builtin = match name {
        "abs" => |args| unary_math("abs", args, f64::abs),
        "ceil" => |args| unary_math("ceil", args, f64::ceil),
        "floor" => |args| unary_math("floor", args, f64::floor),
        "sqrt" => |args| unary_math("sqrt", args, f64::sqrt),
        "exp" => |args| unary_math("exp", args, f64::exp),
        "round" => round,
        "pow" => pow,
        "min" => |args| fold_numbers(args, f64::INFINITY, f64::min),
        "max" => |args| fold_numbers(args, f64::NEG_INFINITY, f64::max),
        "len" => len,
        "lower" => |args| map_text("lower", args, |s| s.to_lowercase()),
        "upper" => |args| map_text("upper", args, |s| s.to_uppercase()),
        "trim" => |args| map_text("trim", args, |s| s.trim().to_string()),
        "contains" => contains,
        "startsWith" => |args| {
            let (s, prefix) = two_texts("startsWith", args)?;
            Ok(Value::Bool(s.starts_with(&prefix)))
        },
        "endsWith" => |args| {
            let (s, suffix) = two_texts("endsWith", args)?;
            Ok(Value::Bool(s.ends_with(&suffix)))
        },
        "number" => |args| Ok(number_value(to_number(arg(args, 0)))),
        "string" => |args| Ok(Value::String(to_text(arg(args, 0)))),
        "keys" => keys,
        "has" => has,
        "jaccard" => jaccard,
        "linear" => |args| range("linear", args, linear_range),
        "gaussian" => |args| range("gaussian", args, gaussian_range),
        _ => return None,
    };
    Some(builtin)
}

static NULL: Value = Value::Null;

/// Positional argument, `null` when missing
fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

fn expect_arity(function: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::Arity {
            function: function.to_string(),
            expected,
            got: args.len(),
        })
    }
}

/// Numeric argument; values without a numeric reading are errors.
fn number_arg(function: &str, value: &Value) -> Result<f64, EvalError> {
    let n = to_number(value);
    if n.is_nan() {
        Err(EvalError::Function {
            function: function.to_string(),
            message: format!("expected a number, got {}", kind_name(value)),
        })
    } else {
        Ok(n)
    }
}

fn unary_math(function: &str, args: &[Value], op: fn(f64) -> f64) -> Result<Value, EvalError> {
    expect_arity(function, args, 1)?;
    Ok(number_value(op(number_arg(function, &args[0])?)))
}

/// Round half up; an optional second argument gives the number of decimals.
fn round(args: &[Value]) -> Result<Value, EvalError> {
    let x = number_arg("round", arg(args, 0))?;
    let digits = match args.len() {
        1 => 0.0,
        2 => number_arg("round", &args[1])?,
        got => {
            return Err(EvalError::Arity {
                function: "round".to_string(),
                expected: 1,
                got,
            })
        }
    };
    let scale = 10f64.powf(digits.trunc());
    Ok(number_value((x * scale + 0.5).floor() / scale))
}

fn pow(args: &[Value]) -> Result<Value, EvalError> {
    expect_arity("pow", args, 2)?;
    let base = number_arg("pow", &args[0])?;
    let exponent = number_arg("pow", &args[1])?;
    Ok(number_value(base.powf(exponent)))
}

/// `min`/`max` over numeric arguments, or over a single array argument.
fn fold_numbers(args: &[Value], init: f64, op: fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    let items = match args {
        [Value::Array(items)] => items.as_slice(),
        _ => args,
    };
    let mut acc = init;
    for item in items {
        let n = to_number(item);
        if n.is_nan() {
            return Ok(Value::Null);
        }
        acc = op(acc, n);
    }
    Ok(number_value(acc))
}

fn len(args: &[Value]) -> Result<Value, EvalError> {
    expect_arity("len", args, 1)?;
    let count = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(EvalError::Function {
                function: "len".to_string(),
                message: format!("expected a string, array or object, got {}", kind_name(other)),
            })
        }
    };
    Ok(Value::from(count))
}

fn map_text(function: &str, args: &[Value], op: fn(&str) -> String) -> Result<Value, EvalError> {
    expect_arity(function, args, 1)?;
    Ok(Value::String(op(&to_text(&args[0]))))
}

fn two_texts(function: &str, args: &[Value]) -> Result<(String, String), EvalError> {
    expect_arity(function, args, 2)?;
    Ok((to_text(&args[0]), to_text(&args[1])))
}

/// Substring for strings, membership for arrays, key presence for objects.
fn contains(args: &[Value]) -> Result<Value, EvalError> {
    expect_arity("contains", args, 2)?;
    let needle = &args[1];
    let found = match &args[0] {
        Value::String(s) => s.contains(to_text(needle).as_str()),
        Value::Array(items) => items.iter().any(|item| strict_eq(item, needle)),
        Value::Object(map) => map.contains_key(to_text(needle).as_str()),
        _ => false,
    };
    Ok(Value::Bool(found))
}

fn keys(args: &[Value]) -> Result<Value, EvalError> {
    expect_arity("keys", args, 1)?;
    let keys = match &args[0] {
        Value::Object(map) => map.keys().cloned().map(Value::String).collect(),
        Value::Array(items) => (0..items.len()).map(|i| Value::String(i.to_string())).collect(),
        _ => Vec::new(),
    };
    Ok(Value::Array(keys))
}

fn has(args: &[Value]) -> Result<Value, EvalError> {
    expect_arity("has", args, 2)?;
    let present = args[0]
        .as_object()
        .is_some_and(|map| map.contains_key(to_text(&args[1]).as_str()));
    Ok(Value::Bool(present))
}

/// Jaccard similarity of two arrays taken as sets: |A ∩ B| / |A ∪ B|.
///
/// Returns 0 when both are empty, so two empty inputs are not a perfect match.
fn jaccard(args: &[Value]) -> Result<Value, EvalError> {
    expect_arity("jaccard", args, 2)?;
    let as_set = |value: &Value| -> Result<Vec<Value>, EvalError> {
        let Value::Array(items) = value else {
            return Err(EvalError::Function {
                function: "jaccard".to_string(),
                message: format!("expected an array, got {}", kind_name(value)),
            });
        };
        let mut unique: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.iter().any(|u| strict_eq(u, item)) {
                unique.push(item.clone());
            }
        }
        Ok(unique)
    };
    let a = as_set(&args[0])?;
    let b = as_set(&args[1])?;
    let intersection = a.iter().filter(|x| b.iter().any(|y| strict_eq(x, y))).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return Ok(number_value(0.0));
    }
    #[allow(clippy::cast_precision_loss)]
    let similarity = intersection as f64 / union as f64;
    Ok(number_value(similarity))
}

fn range(
    function: &str,
    args: &[Value],
    comparator: fn(f64, f64, f64, f64, f64) -> f64,
) -> Result<Value, EvalError> {
    expect_arity(function, args, 5)?;
    let mut n = [0.0; 5];
    for (slot, value) in n.iter_mut().zip(args) {
        *slot = number_arg(function, value)?;
    }
    Ok(number_value(comparator(n[0], n[1], n[2], n[3], n[4])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
        lookup(name).unwrap_or_else(|| panic!("missing builtin {name}"))(args)
    }

    #[test]
    fn test_every_listed_builtin_resolves() {
        for name in BUILTINS {
            assert!(lookup(name).is_some(), "{name}");
        }
        assert!(lookup("eval").is_none());
        let mut sorted = BUILTINS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, BUILTINS);
    }

    #[test]
    fn test_math() {
        assert_eq!(call("abs", &[json!(-3)]).unwrap(), json!(3));
        assert_eq!(call("round", &[json!(2.5)]).unwrap(), json!(3));
        assert_eq!(call("round", &[json!(1.2345), json!(2)]).unwrap(), json!(1.23));
        assert_eq!(call("min", &[json!(3), json!(1), json!(2)]).unwrap(), json!(1));
        assert_eq!(call("max", &[json!([3, 9, 2])]).unwrap(), json!(9));
        assert_eq!(call("max", &[]).unwrap(), Value::Null);
        assert_eq!(call("pow", &[json!(2), json!(10)]).unwrap(), json!(1024));
        assert!(matches!(
            call("abs", &[json!("x")]),
            Err(EvalError::Function { .. })
        ));
        assert!(matches!(call("abs", &[]), Err(EvalError::Arity { .. })));
    }

    #[test]
    fn test_text() {
        assert_eq!(call("lower", &[json!("AbC")]).unwrap(), json!("abc"));
        assert_eq!(call("trim", &[json!("  x ")]).unwrap(), json!("x"));
        assert_eq!(call("startsWith", &[json!("hello"), json!("he")]).unwrap(), json!(true));
        assert_eq!(call("endsWith", &[json!("hello"), json!("he")]).unwrap(), json!(false));
        assert_eq!(call("string", &[json!(4)]).unwrap(), json!("4"));
        assert_eq!(call("number", &[json!("4.5")]).unwrap(), json!(4.5));
    }

    #[test]
    fn test_collections() {
        assert_eq!(call("len", &[json!("héllo")]).unwrap(), json!(5));
        assert_eq!(call("len", &[json!([1, 2])]).unwrap(), json!(2));
        assert!(call("len", &[json!(1)]).is_err());
        assert_eq!(call("contains", &[json!([1, 2]), json!(2.0)]).unwrap(), json!(true));
        assert_eq!(call("contains", &[json!("abc"), json!("bc")]).unwrap(), json!(true));
        assert_eq!(call("has", &[json!({"a": null}), json!("a")]).unwrap(), json!(true));
        assert_eq!(call("keys", &[json!({"b": 1, "a": 2})]).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(call("jaccard", &[json!([1, 2, 3]), json!([2, 3, 4])]).unwrap(), json!(0.5));
        assert_eq!(call("jaccard", &[json!([]), json!([])]).unwrap(), json!(0));
        assert_eq!(call("jaccard", &[json!([1, 1]), json!([1])]).unwrap(), json!(1));
        assert!(call("jaccard", &[json!("a"), json!([])]).is_err());
    }

    #[test]
    fn test_range_builtins() {
        let args = [json!(10), json!(12), json!(0), json!(10), json!(20)];
        assert_eq!(call("linear", &args).unwrap(), json!(0.8));
        assert_eq!(call("gaussian", &[json!(1), json!(1), json!(0), json!(1), json!(2)]).unwrap(), json!(1));
        assert!(call("linear", &args[..3]).is_err());
    }
}
