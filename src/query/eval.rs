//! Row-wise evaluation of parsed filter expressions.

use std::cmp::Ordering;

use regex::RegexBuilder;

use super::lexer::CmpOp;
use super::parser::Expr;
use super::{QueryError, Row, Scope, Value};

pub(super) fn eval(expr: &Expr, row: &dyn Row, scope: &Scope) -> Result<Value, QueryError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Name(name) => row
            .column(name)
            .or_else(|| scope.get(name).cloned())
            .ok_or_else(|| QueryError::Undefined(name.clone())),
        Expr::Var(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::Undefined(format!("@{}", name))),
        Expr::List(items) => items
            .iter()
            .map(|item| eval(item, row, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Not(inner) => {
            let value = eval(inner, row, scope)?;
            Ok(Value::Bool(!truthy(&value, "~")?))
        }
        Expr::And(left, right) => {
            let l = truthy(&eval(left, row, scope)?, "&")?;
            let r = truthy(&eval(right, row, scope)?, "&")?;
            Ok(Value::Bool(l && r))
        }
        Expr::Or(left, right) => {
            let l = truthy(&eval(left, row, scope)?, "|")?;
            let r = truthy(&eval(right, row, scope)?, "|")?;
            Ok(Value::Bool(l || r))
        }
        Expr::Compare { first, rest } => {
            let mut left = eval(first, row, scope)?;
            for (op, operand) in rest {
                let right = eval(operand, row, scope)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::Method {
            target,
            name,
            args,
            kwargs,
        } => {
            let target = eval(target, row, scope)?;
            let args = eval_all(args, row, scope)?;
            ensure_no_kwargs(name, kwargs)?;
            series_method(&target, name, &args)
        }
        Expr::StrMethod {
            target,
            name,
            args,
            kwargs,
        } => {
            let target = eval(target, row, scope)?;
            let args = eval_all(args, row, scope)?;
            let kwargs = kwargs
                .iter()
                .map(|(k, v)| Ok((k.as_str(), eval(v, row, scope)?)))
                .collect::<Result<Vec<_>, QueryError>>()?;
            str_method(&target, name, &args, &kwargs)
        }
        Expr::StrIndex { target, index } => {
            let value = eval(target, row, scope)?;
            let Some(s) = string_target(&value)? else {
                return Ok(Value::Null);
            };
            let chars: Vec<char> = s.chars().collect();
            let idx = if *index < 0 {
                chars.len() as i64 + index
            } else {
                *index
            };
            Ok(usize::try_from(idx)
                .ok()
                .and_then(|i| chars.get(i))
                .map_or(Value::Null, |c| Value::Str(c.to_string())))
        }
        Expr::StrSlice { target, start, end } => {
            let value = eval(target, row, scope)?;
            let Some(s) = string_target(&value)? else {
                return Ok(Value::Null);
            };
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len() as i64;
            let clamp = |i: i64| -> usize {
                let i = if i < 0 { len + i } else { i };
                i.clamp(0, len) as usize
            };
            let from = start.map_or(0, clamp);
            let to = end.map_or(chars.len(), clamp);
            let sliced: String = if from < to {
                chars[from..to].iter().collect()
            } else {
                String::new()
            };
            Ok(Value::Str(sliced))
        }
    }
}

fn eval_all(exprs: &[Expr], row: &dyn Row, scope: &Scope) -> Result<Vec<Value>, QueryError> {
    exprs.iter().map(|e| eval(e, row, scope)).collect()
}

fn ensure_no_kwargs(name: &str, kwargs: &[(String, Expr)]) -> Result<(), QueryError> {
    match kwargs.first() {
        Some((key, _)) => Err(QueryError::Type(format!(
            "{}() got an unexpected keyword argument '{}'",
            name, key
        ))),
        None => Ok(()),
    }
}

/// Boolean value of an operand of `and`/`or`/`not`. Missing values are false.
fn truthy(value: &Value, op: &str) -> Result<bool, QueryError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        other => Err(QueryError::Type(format!(
            "unsupported operand type for {}: '{}'",
            op,
            other.type_name()
        ))),
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Num(a), Value::Num(b)) => a == b,
        (Value::Num(a), Value::Bool(b)) | (Value::Bool(b), Value::Num(a)) => {
            *a == if *b { 1.0 } else { 0.0 }
        }
        (a, b) => a == b,
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, QueryError> {
    match op {
        CmpOp::Eq => Ok(loose_eq(left, right)),
        CmpOp::Ne => Ok(!loose_eq(left, right)),
        CmpOp::In | CmpOp::NotIn => {
            let found = match right {
                Value::List(items) => items.iter().any(|item| loose_eq(left, item)),
                scalar => loose_eq(left, scalar),
            };
            Ok(found == (op == CmpOp::In))
        }
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let ordering = match (left, right) {
                (Value::Null, _) | (_, Value::Null) => return Ok(false),
                (Value::Str(a), Value::Str(b)) => a.cmp(b),
                (Value::Num(a), Value::Num(b)) => match a.partial_cmp(b) {
                    Some(ordering) => ordering,
                    None => return Ok(false),
                },
                (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
                (a, b) => {
                    return Err(QueryError::Type(format!(
                        "'{}' not supported between instances of '{}' and '{}'",
                        op.symbol(),
                        a.type_name(),
                        b.type_name()
                    )))
                }
            };
            Ok(match op {
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::Le => ordering != Ordering::Greater,
                CmpOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn series_method(target: &Value, name: &str, args: &[Value]) -> Result<Value, QueryError> {
    match name {
        "isin" => match args {
            [Value::List(items)] => Ok(Value::Bool(items.iter().any(|i| loose_eq(target, i)))),
            [other] => Err(QueryError::Type(format!(
                "only list-like objects are allowed to be passed to isin(), you passed a '{}'",
                other.type_name()
            ))),
            _ => Err(arity_error(name, 1, args.len())),
        },
        "isna" | "isnull" | "notna" | "notnull" => {
            if !args.is_empty() {
                return Err(arity_error(name, 0, args.len()));
            }
            let missing = *target == Value::Null;
            Ok(Value::Bool(missing == name.starts_with("is")))
        }
        _ => Err(QueryError::UnknownMethod(name.to_string())),
    }
}

fn arity_error(name: &str, expected: usize, got: usize) -> QueryError {
    QueryError::Type(format!(
        "{}() takes {} argument(s) but {} were given",
        name, expected, got
    ))
}

/// Unwraps a `.str` accessor target. `None` means a missing value.
fn string_target(value: &Value) -> Result<Option<&str>, QueryError> {
    match value {
        Value::Str(s) => Ok(Some(s.as_str())),
        Value::Null => Ok(None),
        _ => Err(QueryError::Type(
            "Can only use .str accessor with string values!".to_string(),
        )),
    }
}

fn str_arg<'a>(
    args: &'a [Value],
    kwargs: &'a [(&str, Value)],
    position: usize,
    key: &str,
) -> Option<&'a Value> {
    args.get(position)
        .or_else(|| kwargs.iter().find(|(k, _)| *k == key).map(|(_, v)| v))
}

fn bool_arg(
    name: &str,
    args: &[Value],
    kwargs: &[(&str, Value)],
    position: usize,
    key: &str,
    default: bool,
) -> Result<bool, QueryError> {
    match str_arg(args, kwargs, position, key) {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(QueryError::Type(format!(
            "{}() argument '{}' must be bool, not '{}'",
            name,
            key,
            other.type_name()
        ))),
    }
}

fn pattern_arg<'a>(
    name: &str,
    args: &'a [Value],
    kwargs: &'a [(&str, Value)],
) -> Result<&'a str, QueryError> {
    match str_arg(args, kwargs, 0, "pat") {
        Some(Value::Str(s)) => Ok(s.as_str()),
        Some(other) => Err(QueryError::Type(format!(
            "{}() pattern must be str, not '{}'",
            name,
            other.type_name()
        ))),
        None => Err(QueryError::Type(format!(
            "{}() missing 1 required positional argument: 'pat'",
            name
        ))),
    }
}

fn str_method(
    target: &Value,
    name: &str,
    args: &[Value],
    kwargs: &[(&str, Value)],
) -> Result<Value, QueryError> {
    let Some(s) = string_target(target)? else {
        // Predicates fall back to `na=`; transforms propagate the missing value.
        return Ok(kwargs
            .iter()
            .find(|(k, _)| *k == "na")
            .map_or(Value::Null, |(_, v)| v.clone()));
    };

    match name {
        "contains" => {
            let pat = pattern_arg(name, args, kwargs)?;
            let case = bool_arg(name, args, kwargs, 1, "case", true)?;
            let use_regex = bool_arg(name, args, kwargs, 4, "regex", true)?;
            let found = if use_regex {
                RegexBuilder::new(pat)
                    .case_insensitive(!case)
                    .build()
                    .map_err(|e| QueryError::Regex(e.to_string()))?
                    .is_match(s)
            } else if case {
                s.contains(pat)
            } else {
                s.to_lowercase().contains(&pat.to_lowercase())
            };
            Ok(Value::Bool(found))
        }
        "startswith" => Ok(Value::Bool(s.starts_with(pattern_arg(name, args, kwargs)?))),
        "endswith" => Ok(Value::Bool(s.ends_with(pattern_arg(name, args, kwargs)?))),
        "match" => {
            let pat = pattern_arg(name, args, kwargs)?;
            let case = bool_arg(name, args, kwargs, 1, "case", true)?;
            let re = RegexBuilder::new(&format!("^(?:{})", pat))
                .case_insensitive(!case)
                .build()
                .map_err(|e| QueryError::Regex(e.to_string()))?;
            Ok(Value::Bool(re.is_match(s)))
        }
        "lower" => Ok(Value::Str(s.to_lowercase())),
        "upper" => Ok(Value::Str(s.to_uppercase())),
        "strip" => Ok(Value::Str(s.trim().to_string())),
        "len" => Ok(Value::Num(s.chars().count() as f64)),
        _ => Err(QueryError::UnknownMethod(format!("str.{}", name))),
    }
}
