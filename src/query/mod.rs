//! Row filter expressions for the schedule lookup.
//!
//! The model is told it is writing a pandas `DataFrame.query` string, so the
//! accepted syntax is the subset of that language it actually produces:
//! comparisons (chained too), `in`/`not in`, boolean operators in both their
//! keyword and bitwise spellings, `@variables`, `.isin()`/`.isna()`-style
//! methods and the `.str` accessor. Expressions are parsed once into a
//! [`Filter`] and then evaluated row by row.

mod eval;
mod lexer;
mod parser;

use std::collections::HashMap;

use thiserror::Error;

/// A scalar or list value produced while evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Python type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NoneType",
            Value::Bool(_) => "bool",
            Value::Num(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Option<&str>> for Value {
    fn from(s: Option<&str>) -> Self {
        s.map_or(Value::Null, Value::from)
    }
}

/// Something a filter can be evaluated against.
pub trait Row {
    /// Returns the column's value, or `None` when the row has no such column.
    fn column(&self, name: &str) -> Option<Value>;
}

/// Named variables visible to an expression (`@name`, or a bare name that
/// is not a column).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.vars.insert(name.into(), value);
        self
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("empty query expression")]
    Empty,
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("invalid syntax at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("name '{0}' is not defined")]
    Undefined(String),
    #[error("{0}")]
    Type(String),
    #[error("unknown method '{0}'")]
    UnknownMethod(String),
    #[error("invalid regex: {0}")]
    Regex(String),
    #[error("query expression must evaluate to a boolean, got {0}")]
    NotBoolean(&'static str),
}

/// A parsed filter expression.
#[derive(Debug, Clone)]
pub struct Filter {
    expr: parser::Expr,
}

impl Filter {
    pub fn parse(src: &str) -> Result<Self, QueryError> {
        Ok(Self {
            expr: parser::parse(src)?,
        })
    }

    /// Evaluates the filter against one row. Missing values count as a
    /// non-match rather than an error.
    pub fn matches(&self, row: &dyn Row, scope: &Scope) -> Result<bool, QueryError> {
        match eval::eval(&self.expr, row, scope)? {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(QueryError::NotBoolean(other.type_name())),
        }
    }

    /// Keeps the first `limit` rows the filter accepts, in input order.
    /// Every row is evaluated, so an error anywhere fails the whole query.
    pub fn select<'a, R: Row>(
        &self,
        rows: &'a [R],
        scope: &Scope,
        limit: usize,
    ) -> Result<Vec<&'a R>, QueryError> {
        let mut selected = Vec::new();
        for row in rows {
            if self.matches(row, scope)? && selected.len() < limit {
                selected.push(row);
            }
        }
        Ok(selected)
    }
}
