//! Scalar values and rows exchanged with the database drivers
//!
//! Records are encoded field by field into [`Value`]s, which the drivers bind
//! as named parameters. Query results come back as [`Row`]s keyed by column name.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use std::fmt;

/// A single SQL scalar value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, used in conversion diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Conversion from a [`Value`] read out of a row into a Rust field type
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &str, value: &Value) -> Error {
    Error::Mapping(format!(
        "cannot convert {} value '{}' into {}",
        value.kind(),
        value,
        expected
    ))
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(v) => Ok(v),
            Value::Boolean(v) => Ok(v as i64),
            // MySQL hands back DECIMAL and some aggregates as text
            Value::Text(ref s) => s.parse().map_err(|_| mismatch("i64", &value)),
            other => Err(mismatch("i64", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide).map_err(|_| mismatch("i32", &Value::Integer(wide)))
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> Result<Self> {
        let wide = i64::from_value(value)?;
        u32::try_from(wide).map_err(|_| mismatch("u32", &Value::Integer(wide)))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Real(v) => Ok(v),
            Value::Integer(v) => Ok(v as f64),
            Value::Text(ref s) => s.parse().map_err(|_| mismatch("f64", &value)),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            // SQLite and MySQL both store booleans as integers
            Value::Integer(v) => Ok(v != 0),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(v) => Ok(v),
            Value::Null => Err(mismatch("String", &Value::Null)),
            other => Ok(other.to_string()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Boolean(v) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*v as i64)),
        };
        Ok(output)
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(v) | ValueRef::Blob(v) => {
                Value::Text(String::from_utf8_lossy(v).into_owned())
            }
        }
    }
}

/// A result row: column name to value, in select-list order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    columns: IndexMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Remove a column and convert it into `T`
    pub fn take<T: FromValue>(&mut self, column: &str) -> Result<T> {
        let value = self
            .columns
            .shift_remove(column)
            .ok_or_else(|| Error::Mapping(format!("column '{}' missing from row", column)))?;
        T::from_value(value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_into_value() {
        let none: Option<String> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(
            Value::from(Some("comedy".to_string())),
            Value::Text("comedy".to_string())
        );
        assert_eq!(Value::from(8.01), Value::Real(8.01));
    }

    #[test]
    fn test_bool_from_sqlite_integer() {
        assert!(bool::from_value(Value::Integer(1)).unwrap());
        assert!(!bool::from_value(Value::Integer(0)).unwrap());
        assert!(bool::from_value(Value::Text("yes".to_string())).is_err());
    }

    #[test]
    fn test_numeric_widening_and_narrowing() {
        assert_eq!(f64::from_value(Value::Integer(8)).unwrap(), 8.0);
        assert_eq!(i32::from_value(Value::Integer(42)).unwrap(), 42);
        assert!(i32::from_value(Value::Integer(i64::MAX)).is_err());
        assert!(u32::from_value(Value::Integer(-1)).is_err());
    }

    #[test]
    fn test_null_into_option_and_required() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert!(String::from_value(Value::Null).is_err());
    }

    #[test]
    fn test_row_preserves_column_order() {
        let mut row = Row::new();
        row.push("id", Value::Integer(1));
        row.push("title", Value::from("pop"));
        row.push("price", Value::Real(8.01));

        let columns: Vec<&str> = row.iter().map(|(c, _)| c).collect();
        assert_eq!(columns, vec!["id", "title", "price"]);

        let title: String = row.take("title").unwrap();
        assert_eq!(title, "pop");
        assert_eq!(row.len(), 2);
        assert!(row.take::<String>("title").is_err());
    }

    #[test]
    fn test_row_serializes_as_object() {
        let row: Row = vec![
            ("id".to_string(), Value::Integer(1)),
            ("title".to_string(), Value::from("pop")),
            ("category".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":1,"title":"pop","category":null}"#);
    }
}
