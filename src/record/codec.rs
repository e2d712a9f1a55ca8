//! Moving values between records and rows
//!
//! Records become ordered column/value maps for writes, and rows become
//! records on reads. The clause renderers turn validated [`Column`]s into the
//! SQL fragments used by insert and update statements.

use crate::database::core::connection::Params;
use crate::database::core::dialect::Dialect;
use crate::database::core::value::{Row, Value};
use crate::error::{Error, Result};
use crate::record::{identity_field, Column, Record};
use indexmap::IndexMap;

/// Column name to value, in declaration order, identity excluded
pub type ColumnValues = IndexMap<&'static str, Value>;

/// Read every non-identity field of `record`
pub fn to_column_values<R: Record>(record: &R) -> Result<ColumnValues> {
    identity_field::<R>()?;
    Ok(R::FIELDS
        .iter()
        .filter(|field| !field.is_identity())
        .map(|field| (field.name, (field.get)(record)))
        .collect())
}

/// `("f1", "f2", ...)`
pub fn column_list_clause(dialect: Dialect, columns: &[Column]) -> Result<String> {
    let quoted = columns
        .iter()
        .map(|c| dialect.quote_identifier(c.name()))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", quoted.join(", ")))
}

/// `(:f1, :f2, ...)`
pub fn placeholder_clause(columns: &[Column]) -> String {
    let placeholders: Vec<String> = columns
        .iter()
        .map(|c| format!(":{}", c.placeholder()))
        .collect();
    format!("({})", placeholders.join(", "))
}

/// `"f1" = :f1, "f2" = :f2, ...`
pub fn assignment_clause(dialect: Dialect, columns: &[Column]) -> Result<String> {
    let assignments = columns
        .iter()
        .map(|c| {
            Ok(format!(
                "{} = :{}",
                dialect.quote_identifier(c.name())?,
                c.placeholder()
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(assignments.join(", "))
}

/// Bind each column's value under its placeholder name
pub fn bind_params(columns: &[Column], values: &ColumnValues) -> Result<Params> {
    let mut params = Params::new();
    for column in columns {
        let value = values.get(column.name()).ok_or_else(|| {
            Error::Mapping(format!("no value for column '{}'", column.name()))
        })?;
        params.insert(column.placeholder(), value.clone());
    }
    Ok(params)
}

/// Build a record from a result row
///
/// Columns the record does not declare are ignored; declared fields missing
/// from the row keep their default value.
pub fn from_row<R: Record>(row: Row) -> Result<R> {
    let mut record = R::default();
    for (column, value) in row {
        let Some(field) = R::FIELDS.iter().find(|f| f.name == column) else {
            continue;
        };
        (field.set)(&mut record, value).map_err(|e| match e {
            Error::Mapping(msg) => {
                Error::Mapping(format!("{}.{}: {}", R::TYPE_NAME, field.name, msg))
            }
            other => other,
        })?;
    }
    Ok(record)
}
