//! Record shapes
//!
//! A record type describes itself to the repository through a static list of
//! [`Field`] descriptors. The list fixes the column order used for inserts,
//! updates and inferred DDL, and supplies the accessors the codec uses to move
//! values between a record and a row.
//!
//! ```rust,ignore
//! #[derive(Debug, Default)]
//! struct Movie {
//!     id: Option<i64>,
//!     title: String,
//!     price: f64,
//! }
//!
//! impl Record for Movie {
//!     const TYPE_NAME: &'static str = "Movie";
//!     const FIELDS: &'static [Field<Self>] = &[
//!         Field::new("id", FieldType::Integer, |m: &Movie| m.id.into(), |m: &mut Movie, v| {
//!             assign(&mut m.id, v)
//!         }),
//!         Field::new("title", FieldType::Text, |m: &Movie| (&m.title).into(), |m: &mut Movie, v| {
//!             assign(&mut m.title, v)
//!         }),
//!         Field::new("price", FieldType::Float, |m: &Movie| m.price.into(), |m: &mut Movie, v| {
//!             assign(&mut m.price, v)
//!         }),
//!     ];
//! }
//! ```

pub mod codec;

use crate::database::core::dialect::is_placeholder_name;
use crate::database::core::value::{FromValue, Value};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fmt;

/// Name of the identity field every record carries
pub const IDENTITY_FIELD: &str = "id";

/// Semantic type of a record field, used to pick a column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Float,
    Integer,
    Boolean,
    /// A type with no column mapping; carries the Rust type name for diagnostics
    Opaque(&'static str),
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Float => "float",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Opaque(name) => *name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One declared field of a record type
pub struct Field<R> {
    pub name: &'static str,
    pub field_type: FieldType,
    pub get: fn(&R) -> Value,
    pub set: fn(&mut R, Value) -> Result<()>,
}

impl<R> Field<R> {
    pub const fn new(
        name: &'static str,
        field_type: FieldType,
        get: fn(&R) -> Value,
        set: fn(&mut R, Value) -> Result<()>,
    ) -> Self {
        Self {
            name,
            field_type,
            get,
            set,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.name == IDENTITY_FIELD
    }
}

impl<R> Clone for Field<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Field<R> {}

impl<R> fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .finish()
    }
}

/// Convert `value` and store it in `slot`
///
/// Setters in a field list are usually just `|r, v| assign(&mut r.field, v)`.
pub fn assign<T: FromValue>(slot: &mut T, value: Value) -> Result<()> {
    *slot = T::from_value(value)?;
    Ok(())
}

/// A plain data type stored as rows of one table
pub trait Record: Default + Sized + 'static {
    /// Type name used to derive the default table name
    const TYPE_NAME: &'static str;

    /// Declared fields in column order, including the identity field
    const FIELDS: &'static [Field<Self>];

    /// Explicit `CREATE TABLE` statement, used instead of inferred DDL
    const SCHEMA: Option<&'static str> = None;
}

/// The identity descriptor of `R`
pub fn identity_field<R: Record>() -> Result<&'static Field<R>> {
    R::FIELDS.iter().find(|f| f.is_identity()).ok_or_else(|| {
        Error::Mapping(format!(
            "record type {} has no '{}' field",
            R::TYPE_NAME,
            IDENTITY_FIELD
        ))
    })
}

/// Current identity of a record, `None` when it has not been assigned
pub fn identity_of<R: Record>(record: &R) -> Result<Option<i64>> {
    let field = identity_field::<R>()?;
    Option::<i64>::from_value((field.get)(record))
}

/// Write a database-assigned identity back into a record
pub fn assign_identity<R: Record>(record: &mut R, id: i64) -> Result<()> {
    let field = identity_field::<R>()?;
    (field.set)(record, Value::Integer(id))
}

/// A column name that has been checked against a [`FieldMapping`]
///
/// Only the mapping hands these out, so SQL rendering can rely on every
/// `Column` naming a declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: &'static str,
    placeholder: String,
}

impl Column {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bind name used for this column's `:placeholder`
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }
}

#[derive(Debug, Clone)]
struct MappedField {
    field_type: FieldType,
    placeholder: String,
}

/// Ordered field name to semantic type mapping for one record type
#[derive(Debug, Clone)]
pub struct FieldMapping {
    type_name: &'static str,
    fields: IndexMap<&'static str, MappedField>,
}

impl FieldMapping {
    /// Build the mapping from `R`'s declared fields
    pub fn of<R: Record>() -> Result<Self> {
        let mut fields: IndexMap<&'static str, MappedField> = IndexMap::new();

        for field in R::FIELDS {
            if fields.contains_key(field.name) {
                return Err(Error::Mapping(format!(
                    "record type {} declares field '{}' twice",
                    R::TYPE_NAME,
                    field.name
                )));
            }
            fields.insert(
                field.name,
                MappedField {
                    field_type: field.field_type,
                    placeholder: String::new(),
                },
            );
        }

        // Names that cannot appear after ':' get a generated bind name
        let taken: Vec<&'static str> = fields.keys().copied().collect();
        for (index, (name, mapped)) in fields.iter_mut().enumerate() {
            mapped.placeholder = if is_placeholder_name(name) {
                name.to_string()
            } else {
                let mut candidate = format!("p{}", index);
                while taken.iter().any(|t| *t == candidate) {
                    candidate.push('_');
                }
                candidate
            };
        }

        Ok(Self {
            type_name: R::TYPE_NAME,
            fields,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields.get(name).map(|f| f.field_type)
    }

    pub fn has_identity(&self) -> bool {
        self.contains(IDENTITY_FIELD)
    }

    /// Fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FieldType)> + '_ {
        self.fields.iter().map(|(name, f)| (*name, f.field_type))
    }

    /// Check `name` against the declared fields of this mapping
    ///
    /// `table` is only used in the error.
    pub fn column(&self, table: &str, name: &str) -> Result<Column> {
        match self.fields.get_key_value(name) {
            Some((declared, mapped)) => Ok(Column {
                name: *declared,
                placeholder: mapped.placeholder.clone(),
            }),
            None => Err(Error::invalid_column(table, name)),
        }
    }

    /// Every column but the identity, in declaration order
    pub fn payload_columns(&self) -> Vec<Column> {
        self.fields
            .iter()
            .filter(|entry| *entry.0 != IDENTITY_FIELD)
            .map(|(name, mapped)| Column {
                name: *name,
                placeholder: mapped.placeholder.clone(),
            })
            .collect()
    }

    /// The identity column, if the record type declares one
    pub fn identity_column(&self) -> Option<Column> {
        self.fields
            .get_key_value(IDENTITY_FIELD)
            .map(|(name, mapped)| Column {
                name: *name,
                placeholder: mapped.placeholder.clone(),
            })
    }
}
