//! Table definitions inferred from record shapes
//!
//! A record type either supplies its own `CREATE TABLE` statement through
//! [`Record::SCHEMA`] or has one derived from its field list. Inferred
//! statements carry an `IF NOT EXISTS` guard so running them twice is harmless.

use crate::database::core::dialect::Dialect;
use crate::error::{Error, Result};
use crate::record::{FieldMapping, FieldType, Record, IDENTITY_FIELD};

/// Column type for a field of the given semantic type
///
/// MySQL floats map to `double` so values read back compare equal to what
/// was written.
pub fn column_type(dialect: Dialect, field: &str, field_type: FieldType) -> Result<&'static str> {
    let sql_type = match (dialect, field_type) {
        (Dialect::MySql, FieldType::Text) => "text",
        (Dialect::MySql, FieldType::Float) => "double",
        (Dialect::MySql, FieldType::Integer) => "integer",
        (Dialect::MySql, FieldType::Boolean) => "boolean",
        (Dialect::Sqlite, FieldType::Text) => "TEXT",
        (Dialect::Sqlite, FieldType::Float) => "REAL",
        (Dialect::Sqlite, FieldType::Integer) => "INTEGER",
        (Dialect::Sqlite, FieldType::Boolean) => "BOOLEAN",
        (_, FieldType::Opaque(type_name)) => {
            return Err(Error::SchemaInference {
                field: field.to_string(),
                type_name: type_name.to_string(),
            })
        }
    };
    Ok(sql_type)
}

/// Derive `CREATE TABLE IF NOT EXISTS` for `table` from a field mapping
///
/// The identity column always comes first; the rest follow declaration order.
pub fn infer_create_table_statement(
    table: &str,
    dialect: Dialect,
    mapping: &FieldMapping,
) -> Result<String> {
    let mut columns = vec![format!(
        "{} {}",
        dialect.quote_identifier(IDENTITY_FIELD)?,
        dialect.identity_column()
    )];

    for (name, field_type) in mapping.iter() {
        if name == IDENTITY_FIELD {
            continue;
        }
        columns.push(format!(
            "{} {}",
            dialect.quote_identifier(name)?,
            column_type(dialect, name, field_type)?
        ));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        dialect.quote_identifier(table)?,
        columns.join(", ")
    ))
}

/// The statement that creates `R`'s table
///
/// Prefers the record's explicit schema and falls back to inference.
pub fn resolve_create_table_statement<R: Record>(table: &str, dialect: Dialect) -> Result<String> {
    if let Some(schema) = R::SCHEMA {
        return Ok(schema.to_string());
    }
    infer_create_table_statement(table, dialect, &FieldMapping::of::<R>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{assign, Field};
    use crate::testing::{Dvd, Movie};

    #[derive(Debug, Default)]
    struct Attachment {
        id: Option<i64>,
        name: String,
        blob: Vec<u8>,
    }

    impl Record for Attachment {
        const TYPE_NAME: &'static str = "Attachment";
        const FIELDS: &'static [Field<Self>] = &[
            Field::new(
                "id",
                FieldType::Integer,
                |r: &Attachment| r.id.into(),
                |r: &mut Attachment, v| assign(&mut r.id, v),
            ),
            Field::new(
                "name",
                FieldType::Text,
                |r: &Attachment| (&r.name).into(),
                |r: &mut Attachment, v| assign(&mut r.name, v),
            ),
            Field::new(
                "blob",
                FieldType::Opaque("Vec<u8>"),
                |r: &Attachment| r.blob.len().to_string().into(),
                |_: &mut Attachment, _| Ok(()),
            ),
        ];
    }

    #[derive(Debug, Default)]
    struct Ticket {
        id: Option<i64>,
    }

    impl Record for Ticket {
        const TYPE_NAME: &'static str = "Ticket";
        const FIELDS: &'static [Field<Self>] = &[Field::new(
            "id",
            FieldType::Integer,
            |r: &Ticket| r.id.into(),
            |r: &mut Ticket, v| assign(&mut r.id, v),
        )];
        const SCHEMA: Option<&'static str> =
            Some("CREATE TABLE IF NOT EXISTS tickets (id INTEGER PRIMARY KEY, seat TEXT NOT NULL)");
    }

    #[test]
    fn test_infer_sqlite() {
        let sql = resolve_create_table_statement::<Movie>("movie", Dialect::Sqlite).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"movie\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"title\" TEXT, \"price\" REAL, \"category\" TEXT)"
        );
    }

    #[test]
    fn test_infer_mysql() {
        let sql = resolve_create_table_statement::<Dvd>("dvds", Dialect::MySql).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS `dvds` (`id` integer PRIMARY KEY AUTO_INCREMENT, \
             `title` text, `category` text, `price` double, `voteAverage` double, \
             `numVotes` integer)"
        );
    }

    #[test]
    fn test_explicit_schema_wins() {
        let sql = resolve_create_table_statement::<Ticket>("ignored", Dialect::Sqlite).unwrap();
        assert_eq!(Some(sql.as_str()), Ticket::SCHEMA);
    }

    #[test]
    fn test_opaque_field_fails_inference() {
        match resolve_create_table_statement::<Attachment>("attachment", Dialect::Sqlite) {
            Err(Error::SchemaInference { field, type_name }) => {
                assert_eq!(field, "blob");
                assert_eq!(type_name, "Vec<u8>");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_column_types() {
        assert_eq!(
            column_type(Dialect::Sqlite, "flag", FieldType::Boolean).unwrap(),
            "BOOLEAN"
        );
        assert_eq!(
            column_type(Dialect::MySql, "n", FieldType::Integer).unwrap(),
            "integer"
        );
    }
}
