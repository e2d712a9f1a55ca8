//! SQL text for one bound table
//!
//! Everything here is built from quoted, validated identifiers. Values never
//! appear in the text; they travel as named parameters.

use crate::database::core::dialect::Dialect;
use crate::error::{Error, Result};
use crate::record::codec::{assignment_clause, column_list_clause, placeholder_clause};
use crate::record::{Column, FieldMapping};

/// Bind name of the pattern shared by every `LIKE` predicate
pub const SEARCH_PARAM: &str = "search_text";

/// Statements that only depend on the binding, rendered once per repository
#[derive(Debug, Clone)]
pub struct Statements {
    dialect: Dialect,
    quoted_table: String,
    pub identity: Column,
    pub payload: Vec<Column>,
    pub select_all: String,
    pub select_by_id: String,
    pub insert: String,
    pub update: Option<String>,
    pub delete_by_id: String,
    pub delete_all: String,
    pub drop_table: String,
    pub count: String,
}

impl Statements {
    pub fn build(dialect: Dialect, table: &str, mapping: &FieldMapping) -> Result<Self> {
        let identity = mapping.identity_column().ok_or_else(|| {
            Error::Mapping(format!(
                "record type {} has no identity field",
                mapping.type_name()
            ))
        })?;
        let payload = mapping.payload_columns();

        let quoted_table = dialect.quote_identifier(table)?;
        let id_predicate = format!(
            "{} = :{}",
            dialect.quote_identifier(identity.name())?,
            identity.placeholder()
        );

        let insert = if payload.is_empty() {
            match dialect {
                Dialect::Sqlite => format!("INSERT INTO {} DEFAULT VALUES", quoted_table),
                Dialect::MySql => format!("INSERT INTO {} () VALUES ()", quoted_table),
            }
        } else {
            format!(
                "INSERT INTO {} {} VALUES {}",
                quoted_table,
                column_list_clause(dialect, &payload)?,
                placeholder_clause(&payload)
            )
        };

        // A record with nothing but an identity has nothing to update
        let update = if payload.is_empty() {
            None
        } else {
            Some(format!(
                "UPDATE {} SET {} WHERE {}",
                quoted_table,
                assignment_clause(dialect, &payload)?,
                id_predicate
            ))
        };

        Ok(Self {
            select_all: format!("SELECT * FROM {}", quoted_table),
            select_by_id: format!("SELECT * FROM {} WHERE {}", quoted_table, id_predicate),
            delete_by_id: format!("DELETE FROM {} WHERE {}", quoted_table, id_predicate),
            delete_all: format!("DELETE FROM {}", quoted_table),
            drop_table: format!("DROP TABLE IF EXISTS {}", quoted_table),
            count: format!("SELECT COUNT(*) AS count FROM {}", quoted_table),
            insert,
            update,
            dialect,
            quoted_table,
            identity,
            payload,
        })
    }

    /// `SELECT * FROM t WHERE c1 LIKE :search_text OR c2 LIKE :search_text ...`
    pub fn search(&self, columns: &[Column]) -> Result<String> {
        if columns.is_empty() {
            return Err(Error::Mapping("search needs at least one column".to_string()));
        }
        let predicates = columns
            .iter()
            .map(|c| {
                Ok(format!(
                    "{} LIKE :{}",
                    self.dialect.quote_identifier(c.name())?,
                    SEARCH_PARAM
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(format!(
            "SELECT * FROM {} WHERE {}",
            self.quoted_table,
            predicates.join(" OR ")
        ))
    }
}
