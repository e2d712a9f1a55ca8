//! Error types for tablerepo.

use thiserror::Error;

/// Result type alias for tablerepo operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tablerepo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid connection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The database could not be reached or opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// Record shape does not match what the repository expects
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Caller-supplied column name is not part of the record's field mapping
    #[error("Invalid column '{column}' for table '{table}'")]
    InvalidColumn { table: String, column: String },

    /// A field type has no column mapping and the record supplies no schema
    #[error("Cannot infer column type for field '{field}' of type '{type_name}'")]
    SchemaInference { field: String, type_name: String },

    /// Failure reported by the database engine while executing a statement
    #[error("Database error: {message}{}", format_sql(.sql))]
    Database {
        message: String,
        sql: Option<String>,
    },
}

fn format_sql(sql: &Option<String>) -> String {
    match sql {
        Some(sql) => format!("\n  SQL: {}", sql),
        None => String::new(),
    }
}

impl Error {
    /// Create a Database error carrying the statement that failed
    pub fn database(message: impl std::fmt::Display, sql: impl Into<String>) -> Self {
        Error::Database {
            message: message.to_string(),
            sql: Some(sql.into()),
        }
    }

    /// Create an InvalidColumn error
    pub fn invalid_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::InvalidColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Whether this error came from the database engine rather than from the caller's input
    pub fn is_database(&self) -> bool {
        matches!(self, Error::Database { .. })
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Database {
            message: e.to_string(),
            sql: None,
        }
    }
}
