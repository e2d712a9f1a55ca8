//! SQL dialect differences and identifier handling
//!
//! Table and column names cannot be bound as statement parameters, so they are
//! the only text interpolated into SQL. Every identifier passes through
//! [`validate_identifier`] and is quoted for the target engine before use.

use crate::error::{Error, Result};
use std::fmt;

/// Longest identifier accepted (MySQL's limit, the stricter of the two engines)
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// The SQL engine a connection speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
}

impl Dialect {
    /// Quote an identifier for this dialect
    ///
    /// The quote character is doubled inside the name, so the result is always
    /// a single identifier token.
    pub fn quote_identifier(&self, name: &str) -> Result<String> {
        validate_identifier(name)?;
        Ok(match self {
            Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
        })
    }

    /// Column definition for the auto-assigned integer identity
    pub fn identity_column(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::MySql => "integer PRIMARY KEY AUTO_INCREMENT",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Validate an identifier before it is quoted into SQL text
///
/// Rejects empty names, names containing NUL bytes, and names longer than
/// the engine limit.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Mapping("identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(Error::Mapping(format!(
            "identifier contains a null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(Error::Mapping(format!(
            "identifier exceeds {} bytes (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Whether a name can be used as a `:name` bind placeholder
///
/// Both drivers scan placeholders as `[A-Za-z0-9_]+`, so anything else would
/// be split or misread.
pub fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_sqlite() {
        assert_eq!(Dialect::Sqlite.quote_identifier("dvd").unwrap(), "\"dvd\"");
        assert_eq!(
            Dialect::Sqlite.quote_identifier("a\"b").unwrap(),
            "\"a\"\"b\""
        );
    }

    #[test]
    fn test_quote_mysql() {
        assert_eq!(Dialect::MySql.quote_identifier("dvds").unwrap(), "`dvds`");
        assert_eq!(
            Dialect::MySql.quote_identifier("a`; DROP TABLE x; --").unwrap(),
            "`a``; DROP TABLE x; --`"
        );
    }

    #[test]
    fn test_validate_identifier_rejects() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("bad\0name").is_err());
        assert!(validate_identifier(&"x".repeat(65)).is_err());
        assert!(validate_identifier(&"x".repeat(64)).is_ok());
    }

    #[test]
    fn test_placeholder_names() {
        assert!(is_placeholder_name("vote_average"));
        assert!(is_placeholder_name("numVotes"));
        assert!(!is_placeholder_name("title name"));
        assert!(!is_placeholder_name("price-usd"));
        assert!(!is_placeholder_name(""));
    }

    #[test]
    fn test_identity_column() {
        assert_eq!(
            Dialect::MySql.identity_column(),
            "integer PRIMARY KEY AUTO_INCREMENT"
        );
        assert!(Dialect::Sqlite.identity_column().contains("AUTOINCREMENT"));
    }
}
