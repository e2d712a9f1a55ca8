//! Which table a repository reads and writes

use crate::database::core::dialect::validate_identifier;
use crate::error::Result;
use crate::record::Record;
use serde::Serialize;

/// Overrides for the default table binding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Physical table name; defaults to the lower-cased record type name
    pub table: Option<String>,
    /// Namespace qualifier; defaults to the record type's module path
    pub qualifier: Option<String>,
}

impl RepositoryConfig {
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }
}

/// The record type and physical table one repository is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableBinding {
    type_name: &'static str,
    qualifier: String,
    table: String,
}

impl TableBinding {
    /// Default binding: the table is named after the record type, no plural
    pub fn of<R: Record>() -> Result<Self> {
        Self::from_config::<R>(&RepositoryConfig::default())
    }

    /// Bind `R` to an explicitly named table
    pub fn with_table<R: Record>(table: &str) -> Result<Self> {
        Self::from_config::<R>(&RepositoryConfig::default().with_table(table))
    }

    pub fn from_config<R: Record>(config: &RepositoryConfig) -> Result<Self> {
        let table = match &config.table {
            Some(table) => table.clone(),
            None => R::TYPE_NAME.to_lowercase(),
        };
        validate_identifier(&table)?;

        let qualifier = match &config.qualifier {
            Some(qualifier) => qualifier.clone(),
            None => module_path_of::<R>(),
        };

        Ok(Self {
            type_name: R::TYPE_NAME,
            qualifier,
            table,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

/// `my_crate::models::Dvd` -> `my_crate::models`
fn module_path_of<R>() -> String {
    let full = std::any::type_name::<R>();
    // Generic arguments can contain `::` of their own
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(pos) => base[..pos].to_string(),
        None => String::new(),
    }
}
