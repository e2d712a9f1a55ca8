//! Database connection management
//!
//! This module provides the [`Connection`] capability set every driver offers,
//! and the [`ConnectionProvider`] that opens handles from a [`DatabaseConfig`].

use crate::config::{Backend, ConnectionPolicy, DatabaseConfig};
use crate::database::core::dialect::Dialect;
use crate::database::core::sqlite::SqliteConn;
use crate::database::core::value::{Row, Value};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::cell::RefCell;
use tracing::{debug, info};

/// Named parameters bound to a statement
///
/// Names are stored without the leading `:`; drivers add whatever prefix
/// their binding API expects.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    values: IndexMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.values
            .insert(name.trim_start_matches(':').to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(&name, value);
        }
        params
    }
}

/// The parameterized-query capabilities the repository relies on
///
/// Placeholders in `sql` are written `:name` and bound by name from `params`.
pub trait Connection {
    /// SQL dialect spoken by this connection
    fn dialect(&self) -> Dialect;

    /// Execute a statement and return the number of rows affected
    fn execute(&mut self, sql: &str, params: &Params) -> Result<usize>;

    /// Run a query and collect every row
    fn query(&mut self, sql: &str, params: &Params) -> Result<Vec<Row>>;

    /// Run a query and return the first row, if any
    fn query_one(&mut self, sql: &str, params: &Params) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Identity assigned by the most recent successful insert on this connection
    fn last_insert_id(&mut self) -> Result<i64>;

    /// Check if a table exists in the database
    fn table_exists(&mut self, table_name: &str) -> Result<bool>;
}

/// Opens database handles from a configuration and hands them to operations
///
/// With [`ConnectionPolicy::Reuse`] one handle is opened at construction and
/// kept for the life of the provider. With [`ConnectionPolicy::PerOperation`]
/// the handle opened at construction only proves the database is reachable;
/// every [`with_connection`](Self::with_connection) call opens its own.
pub struct ConnectionProvider {
    config: DatabaseConfig,
    held: RefCell<Option<Box<dyn Connection>>>,
    #[cfg(feature = "mysql")]
    runtime: Option<std::sync::Arc<tokio::runtime::Runtime>>,
}

impl ConnectionProvider {
    /// Validate the configuration and open the first handle
    pub fn connect(config: DatabaseConfig) -> Result<Self> {
        validate(&config)?;

        #[cfg(feature = "mysql")]
        let runtime = match config.backend {
            Backend::MySql { .. } => Some(std::sync::Arc::new(
                crate::database::core::mysql::build_runtime()?,
            )),
            Backend::Sqlite { .. } => None,
        };

        let provider = Self {
            config,
            held: RefCell::new(None),
            #[cfg(feature = "mysql")]
            runtime,
        };

        let conn = provider.open()?;
        info!("Connected to {}", provider.config);

        if provider.policy() == ConnectionPolicy::Reuse {
            *provider.held.borrow_mut() = Some(conn);
        }

        Ok(provider)
    }

    /// Create an in-memory SQLite provider
    pub fn open_in_memory() -> Result<Self> {
        Self::connect(DatabaseConfig::in_memory())
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn policy(&self) -> ConnectionPolicy {
        self.config.effective_policy()
    }

    pub fn dialect(&self) -> Dialect {
        match self.config.backend {
            Backend::MySql { .. } => Dialect::MySql,
            Backend::Sqlite { .. } => Dialect::Sqlite,
        }
    }

    /// Run `f` against a connection chosen by the provider's policy
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Connection) -> Result<T>,
    {
        match self.policy() {
            ConnectionPolicy::Reuse => {
                let mut held = self.held.try_borrow_mut().map_err(|_| {
                    Error::Connection("connection is already in use by another operation".into())
                })?;
                if held.is_none() {
                    *held = Some(self.open()?);
                }
                match held.as_mut() {
                    Some(conn) => f(conn.as_mut()),
                    None => Err(Error::Connection("no open connection".into())),
                }
            }
            ConnectionPolicy::PerOperation => {
                let mut conn = self.open()?;
                debug!("Opened per-operation connection to {}", self.config);
                f(conn.as_mut())
            }
        }
    }

    fn open(&self) -> Result<Box<dyn Connection>> {
        match &self.config.backend {
            Backend::Sqlite { path } => Ok(Box::new(SqliteConn::open(path.as_deref())?)),
            #[cfg(feature = "mysql")]
            Backend::MySql { .. } => {
                let runtime = self.runtime.clone().ok_or_else(|| {
                    Error::Connection("MySQL runtime was not initialized".to_string())
                })?;
                Ok(Box::new(crate::database::core::mysql::MySqlConn::open(
                    &self.config,
                    runtime,
                )?))
            }
            #[cfg(not(feature = "mysql"))]
            Backend::MySql { .. } => Err(Error::Config(
                "MySQL support is not compiled in; enable the `mysql` feature".to_string(),
            )),
        }
    }
}

fn validate(config: &DatabaseConfig) -> Result<()> {
    match &config.backend {
        Backend::MySql { host, database, .. } => {
            if host.trim().is_empty() {
                return Err(Error::Config("missing MySQL host".to_string()));
            }
            if database.trim().is_empty() {
                return Err(Error::Config("missing MySQL database name".to_string()));
            }
        }
        Backend::Sqlite { path: Some(path) } if path.trim().is_empty() => {
            return Err(Error::Config("empty SQLite path".to_string()));
        }
        Backend::Sqlite { .. } => {}
    }
    Ok(())
}
