use crate::error::{Error, Result};
use config::Config;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default MySQL port when `MYSQL_PORT` is not set
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Path value that selects an in-memory SQLite database
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Where the database lives
#[derive(Clone, PartialEq, Eq)]
pub enum Backend {
    /// Network MySQL server
    MySql {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
    /// Embedded SQLite database; `None` is an in-memory database
    Sqlite { path: Option<String> },
}

/// Whether a provider keeps one handle or opens one per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPolicy {
    /// Open the handle once and use it for every operation
    Reuse,
    /// Open a fresh handle for every repository operation
    PerOperation,
}

impl FromStr for ConnectionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "reuse" => Ok(ConnectionPolicy::Reuse),
            "per_operation" => Ok(ConnectionPolicy::PerOperation),
            _ => Err(Error::Config(format!(
                "Invalid connection_policy '{}' (expected 'reuse' or 'per_operation')",
                s
            ))),
        }
    }
}

/// Resolved connection settings
///
/// Credentials never appear in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub backend: Backend,
    pub policy: ConnectionPolicy,
}

impl DatabaseConfig {
    /// Embedded SQLite database stored in a file
    pub fn sqlite(path: impl Into<String>) -> Self {
        let path = path.into();
        if path == IN_MEMORY_PATH {
            return Self::in_memory();
        }
        Self {
            backend: Backend::Sqlite { path: Some(path) },
            policy: ConnectionPolicy::PerOperation,
        }
    }

    /// Embedded in-memory SQLite database (always reuses its single handle)
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Sqlite { path: None },
            policy: ConnectionPolicy::Reuse,
        }
    }

    /// Network MySQL server
    pub fn mysql(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            backend: Backend::MySql {
                host: host.into(),
                port,
                user: user.into(),
                password: password.into(),
                database: database.into(),
            },
            policy: ConnectionPolicy::PerOperation,
        }
    }

    pub fn with_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The policy actually applied: in-memory databases cannot be reopened
    pub fn effective_policy(&self) -> ConnectionPolicy {
        match &self.backend {
            Backend::Sqlite { path: None } => ConnectionPolicy::Reuse,
            _ => self.policy,
        }
    }

    /// Load settings from `.env`, an optional TOML file and the environment
    ///
    /// Recognized environment variables: `MYSQL_HOST`, `MYSQL_PORT`,
    /// `MYSQL_USER`, `MYSQL_PASSWORD`, `MYSQL_DATABASE`, `SQLITE_PATH` and
    /// `TABLEREPO_CONNECTION_POLICY`. The TOML file uses the same names
    /// without prefix (`host`, `port`, ..., `path`, `connection_policy`).
    /// Environment values override the file.
    pub fn load(path: Option<&str>) -> Result<DatabaseConfig> {
        // A missing .env file is not an error; the values may come from the real environment
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(Error::Config(format!("Failed to read .env file: {}", e)));
            }
        }

        let mut builder = Config::builder();

        if let Some(p) = path {
            if !Path::new(p).exists() {
                return Err(Error::Config(format!("Config file not found: {}", p)));
            }
            builder = builder.add_source(config::File::with_name(p));
        }

        // E.g., `MYSQL_HOST=db.internal` sets the host, `SQLITE_PATH=/tmp/app.db` selects embedded mode
        builder = builder
            .add_source(config::Environment::with_prefix("MYSQL"))
            .add_source(config::Environment::with_prefix("SQLITE"))
            .add_source(config::Environment::with_prefix("TABLEREPO"));

        let settings = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build configuration: {}", e)))?;

        let values = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| Error::Config(format!("Failed to deserialize configuration: {}", e)))?;

        Self::from_map(&values)
    }

    /// Resolve settings from already-loaded key/value pairs
    pub fn from_map(values: &HashMap<String, String>) -> Result<DatabaseConfig> {
        let policy = match values.get("connection_policy") {
            Some(p) => p.parse()?,
            None => ConnectionPolicy::PerOperation,
        };

        if let Some(path) = values.get("path").filter(|p| !p.trim().is_empty()) {
            return Ok(DatabaseConfig::sqlite(path.as_str()).with_policy(policy));
        }

        let host = values
            .get("host")
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "missing MYSQL_HOST (and no SQLITE_PATH) - is the .env file present?"
                        .to_string(),
                )
            })?;

        let database = values
            .get("database")
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| Error::Config("missing MYSQL_DATABASE".to_string()))?;

        let port = match values.get("port").filter(|p| !p.trim().is_empty()) {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("Invalid MYSQL_PORT '{}'", p)))?,
            None => DEFAULT_MYSQL_PORT,
        };

        let user = values.get("user").cloned().unwrap_or_default();
        let password = values.get("password").cloned().unwrap_or_default();

        Ok(DatabaseConfig::mysql(host.as_str(), port, user, password, database.as_str())
            .with_policy(policy))
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let location = match &self.backend {
            Backend::MySql {
                host,
                port,
                user,
                database,
                ..
            } => vec![
                "Backend:            mysql".to_string(),
                format!("Host:               {}:{}", host, port),
                format!("User:               {}", user),
                format!("Database:           {}", database),
            ],
            Backend::Sqlite { path } => vec![
                "Backend:            sqlite".to_string(),
                format!(
                    "Path:               {}",
                    path.as_deref().unwrap_or(IN_MEMORY_PATH)
                ),
            ],
        };

        let mut lines = location;
        lines.push(format!(
            "Connection Policy:  {}",
            match self.effective_policy() {
                ConnectionPolicy::Reuse => "reuse",
                ConnectionPolicy::PerOperation => "per operation",
            }
        ));
        lines.join("\n")
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::MySql {
                host,
                port,
                user,
                database,
                ..
            } => f
                .debug_struct("MySql")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &"<redacted>")
                .field("database", database)
                .finish(),
            Backend::Sqlite { path } => f.debug_struct("Sqlite").field("path", path).finish(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("policy", &self.policy)
            .finish()
    }
}

impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backend {
            Backend::MySql {
                host,
                port,
                database,
                ..
            } => write!(f, "mysql://{}:{}/{}", host, port, database),
            Backend::Sqlite { path } => {
                write!(f, "sqlite:{}", path.as_deref().unwrap_or(IN_MEMORY_PATH))
            }
        }
    }
}
