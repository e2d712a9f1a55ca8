#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! tablerepo - A generic table repository for plain data records
//!
//! tablerepo maps record types to rows of one relational table and performs
//! create, read, update, delete and search operations without SQL written per
//! record type. Table names and column lists come from each record's declared
//! field list; values always travel as named bound parameters.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Embedded SQLite, file or in-memory | `rusqlite` |
//! | `mysql` | Network MySQL driver | `mysql_async`, `tokio` |
//!
//! ```toml
//! # SQLite only
//! tablerepo = "0.1"
//!
//! # SQLite and MySQL
//! tablerepo = { version = "0.1", features = ["mysql"] }
//! ```
//!
//! # Architecture
//!
//! - **[`config`]**: connection settings from TOML, `.env` and the environment
//! - **[`database`]**: connection provider, drivers, dialects and DDL inference
//! - **[`record`]**: the [`Record`] trait, field mapping and row codec
//! - **[`repository`]**: [`TableRepository`], the per-table facade
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tablerepo::{ConnectionProvider, DatabaseConfig, TableRepository};
//!
//! // MYSQL_HOST, MYSQL_DATABASE, ... or SQLITE_PATH
//! let provider = ConnectionProvider::connect(DatabaseConfig::load(None)?)?;
//!
//! let dvds = TableRepository::<Dvd>::new(&provider)?;
//! dvds.create_table(None)?;
//!
//! let mut dvd = Dvd { title: "Batman".into(), price: 9.99, ..Default::default() };
//! let id = dvds.insert(&mut dvd);
//!
//! for dvd in dvds.search_by_columns(&["title", "category"], "man")? {
//!     println!("{} {}", dvd.title, dvd.price);
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod record;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Configuration
// =============================================================================

pub use config::{Backend, ConnectionPolicy, DatabaseConfig};

// =============================================================================
// Errors
// =============================================================================

pub use error::{Error, Result};

// =============================================================================
// Database
// =============================================================================

pub use database::{Connection, ConnectionProvider, Dialect, FromValue, Params, Row, Value};

// =============================================================================
// Records and repositories
// =============================================================================

pub use record::{assign, Field, FieldMapping, FieldType, Record};
pub use repository::{RepositoryConfig, TableBinding, TableRepository};
