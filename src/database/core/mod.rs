//! Core database infrastructure
//!
//! This module provides the foundational components the repository builds on:
//! - `ConnectionProvider`: opens handles from a `DatabaseConfig` under a policy
//! - `SqliteConn` / `MySqlConn`: the two drivers behind the `Connection` trait
//! - `Dialect`: identifier quoting and engine-specific column definitions
//! - `schema`: `CREATE TABLE` inference from record shapes

pub mod connection;
pub mod dialect;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use connection::{Connection, ConnectionProvider, Params};
pub use dialect::Dialect;
#[cfg(feature = "mysql")]
pub use mysql::MySqlConn;
pub use schema::resolve_create_table_statement;
pub use sqlite::SqliteConn;
pub use value::{FromValue, Row, Value};
