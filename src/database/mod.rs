//! Database module
//!
//! ```text
//! database/
//! └── core/
//!     ├── connection  # Connection trait, named Params, ConnectionProvider
//!     ├── dialect     # SQLite / MySQL identifier quoting
//!     ├── mysql       # mysql_async driver (feature = "mysql")
//!     ├── schema      # CREATE TABLE inference
//!     ├── sqlite      # rusqlite driver
//!     └── value       # Value and Row
//! ```
//!
//! # Backend Strategy
//!
//! SQLite is always available and backs both file and in-memory databases.
//! MySQL is compiled in with the `mysql` feature. Both drivers bind values by
//! `:name` so the statements rendered by the repository run unchanged on either.

pub mod core;

pub use core::{
    resolve_create_table_statement, Connection, ConnectionProvider, Dialect, FromValue, Params,
    Row, SqliteConn, Value,
};
#[cfg(feature = "mysql")]
pub use core::MySqlConn;
