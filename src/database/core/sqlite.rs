//! Embedded SQLite driver
//!
//! `SqliteConn` wraps a rusqlite connection, handling both file-based and
//! in-memory databases with consistent configuration and error handling.

use crate::database::core::connection::{Connection, Params};
use crate::database::core::dialect::Dialect;
use crate::database::core::value::{Row, Value};
use crate::error::{Error, Result};
use rusqlite::ToSql;
use tracing::debug;

pub struct SqliteConn {
    pub conn: rusqlite::Connection,
}

impl SqliteConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => rusqlite::Connection::open(p).map_err(|e| {
                Error::Connection(format!("Failed to open database at '{}': {}", p, e))
            })?,
            None => rusqlite::Connection::open_in_memory().map_err(|e| {
                Error::Connection(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let db = SqliteConn { conn };
        db.configure()?;
        Ok(db)
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    fn configure(&self) -> Result<()> {
        // WAL lets per-operation handles on the same file read while another writes
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| Error::Connection(format!("Failed to set journal mode: {}", e)))?;

        self.conn
            .execute("PRAGMA synchronous=NORMAL", [])
            .map_err(|e| Error::Connection(format!("Failed to set synchronous mode: {}", e)))?;

        self.conn
            .execute("PRAGMA temp_store=MEMORY", [])
            .map_err(|e| Error::Connection(format!("Failed to set temp store: {}", e)))?;

        Ok(())
    }
}

/// rusqlite wants the `:` prefix on every bound name
fn named_params(params: &Params) -> Vec<(String, &dyn ToSql)> {
    params
        .iter()
        .map(|(name, value)| (format!(":{}", name), value as &dyn ToSql))
        .collect()
}

impl Connection for SqliteConn {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, sql: &str, params: &Params) -> Result<usize> {
        debug!("sqlite execute: {}", sql);
        let named = named_params(params);
        let bound: Vec<(&str, &dyn ToSql)> =
            named.iter().map(|(name, v)| (name.as_str(), *v)).collect();

        self.conn
            .execute(sql, bound.as_slice())
            .map_err(|e| Error::database(e, sql))
    }

    fn query(&mut self, sql: &str, params: &Params) -> Result<Vec<Row>> {
        debug!("sqlite query: {}", sql);
        let named = named_params(params);
        let bound: Vec<(&str, &dyn ToSql)> =
            named.iter().map(|(name, v)| (name.as_str(), *v)).collect();

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| Error::database(e, sql))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let rows = stmt
            .query_map(bound.as_slice(), |row| {
                let mut out = Row::new();
                for (i, column) in columns.iter().enumerate() {
                    out.push(column.as_str(), Value::from(row.get_ref(i)?));
                }
                Ok(out)
            })
            .map_err(|e| Error::database(e, sql))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::database(e, sql))
    }

    fn last_insert_id(&mut self) -> Result<i64> {
        Ok(self.conn.last_insert_rowid())
    }

    fn table_exists(&mut self, table_name: &str) -> Result<bool> {
        const SQL: &str = "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1";
        let count: i32 = self
            .conn
            .query_row(SQL, [table_name], |row| row.get(0))
            .map_err(|e| Error::database(format!("Failed to check table existence: {}", e), SQL))?;
        Ok(count > 0)
    }
}
