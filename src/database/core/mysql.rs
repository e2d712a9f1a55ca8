//! Network MySQL driver
//!
//! Wraps a `mysql_async` connection and drives it on a current-thread tokio
//! runtime, so callers see the same blocking [`Connection`] API as SQLite.

use crate::config::{Backend, DatabaseConfig};
use crate::database::core::connection::{Connection, Params};
use crate::database::core::dialect::Dialect;
use crate::database::core::value::{Row, Value};
use crate::error::{Error, Result};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::debug;

/// Build the runtime that MySQL connections block on
pub(crate) fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Connection(format!("Failed to start MySQL runtime: {}", e)))
}

pub struct MySqlConn {
    runtime: Arc<Runtime>,
    conn: Option<Conn>,
}

impl MySqlConn {
    /// Open a connection to the server named by `config`
    ///
    /// Errors name the host, port and database but never the password.
    pub fn open(config: &DatabaseConfig, runtime: Arc<Runtime>) -> Result<Self> {
        let Backend::MySql {
            host,
            port,
            user,
            password,
            database,
        } = &config.backend
        else {
            return Err(Error::Config(format!(
                "not a MySQL configuration: {}",
                config
            )));
        };

        let opts = OptsBuilder::default()
            .ip_or_hostname(host.as_str())
            .tcp_port(*port)
            .db_name(Some(database.as_str()))
            .user(Some(user.as_str()))
            .pass(Some(password.as_str()));

        let conn = runtime.block_on(Conn::new(opts)).map_err(|e| {
            Error::Connection(format!(
                "Failed to connect to MySQL at {}:{}/{}: {}",
                host, port, database, e
            ))
        })?;

        Ok(Self {
            runtime,
            conn: Some(conn),
        })
    }

    fn conn(&mut self) -> Result<&mut Conn> {
        self.conn
            .as_mut()
            .ok_or_else(|| Error::Connection("MySQL connection already closed".to_string()))
    }
}

impl Drop for MySqlConn {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = self.runtime.block_on(conn.disconnect()) {
                debug!("error while disconnecting from MySQL: {}", e);
            }
        }
    }
}

fn to_mysql_params(params: &Params) -> mysql_async::Params {
    if params.is_empty() {
        return mysql_async::Params::Empty;
    }
    let named: Vec<(String, mysql_async::Value)> = params
        .iter()
        .map(|(name, value)| (name.to_string(), to_mysql_value(value)))
        .collect();
    mysql_async::Params::from(named)
}

fn to_mysql_value(value: &Value) -> mysql_async::Value {
    match value {
        Value::Null => mysql_async::Value::NULL,
        Value::Integer(v) => mysql_async::Value::Int(*v),
        Value::Real(v) => mysql_async::Value::Double(*v),
        Value::Text(v) => mysql_async::Value::Bytes(v.as_bytes().to_vec()),
        Value::Boolean(v) => mysql_async::Value::Int(*v as i64),
    }
}

fn from_mysql_value(value: mysql_async::Value) -> Value {
    match value {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => {
            Value::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        mysql_async::Value::Int(v) => Value::Integer(v),
        // Out-of-range BIGINT UNSIGNED stays text so integer fields reject it
        mysql_async::Value::UInt(v) => match i64::try_from(v) {
            Ok(v) => Value::Integer(v),
            Err(_) => Value::Text(v.to_string()),
        },
        mysql_async::Value::Float(v) => Value::Real(v as f64),
        mysql_async::Value::Double(v) => Value::Real(v),
        mysql_async::Value::Date(y, mo, d, h, mi, s, us) => Value::Text(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
            y, mo, d, h, mi, s, us
        )),
        mysql_async::Value::Time(neg, days, h, mi, s, us) => Value::Text(format!(
            "{}{}:{:02}:{:02}.{:06}",
            if neg { "-" } else { "" },
            days * 24 + h as u32,
            mi,
            s,
            us
        )),
    }
}

impl Connection for MySqlConn {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn execute(&mut self, sql: &str, params: &Params) -> Result<usize> {
        debug!("mysql execute: {}", sql);
        let params = to_mysql_params(params);
        let runtime = self.runtime.clone();
        let conn = self.conn()?;

        runtime.block_on(async {
            let result = conn
                .exec_iter(sql, params)
                .await
                .map_err(|e| Error::database(e, sql))?;
            Ok(result.affected_rows() as usize)
        })
    }

    fn query(&mut self, sql: &str, params: &Params) -> Result<Vec<Row>> {
        debug!("mysql query: {}", sql);
        let params = to_mysql_params(params);
        let runtime = self.runtime.clone();
        let conn = self.conn()?;

        let rows: Vec<mysql_async::Row> = runtime
            .block_on(conn.exec(sql, params))
            .map_err(|e| Error::database(e, sql))?;

        Ok(rows
            .into_iter()
            .map(|mut row| {
                let columns = row.columns();
                let mut out = Row::new();
                for (i, column) in columns.iter().enumerate() {
                    let value: Option<mysql_async::Value> = row.take(i);
                    out.push(
                        column.name_str().into_owned(),
                        value.map(from_mysql_value).unwrap_or(Value::Null),
                    );
                }
                out
            })
            .collect())
    }

    fn last_insert_id(&mut self) -> Result<i64> {
        const SQL: &str = "SELECT LAST_INSERT_ID()";
        let runtime = self.runtime.clone();
        let conn = self.conn()?;

        let id: Option<u64> = runtime
            .block_on(conn.query_first(SQL))
            .map_err(|e| Error::database(e, SQL))?;
        let id = id.ok_or_else(|| Error::database("LAST_INSERT_ID() returned no rows", SQL))?;
        i64::try_from(id).map_err(|_| Error::database("LAST_INSERT_ID() out of range", SQL))
    }

    fn table_exists(&mut self, table_name: &str) -> Result<bool> {
        const SQL: &str = "SELECT COUNT(*) FROM information_schema.tables \
                           WHERE table_schema = DATABASE() AND table_name = :table_name";
        let params = to_mysql_params(&Params::new().with_value("table_name", table_name));
        let runtime = self.runtime.clone();
        let conn = self.conn()?;

        let count: Option<i64> = runtime
            .block_on(conn.exec_first(SQL, params))
            .map_err(|e| Error::database(e, SQL))?;
        Ok(count.unwrap_or(0) > 0)
    }
}
