//! Database connection management
//!
//! One lazily-opened SQLite connection serves every entity type. All SQL the
//! engine generates runs through the helpers here, which attach the
//! statement text to any native error.

use crate::storage::data::{Row, RowValue};
use crate::{Error, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default database file, relative to the working directory
pub const DEFAULT_DATABASE_FILE: &str = "tracker.db";

/// Default lock-wait timeout
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    Memory,
}

impl std::fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseLocation::File(path) => write!(f, "{}", path.display()),
            DatabaseLocation::Memory => write!(f, ":memory:"),
        }
    }
}

/// Options applied when the connection is first opened
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub location: DatabaseLocation,
    pub busy_timeout: Duration,
    pub shared_cache: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::file(DEFAULT_DATABASE_FILE)
    }
}

impl DatabaseConfig {
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            location: DatabaseLocation::File(path.as_ref().to_path_buf()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            shared_cache: true,
        }
    }

    /// Private in-memory database (for testing)
    pub fn in_memory() -> Self {
        Self {
            location: DatabaseLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            shared_cache: false,
        }
    }

    fn open(&self) -> Result<Connection> {
        let conn = match &self.location {
            DatabaseLocation::File(path) => {
                let mut flags = OpenFlags::default();
                if self.shared_cache {
                    flags |= OpenFlags::SQLITE_OPEN_SHARED_CACHE;
                }
                Connection::open_with_flags(path, flags)
            }
            DatabaseLocation::Memory => Connection::open_in_memory(),
        }
        .map_err(|source| Error::Connection {
            path: self.location.to_string(),
            source,
        })?;

        conn.busy_timeout(self.busy_timeout)
            .map_err(|source| Error::Connection {
                path: self.location.to_string(),
                source,
            })?;

        tracing::debug!(
            "Opened database {} (busy timeout {:?}, shared cache {})",
            self.location,
            self.busy_timeout,
            self.shared_cache
        );
        Ok(conn)
    }
}

/// Owner of the single database connection
pub struct Database {
    config: DatabaseConfig,
    conn: Option<Connection>,
}

impl Database {
    /// Prepare a database; nothing is opened until first use
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, conn: None }
    }

    pub fn open_in_memory() -> Self {
        Self::new(DatabaseConfig::in_memory())
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// The live connection, opened on the first call
    pub fn connection(&mut self) -> Result<&mut Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.config.open()?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Execute a statement, tagging failures with `context` and the SQL
    pub fn execute(&mut self, context: &'static str, sql: &str) -> Result<usize> {
        tracing::debug!(sql = %sql, "executing statement");
        self.connection()?
            .execute(sql, [])
            .map_err(|source| statement_error(context, sql, source))
    }

    /// Check the catalog for a table
    pub fn table_exists(&mut self, table_name: &str) -> Result<bool> {
        let sql = "SELECT name FROM sqlite_master WHERE type='table' AND name=?1;";
        let mut stmt = self
            .connection()?
            .prepare(sql)
            .map_err(|source| statement_error("table lookup failed", sql, source))?;
        stmt.exists([table_name])
            .map_err(|source| statement_error("table lookup failed", sql, source))
    }

    /// Row count for a table
    pub fn count(&mut self, table_name: &str) -> Result<usize> {
        let sql = format!("SELECT count(*) FROM {};", table_name);
        tracing::debug!(sql = %sql, "counting rows");
        let count: i64 = self
            .connection()?
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|source| statement_error("count rows failed", &sql, source))?;
        Ok(count as usize)
    }

    /// Run a query and collect every row.
    ///
    /// Returns the column names from the statement metadata together with the
    /// decoded rows. `capacity` only pre-sizes the result.
    pub fn select_all(&mut self, sql: &str, capacity: usize) -> Result<(Vec<String>, Vec<Row>)> {
        tracing::debug!(sql = %sql, "selecting rows");
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|source| statement_error("select failed", sql, source))?;

        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt
            .query([])
            .map_err(|source| statement_error("select failed", sql, source))?;

        let mut collected = Vec::with_capacity(capacity);
        while let Some(row) = rows
            .next()
            .map_err(|source| statement_error("select failed", sql, source))?
        {
            let mut values = Vec::with_capacity(names.len());
            for (index, name) in names.iter().enumerate() {
                let value = row.get_ref(index)?;
                values.push(RowValue::from_sql_ref(name, value)?);
            }
            collected.push(Row::new(values));
        }

        Ok((names, collected))
    }
}

fn statement_error(context: &'static str, sql: &str, source: rusqlite::Error) -> Error {
    tracing::error!(error = %source, sql = %sql, "{}", context);
    Error::Statement {
        context,
        sql: sql.to_string(),
        source,
    }
}
