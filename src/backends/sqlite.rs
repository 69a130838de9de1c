//! SQLite executor
//!
//! Runs statements on a deadpool-managed pool of rusqlite connections. Each call
//! acquires a connection, hands the blocking work to the pool's worker thread and
//! races it against the caller's [`Context`].

use crate::core::{
    error::DatabaseError,
    error::Result,
    executor::{Context, ExecResult, Executor, NamedArgs},
    statement::placeholder_names,
    value::{DatabaseResult, DatabaseRow, DatabaseValue},
};
use async_trait::async_trait;
use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::{params_from_iter, Row, ToSql};
use std::time::{Duration, Instant};

/// Statements slower than this are logged at warn level
const SLOW_STATEMENT_THRESHOLD: Duration = Duration::from_secs(1);

/// Pool configuration for SQLite connections
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: usize,
    /// Timeout for acquiring a connection from the pool
    pub timeout: Duration,
    /// Enable write-ahead logging on startup
    pub wal: bool,
    /// SQLite connection string
    pub connection_string: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 16,
            timeout: Duration::from_secs(5),
            wal: true,
            connection_string: String::new(),
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            ..Default::default()
        }
    }

    /// Set maximum pool size
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Set connection acquisition timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable WAL journaling
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }
}

/// Pool statistics
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Total number of connections in the pool
    pub size: usize,
    /// Number of available connections
    pub available: usize,
    /// Number of requests waiting for a connection
    pub waiting: usize,
}

/// Arguments moved onto the pool's worker thread
enum Bound {
    Positional(Vec<DatabaseValue>),
    Named(Vec<(String, DatabaseValue)>),
}

impl Bound {
    /// Collect a value for every `:name` placeholder in `sql`
    fn named(sql: &str, args: &dyn NamedArgs) -> Result<Self> {
        placeholder_names(sql)
            .into_iter()
            .map(|name| match args.named(&name) {
                Some(value) => Ok((format!(":{}", name), value)),
                None => Err(DatabaseError::query(format!(
                    "no value for named parameter :{}",
                    name
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Bound::Named)
    }
}

/// SQLite implementation of [`Executor`]
///
/// # Example
///
/// ```no_run
/// use rust_record_table::backends::sqlite::{PoolConfig, SqliteExecutor};
/// use rust_record_table::core::{ConnectionHandle, Table};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ConnectionHandle::new();
///     let users = Table::new(&handle, "users");
///
///     let executor = SqliteExecutor::with_config(PoolConfig::new("app.db").with_max_size(4)).await?;
///     handle.replace(Arc::new(executor));
///
///     assert_eq!(users.name(), "users");
///     Ok(())
/// }
/// ```
pub struct SqliteExecutor {
    pool: Pool,
}

impl SqliteExecutor {
    /// Open a pool with the default configuration
    ///
    /// # Errors
    ///
    /// Returns error if pool creation or initialization fails
    pub async fn new(connection_string: impl Into<String>) -> Result<Self> {
        Self::with_config(PoolConfig::new(connection_string)).await
    }

    /// Open a pool with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns error if pool creation or initialization fails
    pub async fn with_config(config: PoolConfig) -> Result<Self> {
        let mut pool_config = Config::new(config.connection_string.clone());
        let mut limits = deadpool_sqlite::PoolConfig::new(config.max_size);
        limits.timeouts.wait = Some(config.timeout);
        pool_config.pool = Some(limits);

        let pool = pool_config
            .create_pool(Runtime::Tokio1)
            .map_err(|e| DatabaseError::pool(format!("Failed to create pool: {}", e)))?;

        let conn = pool.get().await.map_err(|e| {
            DatabaseError::pool(format!("Failed to acquire initial connection: {}", e))
        })?;

        let wal = config.wal;
        conn.interact(move |conn| {
            conn.execute("PRAGMA foreign_keys = ON", [])?;
            if wal {
                // PRAGMA journal_mode returns a value, so it has to go through query_row
                conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
            }
            Ok::<_, rusqlite::Error>(())
        })
        .await
        .map_err(|e| DatabaseError::pool(format!("Interact error: {}", e)))??;

        tracing::info!(
            path = %config.connection_string,
            max_size = config.max_size,
            "sqlite pool ready"
        );

        Ok(Self { pool })
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }

    /// Convert a rusqlite Row to a DatabaseRow
    fn row_to_database_row(row: &Row) -> rusqlite::Result<DatabaseRow> {
        let mut db_row = DatabaseRow::new();
        let column_count = row.as_ref().column_count();

        for i in 0..column_count {
            let column_name = row.as_ref().column_name(i)?.to_string();
            let value = match row.get_ref(i)? {
                rusqlite::types::ValueRef::Null => DatabaseValue::Null,
                rusqlite::types::ValueRef::Integer(v) => DatabaseValue::Long(v),
                rusqlite::types::ValueRef::Real(v) => DatabaseValue::Double(v),
                rusqlite::types::ValueRef::Text(v) => {
                    DatabaseValue::String(String::from_utf8_lossy(v).to_string())
                }
                rusqlite::types::ValueRef::Blob(v) => DatabaseValue::Bytes(v.to_vec()),
            };
            db_row.insert(column_name, value);
        }

        Ok(db_row)
    }

    /// Convert DatabaseValue to rusqlite parameter
    fn value_to_param(value: &DatabaseValue) -> Box<dyn ToSql> {
        match value {
            DatabaseValue::Null => Box::new(None::<i64>),
            DatabaseValue::Bool(v) => Box::new(*v),
            DatabaseValue::Int(v) => Box::new(*v),
            DatabaseValue::Long(v) => Box::new(*v),
            DatabaseValue::Double(v) => Box::new(*v),
            DatabaseValue::String(v) => Box::new(v.clone()),
            DatabaseValue::Bytes(v) => Box::new(v.clone()),
            DatabaseValue::Timestamp(v) => Box::new(*v),
        }
    }

    fn run_execute(conn: &rusqlite::Connection, sql: &str, args: &Bound) -> rusqlite::Result<ExecResult> {
        let mut stmt = conn.prepare(sql)?;
        let affected = match args {
            Bound::Positional(values) => {
                let params: Vec<Box<dyn ToSql>> = values.iter().map(Self::value_to_param).collect();
                stmt.execute(params_from_iter(params.iter()))?
            }
            Bound::Named(values) => {
                let params: Vec<(String, Box<dyn ToSql>)> = values
                    .iter()
                    .map(|(name, value)| (name.clone(), Self::value_to_param(value)))
                    .collect();
                let refs: Vec<(&str, &dyn ToSql)> = params
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_ref()))
                    .collect();
                stmt.execute(refs.as_slice())?
            }
        };

        Ok(ExecResult {
            rows_affected: affected as u64,
            last_insert_id: Some(conn.last_insert_rowid()),
        })
    }

    /// Collect up to `limit` rows; the cursor is not advanced past the last one kept
    fn run_query(
        conn: &rusqlite::Connection,
        sql: &str,
        args: &Bound,
        limit: usize,
    ) -> rusqlite::Result<DatabaseResult> {
        let mut stmt = conn.prepare(sql)?;
        match args {
            Bound::Positional(values) => {
                let params: Vec<Box<dyn ToSql>> = values.iter().map(Self::value_to_param).collect();
                let rows = stmt
                    .query_map(params_from_iter(params.iter()), Self::row_to_database_row)?
                    .take(limit)
                    .collect::<rusqlite::Result<DatabaseResult>>();
                rows
            }
            Bound::Named(values) => {
                let params: Vec<(String, Box<dyn ToSql>)> = values
                    .iter()
                    .map(|(name, value)| (name.clone(), Self::value_to_param(value)))
                    .collect();
                let refs: Vec<(&str, &dyn ToSql)> = params
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_ref()))
                    .collect();
                let rows = stmt
                    .query_map(refs.as_slice(), Self::row_to_database_row)?
                    .take(limit)
                    .collect::<rusqlite::Result<DatabaseResult>>();
                rows
            }
        }
    }

    async fn interact<T, F>(&self, ctx: &Context, sql: &str, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let started = Instant::now();
        let result = ctx
            .run(async {
                let conn = self.pool.get().await.map_err(|e| {
                    DatabaseError::pool(format!("Failed to acquire connection: {}", e))
                })?;

                conn.interact(move |conn| work(conn))
                    .await
                    .map_err(|e| DatabaseError::pool(format!("Interact error: {}", e)))?
                    .map_err(DatabaseError::from)
            })
            .await;

        let elapsed = started.elapsed();
        if elapsed >= SLOW_STATEMENT_THRESHOLD {
            tracing::warn!(sql, ?elapsed, ok = result.is_ok(), "slow statement");
        } else {
            tracing::debug!(sql, ?elapsed, ok = result.is_ok(), "statement");
        }
        result
    }
}

#[async_trait]
impl Executor for SqliteExecutor {
    async fn execute(
        &self,
        ctx: &Context,
        sql: &str,
        args: &[DatabaseValue],
    ) -> Result<ExecResult> {
        let bound = Bound::Positional(args.to_vec());
        let query = sql.to_string();
        self.interact(ctx, sql, move |conn| Self::run_execute(conn, &query, &bound))
            .await
    }

    async fn execute_named(
        &self,
        ctx: &Context,
        sql: &str,
        args: &dyn NamedArgs,
    ) -> Result<ExecResult> {
        let bound = Bound::named(sql, args)?;
        let query = sql.to_string();
        self.interact(ctx, sql, move |conn| Self::run_execute(conn, &query, &bound))
            .await
    }

    async fn query(
        &self,
        ctx: &Context,
        sql: &str,
        args: &[DatabaseValue],
    ) -> Result<DatabaseResult> {
        let bound = Bound::Positional(args.to_vec());
        let query = sql.to_string();
        self.interact(ctx, sql, move |conn| Self::run_query(conn, &query, &bound, usize::MAX))
            .await
    }

    async fn query_one(
        &self,
        ctx: &Context,
        sql: &str,
        args: &[DatabaseValue],
    ) -> Result<Option<DatabaseRow>> {
        let bound = Bound::Positional(args.to_vec());
        let query = sql.to_string();
        self.interact(ctx, sql, move |conn| {
            Self::run_query(conn, &query, &bound, 1).map(|rows| rows.into_iter().next())
        })
        .await
    }

    async fn query_named(
        &self,
        ctx: &Context,
        sql: &str,
        args: &dyn NamedArgs,
    ) -> Result<DatabaseResult> {
        let bound = Bound::named(sql, args)?;
        let query = sql.to_string();
        self.interact(ctx, sql, move |conn| Self::run_query(conn, &query, &bound, usize::MAX))
            .await
    }
}
