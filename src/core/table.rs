//! Table bindings
//!
//! A [`Table`] pairs a table name with a [`ConnectionHandle`] and exposes the
//! CRUD operations. Every operation checks the handle, resolves its column set and
//! renders the statement before anything reaches the executor, so configuration
//! mistakes surface without I/O.

use super::error::{DatabaseError, Result};
use super::executor::{Context, ExecResult, Executor};
use super::handle::ConnectionHandle;
use super::record::{decode_column, FromRow, Record, KEY_COLUMN};
use super::statement::{Access, Columns, StatementBuilder};
use super::value::DatabaseValue;
use std::sync::Arc;

/// CRUD operations scoped to one table
///
/// # Example
///
/// ```ignore
/// let handle = ConnectionHandle::new();
/// let users = Table::new(&handle, "users");
///
/// // later, once the pool is up
/// handle.replace(Arc::new(SqliteExecutor::new("app.db").await?));
///
/// let ctx = Context::background();
/// let user: User = users.get(&ctx, 7, "*").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    builder: StatementBuilder,
    handle: ConnectionHandle,
}

impl Table {
    /// Bind `name` to the connection behind `handle`
    pub fn new(handle: &ConnectionHandle, name: &str) -> Self {
        Self {
            builder: StatementBuilder::new(name),
            handle: handle.clone(),
        }
    }

    /// The table name
    pub fn name(&self) -> &str {
        self.builder.table()
    }

    /// The statement builder for this table
    pub fn statements(&self) -> &StatementBuilder {
        &self.builder
    }

    fn executor(&self) -> Result<Arc<dyn Executor>> {
        self.handle.require()
    }

    /// Fetch the row with key `id`
    ///
    /// `"*"` selects every declared column of `T`.
    pub async fn get<T>(&self, ctx: &Context, id: i64, columns: impl Into<Columns>) -> Result<T>
    where
        T: Record + FromRow + 'static,
    {
        self.get_options(ctx, &StatementBuilder::by_id(id), columns, &[])
            .await
    }

    /// Fetch the first row matching `options`
    ///
    /// Returns [`DatabaseError::NoRows`] when nothing matches.
    pub async fn get_options<T>(
        &self,
        ctx: &Context,
        options: &str,
        columns: impl Into<Columns>,
        args: &[DatabaseValue],
    ) -> Result<T>
    where
        T: Record + FromRow + 'static,
    {
        let executor = self.executor()?;
        let columns = columns.into().resolve::<T>(Access::Read)?;
        let sql = self.builder.select(&columns, options);

        let row = executor
            .query_one(ctx, &sql, args)
            .await?
            .ok_or(DatabaseError::NoRows)?;
        T::from_row(&row)
    }

    /// Fetch every row matching `options`
    pub async fn get_all<T>(
        &self,
        ctx: &Context,
        options: &str,
        columns: impl Into<Columns>,
        args: &[DatabaseValue],
    ) -> Result<Vec<T>>
    where
        T: Record + FromRow + 'static,
    {
        let executor = self.executor()?;
        let columns = columns.into().resolve::<Vec<T>>(Access::Read)?;
        let sql = self.builder.select(&columns, options);

        executor
            .query(ctx, &sql, args)
            .await?
            .iter()
            .map(T::from_row)
            .collect()
    }

    /// Insert `source`
    ///
    /// Without explicit columns every declared column except the key is written.
    pub async fn create<T>(
        &self,
        ctx: &Context,
        source: &T,
        columns: impl Into<Columns>,
    ) -> Result<ExecResult>
    where
        T: Record + 'static,
    {
        self.create_options(ctx, source, "", columns).await
    }

    /// Insert `source` with a trailing options fragment
    pub async fn create_options<T>(
        &self,
        ctx: &Context,
        source: &T,
        options: &str,
        columns: impl Into<Columns>,
    ) -> Result<ExecResult>
    where
        T: Record + 'static,
    {
        let executor = self.executor()?;
        let columns = columns.into().resolve::<T>(Access::Write)?;
        let sql = self.builder.insert(&columns, options);

        executor.execute_named(ctx, &sql, source).await
    }

    /// Insert `source` and return the key from a `RETURNING id` clause
    ///
    /// The result cursor is drained and the key of its last row is kept, so this
    /// works on drivers that do not report a last-insert id.
    pub async fn create_returning<T>(
        &self,
        ctx: &Context,
        source: &T,
        columns: impl Into<Columns>,
    ) -> Result<i64>
    where
        T: Record + 'static,
    {
        let executor = self.executor()?;
        let columns = columns.into().resolve::<T>(Access::Write)?;
        let sql = self.builder.insert_returning(&columns);

        let rows = executor.query_named(ctx, &sql, source).await?;
        let mut id = 0;
        for row in &rows {
            id = decode_column(row, KEY_COLUMN)?;
        }
        Ok(id)
    }

    /// Insert `source`, updating the same columns when the key already exists
    pub async fn upsert<T>(
        &self,
        ctx: &Context,
        source: &T,
        columns: impl Into<Columns>,
    ) -> Result<ExecResult>
    where
        T: Record + 'static,
    {
        self.upsert_options(ctx, source, "", columns).await
    }

    /// [`Table::upsert`] with a trailing options fragment
    pub async fn upsert_options<T>(
        &self,
        ctx: &Context,
        source: &T,
        options: &str,
        columns: impl Into<Columns>,
    ) -> Result<ExecResult>
    where
        T: Record + 'static,
    {
        let executor = self.executor()?;
        let columns = columns.into().resolve::<T>(Access::Write)?;
        let sql = self.builder.upsert(&columns, options);

        executor.execute_named(ctx, &sql, source).await
    }

    /// Update the row whose key matches `source`'s `id`
    pub async fn update<T>(
        &self,
        ctx: &Context,
        source: &T,
        columns: impl Into<Columns>,
    ) -> Result<ExecResult>
    where
        T: Record + 'static,
    {
        self.update_options(ctx, source, " WHERE id=:id", columns)
            .await
    }

    /// Update the rows selected by `options`
    ///
    /// Placeholders in `options` are named and resolved against `source`.
    pub async fn update_options<T>(
        &self,
        ctx: &Context,
        source: &T,
        options: &str,
        columns: impl Into<Columns>,
    ) -> Result<ExecResult>
    where
        T: Record + 'static,
    {
        let executor = self.executor()?;
        let columns = columns.into().resolve::<T>(Access::Write)?;
        let sql = self.builder.update(&columns, options);

        executor.execute_named(ctx, &sql, source).await
    }

    /// Delete the row with key `id`
    pub async fn delete(&self, ctx: &Context, id: i64) -> Result<ExecResult> {
        self.delete_options(ctx, &StatementBuilder::by_id(id), &[])
            .await
    }

    /// Delete the rows selected by `options`
    pub async fn delete_options(
        &self,
        ctx: &Context,
        options: &str,
        args: &[DatabaseValue],
    ) -> Result<ExecResult> {
        let executor = self.executor()?;
        let sql = self.builder.delete(options);

        executor.execute(ctx, &sql, args).await
    }
}
