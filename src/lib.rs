//! # Rust Record Table
//!
//! Table bindings that map record types to relational rows without code
//! generation. A record declares its fields once; the binding derives column
//! lists from that declaration, renders the SQL for each CRUD operation and
//! hands it to an executor. Columns typed as `Safe*` scalars read NULL as their
//! zero value.
//!
//! ## Features
//!
//! - **Column discovery**: declared fields, nested records flattened in place
//! - **Statement rendering**: SELECT, INSERT (SET and RETURNING forms), upsert,
//!   UPDATE and DELETE with caller-supplied trailing clauses
//! - **NULL-tolerant scalars**: text, float, integer, bool and Unix-seconds time
//! - **Replaceable connection**: bindings observe a shared handle that a
//!   reconnect can swap at any time
//! - **Cancellation**: every call takes a [`Context`] passed straight to the
//!   executor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_record_table::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: SafeInt,
//!     name: SafeString,
//! }
//!
//! impl Record for User {
//!     const FIELDS: &'static [Field] = &[Field::column("id", "id"), Field::column("name", "name")];
//!
//!     fn value(&self, column: &str) -> Option<DatabaseValue> {
//!         match column {
//!             "id" => Some(self.id.into()),
//!             "name" => Some((&self.name).into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! impl FromRow for User {
//!     fn from_row(row: &DatabaseRow) -> Result<Self> {
//!         Ok(Self {
//!             id: decode_column(row, "id")?,
//!             name: decode_column(row, "name")?,
//!         })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let handle = ConnectionHandle::new();
//!     let users = Table::new(&handle, "users");
//!
//!     handle.replace(Arc::new(SqliteExecutor::new("app.db").await?));
//!
//!     let ctx = Context::background();
//!     let id = users
//!         .create_returning(&ctx, &User { name: "Alice".into(), ..Default::default() }, "*")
//!         .await?;
//!     let alice: User = users.get(&ctx, id, "*").await?;
//!     println!("{}", alice.name);
//!     Ok(())
//! }
//! ```
//!
//! ## Project Structure
//!
//! ```text
//! rust_record_table/
//! ├── src/
//! │   ├── core/
//! │   │   ├── error.rs       # Error types
//! │   │   ├── executor.rs    # Executor trait, Context
//! │   │   ├── handle.rs      # Replaceable connection handle
//! │   │   ├── record.rs      # Record declarations, column discovery
//! │   │   ├── scalar.rs      # NULL-tolerant scalars
//! │   │   ├── statement.rs   # SQL rendering
//! │   │   ├── table.rs       # Table binding
//! │   │   ├── value.rs       # Value types
//! │   │   └── mod.rs
//! │   ├── backends/
//! │   │   ├── sqlite.rs      # SQLite executor
//! │   │   └── mod.rs
//! │   └── lib.rs
//! ├── tests/
//! └── benches/
//! ```

/// Core table-binding types and traits
pub mod core;

/// Executor implementations
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use rust_record_table::prelude::*;
///
/// let handle = ConnectionHandle::new();
/// let users = Table::new(&handle, "users");
/// assert_eq!(users.name(), "users");
/// ```
pub mod prelude {
    pub use crate::core::{
        decode_column, Columns, ConnectionHandle, Context, DatabaseError, DatabaseResult,
        DatabaseRow, DatabaseValue, Decode, ExecResult, Executor, Field, FromRow, Record,
        Result, SafeBool, SafeFloat, SafeInt, SafeString, SafeTime, Table,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::backends::SqliteExecutor;
}

// Re-export at root level for convenience
pub use self::core::{
    Columns, ConnectionHandle, Context, DatabaseError, DatabaseResult, DatabaseRow,
    DatabaseValue, ExecResult, Executor, Field, FromRow, Record, Result, Table,
};

#[cfg(feature = "sqlite")]
pub use backends::SqliteExecutor;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let handle = ConnectionHandle::new();
        let table = Table::new(&handle, "accounts");
        assert_eq!(table.name(), "accounts");
        assert_eq!(table.statements().padded_table(), " accounts ");
    }

    #[test]
    fn test_value_conversions() {
        use prelude::*;

        let val: DatabaseValue = SafeInt(42).into();
        assert_eq!(val.as_long(), Some(42));

        let val: DatabaseValue = SafeString::from("test").into();
        assert_eq!(val.as_string(), "test");

        let val: DatabaseValue = SafeBool(true).into();
        assert_eq!(val.as_bool(), Some(true));
    }
}
