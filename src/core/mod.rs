//! Core table-binding types and traits
//!
//! This module provides the building blocks: record declarations and column
//! discovery, statement rendering, NULL-tolerant scalars, the executor boundary
//! and the table binding that ties them together.

pub mod error;
pub mod executor;
pub mod handle;
pub mod record;
pub mod scalar;
pub mod statement;
pub mod table;
pub mod value;

// Re-export commonly used types
pub use error::{DatabaseError, Result};
pub use executor::{Context, ExecResult, Executor, NamedArgs};
pub use handle::ConnectionHandle;
pub use record::{
    cached_columns, decode_column, discover_columns, discover_fields, ColumnEntry, Field,
    FromRow, Record, RecordDescriptor, KEY_COLUMN,
};
pub use scalar::{Decode, SafeBool, SafeFloat, SafeInt, SafeString, SafeTime};
pub use statement::{assignment_pairs, conflict_pairs, Access, Columns, StatementBuilder};
pub use table::Table;
pub use value::{DatabaseResult, DatabaseRow, DatabaseValue};
