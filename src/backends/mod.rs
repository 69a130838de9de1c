//! Executor implementations
//!
//! Concrete [`Executor`](crate::core::Executor) implementations for specific
//! database engines.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::{PoolConfig, PoolStats, SqliteExecutor};
