//! Shared connection handle
//!
//! The application owns the connection lifecycle. Table bindings hold a clone of
//! the handle and read the current executor on every call, so a reconnect that
//! swaps the executor is picked up without rebuilding any binding.

use super::error::{DatabaseError, Result};
use super::executor::Executor;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Replaceable cell holding the live executor, if any
#[derive(Clone, Default)]
pub struct ConnectionHandle {
    inner: Arc<RwLock<Option<Arc<dyn Executor>>>>,
}

impl ConnectionHandle {
    /// An empty handle; operations report [`DatabaseError::NotReady`] until filled
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that already holds `executor`
    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(executor))),
        }
    }

    /// Install `executor`, returning the one it replaced
    pub fn replace(&self, executor: Arc<dyn Executor>) -> Option<Arc<dyn Executor>> {
        self.inner.write().replace(executor)
    }

    /// Empty the handle, returning the executor it held
    pub fn clear(&self) -> Option<Arc<dyn Executor>> {
        self.inner.write().take()
    }

    /// Snapshot of the current executor
    ///
    /// The lock is released before returning; callers keep the snapshot for the
    /// duration of one operation only.
    pub fn current(&self) -> Option<Arc<dyn Executor>> {
        self.inner.read().clone()
    }

    /// The current executor, or [`DatabaseError::NotReady`]
    pub fn require(&self) -> Result<Arc<dyn Executor>> {
        self.current().ok_or(DatabaseError::NotReady)
    }

    /// Whether an executor is installed
    pub fn is_ready(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}
