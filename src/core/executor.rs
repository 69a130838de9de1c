//! Executor trait and call context
//!
//! This module defines the boundary between table bindings and the engine that
//! actually runs SQL. Bindings render statements; executors run them.

use super::error::{DatabaseError, Result};
use super::record::Record;
use super::value::{DatabaseResult, DatabaseRow, DatabaseValue};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline carried through every executor call
///
/// Bindings never inspect or alter the context; they hand it to the executor
/// exactly as received.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A context cancelled through an existing token
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a child context; cancelling the parent cancels the child
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and all of its children
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the context was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The cancellation token
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Fail fast if the context is already done
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(DatabaseError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drive `operation` until it completes or the context is done
    ///
    /// Dropping the losing future is the only cleanup performed; executors that
    /// hand work to other threads must stop that work themselves.
    pub async fn run<F, T>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = operation => result,
            _ = self.token.cancelled() => Err(DatabaseError::Cancelled),
            _ = deadline => Err(DatabaseError::DeadlineExceeded),
        }
    }
}

/// Outcome of a statement that returns no rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Number of rows changed
    pub rows_affected: u64,
    /// Driver-reported key of the last inserted row, when the driver has one
    pub last_insert_id: Option<i64>,
}

/// Source of values for `:name` placeholders
pub trait NamedArgs: Send + Sync {
    /// Value for the placeholder `:name`
    fn named(&self, name: &str) -> Option<DatabaseValue>;
}

impl<T: Record> NamedArgs for T {
    fn named(&self, name: &str) -> Option<DatabaseValue> {
        self.value(name)
    }
}

/// Engine that runs rendered statements
///
/// Positional methods bind `args` to `?` placeholders in order. Named methods
/// resolve every `:name` placeholder through [`NamedArgs`].
///
/// # Thread Safety
/// Implementations are shared behind `Arc` and called concurrently.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a statement that returns no rows
    async fn execute(&self, ctx: &Context, sql: &str, args: &[DatabaseValue])
        -> Result<ExecResult>;

    /// Run a statement with named placeholders that returns no rows
    async fn execute_named(
        &self,
        ctx: &Context,
        sql: &str,
        args: &dyn NamedArgs,
    ) -> Result<ExecResult>;

    /// Run a query and collect every row
    async fn query(&self, ctx: &Context, sql: &str, args: &[DatabaseValue])
        -> Result<DatabaseResult>;

    /// Run a query and read at most its first row
    ///
    /// Rows after the first are never fetched.
    async fn query_one(
        &self,
        ctx: &Context,
        sql: &str,
        args: &[DatabaseValue],
    ) -> Result<Option<DatabaseRow>>;

    /// Run a query with named placeholders and collect every row
    async fn query_named(
        &self,
        ctx: &Context,
        sql: &str,
        args: &dyn NamedArgs,
    ) -> Result<DatabaseResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = Context::background();
        let value = ctx.run(async { Ok(5) }).await.unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn test_run_cancelled() {
        let ctx = Context::background();
        ctx.cancel();
        let result = ctx.run(async { Ok(()) }).await;
        assert!(matches!(result, Err(DatabaseError::Cancelled)));
    }

    #[tokio::test]
    async fn test_child_follows_parent() {
        let parent = Context::background();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline() {
        let ctx = Context::with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(DatabaseError::DeadlineExceeded)));
    }
}
