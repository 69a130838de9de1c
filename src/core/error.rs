//! Error types for table bindings
//!
//! Four kinds are detected locally (missing columns, missing connection, missing
//! row, undecodable value). Every other variant is produced by an executor and is
//! relayed to the caller untouched.

/// Result type alias for table operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for table operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// The record type declares no persisted columns, or an explicit column list was empty
    #[error("No columns found. Did you forget the column annotations on the record fields?")]
    NoColumns,

    /// The connection handle is currently empty
    #[error("The database has not been initialized")]
    NotReady,

    /// A single-row read matched nothing
    #[error("No rows returned by a query that expected one")]
    NoRows,

    /// A non-NULL value could not be coerced to the target kind
    #[error("Decode error: expected {expected}, got {actual}")]
    Decode { expected: String, actual: String },

    /// A column expected by a row decoder was not present in the result
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Query execution error
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Connection pool failure (acquire timeout, closed pool, worker crash)
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// The caller's deadline passed before the executor finished
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DatabaseError {
    /// Create a new decode error
    pub fn decode(expected: &str, actual: impl Into<String>) -> Self {
        DatabaseError::Decode {
            expected: expected.to_string(),
            actual: actual.into(),
        }
    }

    /// Create a new query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        DatabaseError::QueryError(msg.into())
    }

    /// Create a new pool error
    pub fn pool<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Pool(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Other(msg.into())
    }

    /// Whether the error came back from the executor rather than being detected
    /// before any I/O was attempted
    pub fn is_execution(&self) -> bool {
        !matches!(
            self,
            DatabaseError::NoColumns
                | DatabaseError::NotReady
                | DatabaseError::NoRows
                | DatabaseError::Decode { .. }
                | DatabaseError::ColumnNotFound(_)
        )
    }
}
