//! SQLite storage for Taskdesk user accounts and tasks.
//!
//! This crate owns the relational half of the local environment: opening (or
//! creating) the database file with foreign-key enforcement switched on,
//! declaring the `users` and `tasks` tables, and the row-level operations the
//! rest of the application builds on.

pub mod connection;
pub mod models;
pub mod schema;
pub mod store;

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for database operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Generic database error: {0}")]
    Generic(String),
}

impl Error {
    /// Create a new constraint violation error.
    pub fn constraint<S: Into<String>>(message: S) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }

    /// Create a new generic database error.
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether this error is a unique, not-null or foreign-key rejection.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, message) = &err {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                return Self::constraint(message.clone().unwrap_or_else(|| code.to_string()));
            }
        }
        Self::Database(err)
    }
}

/// Database connection and management.
pub use connection::Database;

/// Typed records over the generic store.
pub use models::{TaskRecord, TaskStore, UserRecord, UserStore};

/// Generic store capability and its row types.
pub use store::{Filter, RelationalStore, Row, TableSpec, Value};

/// Schema definitions and constants.
pub use schema::*;
