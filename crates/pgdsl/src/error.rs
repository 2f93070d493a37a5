//! Error types for pgdsl

use thiserror::Error;

use crate::path::Path;

/// Result type alias for pgdsl operations
pub type DslResult<T> = Result<T, DslError>;

/// Error types for query construction and execution
#[derive(Debug, Error)]
pub enum DslError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// A field was referenced outside the scope of any builder that declared it.
    ///
    /// This is a programming error, not a runtime condition: the expression
    /// must be rebuilt inside the tree that owns the field.
    #[error("Unresolvable alias for path '{path}'")]
    UnresolvableAlias { path: String },

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Execution failure with the rendered SQL attached for diagnosis
    #[error("Failed to execute query: {sql}")]
    Execute {
        sql: String,
        #[source]
        source: Box<DslError>,
    },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Column decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Builder misuse detected before execution
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl DslError {
    /// Create an unresolvable-alias error for a path
    pub fn unresolvable_alias(path: &Path) -> Self {
        Self::UnresolvableAlias {
            path: path.to_string(),
        }
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Attach the rendered SQL text to an execution error.
    ///
    /// Idempotent: an error that already carries its SQL is returned as is.
    pub fn with_sql(self, sql: &str) -> Self {
        match self {
            err @ Self::Execute { .. } => err,
            other => Self::Execute {
                sql: sql.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Parse a tokio_postgres error into a more specific DslError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DslError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
