use thiserror::Error;

/// Errors that can occur when reading from or committing to a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A staged write collided with a unique constraint.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A staged write referenced a missing row, or removed a referenced one.
    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// An update or delete targeted a row that does not exist.
    #[error("{entity} {id} does not exist")]
    RowNotFound { entity: &'static str, id: String },

    /// The backend refused the commit.
    #[error("Commit rejected: {0}")]
    CommitRejected(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
