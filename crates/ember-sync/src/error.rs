//! Error types for schema synchronization.

use ember_core::ColumnDefinitionError;

/// Errors that can occur while synchronizing a schema.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The database rejected a statement.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A declared column could not be rendered as SQL.
    #[error("Invalid column definition: {0}")]
    ColumnDefinition(#[from] ColumnDefinitionError),

    /// A table declares the same column twice.
    #[error("Table '{table}' declares column '{column}' more than once")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Repeated column name.
        column: String,
    },

    /// IO error (reading declaration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed declaration file.
    #[error("Invalid declaration file: {0}")]
    Declaration(#[from] serde_json::Error),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
