//! Error types for rendering column definitions.

use thiserror::Error;

/// A declared column that cannot be turned into a column definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnDefinitionError {
    /// The column name is empty.
    #[error("column in table '{table}' has an empty name")]
    EmptyName {
        /// Table owning the column.
        table: String,
    },

    /// The column name contains a NUL character.
    #[error("column name {column:?} in table '{table}' contains a NUL character")]
    InvalidName {
        /// Table owning the column.
        table: String,
        /// Offending column name.
        column: String,
    },

    /// The default literal is empty or only whitespace.
    #[error("column '{column}' in table '{table}' declares an empty default")]
    EmptyDefault {
        /// Table owning the column.
        table: String,
        /// Offending column name.
        column: String,
    },
}
