//! Declared table definitions.
//!
//! These types describe the shape the application expects a table to have.
//! They are built once (by hand, from a declaration file, or through
//! `#[derive(Table)]`) and handed to the sync engine, which compares them
//! against what the database actually contains.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::live::LiveColumnInfo;

/// SQLite type affinity of a declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlAffinity {
    /// Signed integer storage.
    Integer,
    /// Floating point storage.
    Real,
    /// Text storage.
    Text,
    /// Raw bytes.
    Blob,
}

impl SqlAffinity {
    /// Returns the type name used in column definitions.
    #[must_use]
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
        }
    }
}

impl fmt::Display for SqlAffinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Type affinity.
    pub affinity: SqlAffinity,
    /// Whether the column rejects NULL.
    #[serde(default)]
    pub not_null: bool,
    /// Raw SQL default literal (e.g. `0`, `'guest'`, `CURRENT_TIMESTAMP`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Whether the column is part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// 1-based position inside a composite primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key_ordinal: Option<u32>,
}

impl ColumnDescriptor {
    /// Creates a nullable, non-key column without a default.
    #[must_use]
    pub fn new(name: impl Into<String>, affinity: SqlAffinity) -> Self {
        Self {
            name: name.into(),
            affinity,
            not_null: false,
            default: None,
            primary_key: false,
            primary_key_ordinal: None,
        }
    }

    /// Shorthand for an `INTEGER` column.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, SqlAffinity::Integer)
    }

    /// Shorthand for a `REAL` column.
    #[must_use]
    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, SqlAffinity::Real)
    }

    /// Shorthand for a `TEXT` column.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, SqlAffinity::Text)
    }

    /// Shorthand for a `BLOB` column.
    #[must_use]
    pub fn blob(name: impl Into<String>) -> Self {
        Self::new(name, SqlAffinity::Blob)
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Sets a raw SQL default literal.
    #[must_use]
    pub fn default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    /// Marks the column as (part of) the primary key.
    ///
    /// Nullability is left alone: SQLite reports `notnull = 0` for a plain
    /// `INTEGER PRIMARY KEY`, so chain [`not_null`](Self::not_null) only when
    /// the live column carries the constraint. The ordinal is assigned when
    /// the column is added to a [`TableDefinition`].
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as part of the primary key at a fixed position.
    #[must_use]
    pub const fn primary_key_at(mut self, ordinal: u32) -> Self {
        self.primary_key_ordinal = Some(ordinal);
        self.primary_key()
    }

    /// Returns whether a default literal is declared.
    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Compares this declared column with a live one.
    ///
    /// Names, nullability, default presence and primary-key participation
    /// must agree. The default *text* and the primary-key ordinal are not
    /// compared, so `DEFAULT 0` and `DEFAULT 1` are considered the same
    /// column. This leniency is intentional for now but means a changed
    /// default literal never triggers a migration.
    #[must_use]
    pub fn matches_live(&self, live: &LiveColumnInfo) -> bool {
        self.name == live.name
            && self.not_null == live.not_null
            && self.has_default() == live.has_default()
            && self.primary_key == live.is_primary_key()
    }

    /// Returns whether the column can be added to a populated table with
    /// `ALTER TABLE ... ADD COLUMN`.
    #[must_use]
    pub const fn can_be_added_in_place(&self) -> bool {
        !self.not_null || self.has_default()
    }
}

/// Raw serde shape of a table definition.
///
/// Deserialization goes through the builder so that primary-key ordinals
/// are assigned the same way as for hand-built definitions.
#[derive(Deserialize)]
struct DeclaredTable {
    name: String,
    #[serde(default)]
    columns: Vec<ColumnDescriptor>,
}

impl From<DeclaredTable> for TableDefinition {
    fn from(declared: DeclaredTable) -> Self {
        declared
            .columns
            .into_iter()
            .fold(Self::new(declared.name), Self::column)
    }
}

/// The declared shape of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DeclaredTable")]
pub struct TableDefinition {
    name: String,
    columns: Vec<ColumnDescriptor>,
}

impl TableDefinition {
    /// Creates an empty table definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    ///
    /// A key column without an explicit ordinal gets the next free one, so
    /// single-column keys end up with ordinal 1.
    #[must_use]
    pub fn column(mut self, mut column: ColumnDescriptor) -> Self {
        if column.primary_key && column.primary_key_ordinal.is_none() {
            let next = self
                .columns
                .iter()
                .filter_map(|c| c.primary_key_ordinal)
                .max()
                .unwrap_or(0);
            column.primary_key_ordinal = Some(next + 1);
        }
        self.columns.push(column);
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the primary-key columns ordered by ordinal.
    #[must_use]
    pub fn primary_key_columns(&self) -> Vec<&ColumnDescriptor> {
        let mut keys: Vec<&ColumnDescriptor> =
            self.columns.iter().filter(|c| c.primary_key).collect();
        keys.sort_by_key(|c| c.primary_key_ordinal.unwrap_or(u32::MAX));
        keys
    }

    /// Returns the first column name that is declared more than once.
    #[must_use]
    pub fn duplicate_column(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .find(|name| !seen.insert(*name))
    }
}

/// Implemented by types that declare a table, usually via `#[derive(Table)]`.
pub trait Table {
    /// The SQL table name.
    const NAME: &'static str;

    /// Returns the declared definition of the table.
    fn definition() -> TableDefinition;
}
