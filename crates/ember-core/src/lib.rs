//! # ember-core
//!
//! Declared table definitions and the pure half of schema synchronization
//! for SQLite.
//!
//! The sync engine compares what the application declares against what the
//! database contains and picks the least destructive way to reconcile them.
//! This crate holds every step that does not touch a connection:
//!
//! - [`schema`] - [`TableDefinition`] and [`ColumnDescriptor`], the declared shape
//! - [`live`] - [`LiveColumnInfo`], one row of `PRAGMA table_info`
//! - [`diff`] - compares declared columns against live ones
//! - [`plan`] - maps a diff to a [`SyncOutcome`]
//! - [`ddl`] - renders the exact SQL the executor sends
//!
//! The `ember-sync` crate runs these steps against a database.
//!
//! ## Example
//!
//! ```rust
//! use ember_core::diff::diff_columns;
//! use ember_core::plan::{plan_diff, SyncOutcome};
//! use ember_core::{ColumnDescriptor, LiveColumnInfo, TableDefinition};
//!
//! let users = TableDefinition::new("users")
//!     .column(ColumnDescriptor::integer("id").primary_key().not_null())
//!     .column(ColumnDescriptor::text("email"));
//!
//! let live = vec![LiveColumnInfo {
//!     ordinal: 0,
//!     name: "id".to_string(),
//!     declared_type: "INTEGER".to_string(),
//!     not_null: true,
//!     default_literal: None,
//!     pk_ordinal: 1,
//! }];
//!
//! let diff = diff_columns(users.columns(), live);
//! assert_eq!(plan_diff(&diff, false), SyncOutcome::NewColumnsAdded);
//! ```

pub mod ddl;
pub mod diff;
mod error;
pub mod live;
pub mod plan;
pub mod schema;

pub use diff::ColumnDiff;
pub use error::ColumnDefinitionError;
pub use live::LiveColumnInfo;
pub use plan::SyncOutcome;
pub use schema::{ColumnDescriptor, SqlAffinity, Table, TableDefinition};
