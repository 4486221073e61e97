//! Schema synchronization for SQLite.
//!
//! `ember-sync` compares declared tables against the live schema of a SQLite
//! database and reconciles them with the least destructive statement
//! sequence SQLite supports:
//!
//! - missing tables are created
//! - missing nullable or defaulted columns are added in place
//! - columns that are no longer declared are removed through a
//!   backup-copy-rename when `preserve` is set, keeping the rows
//! - anything else (changed nullability, key or default presence, or a new
//!   NOT NULL column without default) drops and recreates the table
//!
//! # Architecture
//!
//! - **Inspect** - catalog queries ([`inspect`])
//! - **Diff / Plan** - pure decision logic from `ember-core`
//! - **Executor** - runs the planned statements ([`executor`])
//! - **SchemaSync** - ties the steps together per table ([`sync`])
//! - **Declaration** - loads table definitions from JSON ([`declaration`])
//!
//! # Example
//!
//! ```rust,ignore
//! use ember_sync::prelude::*;
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! let pool = SqlitePoolOptions::new().connect("sqlite:app.db").await?;
//!
//! let sync = SchemaSync::new(pool).table(
//!     TableDefinition::new("users")
//!         .column(ColumnDescriptor::integer("id").primary_key())
//!         .column(ColumnDescriptor::text("email").not_null().default("''")),
//! );
//!
//! for (table, outcome) in sync.sync_schema(true).await? {
//!     println!("{table}: {outcome}");
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Reconcile the database with a declaration file, keeping rows
//! ember-sync --database sqlite:app.db sync --schema tables.json --preserve
//!
//! # Show the SQL without running it
//! ember-sync sync --schema tables.json --dry-run
//!
//! # Inspect a live table
//! ember-sync inspect users
//! ```

pub mod declaration;
pub mod error;
pub mod executor;
pub mod inspect;
pub mod sync;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::declaration::SchemaDeclaration;
    pub use crate::error::{Result, SyncError};
    pub use crate::executor::MigrationExecutor;
    pub use crate::sync::{PlannedSync, SchemaSync, SyncReport};
    pub use ember_core::{
        ColumnDescriptor, LiveColumnInfo, SqlAffinity, SyncOutcome, Table, TableDefinition,
    };
}
