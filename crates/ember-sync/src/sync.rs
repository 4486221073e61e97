//! Schema synchronization entry point.
//!
//! [`SchemaSync`] owns the declared tables and a pool. Each sync acquires a
//! single connection and walks the tables in declaration order:
//! inspect, diff, plan, execute. No transaction is opened; callers that need
//! the whole sync to be atomic wrap it in one themselves.

use ember_core::diff::diff_columns;
use ember_core::plan::{plan, plan_diff};
use ember_core::{ddl, ColumnDescriptor, LiveColumnInfo, SyncOutcome, Table, TableDefinition};
use indexmap::IndexMap;
use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::executor::MigrationExecutor;
use crate::inspect;

/// Outcome per table name, in declaration order.
pub type SyncReport = IndexMap<String, SyncOutcome>;

/// What a sync would do to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSync {
    /// Table name.
    pub table: String,
    /// Planned outcome.
    pub outcome: SyncOutcome,
    /// Statements the sync would send, in order.
    pub statements: Vec<String>,
}

/// Reconciles declared tables with a live SQLite database.
#[derive(Debug, Clone)]
pub struct SchemaSync {
    pool: SqlitePool,
    tables: Vec<TableDefinition>,
}

impl SchemaSync {
    /// Creates a sync engine with no declared tables.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            tables: Vec::new(),
        }
    }

    /// Declares a table.
    #[must_use]
    pub fn table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    /// Declares several tables.
    #[must_use]
    pub fn tables(mut self, tables: impl IntoIterator<Item = TableDefinition>) -> Self {
        self.tables.extend(tables);
        self
    }

    /// Declares the table of a `#[derive(Table)]` type.
    #[must_use]
    pub fn register<T: Table>(self) -> Self {
        self.table(T::definition())
    }

    /// Returns the declared tables.
    #[must_use]
    pub fn declared_tables(&self) -> &[TableDefinition] {
        &self.tables
    }

    /// Returns the pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns whether a table called `name` exists.
    ///
    /// # Errors
    ///
    /// Fails when no connection can be acquired or the query fails.
    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        inspect::table_exists(&mut conn, name).await
    }

    /// Reads the live columns of `table`.
    ///
    /// # Errors
    ///
    /// Fails when no connection can be acquired or the query fails.
    pub async fn live_columns(&self, table: &str) -> Result<Vec<LiveColumnInfo>> {
        let mut conn = self.pool.acquire().await?;
        inspect::live_columns(&mut conn, table).await
    }

    /// Brings every declared table in line with its declaration.
    ///
    /// With `preserve` set, tables carrying columns that are no longer
    /// declared are rebuilt through a backup copy that keeps their rows;
    /// otherwise they are dropped and recreated empty.
    ///
    /// The first error aborts the call. Tables already processed keep their
    /// changes, but no outcomes are returned.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::DuplicateColumn`] or
    /// [`SyncError::ColumnDefinition`] before any SQL runs when a declaration
    /// is invalid, and with [`SyncError::Database`] when a statement fails.
    pub async fn sync_schema(&self, preserve: bool) -> Result<SyncReport> {
        self.validate()?;
        let mut conn = self.pool.acquire().await?;

        let mut report = SyncReport::with_capacity(self.tables.len());
        for table in &self.tables {
            let (outcome, _) = sync_table(&mut conn, table, preserve, false).await?;
            info!(table = %table.name(), outcome = %outcome, "Table synchronized");
            report.insert(table.name().to_string(), outcome);
        }

        Ok(report)
    }

    /// Computes what [`sync_schema`](Self::sync_schema) would do without
    /// changing the database.
    ///
    /// # Errors
    ///
    /// Same validation and catalog errors as [`sync_schema`](Self::sync_schema).
    pub async fn plan(&self, preserve: bool) -> Result<Vec<PlannedSync>> {
        self.validate()?;
        let mut conn = self.pool.acquire().await?;

        let mut planned = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            let (outcome, statements) = sync_table(&mut conn, table, preserve, true).await?;
            planned.push(PlannedSync {
                table: table.name().to_string(),
                outcome,
                statements,
            });
        }

        Ok(planned)
    }

    /// Rejects declarations the diff cannot handle before any SQL runs.
    fn validate(&self) -> Result<()> {
        for table in &self.tables {
            if let Some(column) = table.duplicate_column() {
                return Err(SyncError::DuplicateColumn {
                    table: table.name().to_string(),
                    column: column.to_string(),
                });
            }
            ddl::create_table_sql(table.name(), table.columns())?;
        }
        Ok(())
    }
}

/// Runs one inspect, diff, plan, execute cycle.
async fn sync_table(
    conn: &mut SqliteConnection,
    table: &TableDefinition,
    preserve: bool,
    dry_run: bool,
) -> Result<(SyncOutcome, Vec<String>)> {
    let exists = inspect::table_exists(conn, table.name()).await?;

    let (outcome, columns_to_add): (SyncOutcome, Vec<ColumnDescriptor>) = if exists {
        let live = inspect::live_columns(conn, table.name()).await?;
        let diff = diff_columns(table.columns(), live);
        debug!(
            table = %table.name(),
            to_add = diff.columns_to_add.len(),
            excess = diff.excess_count(),
            mismatch = diff.structural_mismatch,
            "Computed column diff"
        );
        (plan_diff(&diff, preserve), diff.columns_to_add)
    } else {
        (plan(false, &[], false, 0, preserve), Vec::new())
    };

    let mut executor = MigrationExecutor::new(conn).dry_run(dry_run);
    executor.apply(table, outcome, &columns_to_add).await?;
    Ok((outcome, executor.into_statements()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool")
    }

    fn users() -> TableDefinition {
        TableDefinition::new("users")
            .column(ColumnDescriptor::integer("id").primary_key())
            .column(ColumnDescriptor::text("name").not_null())
    }

    fn posts() -> TableDefinition {
        TableDefinition::new("posts")
            .column(ColumnDescriptor::integer("id").primary_key())
            .column(ColumnDescriptor::text("title"))
    }

    #[tokio::test]
    async fn test_sync_creates_tables_in_order() {
        let pool = create_test_pool().await;
        let sync = SchemaSync::new(pool).table(users()).table(posts());

        let report = sync.sync_schema(false).await.unwrap();

        let entries: Vec<(&str, SyncOutcome)> =
            report.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(
            entries,
            vec![
                ("users", SyncOutcome::NewTableCreated),
                ("posts", SyncOutcome::NewTableCreated),
            ]
        );
        assert!(sync.table_exists("users").await.unwrap());
        assert!(sync.table_exists("posts").await.unwrap());
    }

    #[tokio::test]
    async fn test_second_sync_is_in_sync() {
        let pool = create_test_pool().await;
        let sync = SchemaSync::new(pool).table(users()).table(posts());

        sync.sync_schema(true).await.unwrap();
        for preserve in [true, false] {
            let report = sync.sync_schema(preserve).await.unwrap();
            assert!(report.values().all(|o| *o == SyncOutcome::AlreadyInSync));
        }
    }

    #[tokio::test]
    async fn test_duplicate_columns_rejected_before_any_sql() {
        let pool = create_test_pool().await;
        let broken = TableDefinition::new("broken")
            .column(ColumnDescriptor::text("a"))
            .column(ColumnDescriptor::text("a"));
        let sync = SchemaSync::new(pool).table(users()).table(broken);

        let err = sync.sync_schema(false).await.unwrap_err();
        assert!(matches!(err, SyncError::DuplicateColumn { ref column, .. } if column == "a"));
        assert!(!sync.table_exists("users").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_column_rejected_before_any_sql() {
        let pool = create_test_pool().await;
        let broken = TableDefinition::new("broken").column(ColumnDescriptor::text(""));
        let sync = SchemaSync::new(pool).table(users()).table(broken);

        let err = sync.sync_schema(false).await.unwrap_err();
        assert!(matches!(err, SyncError::ColumnDefinition(_)));
        assert!(!sync.table_exists("users").await.unwrap());
    }

    #[tokio::test]
    async fn test_plan_does_not_touch_the_database() {
        let pool = create_test_pool().await;
        let sync = SchemaSync::new(pool).table(users());

        let planned = sync.plan(false).await.unwrap();

        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].table, "users");
        assert_eq!(planned[0].outcome, SyncOutcome::NewTableCreated);
        assert_eq!(
            planned[0].statements,
            vec![
                "CREATE TABLE 'users' (\"id\" INTEGER PRIMARY KEY, \"name\" TEXT NOT NULL)"
                    .to_string()
            ]
        );
        assert!(!sync.table_exists("users").await.unwrap());
    }

    #[tokio::test]
    async fn test_live_columns() {
        let pool = create_test_pool().await;
        let sync = SchemaSync::new(pool).table(users());
        sync.sync_schema(false).await.unwrap();

        let live = sync.live_columns("users").await.unwrap();
        let names: Vec<&str> = live.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }
}
