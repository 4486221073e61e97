//! Migration executor.
//!
//! Applies a planned [`SyncOutcome`] to one table over a borrowed
//! connection. Statements run one at a time; the first failure is returned
//! and whatever already ran stays applied. In particular a backup table
//! created before a failed copy is left in place.

use ember_core::ddl;
use ember_core::{ColumnDescriptor, SyncOutcome, TableDefinition};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::inspect;

/// Applies sync outcomes to a database.
pub struct MigrationExecutor<'c> {
    conn: &'c mut SqliteConnection,
    dry_run: bool,
    statements: Vec<String>,
}

impl<'c> MigrationExecutor<'c> {
    /// Creates an executor over `conn`.
    #[must_use]
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self {
            conn,
            dry_run: false,
            statements: Vec::new(),
        }
    }

    /// Enables dry-run mode: DDL and DML are recorded but not executed.
    ///
    /// Catalog lookups still run, so backup names are chosen against the
    /// live database.
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Statements issued so far (or that would have been, in dry-run mode).
    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Consumes the executor, returning the issued statements.
    #[must_use]
    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }

    /// Applies `outcome` to `table`.
    ///
    /// `columns_to_add` is the diff output; it drives `ADD COLUMN` and is
    /// excluded from the backup copy.
    ///
    /// # Errors
    ///
    /// Returns the first rendering or database error. Statements issued
    /// before it stay applied.
    pub async fn apply(
        &mut self,
        table: &TableDefinition,
        outcome: SyncOutcome,
        columns_to_add: &[ColumnDescriptor],
    ) -> Result<()> {
        match outcome {
            SyncOutcome::AlreadyInSync => Ok(()),
            SyncOutcome::NewTableCreated => self.create_table(table.name(), table.columns()).await,
            SyncOutcome::NewColumnsAdded => self.add_columns(table.name(), columns_to_add).await,
            SyncOutcome::DroppedAndRecreated => self.drop_and_recreate(table).await,
            SyncOutcome::OldColumnsRemoved => self.backup_copy_rename(table, &[]).await,
            SyncOutcome::NewColumnsAddedAndOldColumnsRemoved => {
                self.backup_copy_rename(table, columns_to_add).await
            }
        }
    }

    async fn execute(&mut self, sql: String) -> Result<()> {
        debug!(sql = %sql, "Executing SQL");
        if !self.dry_run {
            sqlx::query(&sql).execute(&mut *self.conn).await?;
        }
        self.statements.push(sql);
        Ok(())
    }

    async fn create_table(&mut self, name: &str, columns: &[ColumnDescriptor]) -> Result<()> {
        let sql = ddl::create_table_sql(name, columns)?;
        self.execute(sql).await
    }

    async fn add_columns(&mut self, table: &str, columns: &[ColumnDescriptor]) -> Result<()> {
        for column in columns {
            let sql = ddl::add_column_sql(table, column)?;
            self.execute(sql).await?;
        }
        Ok(())
    }

    async fn drop_and_recreate(&mut self, table: &TableDefinition) -> Result<()> {
        // Render first so an unrenderable declaration never drops data.
        let create = ddl::create_table_sql(table.name(), table.columns())?;
        warn!(table = %table.name(), "Dropping table; existing rows are discarded");
        self.execute(ddl::drop_table_sql(table.name())).await?;
        self.execute(create).await
    }

    /// Finds the first backup name that is not taken.
    ///
    /// Availability is re-queried for every candidate against every object
    /// type, since an index or view called `<table>_backup` would make the
    /// `CREATE TABLE` fail.
    async fn free_backup_name(&mut self, table: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            let candidate = ddl::backup_table_name(table, attempt);
            if !inspect::name_in_use(&mut *self.conn, &candidate).await? {
                return Ok(candidate);
            }
            debug!(candidate = %candidate, "Backup name taken");
            attempt += 1;
        }
    }

    /// Rebuilds `table` in its declared shape while keeping its rows.
    ///
    /// Creates a backup table with the declared columns, copies every
    /// declared column not in `ignore` from the original, drops the
    /// original and renames the backup over it. Ignored columns end up
    /// NULL or defaulted in every copied row.
    async fn backup_copy_rename(
        &mut self,
        table: &TableDefinition,
        ignore: &[ColumnDescriptor],
    ) -> Result<()> {
        let original = table.name();
        let backup = self.free_backup_name(original).await?;
        info!(table = %original, backup = %backup, "Rebuilding table through backup copy");

        self.create_table(&backup, table.columns()).await?;

        let carried: Vec<&str> = table
            .columns()
            .iter()
            .filter(|c| !ignore.iter().any(|i| i.name == c.name))
            .map(|c| c.name.as_str())
            .collect();

        if carried.is_empty() {
            warn!(
                table = %original,
                "No declared column exists in the live table; rows are not copied"
            );
        } else {
            self.execute(ddl::copy_rows_sql(&backup, original, &carried))
                .await?;
        }

        self.execute(ddl::drop_table_sql(original)).await?;
        self.execute(ddl::rename_table_sql(&backup, original)).await
    }
}
