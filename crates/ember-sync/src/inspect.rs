//! Live schema inspection.
//!
//! Read-only queries against the SQLite catalog. Errors are returned as-is;
//! nothing here retries.

use ember_core::ddl;
use ember_core::LiveColumnInfo;
use sqlx::{Row, SqliteConnection};
use tracing::trace;

use crate::error::Result;

/// Returns whether a table called `name` exists.
///
/// True only when the catalog query yields exactly one row with a count of 1.
///
/// # Errors
///
/// Returns the database error if the query fails.
pub async fn table_exists(conn: &mut SqliteConnection, name: &str) -> Result<bool> {
    let sql = ddl::table_exists_sql(name);
    trace!(sql = %sql, "Checking table existence");

    let rows: Vec<(i64,)> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;
    Ok(matches!(rows.as_slice(), [(1,)]))
}

/// Returns whether any schema object (table, index, view or trigger) is
/// called `name`.
///
/// # Errors
///
/// Returns the database error if the query fails.
pub async fn name_in_use(conn: &mut SqliteConnection, name: &str) -> Result<bool> {
    let sql = ddl::name_in_use_sql(name);
    trace!(sql = %sql, "Checking name availability");

    let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&mut *conn).await?;
    Ok(count > 0)
}

/// Reads the live columns of `table` in storage order.
///
/// A missing table yields an empty list.
///
/// # Errors
///
/// Returns the database error if the query fails or a row does not decode.
pub async fn live_columns(conn: &mut SqliteConnection, table: &str) -> Result<Vec<LiveColumnInfo>> {
    let sql = ddl::table_info_sql(table);
    trace!(sql = %sql, "Reading live columns");

    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        columns.push(LiveColumnInfo {
            ordinal: row.try_get("cid")?,
            name: row.try_get("name")?,
            declared_type: row.try_get("type")?,
            not_null: row.try_get::<i64, _>("notnull")? != 0,
            default_literal: row.try_get("dflt_value")?,
            pk_ordinal: row.try_get("pk")?,
        });
    }

    Ok(columns)
}
