//! SQLite statement rendering for schema synchronization.
//!
//! Every statement the sync engine sends is built here so the exact text
//! stays in one place. Tooling inspects this SQL, so the shapes below are
//! part of the public contract:
//!
//! ```text
//! SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '<name>'
//! PRAGMA table_info('<name>')
//! CREATE TABLE '<name>' (<col1>, <col2>, ...)
//! ALTER TABLE <name> ADD COLUMN <col> <type> [PRIMARY KEY] [NOT NULL] [DEFAULT <literal>]
//! DROP TABLE '<name>'
//! ALTER TABLE <old> RENAME TO <new>
//! INSERT INTO <name> (<cols>) SELECT <cols> FROM '<original>'
//! ```

use crate::error::ColumnDefinitionError;
use crate::schema::ColumnDescriptor;

/// Suffix appended to a table name to build its backup name.
pub const BACKUP_SUFFIX: &str = "_backup";

/// Quotes a name as a single-quoted SQL string.
#[must_use]
pub fn quote_literal(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Quotes a name as a double-quoted identifier.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Catalog query counting tables called `name`.
#[must_use]
pub fn table_exists_sql(name: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = {}",
        quote_literal(name)
    )
}

/// Catalog query counting schema objects of any type called `name`.
///
/// Tables, indexes, views and triggers share one namespace in SQLite.
#[must_use]
pub fn name_in_use_sql(name: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM sqlite_master WHERE name = {}",
        quote_literal(name)
    )
}

/// Column introspection command for `table`.
#[must_use]
pub fn table_info_sql(table: &str) -> String {
    format!("PRAGMA table_info({})", quote_literal(table))
}

/// Renders the definition fragment of one column.
///
/// # Errors
///
/// Fails when the name is empty or contains NUL, or when the default
/// literal is blank.
pub fn column_definition(
    table: &str,
    column: &ColumnDescriptor,
) -> Result<String, ColumnDefinitionError> {
    render_column(table, column, column.primary_key)
}

fn render_column(
    table: &str,
    column: &ColumnDescriptor,
    inline_primary_key: bool,
) -> Result<String, ColumnDefinitionError> {
    if column.name.is_empty() {
        return Err(ColumnDefinitionError::EmptyName {
            table: table.to_string(),
        });
    }
    if column.name.contains('\0') {
        return Err(ColumnDefinitionError::InvalidName {
            table: table.to_string(),
            column: column.name.clone(),
        });
    }

    let mut parts = vec![
        quote_identifier(&column.name),
        column.affinity.sql_name().to_string(),
    ];

    if inline_primary_key {
        parts.push("PRIMARY KEY".to_string());
    }

    // Keys carry NOT NULL only when declared so; PRAGMA table_info reports
    // the constraint as written.
    if column.not_null {
        parts.push("NOT NULL".to_string());
    }

    if let Some(literal) = &column.default {
        if literal.trim().is_empty() {
            return Err(ColumnDefinitionError::EmptyDefault {
                table: table.to_string(),
                column: column.name.clone(),
            });
        }
        parts.push(format!("DEFAULT {literal}"));
    }

    Ok(parts.join(" "))
}

/// Renders `CREATE TABLE` for `name` with the given columns.
///
/// A single key column is declared inline. With several key columns the
/// inline clauses are dropped and a table constraint lists them by
/// primary-key ordinal.
///
/// # Errors
///
/// Fails if any column fails to render.
pub fn create_table_sql(
    name: &str,
    columns: &[ColumnDescriptor],
) -> Result<String, ColumnDefinitionError> {
    let mut keys: Vec<&ColumnDescriptor> = columns.iter().filter(|c| c.primary_key).collect();
    let composite = keys.len() > 1;

    let mut definitions = columns
        .iter()
        .map(|c| render_column(name, c, c.primary_key && !composite))
        .collect::<Result<Vec<_>, _>>()?;

    if composite {
        keys.sort_by_key(|c| c.primary_key_ordinal.unwrap_or(u32::MAX));
        let quoted: Vec<String> = keys.iter().map(|c| quote_identifier(&c.name)).collect();
        definitions.push(format!("PRIMARY KEY ({})", quoted.join(", ")));
    }

    Ok(format!(
        "CREATE TABLE {} ({})",
        quote_literal(name),
        definitions.join(", ")
    ))
}

/// Renders `ALTER TABLE ... ADD COLUMN`.
///
/// # Errors
///
/// Fails if the column fails to render.
pub fn add_column_sql(
    table: &str,
    column: &ColumnDescriptor,
) -> Result<String, ColumnDefinitionError> {
    Ok(format!(
        "ALTER TABLE {table} ADD COLUMN {}",
        column_definition(table, column)?
    ))
}

/// Renders `DROP TABLE`.
#[must_use]
pub fn drop_table_sql(name: &str) -> String {
    format!("DROP TABLE {}", quote_literal(name))
}

/// Renders a table rename.
#[must_use]
pub fn rename_table_sql(old_name: &str, new_name: &str) -> String {
    format!("ALTER TABLE {old_name} RENAME TO {new_name}")
}

/// Renders the row copy from `source` into `target`.
///
/// The same column list is used on both sides.
#[must_use]
pub fn copy_rows_sql(target: &str, source: &str, columns: &[&str]) -> String {
    let list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {target} ({list}) SELECT {list} FROM {}",
        quote_literal(source)
    )
}

/// Returns the `attempt`-th backup name candidate for `table`.
///
/// Attempt 0 is `<table>_backup`, then `<table>_backup1`, `<table>_backup2`...
#[must_use]
pub fn backup_table_name(table: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{table}{BACKUP_SUFFIX}")
    } else {
        format!("{table}{BACKUP_SUFFIX}{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_queries() {
        assert_eq!(
            table_exists_sql("users"),
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'"
        );
        assert_eq!(table_info_sql("users"), "PRAGMA table_info('users')");
        assert_eq!(
            name_in_use_sql("users_backup"),
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'users_backup'"
        );
    }

    #[test]
    fn test_quote_literal_escapes() {
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_column_definition() {
        let col = ColumnDescriptor::integer("id").primary_key().not_null();
        assert_eq!(
            column_definition("users", &col).unwrap(),
            "\"id\" INTEGER PRIMARY KEY NOT NULL"
        );

        let col = ColumnDescriptor::integer("id").primary_key();
        assert_eq!(
            column_definition("users", &col).unwrap(),
            "\"id\" INTEGER PRIMARY KEY"
        );

        let col = ColumnDescriptor::text("role").not_null().default("'guest'");
        assert_eq!(
            column_definition("users", &col).unwrap(),
            "\"role\" TEXT NOT NULL DEFAULT 'guest'"
        );

        let col = ColumnDescriptor::real("score");
        assert_eq!(column_definition("users", &col).unwrap(), "\"score\" REAL");
    }

    #[test]
    fn test_column_definition_errors() {
        let err = column_definition("users", &ColumnDescriptor::text("")).unwrap_err();
        assert_eq!(
            err,
            ColumnDefinitionError::EmptyName {
                table: "users".to_string()
            }
        );

        let err = column_definition("users", &ColumnDescriptor::text("a\0b")).unwrap_err();
        assert!(matches!(err, ColumnDefinitionError::InvalidName { .. }));

        let err =
            column_definition("users", &ColumnDescriptor::text("bio").default("  ")).unwrap_err();
        assert!(matches!(err, ColumnDefinitionError::EmptyDefault { .. }));
    }

    #[test]
    fn test_create_table() {
        let columns = vec![
            ColumnDescriptor::integer("id").primary_key().not_null(),
            ColumnDescriptor::text("name").not_null(),
            ColumnDescriptor::blob("avatar"),
        ];
        assert_eq!(
            create_table_sql("users", &columns).unwrap(),
            "CREATE TABLE 'users' (\"id\" INTEGER PRIMARY KEY NOT NULL, \
             \"name\" TEXT NOT NULL, \"avatar\" BLOB)"
        );
    }

    #[test]
    fn test_create_table_composite_key() {
        let columns = vec![
            ColumnDescriptor::integer("group_id").primary_key_at(2).not_null(),
            ColumnDescriptor::integer("user_id").primary_key_at(1).not_null(),
        ];
        assert_eq!(
            create_table_sql("memberships", &columns).unwrap(),
            "CREATE TABLE 'memberships' (\"group_id\" INTEGER NOT NULL, \
             \"user_id\" INTEGER NOT NULL, PRIMARY KEY (\"user_id\", \"group_id\"))"
        );
    }

    #[test]
    fn test_create_table_propagates_column_errors() {
        let columns = vec![ColumnDescriptor::integer("id"), ColumnDescriptor::text("")];
        assert!(create_table_sql("users", &columns).is_err());
    }

    #[test]
    fn test_add_column() {
        let col = ColumnDescriptor::integer("age").not_null().default("0");
        assert_eq!(
            add_column_sql("users", &col).unwrap(),
            "ALTER TABLE users ADD COLUMN \"age\" INTEGER NOT NULL DEFAULT 0"
        );
    }

    #[test]
    fn test_drop_and_rename() {
        assert_eq!(drop_table_sql("users"), "DROP TABLE 'users'");
        assert_eq!(
            rename_table_sql("users_backup", "users"),
            "ALTER TABLE users_backup RENAME TO users"
        );
    }

    #[test]
    fn test_copy_rows() {
        assert_eq!(
            copy_rows_sql("users_backup", "users", &["id", "name"]),
            "INSERT INTO users_backup (\"id\", \"name\") SELECT \"id\", \"name\" FROM 'users'"
        );
    }

    #[test]
    fn test_backup_names() {
        assert_eq!(backup_table_name("users", 0), "users_backup");
        assert_eq!(backup_table_name("users", 1), "users_backup1");
        assert_eq!(backup_table_name("users", 12), "users_backup12");
    }
}
