//! Live column information as reported by `PRAGMA table_info`.

use serde::{Deserialize, Serialize};

/// One row of `PRAGMA table_info('<table>')`.
///
/// Values are read fresh on every sync; they are never cached because the
/// database may have been altered since the last call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveColumnInfo {
    /// Column position (`cid`).
    pub ordinal: i64,
    /// Column name.
    pub name: String,
    /// Declared type text, as written in the original DDL.
    pub declared_type: String,
    /// Whether the column is NOT NULL.
    pub not_null: bool,
    /// Default expression text (`dflt_value`), if any.
    pub default_literal: Option<String>,
    /// 1-based position in the primary key, 0 when not a key column.
    pub pk_ordinal: i64,
}

impl LiveColumnInfo {
    /// Returns whether the column carries a default.
    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default_literal
            .as_deref()
            .is_some_and(|literal| !literal.is_empty())
    }

    /// Returns whether the column participates in the primary key.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.pk_ordinal != 0
    }
}
