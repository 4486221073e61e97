//! Declared-vs-live column diffing.
//!
//! The scan walks the declared columns in order with an explicit cursor.
//! Every declared column that matches a live column removes both entries
//! from the working lists, so a matched column is never compared twice.
//! The first same-named column whose shape differs aborts the scan; the
//! table is going to be recreated anyway, so the remaining columns are not
//! inspected.

use crate::live::LiveColumnInfo;
use crate::schema::ColumnDescriptor;

/// Result of comparing declared columns against live columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDiff {
    /// Declared columns with no live counterpart, in declared order.
    pub columns_to_add: Vec<ColumnDescriptor>,
    /// Set when a same-named column differs in nullability, default
    /// presence or primary-key participation.
    pub structural_mismatch: bool,
    /// Live columns left unmatched when the scan ended.
    pub excess_columns: Vec<LiveColumnInfo>,
}

impl ColumnDiff {
    /// Returns the number of live columns absent from the declaration.
    #[must_use]
    pub fn excess_count(&self) -> usize {
        self.excess_columns.len()
    }

    /// Returns whether declared and live columns agree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.structural_mismatch
            && self.columns_to_add.is_empty()
            && self.excess_columns.is_empty()
    }
}

/// Compares `declared` against a working copy of `live`.
///
/// Declared names must be unique; with duplicates the second occurrence is
/// reported as a column to add.
#[must_use]
pub fn diff_columns(declared: &[ColumnDescriptor], live: Vec<LiveColumnInfo>) -> ColumnDiff {
    let mut pending: Vec<&ColumnDescriptor> = declared.iter().collect();
    let mut live = live;
    let mut columns_to_add = Vec::new();
    let mut structural_mismatch = false;

    let mut cursor = 0;
    while cursor < pending.len() {
        let column = pending[cursor];
        match live.iter().position(|l| l.name == column.name) {
            Some(index) if column.matches_live(&live[index]) => {
                live.remove(index);
                pending.remove(cursor);
                // The next declared column has shifted into `cursor`.
            }
            Some(_) => {
                structural_mismatch = true;
                break;
            }
            None => {
                columns_to_add.push(column.clone());
                cursor += 1;
            }
        }
    }

    ColumnDiff {
        columns_to_add,
        structural_mismatch,
        excess_columns: live,
    }
}
