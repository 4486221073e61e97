//! Migration planning.
//!
//! Maps the output of [`diff_columns`](crate::diff::diff_columns) and the
//! caller's `preserve` policy to a [`SyncOutcome`]. The planner never
//! invents default values or coerces types: anything that cannot be done
//! with `ADD COLUMN` or a backup copy falls back to dropping and recreating
//! the table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::ColumnDiff;
use crate::schema::ColumnDescriptor;

/// What a sync did (or would do) to one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// Live schema already matches the declaration.
    AlreadyInSync,
    /// The table did not exist and was created.
    NewTableCreated,
    /// Missing columns were added with `ALTER TABLE ... ADD COLUMN`.
    NewColumnsAdded,
    /// Excess columns were removed through a backup copy, keeping rows.
    OldColumnsRemoved,
    /// Both of the above, in a single backup copy.
    NewColumnsAddedAndOldColumnsRemoved,
    /// The table was dropped and created empty.
    DroppedAndRecreated,
}

impl SyncOutcome {
    /// Returns whether applying this outcome issues any statement.
    #[must_use]
    pub const fn changes_schema(self) -> bool {
        !matches!(self, Self::AlreadyInSync)
    }

    /// Returns whether applying this outcome discards existing rows.
    #[must_use]
    pub const fn loses_data(self) -> bool {
        matches!(self, Self::DroppedAndRecreated)
    }

    /// Folds the columns that still have to be added into a tentative
    /// outcome.
    ///
    /// A NOT NULL column without a default cannot be added to a populated
    /// table, so a single one forces recreation.
    #[must_use]
    pub fn with_additions(self, columns_to_add: &[ColumnDescriptor]) -> Self {
        if columns_to_add.is_empty() {
            return self;
        }
        if !columns_to_add.iter().all(ColumnDescriptor::can_be_added_in_place) {
            return Self::DroppedAndRecreated;
        }
        match self {
            Self::OldColumnsRemoved => Self::NewColumnsAddedAndOldColumnsRemoved,
            Self::DroppedAndRecreated | Self::NewTableCreated => self,
            _ => Self::NewColumnsAdded,
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AlreadyInSync => "already in sync",
            Self::NewTableCreated => "new table created",
            Self::NewColumnsAdded => "new columns added",
            Self::OldColumnsRemoved => "old columns removed",
            Self::NewColumnsAddedAndOldColumnsRemoved => "new columns added and old columns removed",
            Self::DroppedAndRecreated => "dropped and recreated",
        };
        f.write_str(label)
    }
}

/// Chooses the outcome for one table.
///
/// Evaluated in priority order: a missing table is created, a structural
/// mismatch recreates, excess columns recreate unless `preserve` is set,
/// and finally the columns to add may upgrade or escalate the result.
#[must_use]
pub fn plan(
    table_exists: bool,
    columns_to_add: &[ColumnDescriptor],
    structural_mismatch: bool,
    excess_column_count: usize,
    preserve: bool,
) -> SyncOutcome {
    if !table_exists {
        return SyncOutcome::NewTableCreated;
    }
    if structural_mismatch {
        return SyncOutcome::DroppedAndRecreated;
    }

    let tentative = match (excess_column_count > 0, preserve) {
        (true, false) => return SyncOutcome::DroppedAndRecreated,
        (true, true) => SyncOutcome::OldColumnsRemoved,
        (false, _) => SyncOutcome::AlreadyInSync,
    };

    tentative.with_additions(columns_to_add)
}

/// Convenience wrapper over [`plan`] for an existing table's diff.
#[must_use]
pub fn plan_diff(diff: &ColumnDiff, preserve: bool) -> SyncOutcome {
    plan(
        true,
        &diff.columns_to_add,
        diff.structural_mismatch,
        diff.excess_count(),
        preserve,
    )
}
