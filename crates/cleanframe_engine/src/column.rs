//! Column orchestration.

use crate::{
    DropMask, apply_constraints, apply_custom, coerce, handle_null_and_pattern, resolve_uniqueness,
};
use cleanframe_core::{ColumnRule, Report, Table};
use tracing::debug;

/// A column stage: mutates the column in place and returns rows to drop.
pub type Stage = fn(&mut Table, &str, &ColumnRule, &mut Report) -> DropMask;

/// The column stages in run order.
pub const STAGES: [(&str, Stage); 5] = [
    ("null_and_pattern", handle_null_and_pattern),
    ("coercion", coerce),
    ("constraints", apply_constraints),
    ("custom", apply_custom),
    ("uniqueness", resolve_uniqueness),
];

/// Runs every stage for one column and returns the union of their masks.
///
/// A column missing from the table is reported and skipped.
pub fn clean_column(table: &mut Table, column: &str, rule: &ColumnRule, report: &mut Report) -> DropMask {
    if !table.has_column(column) {
        report.warn(format!("Column '{}' is missing from the table.", column));
        return DropMask::new(table.len());
    }

    STAGES
        .iter()
        .fold(DropMask::new(table.len()), |mask, (name, stage)| {
            let flagged = stage(table, column, rule, report);
            debug!(column, stage = name, flagged = flagged.count(), "Column stage finished");
            mask.union(&flagged)
        })
}
