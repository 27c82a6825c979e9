//! Caller-supplied row predicates.

use crate::{CleanError, DropMask};
use cleanframe_core::{ColumnRule, Report, Table};

/// Runs the column's custom validator over every row.
///
/// The validator sees nulls too. If it fails on any row, the stage is
/// abandoned for the column and nothing is changed or marked.
pub fn apply_custom(table: &mut Table, column: &str, rule: &ColumnRule, report: &mut Report) -> DropMask {
    let len = table.len();
    let Some(validator) = &rule.custom_validator else {
        return DropMask::new(len);
    };
    let Some(col) = table.column(column) else {
        return DropMask::new(len);
    };

    let mut invalid = Vec::new();
    for row in table.rows() {
        let Some(value) = col.get(row.position()) else {
            continue;
        };
        match validator.check(value, &row) {
            Ok(true) => {}
            Ok(false) => invalid.push(row.position()),
            Err(err) => {
                report.error(format!(
                    "Error applying custom validator to '{}': {}",
                    column,
                    CleanError::Callback(err)
                ));
                return DropMask::new(len);
            }
        }
    }

    if invalid.is_empty() {
        return DropMask::new(len);
    }

    if rule.drop_if_invalid {
        report.warn(format!(
            "{} value(s) failed custom validation in '{}' and were marked for drop.",
            invalid.len(),
            column
        ));
        return DropMask::from_positions(len, &invalid);
    }

    let fill = rule.fill_literal();
    if let Some(col) = table.column_mut(column) {
        for &position in &invalid {
            col.set(position, fill.clone());
        }
    }
    report.info(format!(
        "Replaced {} invalid custom value(s) in '{}' with {}.",
        invalid.len(),
        column,
        fill
    ));

    DropMask::new(len)
}
