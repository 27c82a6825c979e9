//! Cross-column checks.

use crate::{CleanError, ExpressionEngine};
use cleanframe_core::{Action, CrossValidation, Report, Table};
use tracing::debug;

/// Runs each check in declaration order.
///
/// A `drop` action removes the failing rows immediately, so later checks see
/// the reduced table. A check whose expression cannot be evaluated is reported
/// and skipped. Returns the number of rows removed.
pub fn run_cross_validations(
    table: &mut Table,
    checks: &[CrossValidation],
    engine: &dyn ExpressionEngine,
    report: &mut Report,
) -> usize {
    let mut removed = 0;
    for check in checks {
        debug!(kind = check.kind(), check = %check.describe(), "Running cross validation");
        match run_check(table, check, engine, report) {
            Ok(n) => removed += n,
            Err(err) => report.error(format!(
                "Error evaluating {} '{}': {}",
                check.kind(),
                check.describe(),
                err
            )),
        }
    }
    removed
}

fn run_check(
    table: &mut Table,
    check: &CrossValidation,
    engine: &dyn ExpressionEngine,
    report: &mut Report,
) -> Result<usize, CleanError> {
    let failing = match check {
        CrossValidation::Aggregate { condition, action } => {
            if !engine.aggregate(condition, table)? {
                report.warn(format!("Aggregate check '{}' failed.", condition));
                if *action == Action::Drop {
                    report.warn(format!("Aggregate check '{}' cannot drop rows.", condition));
                }
            }
            return Ok(0);
        }
        CrossValidation::Comparison { condition, .. } => {
            let passing = sized(engine.row_mask(condition, table)?, table, condition)?;
            passing.into_iter().map(|ok| !ok).collect::<Vec<_>>()
        }
        CrossValidation::Conditional { when, then, .. } => {
            let applies = sized(engine.row_mask(when, table)?, table, when)?;
            let holds = sized(engine.row_mask(then, table)?, table, then)?;
            applies
                .into_iter()
                .zip(holds)
                .map(|(applies, holds)| applies && !holds)
                .collect()
        }
    };

    let count = failing.iter().filter(|f| **f).count();
    if count == 0 {
        return Ok(0);
    }

    if check.action() == Action::Drop {
        let removed = table.drop_rows(&failing);
        report.warn(format!(
            "Dropped {} row(s) failing {} '{}'.",
            removed,
            check.kind(),
            check.describe()
        ));
        Ok(removed)
    } else {
        report.warn(format!(
            "{} row(s) fail {} '{}'.",
            count,
            check.kind(),
            check.describe()
        ));
        Ok(0)
    }
}

fn sized(mask: Vec<bool>, table: &Table, expression: &str) -> Result<Vec<bool>, CleanError> {
    if mask.len() != table.len() {
        return Err(CleanError::unexpected(
            expression,
            "one value per row",
            format!("{} value(s) for {} row(s)", mask.len(), table.len()),
        ));
    }
    Ok(mask)
}
