//! Table orchestration.
//!
//! [`Cleaner`] runs one cleaning pass as a fixed sequence of states:
//! structural checks, cross validation, per-column validation, then a single
//! deferred row removal. Table-level drops happen immediately in their own
//! state; per-column drops are unioned and applied once at the end.

use crate::{
    DropMask, ExpressionEngine, SqlExpressionEngine, clean_column, run_cross_validations,
    run_structural_checks,
};
use cleanframe_core::{Report, Schema, Table};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Orchestrator states, entered once each in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    StructuralChecks,
    CrossValidation,
    PerColumnValidation,
    DeferredRowRemoval,
    Done,
}

impl RunState {
    /// The state that follows this one. `Done` is terminal.
    pub fn next(self) -> Self {
        match self {
            RunState::StructuralChecks => RunState::CrossValidation,
            RunState::CrossValidation => RunState::PerColumnValidation,
            RunState::PerColumnValidation => RunState::DeferredRowRemoval,
            RunState::DeferredRowRemoval | RunState::Done => RunState::Done,
        }
    }
}

/// Row counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanStats {
    /// Rows in the input table
    pub rows_in: usize,
    /// Rows in the output table
    pub rows_out: usize,
    /// Exact duplicate rows removed by `no_duplicates`
    pub duplicates_removed: usize,
    /// Rows removed by cross-validation checks with `action: drop`
    pub cross_validation_removed: usize,
    /// Rows removed by the deferred per-column pass
    pub validation_removed: usize,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

/// Result of a cleaning run.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    /// The cleaned table, reindexed from zero
    pub table: Table,
    /// Every message produced, in order
    pub report: Report,
    /// Row accounting
    pub stats: CleanStats,
}

/// Cleans tables against one schema.
///
/// # Example
///
/// ```rust
/// use cleanframe_core::{ColumnRuleBuilder, SchemaBuilder, Table, Value};
/// use cleanframe_engine::Cleaner;
///
/// let schema = SchemaBuilder::new()
///     .column("id", ColumnRuleBuilder::new().unique(true).build())
///     .build()
///     .unwrap();
/// let table = Table::from_columns(vec![("id", vec![Value::Int(1), Value::Int(1), Value::Int(2)])])
///     .unwrap();
///
/// let outcome = Cleaner::new(schema).clean(&table);
/// assert_eq!(outcome.table.len(), 2);
/// assert_eq!(outcome.stats.validation_removed, 1);
/// ```
pub struct Cleaner {
    schema: Schema,
    engine: Option<Box<dyn ExpressionEngine>>,
}

impl Cleaner {
    /// Creates a cleaner. Cross-validation checks use [`SqlExpressionEngine`]
    /// unless another engine is supplied with [`Cleaner::with_engine`].
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            engine: None,
        }
    }

    /// Uses `engine` to evaluate cross-validation expressions.
    pub fn with_engine(mut self, engine: impl ExpressionEngine + 'static) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    /// Returns the schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Cleans a copy of `input`. The input is never modified.
    ///
    /// The run always completes: faulty rules and failing callbacks are
    /// reported as errors in the outcome's report.
    pub fn clean(&self, input: &Table) -> CleanOutcome {
        let start = Instant::now();
        let mut table = input.clone();
        let mut report = Report::new();
        let mut stats = CleanStats {
            rows_in: input.len(),
            ..CleanStats::default()
        };
        let mut mask = DropMask::new(0);

        let mut state = RunState::StructuralChecks;
        loop {
            debug!(state = ?state, rows = table.len(), "Entering state");
            match state {
                RunState::StructuralChecks => {
                    if let Some(rule) = &self.schema.table {
                        stats.duplicates_removed =
                            run_structural_checks(&mut table, rule, &mut report);
                    }
                }
                RunState::CrossValidation => {
                    stats.cross_validation_removed = self.cross_validate(&mut table, &mut report);
                }
                RunState::PerColumnValidation => {
                    mask = self
                        .schema
                        .columns
                        .iter()
                        .fold(DropMask::new(table.len()), |mask, (name, rule)| {
                            debug!(column = %name, "Cleaning column");
                            mask.union(&clean_column(&mut table, name, rule, &mut report))
                        });
                }
                RunState::DeferredRowRemoval => {
                    if mask.any() {
                        report.info(format!(
                            "Dropping {} row(s) due to validation.",
                            mask.count()
                        ));
                        stats.validation_removed = table.drop_rows(mask.as_slice());
                    }
                    table.reset_index();
                }
                RunState::Done => break,
            }
            state = state.next();
        }

        stats.rows_out = table.len();
        stats.duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            rows_in = stats.rows_in,
            rows_out = stats.rows_out,
            messages = report.len(),
            "Cleaning finished"
        );

        CleanOutcome {
            table,
            report,
            stats,
        }
    }

    fn cross_validate(&self, table: &mut Table, report: &mut Report) -> usize {
        let Some(rule) = &self.schema.table else {
            return 0;
        };
        let checks = &rule.cross_validations;
        if checks.is_empty() {
            return 0;
        }

        if let Some(engine) = &self.engine {
            return run_cross_validations(table, checks, engine.as_ref(), report);
        }

        match SqlExpressionEngine::new() {
            Ok(engine) => run_cross_validations(table, checks, &engine, report),
            Err(err) => {
                for check in checks {
                    report.error(format!(
                        "Error evaluating {} '{}': {}",
                        check.kind(),
                        check.describe(),
                        err
                    ));
                }
                0
            }
        }
    }
}

/// Cleans `table` against `schema` with the default expression engine.
pub fn clean_and_validate(table: &Table, schema: &Schema) -> CleanOutcome {
    Cleaner::new(schema.clone()).clean(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanframe_core::{ColumnRuleBuilder, SchemaBuilder, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_state_order() {
        let mut state = RunState::StructuralChecks;
        let mut visited = vec![state];
        while state != RunState::Done {
            state = state.next();
            visited.push(state);
        }
        assert_eq!(
            visited,
            vec![
                RunState::StructuralChecks,
                RunState::CrossValidation,
                RunState::PerColumnValidation,
                RunState::DeferredRowRemoval,
                RunState::Done,
            ]
        );
        assert_eq!(RunState::Done.next(), RunState::Done);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let table = Table::from_columns(vec![(
            "age",
            vec![Value::Int(25), Value::Int(99)],
        )])
        .unwrap();
        let schema = SchemaBuilder::new()
            .column("age", ColumnRuleBuilder::new().max(60).build())
            .build()
            .unwrap();

        let outcome = Cleaner::new(schema).clean(&table);
        assert_eq!(
            outcome.table.column("age").map(|c| c.values().to_vec()),
            Some(vec![Value::Int(25), Value::Int(60)])
        );
        assert_eq!(
            table.column("age").map(|c| c.values().to_vec()),
            Some(vec![Value::Int(25), Value::Int(99)])
        );
    }

    #[test]
    fn test_deferred_removal_reindexes() {
        let table = Table::from_columns(vec![(
            "age",
            vec![Value::Int(99), Value::Int(25), Value::Int(30)],
        )])
        .unwrap();
        let schema = SchemaBuilder::new()
            .column(
                "age",
                ColumnRuleBuilder::new().max(60).drop_if_invalid(true).build(),
            )
            .build()
            .unwrap();

        let outcome = Cleaner::new(schema).clean(&table);
        assert_eq!(outcome.table.index(), &[0, 1]);
        assert_eq!(
            outcome.report.messages(),
            vec![
                "1 value(s) in 'age' above max marked for drop.",
                "Dropping 1 row(s) due to validation.",
            ]
        );
        assert_eq!(outcome.stats.rows_in, 3);
        assert_eq!(outcome.stats.rows_out, 2);
        assert_eq!(outcome.stats.validation_removed, 1);

        let stats = serde_json::to_value(&outcome.stats).unwrap();
        assert_eq!(stats["rows_out"], 2);
        assert_eq!(stats["duplicates_removed"], 0);
    }
}
