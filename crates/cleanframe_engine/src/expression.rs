//! Expression evaluation for cross-validation checks.
//!
//! The engine only needs two answers from an expression: a boolean per row, or
//! a single boolean for the whole table. [`SqlExpressionEngine`] gets them from
//! DataFusion by registering the table as `data` and running SQL over it.

use crate::CleanError;
use arrow_array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray,
    TimestampMicrosecondArray, UInt64Array,
};
use arrow_schema::{DataType, Field, Schema as ArrowSchema, TimeUnit};
use cleanframe_core::{Table, Value};
use datafusion::prelude::{SessionConfig, SessionContext};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Name under which the table is registered.
pub const TABLE_NAME: &str = "data";

/// Extra column holding each row's position.
pub const ROW_COLUMN: &str = "__row";

/// Evaluates boolean expressions against a table.
pub trait ExpressionEngine {
    /// One boolean per row, in table order. `NULL` results count as `false`.
    fn row_mask(&self, expression: &str, table: &Table) -> Result<Vec<bool>, CleanError>;

    /// A single boolean over the whole table. `NULL` counts as `false`.
    fn aggregate(&self, expression: &str, table: &Table) -> Result<bool, CleanError>;
}

/// DataFusion-backed SQL expression engine.
///
/// Runs queries on a private current-thread runtime, so it must not be used
/// from inside another Tokio runtime.
pub struct SqlExpressionEngine {
    runtime: Runtime,
}

impl SqlExpressionEngine {
    /// Creates an engine with its own runtime.
    pub fn new() -> Result<Self, CleanError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { runtime })
    }

    fn context(&self, table: &Table) -> Result<SessionContext, CleanError> {
        let mut config = SessionConfig::new().with_target_partitions(1);
        config.options_mut().sql_parser.enable_ident_normalization = false;

        let ctx = SessionContext::new_with_config(config);
        ctx.register_batch(TABLE_NAME, to_record_batch(table)?)?;
        Ok(ctx)
    }

    fn query(&self, table: &Table, sql: &str) -> Result<Vec<RecordBatch>, CleanError> {
        debug!(sql, rows = table.len(), "Evaluating expression");
        let ctx = self.context(table)?;
        let batches = self.runtime.block_on(async {
            let frame = ctx.sql(sql).await?;
            frame.collect().await
        })?;
        Ok(batches)
    }
}

impl ExpressionEngine for SqlExpressionEngine {
    fn row_mask(&self, expression: &str, table: &Table) -> Result<Vec<bool>, CleanError> {
        let sql = format!("SELECT {ROW_COLUMN}, ({expression}) FROM {TABLE_NAME}");
        let batches = self.query(table, &sql)?;

        let mut mask = vec![false; table.len()];
        for batch in &batches {
            let rows = batch
                .column(0)
                .as_any()
                .downcast_ref::<UInt64Array>()
                .ok_or_else(|| {
                    let actual = batch.column(0).data_type().to_string();
                    CleanError::unexpected(ROW_COLUMN, "row numbers", actual)
                })?;
            let flags = boolean_column(expression, batch.column(1))?;

            for i in 0..batch.num_rows() {
                let Ok(position) = usize::try_from(rows.value(i)) else {
                    continue;
                };
                if let Some(slot) = mask.get_mut(position) {
                    *slot = flags.is_valid(i) && flags.value(i);
                }
            }
        }
        Ok(mask)
    }

    fn aggregate(&self, expression: &str, table: &Table) -> Result<bool, CleanError> {
        let sql = format!("SELECT ({expression}) FROM {TABLE_NAME}");
        let batches = self.query(table, &sql)?;

        let total: usize = batches.iter().map(RecordBatch::num_rows).sum();
        if total != 1 {
            return Err(CleanError::unexpected(
                expression,
                "exactly one row",
                format!("{total} row(s)"),
            ));
        }

        let Some(batch) = batches.iter().find(|b| b.num_rows() == 1) else {
            return Ok(false);
        };
        let flags = boolean_column(expression, batch.column(0))?;
        Ok(flags.is_valid(0) && flags.value(0))
    }
}

fn boolean_column<'a>(
    expression: &str,
    array: &'a ArrayRef,
) -> Result<&'a BooleanArray, CleanError> {
    array.as_any().downcast_ref::<BooleanArray>().ok_or_else(|| {
        CleanError::unexpected(expression, "a boolean", array.data_type().to_string())
    })
}

/// Converts a table into an Arrow record batch.
///
/// The first column is [`ROW_COLUMN`]. Columns whose non-null values are all
/// integers, numbers, booleans or timestamps keep a typed representation;
/// anything else is rendered as text.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch, CleanError> {
    let mut fields = vec![Field::new(ROW_COLUMN, DataType::UInt64, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(UInt64Array::from_iter_values(
        (0..table.len()).map(|p| p as u64),
    ))];

    for (name, column) in table.columns() {
        let (data_type, array) = to_array(column.values());
        fields.push(Field::new(name, data_type, true));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(ArrowSchema::new(fields)), arrays)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrowKind {
    Int,
    Float,
    Bool,
    Timestamp,
    Text,
}

fn infer_kind(values: &[Value]) -> ArrowKind {
    let mut kind = None;
    for value in values.iter().filter(|v| !v.is_null()) {
        let this = match value {
            Value::Int(_) => ArrowKind::Int,
            Value::Float(_) => ArrowKind::Float,
            Value::Bool(_) => ArrowKind::Bool,
            Value::Timestamp(_) => ArrowKind::Timestamp,
            _ => return ArrowKind::Text,
        };
        kind = Some(match (kind, this) {
            (None, this) => this,
            (Some(seen), this) if seen == this => seen,
            (Some(ArrowKind::Int | ArrowKind::Float), ArrowKind::Int | ArrowKind::Float) => {
                ArrowKind::Float
            }
            _ => return ArrowKind::Text,
        });
    }
    kind.unwrap_or(ArrowKind::Text)
}

fn to_array(values: &[Value]) -> (DataType, ArrayRef) {
    match infer_kind(values) {
        ArrowKind::Int => (
            DataType::Int64,
            Arc::new(Int64Array::from(
                values.iter().map(Value::as_int).collect::<Vec<_>>(),
            )),
        ),
        ArrowKind::Float => (
            DataType::Float64,
            Arc::new(Float64Array::from(
                values.iter().map(Value::as_float).collect::<Vec<_>>(),
            )),
        ),
        ArrowKind::Bool => (
            DataType::Boolean,
            Arc::new(BooleanArray::from(
                values.iter().map(Value::as_bool).collect::<Vec<_>>(),
            )),
        ),
        ArrowKind::Timestamp => (
            DataType::Timestamp(TimeUnit::Microsecond, None),
            Arc::new(TimestampMicrosecondArray::from(
                values
                    .iter()
                    .map(|v| v.as_timestamp().map(|ts| ts.and_utc().timestamp_micros()))
                    .collect::<Vec<_>>(),
            )),
        ),
        ArrowKind::Text => (
            DataType::Utf8,
            Arc::new(StringArray::from(
                values
                    .iter()
                    .map(|v| (!v.is_null()).then(|| v.to_string()))
                    .collect::<Vec<_>>(),
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_infer_kind() {
        assert_eq!(infer_kind(&[Value::Int(1), Value::Null]), ArrowKind::Int);
        assert_eq!(infer_kind(&[Value::Int(1), Value::Float(2.5)]), ArrowKind::Float);
        assert_eq!(infer_kind(&[Value::Bool(true)]), ArrowKind::Bool);
        assert_eq!(infer_kind(&[Value::Int(1), Value::from("x")]), ArrowKind::Text);
        assert_eq!(infer_kind(&[Value::Null]), ArrowKind::Text);
    }

    #[test]
    fn test_record_batch_layout() {
        let table = Table::from_columns(vec![
            ("qty", vec![Value::Int(1), Value::Null]),
            ("label", vec!["a".into(), Value::Int(2)]),
        ])
        .unwrap();

        let batch = to_record_batch(&table).expect("convertible");
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 3);

        let schema = batch.schema();
        assert_eq!(schema.field(0).name(), ROW_COLUMN);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
        assert!(batch.column(1).is_null(1));
    }
}
