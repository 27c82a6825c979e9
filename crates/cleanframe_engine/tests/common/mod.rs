//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use cleanframe_core::{Table, Value};
use cleanframe_engine::{CleanError, ExpressionEngine};
use std::cell::RefCell;
use std::collections::HashMap;

type RowRule = Box<dyn Fn(&Table) -> Vec<bool>>;

/// An expression engine that answers from closures registered per expression.
///
/// Unknown expressions fail, and every call records the table length it saw.
#[derive(Default)]
pub struct ScriptedEngine {
    rows: HashMap<String, RowRule>,
    aggregates: HashMap<String, bool>,
    seen: RefCell<Vec<(String, usize)>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, expression: &str, rule: impl Fn(&Table) -> Vec<bool> + 'static) -> Self {
        self.rows.insert(expression.to_string(), Box::new(rule));
        self
    }

    pub fn aggregate(mut self, expression: &str, result: bool) -> Self {
        self.aggregates.insert(expression.to_string(), result);
        self
    }

    pub fn seen(&self) -> Vec<(String, usize)> {
        self.seen.borrow().clone()
    }
}

impl ExpressionEngine for ScriptedEngine {
    fn row_mask(&self, expression: &str, table: &Table) -> Result<Vec<bool>, CleanError> {
        self.seen
            .borrow_mut()
            .push((expression.to_string(), table.len()));
        let rule = self
            .rows
            .get(expression)
            .ok_or_else(|| CleanError::expression(format!("unknown expression '{expression}'")))?;
        Ok(rule(table))
    }

    fn aggregate(&self, expression: &str, table: &Table) -> Result<bool, CleanError> {
        self.seen
            .borrow_mut()
            .push((expression.to_string(), table.len()));
        self.aggregates
            .get(expression)
            .copied()
            .ok_or_else(|| CleanError::expression(format!("unknown expression '{expression}'")))
    }
}

/// Compares two integer columns row by row with `<=`. Nulls fail.
pub fn le(left: &'static str, right: &'static str) -> impl Fn(&Table) -> Vec<bool> {
    move |table| {
        table
            .rows()
            .map(|row| {
                match (
                    row.get(left).and_then(Value::as_int),
                    row.get(right).and_then(Value::as_int),
                ) {
                    (Some(l), Some(r)) => l <= r,
                    _ => false,
                }
            })
            .collect()
    }
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| Value::Int(*v)).collect()
}

pub fn texts(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

pub fn values(table: &Table, column: &str) -> Vec<Value> {
    table
        .column(column)
        .map(|c| c.values().to_vec())
        .unwrap_or_default()
}
