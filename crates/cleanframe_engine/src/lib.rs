//! Rule-driven cleaning engine for cleanframe tables.
//!
//! Each declared column runs through five stages in a fixed order: null and
//! pattern handling, type coercion, constraints, the custom validator, then
//! uniqueness. Each stage may rewrite values in place or flag rows for removal.
//! Flags from every column are unioned and applied once, after table-level
//! structural checks and cross-column validation have already run.
//!
//! # Example
//!
//! ```rust
//! use cleanframe_core::{ColumnRuleBuilder, SchemaBuilder, Table, Value};
//! use cleanframe_engine::clean_and_validate;
//!
//! let table = Table::from_columns(vec![(
//!     "age",
//!     vec![Value::Int(25), Value::Int(30), Value::Int(18), Value::Int(99)],
//! )])
//! .unwrap();
//! let schema = SchemaBuilder::new()
//!     .column(
//!         "age",
//!         ColumnRuleBuilder::new().min(18).max(60).drop_if_invalid(true).build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let outcome = clean_and_validate(&table, &schema);
//! assert_eq!(outcome.table.len(), 3);
//! assert!(outcome.report.contains("above max marked for drop"));
//! ```

mod coercion;
mod column;
mod constraints;
mod cross;
mod custom;
mod engine;
mod error;
mod expression;
mod mask;
mod nulls;
mod structural;
mod uniqueness;

pub use coercion::*;
pub use column::*;
pub use constraints::*;
pub use cross::*;
pub use custom::*;
pub use engine::*;
pub use error::*;
pub use expression::*;
pub use mask::*;
pub use nulls::*;
pub use structural::*;
pub use uniqueness::*;
