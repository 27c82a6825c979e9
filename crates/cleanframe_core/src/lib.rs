//! # Cleanframe Core
//!
//! Core data structures and types for the cleanframe engine.
//!
//! This crate provides the building blocks shared by the parser, the engine and
//! the CLI: the value and table model, the declarative rule model, and the report
//! that records every decision taken during a cleaning run.
//!
//! ## Key Concepts
//!
//! - **Column rule**: the cleaning contract for one named column
//! - **Table rule**: structural and cross-column checks for the table as a whole
//! - **Schema**: column rules in declaration order plus at most one table rule
//! - **Report**: ordered, append-only log of human-readable messages
//!
//! ## Example
//!
//! ```rust
//! use cleanframe_core::{ColumnRuleBuilder, DType, SchemaBuilder, TableRuleBuilder};
//!
//! let schema = SchemaBuilder::new()
//!     .column("id", ColumnRuleBuilder::new().dtype(DType::Int).unique(true).build())
//!     .column(
//!         "age",
//!         ColumnRuleBuilder::new()
//!             .min(18)
//!             .max(60)
//!             .drop_if_invalid(true)
//!             .build(),
//!     )
//!     .table(TableRuleBuilder::new().min_rows(3).no_duplicates(true).build())
//!     .build()
//!     .expect("schema is well-formed");
//!
//! assert_eq!(schema.columns.len(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod report;
pub mod rule;
pub mod table;
pub mod value;

pub use builder::*;
pub use error::*;
pub use report::*;
pub use rule::*;
pub use table::*;
pub use value::*;
