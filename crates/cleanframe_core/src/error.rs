//! Error types for the rule model and the table model.
//!
//! Structural problems with a schema are fatal and surface before any cleaning
//! begins. Everything that can go wrong while cleaning data is reported through
//! the [`Report`](crate::Report) instead.

use thiserror::Error;

/// Result type for schema construction.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Structural problems in a schema definition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A column rule is declared for an empty column name
    #[error("Column rule declared with an empty column name")]
    EmptyColumnName,

    /// The lower bound is greater than the upper bound
    #[error("Column '{column}': min {min} is greater than max {max}")]
    InvertedBounds {
        /// Column name
        column: String,
        /// Declared minimum
        min: String,
        /// Declared maximum
        max: String,
    },

    /// `allowed_values` is declared but empty
    #[error("Column '{0}': allowed_values must not be empty")]
    EmptyAllowedValues(String),

    /// `pattern` is declared but blank
    #[error("Column '{0}': pattern must not be blank")]
    BlankPattern(String),

    /// A duplicate resolver is attached to a column that is not unique
    #[error("Column '{0}': resolve_duplicates requires unique = true")]
    ResolverWithoutUnique(String),

    /// Unknown target type tag
    #[error("Unknown dtype '{0}'")]
    UnknownDType(String),

    /// A rule refers to a column the schema does not declare
    #[error("No column rule declared for '{0}'")]
    UnknownColumn(String),

    /// Row-count bounds are inverted
    #[error("Table rule: min_rows {min} is greater than max_rows {max}")]
    InvertedRowBounds {
        /// Declared minimum row count
        min: usize,
        /// Declared maximum row count
        max: usize,
    },

    /// A list-valued table rule is declared but empty
    #[error("Table rule: {0} must not be empty")]
    EmptyList(&'static str),

    /// A list-valued table rule contains a blank column name
    #[error("Table rule: {0} contains a blank column name")]
    BlankColumnName(&'static str),

    /// A cross-validation check has a blank expression
    #[error("Table rule: {kind} check #{position} has a blank expression")]
    BlankExpression {
        /// Check kind (comparison, aggregate, conditional)
        kind: &'static str,
        /// One-based position in `cross_validations`
        position: usize,
    },

    /// Several structural problems at once
    #[error("Schema is invalid: {}", join_errors(.0))]
    Invalid(Vec<SchemaError>),
}

fn join_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while assembling a table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Column lengths disagree
    #[error("Column '{column}' has {actual} value(s), expected {expected}")]
    RaggedColumn {
        /// Column name
        column: String,
        /// Row count of the table
        expected: usize,
        /// Values supplied for the column
        actual: usize,
    },

    /// The same column name appears twice
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A row has more or fewer cells than there are columns
    #[error("Row {row} has {actual} cell(s), expected {expected}")]
    RaggedRow {
        /// Zero-based row position
        row: usize,
        /// Number of columns
        expected: usize,
        /// Cells supplied for the row
        actual: usize,
    },

    /// The row index length does not match the row count
    #[error("Row index has {actual} label(s), expected {expected}")]
    IndexLength {
        /// Row count of the table
        expected: usize,
        /// Labels supplied
        actual: usize,
    },
}
