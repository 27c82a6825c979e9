//! Error types for cleaning stages and expression evaluation.
//!
//! None of these abort a run. Each one is caught by the stage or check that
//! raised it and rendered into a report message.

use arrow_schema::ArrowError;
use cleanframe_core::{DType, RowId};
use datafusion::error::DataFusionError;
use thiserror::Error;

/// Faults raised while applying a single rule.
#[derive(Debug, Error)]
pub enum CleanError {
    /// A nested value cannot be converted to a scalar target type
    #[error("cannot convert {type_name} value at row {position} to {dtype}")]
    NestedValue {
        position: usize,
        type_name: &'static str,
        dtype: DType,
    },

    /// A fill aggregate cannot be computed from the column
    #[error("{0}")]
    Aggregate(String),

    /// A column value and a rule bound have no common ordering
    #[error("{value} ({value_type}) is not comparable with {bound} ({bound_type})")]
    Incomparable {
        value: String,
        value_type: &'static str,
        bound: String,
        bound_type: &'static str,
    },

    /// Malformed regular expression
    #[error(transparent)]
    Pattern(#[from] regex::Error),

    /// A caller-supplied validator or resolver failed
    #[error("{0:#}")]
    Callback(anyhow::Error),

    /// A resolver picked a row outside the group it was given
    #[error("resolver returned row {0}, which is not part of the duplicate group")]
    ForeignRow(RowId),

    /// Expression evaluation failed in DataFusion
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] DataFusionError),

    /// Table conversion to Arrow failed
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// The expression runtime could not be started
    #[error("Failed to start expression runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// An expression produced a result of the wrong shape
    #[error("{expression} returned {actual}, expected {expected}")]
    UnexpectedResult {
        expression: String,
        expected: &'static str,
        actual: String,
    },

    /// Failure reported by a caller-supplied expression engine
    #[error("{0}")]
    Expression(String),
}

impl CleanError {
    /// Creates an aggregate error.
    pub fn aggregate(reason: impl Into<String>) -> Self {
        Self::Aggregate(reason.into())
    }

    /// Creates an unexpected-result error.
    pub fn unexpected(
        expression: impl Into<String>,
        expected: &'static str,
        actual: impl Into<String>,
    ) -> Self {
        Self::UnexpectedResult {
            expression: expression.into(),
            expected,
            actual: actual.into(),
        }
    }

    /// Creates an expression error.
    pub fn expression(message: impl Into<String>) -> Self {
        Self::Expression(message.into())
    }
}
