//! Builder pattern for creating schemas.
//!
//! This module provides ergonomic builders for constructing schemas and their
//! rules with a fluent API. It is also the only way to attach function-valued
//! rules (custom validators and duplicate resolvers), which schema files cannot
//! express.

use crate::{
    Action, ColumnRule, CrossValidation, CustomValidator, DType, DuplicateGroup, DuplicateResolver,
    FillValue, Row, RowId, Schema, SchemaError, TableRule, Value,
};
use indexmap::IndexMap;

/// Builder for creating a `Schema`.
///
/// # Example
///
/// ```rust
/// use cleanframe_core::{ColumnRuleBuilder, DType, SchemaBuilder};
///
/// let schema = SchemaBuilder::new()
///     .column("name", ColumnRuleBuilder::new().dtype(DType::String).build())
///     .build()
///     .expect("schema is well-formed");
/// assert!(schema.column("name").is_some());
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    columns: IndexMap<String, ColumnRule>,
    table: Option<TableRule>,
}

impl SchemaBuilder {
    /// Creates an empty schema builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the rule for a column.
    ///
    /// Columns are cleaned in the order they are first added.
    pub fn column(mut self, name: impl Into<String>, rule: ColumnRule) -> Self {
        self.columns.insert(name.into(), rule);
        self
    }

    /// Sets the table rule.
    pub fn table(mut self, rule: TableRule) -> Self {
        self.table = Some(rule);
        self
    }

    /// Builds the schema, rejecting structurally unsound rules.
    pub fn build(self) -> Result<Schema, SchemaError> {
        Schema {
            columns: self.columns,
            table: self.table,
        }
        .ensure_valid()
    }
}

/// Builder for creating a `ColumnRule`.
///
/// # Example
///
/// ```rust
/// use cleanframe_core::{ColumnRuleBuilder, FillStrategy};
///
/// let rule = ColumnRuleBuilder::new()
///     .allow_null(false)
///     .fill_value(FillStrategy::Median)
///     .build();
/// assert!(!rule.allow_null);
/// ```
#[derive(Debug, Default)]
pub struct ColumnRuleBuilder {
    rule: ColumnRule,
}

impl ColumnRuleBuilder {
    /// Creates a builder with default rule settings (nullable, correct in place).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target type.
    pub fn dtype(mut self, dtype: DType) -> Self {
        self.rule.dtype = Some(dtype);
        self
    }

    /// Sets whether nulls are acceptable.
    pub fn allow_null(mut self, allow: bool) -> Self {
        self.rule.allow_null = allow;
        self
    }

    /// Sets the failure policy.
    pub fn drop_if_invalid(mut self, drop: bool) -> Self {
        self.rule.drop_if_invalid = drop;
        self
    }

    /// Sets the substitute for nulls and invalid values.
    pub fn fill_value(mut self, fill: impl Into<FillValue>) -> Self {
        self.rule.fill_value = Some(fill.into());
        self
    }

    /// Sets a literal substitute, never read as a strategy name.
    pub fn fill_literal(mut self, value: impl Into<Value>) -> Self {
        self.rule.fill_value = Some(FillValue::Literal(value.into()));
        self
    }

    /// Sets the inclusive lower bound.
    pub fn min(mut self, min: impl Into<Value>) -> Self {
        self.rule.min = Some(min.into());
        self
    }

    /// Sets the inclusive upper bound.
    pub fn max(mut self, max: impl Into<Value>) -> Self {
        self.rule.max = Some(max.into());
        self
    }

    /// Sets the closed set of permitted values.
    pub fn allowed_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rule.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the full-match regular expression.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.rule.pattern = Some(pattern.into());
        self
    }

    /// Attaches a fallible row-level predicate.
    pub fn custom_validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value, &Row<'_>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        self.rule.custom_validator = Some(CustomValidator::new(f));
        self
    }

    /// Sets whether values must be unique.
    pub fn unique(mut self, unique: bool) -> Self {
        self.rule.unique = unique;
        self
    }

    /// Attaches a duplicate resolver.
    pub fn resolve_duplicates<F>(mut self, f: F) -> Self
    where
        F: Fn(&DuplicateGroup<'_>) -> anyhow::Result<RowId> + Send + Sync + 'static,
    {
        self.rule.resolve_duplicates = Some(DuplicateResolver::new(f));
        self
    }

    /// Builds the rule.
    pub fn build(self) -> ColumnRule {
        self.rule
    }
}

/// Builder for creating a `TableRule`.
///
/// # Example
///
/// ```rust
/// use cleanframe_core::{Action, TableRuleBuilder};
///
/// let rule = TableRuleBuilder::new()
///     .min_rows(1)
///     .comparison("start_day <= end_day", Action::Drop)
///     .build();
/// assert_eq!(rule.cross_validations.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct TableRuleBuilder {
    rule: TableRule,
}

impl TableRuleBuilder {
    /// Creates an empty table rule builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the advisory minimum row count.
    pub fn min_rows(mut self, min: usize) -> Self {
        self.rule.min_rows = Some(min);
        self
    }

    /// Sets the advisory maximum row count.
    pub fn max_rows(mut self, max: usize) -> Self {
        self.rule.max_rows = Some(max);
        self
    }

    /// Sets whether exact duplicate rows are removed.
    pub fn no_duplicates(mut self, enabled: bool) -> Self {
        self.rule.no_duplicates = enabled;
        self
    }

    /// Sets the unique key columns.
    pub fn unique_keys<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule.unique_keys = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the expected columns.
    pub fn expected_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule.expected_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Appends a cross-validation check.
    pub fn cross_validation(mut self, check: CrossValidation) -> Self {
        self.rule.cross_validations.push(check);
        self
    }

    /// Appends a row-wise comparison check.
    pub fn comparison(self, condition: impl Into<String>, action: Action) -> Self {
        self.cross_validation(CrossValidation::Comparison {
            condition: condition.into(),
            action,
        })
    }

    /// Appends a whole-table aggregate check.
    pub fn aggregate(self, condition: impl Into<String>) -> Self {
        self.cross_validation(CrossValidation::Aggregate {
            condition: condition.into(),
            action: Action::Warn,
        })
    }

    /// Appends an if/then check.
    pub fn conditional(
        self,
        when: impl Into<String>,
        then: impl Into<String>,
        action: Action,
    ) -> Self {
        self.cross_validation(CrossValidation::Conditional {
            when: when.into(),
            then: then.into(),
            action,
        })
    }

    /// Builds the rule.
    pub fn build(self) -> TableRule {
        self.rule
    }
}
