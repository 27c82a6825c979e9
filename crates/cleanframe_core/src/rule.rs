//! Rule model.
//!
//! This module contains the declarative rules applied by a cleaning run: one
//! [`ColumnRule`] per column, at most one [`TableRule`], both gathered in a
//! [`Schema`]. Rules are plain values; function-valued fields (custom
//! validators and duplicate resolvers) are injected capabilities and cannot be
//! read from a schema file.

use crate::{DuplicateGroup, Row, RowId, SchemaError, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Target type of a column coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DType {
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// Text
    String,
    /// Boolean
    Bool,
    /// Timestamp without time zone
    DateTime,
    /// Categorical text over the values present
    Category,
}

impl DType {
    /// Canonical tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Int => "int",
            DType::Float => "float",
            DType::String => "string",
            DType::Bool => "bool",
            DType::DateTime => "datetime",
            DType::Category => "category",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "int" | "int64" | "integer" | "long" => Ok(DType::Int),
            "float" | "float64" | "double" | "number" => Ok(DType::Float),
            "string" | "str" | "text" => Ok(DType::String),
            "bool" | "boolean" => Ok(DType::Bool),
            "datetime" | "timestamp" | "datetime64" => Ok(DType::DateTime),
            "category" | "categorical" => Ok(DType::Category),
            _ => Err(SchemaError::UnknownDType(s.to_string())),
        }
    }
}

impl TryFrom<String> for DType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DType> for String {
    fn from(dtype: DType) -> Self {
        dtype.as_str().to_string()
    }
}

/// Aggregate used to fill nulls from the column's own valid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStrategy {
    /// Arithmetic mean (numeric columns only)
    Mean,
    /// Median (numeric columns only)
    Median,
    /// Smallest value
    Min,
    /// Largest value
    Max,
}

impl FillStrategy {
    /// Strategy name as written in a schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            FillStrategy::Mean => "mean",
            FillStrategy::Median => "median",
            FillStrategy::Min => "min",
            FillStrategy::Max => "max",
        }
    }

    /// Parses an exact strategy name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mean" => Some(FillStrategy::Mean),
            "median" => Some(FillStrategy::Median),
            "min" => Some(FillStrategy::Min),
            "max" => Some(FillStrategy::Max),
            _ => None,
        }
    }
}

impl fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substitute for an invalid or null value.
///
/// A string equal to a strategy name (`mean`, `median`, `min`, `max`) is read as
/// that strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FillValue {
    /// Literal substitution value
    Literal(Value),
    /// Aggregate computed from the column when nulls are filled
    Strategy(FillStrategy),
}

impl FillValue {
    /// The value substituted verbatim, without aggregate resolution.
    ///
    /// Strategies become their name as text.
    pub fn literal(&self) -> Value {
        match self {
            FillValue::Literal(value) => value.clone(),
            FillValue::Strategy(strategy) => Value::from(strategy.as_str()),
        }
    }
}

impl From<Value> for FillValue {
    fn from(value: Value) -> Self {
        match value.as_str().and_then(FillStrategy::from_name) {
            Some(strategy) => FillValue::Strategy(strategy),
            None => FillValue::Literal(value),
        }
    }
}

impl From<FillValue> for Value {
    fn from(fill: FillValue) -> Self {
        fill.literal()
    }
}

impl From<FillStrategy> for FillValue {
    fn from(strategy: FillStrategy) -> Self {
        FillValue::Strategy(strategy)
    }
}

type ValidatorFn = dyn Fn(&Value, &Row<'_>) -> anyhow::Result<bool> + Send + Sync;
type ResolverFn = dyn Fn(&DuplicateGroup<'_>) -> anyhow::Result<RowId> + Send + Sync;

/// Caller-supplied row-level predicate: `(value, row) -> valid?`.
#[derive(Clone)]
pub struct CustomValidator(Arc<ValidatorFn>);

impl CustomValidator {
    /// Wraps a fallible predicate. An `Err` aborts the stage for the column.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Row<'_>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps an infallible predicate.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value, &Row<'_>) -> bool + Send + Sync + 'static,
    {
        Self::new(move |value, row| Ok(f(value, row)))
    }

    /// Evaluates the predicate.
    pub fn check(&self, value: &Value, row: &Row<'_>) -> anyhow::Result<bool> {
        (self.0)(value, row)
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidator(..)")
    }
}

/// Caller-supplied duplicate resolver: picks the identity of the row to keep.
#[derive(Clone)]
pub struct DuplicateResolver(Arc<ResolverFn>);

impl DuplicateResolver {
    /// Wraps a resolver.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&DuplicateGroup<'_>) -> anyhow::Result<RowId> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Picks the row to keep for `group`.
    pub fn resolve(&self, group: &DuplicateGroup<'_>) -> anyhow::Result<RowId> {
        (self.0)(group)
    }
}

impl fmt::Debug for DuplicateResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DuplicateResolver(..)")
    }
}

/// Cleaning contract for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnRule {
    /// Target type; `None` skips coercion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DType>,

    /// Whether nulls are acceptable without remediation
    pub allow_null: bool,

    /// Failure policy: `true` marks rows for removal, `false` corrects in place
    pub drop_if_invalid: bool,

    /// Substitute for nulls and invalid values
    #[serde(alias = "fillna", skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<FillValue>,

    /// Inclusive lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,

    /// Inclusive upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,

    /// Closed set of permitted values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,

    /// Regular expression the stringified value must fully match
    #[serde(alias = "regex", skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Row-level predicate
    #[serde(skip)]
    pub custom_validator: Option<CustomValidator>,

    /// Column-wide uniqueness requirement
    pub unique: bool,

    /// Picks the surviving row of each duplicate group; keep-first when absent
    #[serde(skip)]
    pub resolve_duplicates: Option<DuplicateResolver>,
}

impl Default for ColumnRule {
    fn default() -> Self {
        Self {
            dtype: None,
            allow_null: true,
            drop_if_invalid: false,
            fill_value: None,
            min: None,
            max: None,
            allowed_values: None,
            pattern: None,
            custom_validator: None,
            unique: false,
            resolve_duplicates: None,
        }
    }
}

impl ColumnRule {
    /// Value substituted for invalid values (null when unset).
    pub fn fill_literal(&self) -> Value {
        self.fill_value
            .as_ref()
            .map_or(Value::Null, FillValue::literal)
    }

    fn validate(&self, column: &str, errors: &mut Vec<SchemaError>) {
        if let (Some(min), Some(max)) = (&self.min, &self.max) {
            if min.compare(max) == Some(Ordering::Greater) {
                errors.push(SchemaError::InvertedBounds {
                    column: column.to_string(),
                    min: min.to_string(),
                    max: max.to_string(),
                });
            }
        }

        if self.allowed_values.as_ref().is_some_and(Vec::is_empty) {
            errors.push(SchemaError::EmptyAllowedValues(column.to_string()));
        }

        if self.pattern.as_ref().is_some_and(|p| p.trim().is_empty()) {
            errors.push(SchemaError::BlankPattern(column.to_string()));
        }

        if self.resolve_duplicates.is_some() && !self.unique {
            errors.push(SchemaError::ResolverWithoutUnique(column.to_string()));
        }
    }
}

/// What to do with rows failing a cross-validation check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Remove failing rows immediately
    Drop,
    /// Report only
    #[default]
    Warn,
}

/// A check spanning several columns or the whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum CrossValidation {
    /// Row-wise boolean expression every row must satisfy
    Comparison {
        /// Row-wise boolean expression
        condition: String,
        /// Drop or warn on failing rows
        #[serde(default)]
        action: Action,
    },

    /// Boolean expression over the whole table; can only warn
    Aggregate {
        /// Aggregate boolean expression
        condition: String,
        /// `drop` is reported as impossible and treated as `warn`
        #[serde(default)]
        action: Action,
    },

    /// For rows where `if` holds, `then` must hold too
    Conditional {
        /// Row-wise premise
        #[serde(rename = "if")]
        when: String,
        /// Row-wise consequence
        then: String,
        /// Drop or warn on failing rows
        #[serde(default)]
        action: Action,
    },
}

impl CrossValidation {
    /// Check kind as written in a schema.
    pub fn kind(&self) -> &'static str {
        match self {
            CrossValidation::Comparison { .. } => "comparison",
            CrossValidation::Aggregate { .. } => "aggregate",
            CrossValidation::Conditional { .. } => "conditional",
        }
    }

    /// Configured action.
    pub fn action(&self) -> Action {
        match self {
            CrossValidation::Comparison { action, .. }
            | CrossValidation::Aggregate { action, .. }
            | CrossValidation::Conditional { action, .. } => *action,
        }
    }

    /// Human-readable expression text.
    pub fn describe(&self) -> String {
        match self {
            CrossValidation::Comparison { condition, .. }
            | CrossValidation::Aggregate { condition, .. } => condition.clone(),
            CrossValidation::Conditional { when, then, .. } => {
                format!("if {} then {}", when, then)
            }
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            CrossValidation::Comparison { condition, .. }
            | CrossValidation::Aggregate { condition, .. } => condition.trim().is_empty(),
            CrossValidation::Conditional { when, then, .. } => {
                when.trim().is_empty() || then.trim().is_empty()
            }
        }
    }
}

/// Cleaning contract for the table as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableRule {
    /// Advisory lower bound on the row count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rows: Option<usize>,

    /// Advisory upper bound on the row count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,

    /// Remove exact full-row duplicates, keeping the first
    pub no_duplicates: bool,

    /// Columns whose combination should be unique (reported only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_keys: Option<Vec<String>>,

    /// Columns the table should have (reported only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_columns: Option<Vec<String>>,

    /// Cross-column checks, evaluated in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cross_validations: Vec<CrossValidation>,
}

impl TableRule {
    fn validate(&self, errors: &mut Vec<SchemaError>) {
        if let (Some(min), Some(max)) = (self.min_rows, self.max_rows) {
            if min > max {
                errors.push(SchemaError::InvertedRowBounds { min, max });
            }
        }

        for (label, list) in [
            ("unique_keys", &self.unique_keys),
            ("expected_columns", &self.expected_columns),
        ] {
            if let Some(names) = list {
                if names.is_empty() {
                    errors.push(SchemaError::EmptyList(label));
                } else if names.iter().any(|n| n.trim().is_empty()) {
                    errors.push(SchemaError::BlankColumnName(label));
                }
            }
        }

        for (idx, check) in self.cross_validations.iter().enumerate() {
            if check.is_blank() {
                errors.push(SchemaError::BlankExpression {
                    kind: check.kind(),
                    position: idx + 1,
                });
            }
        }
    }
}

/// Column rules in declaration order plus an optional table rule.
///
/// Declaration order is run order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    /// Column rules keyed by column name
    #[serde(default)]
    pub columns: IndexMap<String, ColumnRule>,

    /// Table-level rule
    #[serde(default, alias = "dataframe_rule", skip_serializing_if = "Option::is_none")]
    pub table: Option<TableRule>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the rule for a column.
    pub fn column(&self, name: &str) -> Option<&ColumnRule> {
        self.columns.get(name)
    }

    /// Collects every structural problem in the rule set.
    ///
    /// This checks the rules themselves, never any data. Malformed regular
    /// expressions are not structural: they are reported when a run uses them.
    pub fn validate(&self) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (name, rule) in &self.columns {
            if name.trim().is_empty() {
                errors.push(SchemaError::EmptyColumnName);
            }
            if !seen.insert(name.as_str()) {
                continue;
            }
            rule.validate(name, &mut errors);
        }

        if let Some(table) = &self.table {
            table.validate(&mut errors);
        }

        errors
    }

    /// Returns the schema if it is structurally sound.
    pub fn ensure_valid(self) -> Result<Self, SchemaError> {
        let mut errors = self.validate();
        match errors.len() {
            0 => Ok(self),
            1 => Err(errors.remove(0)),
            _ => Err(SchemaError::Invalid(errors)),
        }
    }

    /// Attaches a custom validator to a declared column.
    pub fn with_validator(
        mut self,
        column: &str,
        validator: CustomValidator,
    ) -> Result<Self, SchemaError> {
        let rule = self
            .columns
            .get_mut(column)
            .ok_or_else(|| SchemaError::UnknownColumn(column.to_string()))?;
        rule.custom_validator = Some(validator);
        Ok(self)
    }

    /// Attaches a duplicate resolver to a declared column.
    pub fn with_resolver(
        mut self,
        column: &str,
        resolver: DuplicateResolver,
    ) -> Result<Self, SchemaError> {
        let rule = self
            .columns
            .get_mut(column)
            .ok_or_else(|| SchemaError::UnknownColumn(column.to_string()))?;
        rule.resolve_duplicates = Some(resolver);
        self.ensure_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dtype_aliases() {
        assert_eq!("int64".parse::<DType>(), Ok(DType::Int));
        assert_eq!(" Double ".parse::<DType>(), Ok(DType::Float));
        assert_eq!("text".parse::<DType>(), Ok(DType::String));
        assert_eq!("timestamp".parse::<DType>(), Ok(DType::DateTime));
        assert_eq!(
            "complex128".parse::<DType>(),
            Err(SchemaError::UnknownDType("complex128".to_string()))
        );
    }

    #[test]
    fn test_fill_value_strategy_names() {
        assert_eq!(
            FillValue::from(Value::from("median")),
            FillValue::Strategy(FillStrategy::Median)
        );
        assert_eq!(
            FillValue::from(Value::from("Unknown")),
            FillValue::Literal(Value::from("Unknown"))
        );
        assert_eq!(
            FillValue::Strategy(FillStrategy::Mean).literal(),
            Value::from("mean")
        );
    }

    #[test]
    fn test_column_rule_defaults() {
        let rule = ColumnRule::default();
        assert!(rule.allow_null);
        assert!(!rule.drop_if_invalid);
        assert!(!rule.unique);
        assert_eq!(rule.fill_literal(), Value::Null);
    }

    #[test]
    fn test_cross_validation_describe() {
        let check = CrossValidation::Conditional {
            when: "status = 'shipped'".to_string(),
            then: "shipped_at IS NOT NULL".to_string(),
            action: Action::Drop,
        };
        assert_eq!(check.kind(), "conditional");
        assert_eq!(check.action(), Action::Drop);
        assert_eq!(
            check.describe(),
            "if status = 'shipped' then shipped_at IS NOT NULL"
        );
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut schema = Schema::new();
        schema.columns.insert(
            "age".to_string(),
            ColumnRule {
                min: Some(Value::Int(60)),
                max: Some(Value::Int(18)),
                allowed_values: Some(vec![]),
                ..Default::default()
            },
        );
        schema.table = Some(TableRule {
            min_rows: Some(10),
            max_rows: Some(5),
            unique_keys: Some(vec![]),
            cross_validations: vec![CrossValidation::Comparison {
                condition: "  ".to_string(),
                action: Action::Warn,
            }],
            ..Default::default()
        });

        let errors = schema.validate();
        assert_eq!(errors.len(), 5);
        assert!(matches!(
            schema.ensure_valid(),
            Err(SchemaError::Invalid(list)) if list.len() == 5
        ));
    }

    #[test]
    fn test_resolver_requires_unique() {
        let mut schema = Schema::new();
        schema
            .columns
            .insert("id".to_string(), ColumnRule::default());

        let resolver = DuplicateResolver::new(|group| Ok(group.ids()[0]));
        let err = schema.clone().with_resolver("id", resolver.clone()).unwrap_err();
        assert_eq!(err, SchemaError::ResolverWithoutUnique("id".to_string()));

        let err = schema.with_resolver("missing", resolver).unwrap_err();
        assert_eq!(err, SchemaError::UnknownColumn("missing".to_string()));
    }

    #[test]
    fn test_deserialize_cross_validations() {
        let rule: TableRule = serde_json::from_str(
            r#"{
                "min_rows": 3,
                "cross_validations": [
                    {"type": "comparison", "condition": "start_day <= end_day", "action": "drop"},
                    {"type": "aggregate", "condition": "SUM(amount) > 0"},
                    {"type": "conditional", "if": "a > 0", "then": "b > 0"}
                ]
            }"#,
        )
        .expect("valid table rule");

        assert_eq!(rule.min_rows, Some(3));
        assert_eq!(rule.cross_validations.len(), 3);
        assert_eq!(rule.cross_validations[0].action(), Action::Drop);
        assert_eq!(rule.cross_validations[1].action(), Action::Warn);
        assert_eq!(rule.cross_validations[2].describe(), "if a > 0 then b > 0");
    }
}
