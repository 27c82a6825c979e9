//! Parser for cleanframe schema files (YAML/TOML formats).
//!
//! This crate reads declarative schema files into the strongly-typed
//! [`Schema`] structure and runs structural validation on the result, so a
//! successfully parsed schema is always ready for a cleaning run.
//!
//! Function-valued rules (custom validators, duplicate resolvers) cannot be
//! written in a file; attach them afterwards with [`Schema::with_validator`]
//! and [`Schema::with_resolver`].
//!
//! # Example
//!
//! ```rust
//! use cleanframe_parser::parse_yaml;
//!
//! let yaml = r#"
//! columns:
//!   id:
//!     dtype: int
//!     unique: true
//!   age:
//!     min: 18
//!     max: 60
//!     drop_if_invalid: true
//! table:
//!   min_rows: 3
//! "#;
//!
//! let schema = parse_yaml(yaml).expect("Failed to parse schema");
//! assert_eq!(schema.columns.len(), 2);
//! ```

use cleanframe_core::{Schema, SchemaError};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during schema parsing.
#[derive(Debug, Error)]
pub enum ParserError {
    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing or deserialization failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,

    /// The file parsed but the rules are structurally unsound
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Supported schema file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
}

/// Parse a schema from a YAML string.
///
/// # Example
///
/// ```rust
/// use cleanframe_parser::parse_yaml;
///
/// let yaml = r#"
/// columns:
///   zip:
///     pattern: '^\d{5}$'
/// "#;
///
/// let schema = parse_yaml(yaml).unwrap();
/// assert!(schema.column("zip").is_some());
/// ```
pub fn parse_yaml(content: &str) -> Result<Schema> {
    let schema: Schema = serde_yaml_ng::from_str(content)?;
    finish(schema)
}

/// Parse a schema from a TOML string.
///
/// # Example
///
/// ```rust
/// use cleanframe_parser::parse_toml;
///
/// let toml = r#"
/// [columns.name]
/// dtype = "string"
/// allow_null = false
/// fill_value = "Unknown"
///
/// [table]
/// no_duplicates = true
/// "#;
///
/// let schema = parse_toml(toml).unwrap();
/// assert!(schema.table.is_some());
/// ```
pub fn parse_toml(content: &str) -> Result<Schema> {
    let schema: Schema =
        toml::from_str(content).map_err(|e| ParserError::TomlError(e.to_string()))?;
    finish(schema)
}

fn finish(schema: Schema) -> Result<Schema> {
    let schema = schema.ensure_valid()?;
    debug!(
        columns = schema.columns.len(),
        table_rule = schema.table.is_some(),
        "Parsed schema"
    );
    Ok(schema)
}

/// Detect the schema format from a file path based on its extension.
///
/// # Supported Extensions
///
/// * `.yaml`, `.yml` → `SchemaFormat::Yaml`
/// * `.toml` → `SchemaFormat::Toml`
///
/// # Errors
///
/// Returns `ParserError::InvalidExtension` if the file has no extension.
/// Returns `ParserError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<SchemaFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ParserError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(SchemaFormat::Yaml),
        "toml" => Ok(SchemaFormat::Toml),
        other => Err(ParserError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a schema from a file with automatic format detection.
///
/// # Example
///
/// ```no_run
/// use cleanframe_parser::parse_file;
/// use std::path::Path;
///
/// let schema = parse_file(Path::new("schemas/customers.yml")).unwrap();
/// println!("Loaded {} column rule(s)", schema.columns.len());
/// ```
pub fn parse_file(path: &Path) -> Result<Schema> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        SchemaFormat::Yaml => parse_yaml(&content),
        SchemaFormat::Toml => parse_toml(&content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanframe_core::{Action, CrossValidation, DType, FillStrategy, FillValue, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_yaml_column_rules() {
        let yaml = r#"
columns:
  id:
    dtype: int
    unique: true
  name:
    dtype: string
    allow_null: false
    fill_value: Unknown
  age:
    dtype: integer
    min: 18
    max: 60
    drop_if_invalid: true
  income:
    allow_null: false
    fillna: median
  status:
    allowed_values: [active, inactive]
"#;

        let schema = parse_yaml(yaml).expect("Failed to parse valid YAML");

        assert_eq!(
            schema.columns.keys().collect::<Vec<_>>(),
            vec!["id", "name", "age", "income", "status"]
        );

        let id = schema.column("id").expect("id rule");
        assert_eq!(id.dtype, Some(DType::Int));
        assert!(id.unique);
        assert!(id.allow_null);

        let name = schema.column("name").expect("name rule");
        assert!(!name.allow_null);
        assert_eq!(
            name.fill_value,
            Some(FillValue::Literal(Value::from("Unknown")))
        );

        let age = schema.column("age").expect("age rule");
        assert_eq!(age.min, Some(Value::Int(18)));
        assert_eq!(age.max, Some(Value::Int(60)));
        assert!(age.drop_if_invalid);

        let income = schema.column("income").expect("income rule");
        assert_eq!(
            income.fill_value,
            Some(FillValue::Strategy(FillStrategy::Median))
        );

        let status = schema.column("status").expect("status rule");
        assert_eq!(
            status.allowed_values,
            Some(vec![Value::from("active"), Value::from("inactive")])
        );
        assert!(schema.table.is_none());
    }

    #[test]
    fn test_datetime_like_literals_stay_text() {
        let yaml = r#"
columns:
  slot:
    allowed_values: ["2024-01-01T00:00:00"]
    fill_value: "2024-01-01T00:00:00"
"#;

        let schema = parse_yaml(yaml).expect("Failed to parse valid YAML");
        let slot = schema.column("slot").expect("slot rule");
        assert_eq!(
            slot.allowed_values,
            Some(vec![Value::from("2024-01-01T00:00:00")])
        );
        assert_eq!(
            slot.fill_value,
            Some(FillValue::Literal(Value::from("2024-01-01T00:00:00")))
        );
    }

    #[test]
    fn test_parse_yaml_table_rule() {
        let yaml = r#"
columns: {}
table:
  min_rows: 3
  max_rows: 100
  no_duplicates: true
  unique_keys: [order_id, line]
  expected_columns: [order_id, line, qty]
  cross_validations:
    - type: comparison
      condition: "start_day <= end_day"
      action: drop
    - type: aggregate
      condition: "SUM(qty) > 0"
    - type: conditional
      if: "status = 'shipped'"
      then: "shipped_at IS NOT NULL"
      action: warn
"#;

        let schema = parse_yaml(yaml).expect("Failed to parse YAML with table rule");
        let table = schema.table.expect("table rule should be present");

        assert_eq!(table.min_rows, Some(3));
        assert_eq!(table.max_rows, Some(100));
        assert!(table.no_duplicates);
        assert_eq!(
            table.unique_keys,
            Some(vec!["order_id".to_string(), "line".to_string()])
        );
        assert_eq!(table.cross_validations.len(), 3);
        assert_eq!(
            table.cross_validations[0],
            CrossValidation::Comparison {
                condition: "start_day <= end_day".to_string(),
                action: Action::Drop,
            }
        );
        assert_eq!(table.cross_validations[1].action(), Action::Warn);
        assert_eq!(table.cross_validations[2].kind(), "conditional");
    }

    #[test]
    fn test_dataframe_rule_alias() {
        let yaml = r#"
dataframe_rule:
  min_rows: 1
"#;
        let schema = parse_yaml(yaml).expect("alias accepted");
        assert_eq!(schema.table.and_then(|t| t.min_rows), Some(1));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let invalid_yaml = r#"
columns:
  id:
    dtype: int
   unique: true
"#;

        let result = parse_yaml(invalid_yaml);
        assert!(matches!(result.unwrap_err(), ParserError::YamlError(_)));
    }

    #[test]
    fn test_parse_yaml_unknown_field() {
        let yaml = r#"
columns:
  id:
    nullable: false
"#;

        assert!(matches!(
            parse_yaml(yaml).unwrap_err(),
            ParserError::YamlError(_)
        ));
    }

    #[test]
    fn test_parse_yaml_unknown_dtype() {
        let yaml = r#"
columns:
  id:
    dtype: decimal
"#;

        assert!(parse_yaml(yaml).is_err());
    }

    #[test]
    fn test_parse_yaml_structurally_invalid() {
        let yaml = r#"
columns:
  age:
    min: 60
    max: 18
table:
  min_rows: 10
  max_rows: 1
"#;

        let err = parse_yaml(yaml).unwrap_err();
        match err {
            ParserError::Schema(SchemaError::Invalid(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_valid_toml() {
        let toml = r#"
[columns.id]
dtype = "int"
unique = true

[columns.age]
min = 18
max = 60
drop_if_invalid = true

[table]
min_rows = 3
no_duplicates = true

[[table.cross_validations]]
type = "comparison"
condition = "start_day <= end_day"
action = "drop"
"#;

        let schema = parse_toml(toml).expect("Failed to parse valid TOML");

        assert_eq!(schema.columns.keys().collect::<Vec<_>>(), vec!["id", "age"]);
        assert_eq!(schema.column("age").and_then(|r| r.max.clone()), Some(Value::Int(60)));
        let table = schema.table.expect("table rule should be present");
        assert_eq!(table.cross_validations[0].action(), Action::Drop);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = parse_toml("[columns.id\ndtype = ");
        assert!(matches!(result.unwrap_err(), ParserError::TomlError(_)));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(Path::new("schema.yml")).unwrap(),
            SchemaFormat::Yaml
        );
        assert_eq!(
            detect_format(Path::new("schema.YAML")).unwrap(),
            SchemaFormat::Yaml
        );
        assert_eq!(
            detect_format(Path::new("schema.toml")).unwrap(),
            SchemaFormat::Toml
        );
        assert!(matches!(
            detect_format(Path::new("schema.json")),
            Err(ParserError::UnsupportedFormat(ext)) if ext == "json"
        ));
        assert!(matches!(
            detect_format(Path::new("schema")),
            Err(ParserError::InvalidExtension)
        ));
    }
}
