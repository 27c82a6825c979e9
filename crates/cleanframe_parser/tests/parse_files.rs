use cleanframe_parser::{ParserError, parse_file};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_parse_yaml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("customers.yml");
    fs::write(
        &path,
        r#"
columns:
  name:
    dtype: string
    allow_null: false
    fill_value: Unknown
  zip:
    pattern: '^\d{5}$'
table:
  expected_columns: [name, zip]
"#,
    )
    .unwrap();

    let schema = parse_file(&path).expect("schema file parses");
    assert_eq!(schema.columns.len(), 2);
    assert_eq!(
        schema.column("zip").and_then(|r| r.pattern.as_deref()),
        Some(r"^\d{5}$")
    );
}

#[test]
fn test_parse_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orders.toml");
    fs::write(
        &path,
        r#"
[columns.qty]
dtype = "int"
min = 1

[table]
unique_keys = ["order_id"]
"#,
    )
    .unwrap();

    let schema = parse_file(&path).expect("schema file parses");
    assert!(schema.column("qty").is_some());
    assert!(schema.table.is_some());
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = parse_file(&dir.path().join("absent.yml"));
    assert!(matches!(result, Err(ParserError::IoError(_))));
}

#[test]
fn test_unsupported_extension_checked_before_reading() {
    let dir = TempDir::new().unwrap();
    let result = parse_file(&dir.path().join("schema.ini"));
    assert!(matches!(result, Err(ParserError::UnsupportedFormat(_))));
}
