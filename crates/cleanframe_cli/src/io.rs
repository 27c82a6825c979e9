//! Table input and output for the CLI.
//!
//! CSV and JSON (an array of objects) are picked by file extension.

use anyhow::{Context, Result, bail};
use cleanframe_core::{Table, Value};
use indexmap::IndexMap;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Json,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .with_context(|| format!("No file extension on {}", path.display()))?;

        match ext.as_str() {
            "csv" => Ok(DataFormat::Csv),
            "json" => Ok(DataFormat::Json),
            other => bail!("Unsupported data format: {}", other),
        }
    }
}

/// Reads a table from a CSV or JSON file.
pub fn read_table(path: &Path) -> Result<Table> {
    let format = DataFormat::from_path(path)?;
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    match format {
        DataFormat::Csv => parse_csv(&content),
        DataFormat::Json => parse_json(&content),
    }
}

/// Parses CSV with a header row. Cells are typed by [`parse_cell`].
pub fn parse_csv(content: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", i + 1))?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(Table::from_rows(header, rows)?)
}

/// Parses a JSON array of objects.
pub fn parse_json(content: &str) -> Result<Table> {
    let records: Vec<IndexMap<String, Value>> =
        serde_json::from_str(content).context("Expected a JSON array of objects")?;
    Ok(Table::from_records(records))
}

/// Types a CSV cell: empty is null, then integer, float, boolean, else text.
///
/// Digits with a leading zero (`01234`) stay text so codes keep their form.
pub fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if has_leading_zero(trimmed) {
        return Value::String(cell.to_string());
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Value::Float(f);
    }
    match trimmed.to_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

fn has_leading_zero(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    let mut chars = digits.chars();
    chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Writes a table to `path`, or as CSV to stdout when no path is given.
pub fn write_table(table: &Table, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        let stdout = std::io::stdout();
        return write_csv(table, stdout.lock());
    };

    let file =
        fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    match DataFormat::from_path(path)? {
        DataFormat::Csv => write_csv(table, file),
        DataFormat::Json => write_json(table, file),
    }
}

fn write_csv<W: Write>(table: &Table, sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|(_, value)| render_cell(value)))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<W: Write>(table: &Table, mut sink: W) -> Result<()> {
    let records: Vec<IndexMap<&str, &Value>> = table.rows().map(|row| row.iter().collect()).collect();
    serde_json::to_writer_pretty(&mut sink, &records)?;
    writeln!(sink)?;
    Ok(())
}

fn render_cell(value: &Value) -> String {
    if value.is_null() {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell(""), Value::Null);
        assert_eq!(parse_cell(" 42 "), Value::Int(42));
        assert_eq!(parse_cell("2.5"), Value::Float(2.5));
        assert_eq!(parse_cell("TRUE"), Value::Bool(true));
        assert_eq!(parse_cell("abc"), Value::from("abc"));
    }

    #[test]
    fn test_parse_cell_keeps_leading_zeros() {
        assert_eq!(parse_cell("01234"), Value::from("01234"));
        assert_eq!(parse_cell("-007"), Value::from("-007"));
        assert_eq!(parse_cell("0"), Value::Int(0));
        assert_eq!(parse_cell("0.5"), Value::Float(0.5));
    }

    #[test]
    fn test_parse_csv() {
        let table = parse_csv("id,name\n1,ann\n2,\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.column("name").map(|c| c.values().to_vec()),
            Some(vec![Value::from("ann"), Value::Null])
        );
    }

    #[test]
    fn test_parse_json_fills_missing_keys() {
        let table = parse_json(r#"[{"id": 1, "tag": "a"}, {"id": 2}]"#).unwrap();
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["id", "tag"]);
        assert_eq!(
            table.column("tag").map(|c| c.values().to_vec()),
            Some(vec![Value::from("a"), Value::Null])
        );
    }

    #[test]
    fn test_write_csv_renders_nulls_empty() {
        let table = parse_csv("id,name\n1,ann\n2,\n").unwrap();
        let mut buffer = Vec::new();
        write_csv(&table, &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "id,name\n1,ann\n2,\n");
    }

    #[test]
    fn test_unknown_extension() {
        assert!(DataFormat::from_path(Path::new("data.parquet")).is_err());
    }
}
