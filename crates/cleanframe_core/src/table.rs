//! In-memory table representation.
//!
//! A [`Table`] is a set of named columns in a fixed order plus a row index of
//! stable [`RowId`]s. Row ids survive row removal, so a row stays addressable
//! by identity while earlier stages rewrite its content.

use crate::{TableError, Value};
use indexmap::IndexMap;

/// Stable identity of a row within one cleaning run.
pub type RowId = usize;

/// A single column: values plus an optional categorical domain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Column {
    values: Vec<Value>,
    categories: Option<Vec<Value>>,
}

impl Column {
    /// Creates a column from values.
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            categories: None,
        }
    }

    /// Returns the values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value at `position`.
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Overwrites the value at `position`. Out-of-range positions are ignored.
    pub fn set(&mut self, position: usize, value: Value) {
        if let Some(slot) = self.values.get_mut(position) {
            *slot = value;
        }
    }

    /// Replaces every value at once.
    pub fn replace_values(&mut self, values: Vec<Value>) {
        self.values = values;
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null values.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// The categorical domain, when the column is categorical.
    pub fn categories(&self) -> Option<&[Value]> {
        self.categories.as_deref()
    }

    /// Sets or clears the categorical domain.
    pub fn set_categories(&mut self, categories: Option<Vec<Value>>) {
        self.categories = categories;
    }
}

/// A table of rows and named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: IndexMap<String, Column>,
    index: Vec<RowId>,
}

impl Table {
    /// Creates a table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a table from named columns, in order.
    ///
    /// The row index defaults to `0..n`.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut map: IndexMap<String, Column> = IndexMap::new();
        let mut expected: Option<usize> = None;

        for (name, values) in columns {
            let name = name.into();
            let len = *expected.get_or_insert(values.len());
            if values.len() != len {
                return Err(TableError::RaggedColumn {
                    column: name,
                    expected: len,
                    actual: values.len(),
                });
            }
            if map.contains_key(&name) {
                return Err(TableError::DuplicateColumn(name));
            }
            map.insert(name, Column::new(values));
        }

        let len = expected.unwrap_or(0);
        Ok(Self {
            columns: map,
            index: (0..len).collect(),
        })
    }

    /// Creates a table from a header and row-major cells.
    pub fn from_rows<S: Into<String>>(
        header: Vec<S>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, TableError> {
        let names: Vec<String> = header.into_iter().map(Into::into).collect();
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(TableError::RaggedRow {
                    row: row_idx,
                    expected: names.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }

        Self::from_columns(names.into_iter().zip(columns))
    }

    /// Creates a table from records keyed by column name.
    ///
    /// Columns appear in first-seen order; a record missing a column gets a null.
    pub fn from_records(records: Vec<IndexMap<String, Value>>) -> Self {
        let mut names: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let columns: IndexMap<String, Column> = names
            .into_iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|r| r.get(&name).cloned().unwrap_or(Value::Null))
                    .collect();
                (name, Column::new(values))
            })
            .collect();

        Self {
            columns,
            index: (0..records.len()).collect(),
        }
    }

    /// Replaces the row index with explicit labels.
    pub fn with_index(mut self, index: Vec<RowId>) -> Result<Self, TableError> {
        if index.len() != self.len() {
            return Err(TableError::IndexLength {
                expected: self.len(),
                actual: index.len(),
            });
        }
        self.index = index;
        Ok(self)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Named columns in order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, col)| (name.as_str(), col))
    }

    /// Returns true if the table has a column called `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Looks up a column.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Looks up a column for mutation.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    /// Returns the row index.
    pub fn index(&self) -> &[RowId] {
        &self.index
    }

    /// Returns the position of the row with identity `id`.
    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.index.iter().position(|&label| label == id)
    }

    /// Returns a view of the row at `position`.
    pub fn row(&self, position: usize) -> Option<Row<'_>> {
        (position < self.len()).then_some(Row {
            table: self,
            position,
        })
    }

    /// Iterates over all rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.len()).map(move |position| Row {
            table: self,
            position,
        })
    }

    /// Removes every row whose flag is set and returns how many were removed.
    ///
    /// Surviving rows keep their identities. Flags beyond the row count are
    /// ignored; missing flags count as "keep".
    pub fn drop_rows(&mut self, flags: &[bool]) -> usize {
        let keep: Vec<bool> = (0..self.len())
            .map(|p| !flags.get(p).copied().unwrap_or(false))
            .collect();
        let removed = keep.iter().filter(|k| !**k).count();
        if removed == 0 {
            return 0;
        }

        for column in self.columns.values_mut() {
            let mut flags = keep.iter();
            column
                .values
                .retain(|_| flags.next().copied().unwrap_or(true));
        }
        let mut flags = keep.iter();
        self.index.retain(|_| flags.next().copied().unwrap_or(true));

        removed
    }

    /// Renumbers the row index contiguously from zero.
    pub fn reset_index(&mut self) {
        self.index = (0..self.len()).collect();
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    position: usize,
}

impl<'a> Row<'a> {
    /// Stable identity of the row.
    pub fn id(&self) -> RowId {
        self.table.index[self.position]
    }

    /// Current position of the row in the table.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Value of `column` in this row.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.table.columns.get(column)?.values.get(self.position)
    }

    /// Iterates over `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        let position = self.position;
        self.table
            .columns
            .iter()
            .filter_map(move |(name, col)| Some((name.as_str(), col.values.get(position)?)))
    }

    /// Hashable key over the given columns, or every column when `columns` is `None`.
    ///
    /// One entry per cell, so cell text can never bleed into a neighbour.
    pub fn key(&self, columns: Option<&[String]>) -> Vec<String> {
        match columns {
            Some(names) => names
                .iter()
                .map(|n| self.get(n).map_or_else(|| "missing:".to_string(), Value::group_key))
                .collect(),
            None => self.iter().map(|(_, v)| v.group_key()).collect(),
        }
    }
}

/// Rows sharing one duplicated value in a column.
///
/// Handed to a duplicate resolver, which picks the row to keep.
#[derive(Debug, Clone)]
pub struct DuplicateGroup<'a> {
    table: &'a Table,
    column: &'a str,
    positions: Vec<usize>,
}

impl<'a> DuplicateGroup<'a> {
    /// Creates a group from row positions in `table`.
    pub fn new(table: &'a Table, column: &'a str, positions: Vec<usize>) -> Self {
        Self {
            table,
            column,
            positions,
        }
    }

    /// The column whose values are duplicated.
    pub fn column(&self) -> &str {
        self.column
    }

    /// The shared value.
    pub fn value(&self) -> Option<&'a Value> {
        let first = *self.positions.first()?;
        self.table.column(self.column)?.get(first)
    }

    /// Rows of the group in original order.
    pub fn rows(&self) -> impl Iterator<Item = Row<'a>> + '_ {
        self.positions.iter().filter_map(|&p| self.table.row(p))
    }

    /// Row identities of the group in original order.
    pub fn ids(&self) -> Vec<RowId> {
        self.rows().map(|r| r.id()).collect()
    }

    /// Number of rows in the group.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true for an empty group.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position in the table of the member row with identity `id`.
    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.rows().find(|r| r.id() == id).map(|r| r.position())
    }
}
