//! Tabular data model: an ordered list of rows, each row a map from column
//! name to a scalar JSON value (string, number or null).

use serde::Serialize;
use serde_json::{Map, Value};

/// One table row. Key order is preserved (`serde_json/preserve_order`).
pub type Row = Map<String, Value>;

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// At least one non-null value, and every non-null value is a number.
    Numeric,
    /// Anything else (strings, booleans, mixed, or only nulls).
    Text,
}

impl ColumnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
        }
    }
}

/// Rows plus the ordered column set.
///
/// Columns are either given explicitly (CSV header) or derived from the
/// keys observed across rows, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Builds a table with an explicit column list (e.g. from a CSV header).
    ///
    /// Keys present in rows but missing from `columns` are appended in
    /// first-seen order so that no data is hidden.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let mut table = Self { columns, rows };
        table.absorb_row_keys();
        table
    }

    /// Builds a table whose columns are the keys observed across `rows`.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::new(Vec::new(), rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Infers the kind of `column` from its current values.
    pub fn column_kind(&self, column: &str) -> ColumnKind {
        let mut seen_number = false;
        for cell in self.rows.iter().filter_map(|row| row.get(column)) {
            match cell {
                Value::Null => {}
                Value::Number(_) => seen_number = true,
                _ => return ColumnKind::Text,
            }
        }
        if seen_number {
            ColumnKind::Numeric
        } else {
            ColumnKind::Text
        }
    }

    /// `(column, kind)` pairs in column order.
    pub fn column_kinds(&self) -> Vec<(String, ColumnKind)> {
        self.columns
            .iter()
            .map(|c| (c.clone(), self.column_kind(c)))
            .collect()
    }

    /// Replaces every value of `column`, one entry per row.
    ///
    /// A `null` replacement for a row that never had the key keeps the key
    /// absent.
    pub(crate) fn replace_column(&mut self, column: &str, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        for (row, value) in self.rows.iter_mut().zip(values) {
            if value.is_null() && !row.contains_key(column) {
                continue;
            }
            row.insert(column.to_string(), value);
        }
    }

    fn absorb_row_keys(&mut self) {
        for row in &self.rows {
            for key in row.keys() {
                if !self.columns.iter().any(|c| c == key) {
                    self.columns.push(key.clone());
                }
            }
        }
    }
}
