//! Tabular results exchanged between sessions, the metastore and transformations

use serde_json::{Map, Value};

/// A single row: column name to value
pub type Row = Map<String, Value>;

/// An ordered collection of rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in order of first appearance
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// Append the rows of `other`
    pub fn union(mut self, other: Table) -> Table {
        self.rows.extend(other.rows);
        self
    }

    /// Set `name` to `value` on every row, replacing any existing value
    pub fn with_column(mut self, name: &str, value: Value) -> Table {
        for row in &mut self.rows {
            row.insert(name.to_string(), value.clone());
        }
        self
    }

    /// Keep only rows matching `predicate`
    pub fn filter<F>(mut self, predicate: F) -> Table
    where
        F: Fn(&Row) -> bool,
    {
        self.rows.retain(|row| predicate(row));
        self
    }

    /// Keep the first `n` rows
    pub fn head(mut self, n: usize) -> Table {
        self.rows.truncate(n);
        self
    }
}

impl FromIterator<Row> for Table {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
