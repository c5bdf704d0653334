use std::collections::HashSet;
use std::sync::Arc;

use duckdb::types::Value;

use crate::error::{FacadeError, Result};

/// A single row: values in column order, with the column list shared by
/// every row of the same result.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row against an existing column list.
    ///
    /// Column names must be unique and match `values` one to one.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Result<Self> {
        if let Some(name) = first_duplicate(&columns) {
            return Err(FacadeError::Validation(format!(
                "duplicate column '{name}' in row"
            )));
        }
        Self::with_columns(columns, values)
    }

    /// Like [`Row::new`] for a column list already known to be unique.
    pub(crate) fn with_columns(columns: Arc<[String]>, values: Vec<Value>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(FacadeError::Execution(format!(
                "row has {} values but result describes {} columns",
                values.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Build a row from `(column, value)` pairs, preserving their order.
    pub fn from_pairs<K, I>(pairs: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for (name, value) in pairs {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(FacadeError::Validation(format!(
                    "duplicate column '{name}' in row"
                )));
            }
            columns.push(name);
            values.push(value);
        }
        Ok(Self {
            columns: columns.into(),
            values,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value of the first column named `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name == column)
            .map(|idx| &self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.columns.iter().cloned().zip(self.values).collect()
    }

    pub(crate) fn column_list(&self) -> &Arc<[String]> {
        &self.columns
    }
}

/// First column name that appears more than once.
pub(crate) fn first_duplicate(columns: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    columns
        .iter()
        .find(|name| !seen.insert(name.as_str()))
        .map(String::as_str)
}

/// Fully materialized query result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub(crate) fn new(columns: Arc<[String]>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|row| row.column_list() == &columns));
        Self { columns, rows }
    }

    /// Column names captured from the statement's result metadata.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
