//! Query results as returned across the execution boundary.

use super::value::SqlValue;

/// Materialized result of one SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names in select order.
    pub columns: Vec<String>,

    /// Row values, each aligned with `columns`.
    pub rows: Vec<Vec<SqlValue<'static>>>,
}

impl ResultSet {
    /// Create a result set from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue<'static>>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result set has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate rows as named views.
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// All values of one column, in row order. Rows too short to hold the
    /// column are skipped.
    pub fn column_values(&self, name: &str) -> Option<Vec<SqlValue<'static>>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(idx).cloned())
                .collect(),
        )
    }

    /// First row whose length differs from the column count, as
    /// `(row index, value count)`.
    pub fn misaligned_row(&self) -> Option<(usize, usize)> {
        self.rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.columns.len())
            .map(|(idx, row)| (idx, row.len()))
    }
}

/// Borrowed view of a single row with access by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [SqlValue<'static>],
}

impl<'a> Row<'a> {
    /// Create a view over aligned column names and values.
    pub fn new(columns: &'a [String], values: &'a [SqlValue<'static>]) -> Self {
        Self { columns, values }
    }

    /// Get a value by column name.
    pub fn get(&self, column: &str) -> Option<&'a SqlValue<'static>> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Column names of this row.
    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    /// Values of this row.
    pub fn values(&self) -> &'a [SqlValue<'static>] {
        self.values
    }
}
