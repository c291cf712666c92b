//! Values harvested from already dumped tables.

use std::collections::HashMap;

use crate::core::result::ResultSet;
use crate::core::value::SqlValue;

/// Per-table, per-column values gathered while tables are dumped.
///
/// Owned by the orchestrator and passed by reference into the selector. A
/// table entry exists once the table has been dumped, even if none of its
/// columns were harvested; this distinguishes "table not dumped yet" from
/// "column not collected" when resolving dependent filters.
#[derive(Debug, Clone, Default)]
pub struct CollectedValues {
    tables: HashMap<String, HashMap<String, Vec<SqlValue<'static>>>>,
}

impl CollectedValues {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the table has been recorded.
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Collected columns of a table.
    pub fn table(&self, table: &str) -> Option<&HashMap<String, Vec<SqlValue<'static>>>> {
        self.tables.get(table)
    }

    /// Collected values of one column.
    pub fn get(&self, table: &str, column: &str) -> Option<&[SqlValue<'static>]> {
        self.tables
            .get(table)
            .and_then(|columns| columns.get(column))
            .map(Vec::as_slice)
    }

    /// Record that a table has been dumped.
    pub fn mark_table(&mut self, table: impl Into<String>) {
        self.tables.entry(table.into()).or_default();
    }

    /// Append values for a column. Existing values are kept.
    pub fn extend(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        values: impl IntoIterator<Item = SqlValue<'static>>,
    ) {
        self.tables
            .entry(table.into())
            .or_default()
            .entry(column.into())
            .or_default()
            .extend(values);
    }

    /// Record the given columns of a result set for `table`.
    ///
    /// Columns missing from the result are skipped, so a dependent filter on
    /// them still fails to resolve.
    pub fn harvest(&mut self, table: &str, result: &ResultSet, columns: &[String]) {
        self.mark_table(table);
        for column in columns {
            if let Some(values) = result.column_values(column) {
                self.extend(table, column.as_str(), values);
            }
        }
    }

    /// Append everything recorded in `other`.
    pub fn merge(&mut self, other: CollectedValues) {
        for (table, columns) in other.tables {
            self.mark_table(table.as_str());
            for (column, values) in columns {
                self.extend(table.as_str(), column, values);
            }
        }
    }

    /// Number of recorded tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
