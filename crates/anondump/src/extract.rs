//! Per-table extraction: select, harvest and convert.
//!
//! [`TableExtractor`] does the work of one table for an orchestrator. It never
//! decides the table order; the caller dumps referenced tables first and
//! merges each [`ExtractedTable::harvested`] into its [`CollectedValues`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::{Config, TableConfiguration};
use crate::converter::{
    converter_key, ConvertContext, ConverterRegistry, ConverterService, TableConverterPolicy,
};
use crate::core::result::{ResultSet, Row};
use crate::core::schema::Table;
use crate::core::traits::QueryExecutor;
use crate::error::{DumpError, Result};
use crate::selector::{CollectedValues, DataSelector};

/// Converted rows of one table and the values other tables depend on.
#[derive(Debug, Clone, Default)]
pub struct ExtractedTable {
    /// Rows after conversion.
    pub rows: ResultSet,
    /// Unconverted values of the harvested columns of this table.
    pub harvested: CollectedValues,
}

/// Runs the selector and the converters for one table at a time.
pub struct TableExtractor {
    selector: DataSelector,
    converters: Arc<ConverterService>,
    harvest: HashMap<String, Vec<String>>,
}

impl TableExtractor {
    /// Create an extractor that harvests nothing.
    pub fn new(selector: DataSelector, converters: Arc<ConverterService>) -> Self {
        Self {
            selector,
            converters,
            harvest: HashMap::new(),
        }
    }

    /// Create an extractor for a whole configuration.
    ///
    /// Converters come from the tables' `converters` sections and every
    /// column referenced by a dependent filter is harvested.
    pub fn from_config(
        config: &Config,
        executor: Arc<dyn QueryExecutor>,
        registry: ConverterRegistry,
    ) -> Result<Self> {
        let converters =
            ConverterService::from_policy(&TableConverterPolicy::new(&config.tables), registry)?;
        let mut extractor = Self::new(DataSelector::new(executor), Arc::new(converters));

        for reference in config
            .tables
            .iter()
            .flat_map(|t| t.filters.iter())
            .filter_map(|f| f.referenced_column())
        {
            extractor.harvest_column(reference.table.as_str(), reference.column.as_str());
        }

        Ok(extractor)
    }

    /// Collect the unconverted values of `table.column` during extraction.
    pub fn harvest_column(&mut self, table: impl Into<String>, column: impl Into<String>) {
        let columns = self.harvest.entry(table.into()).or_default();
        let column = column.into();
        if !columns.contains(&column) {
            columns.push(column);
        }
    }

    /// Columns harvested for a table.
    pub fn harvest_columns(&self, table: &str) -> &[String] {
        self.harvest.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn selector(&self) -> &DataSelector {
        &self.selector
    }

    /// Extract one table.
    ///
    /// Harvesting reads the raw rows, so dependent filters match the source
    /// data and not its anonymized form.
    pub async fn extract(
        &self,
        table_config: Option<&TableConfiguration>,
        table: &Table,
        collected: &CollectedValues,
    ) -> Result<ExtractedTable> {
        let raw = self
            .selector
            .execute_select_query(table_config, table, collected)
            .await?;
        if let Some((row, actual)) = raw.misaligned_row() {
            return Err(DumpError::MalformedRow {
                table: table.full_name(),
                row,
                expected: raw.columns.len(),
                actual,
            });
        }

        let mut harvested = CollectedValues::new();
        harvested.harvest(&table.name, &raw, self.harvest_columns(&table.name));

        let rows = self.convert_rows(&table.name, &raw)?;
        info!("{}: extracted {} rows", table.full_name(), rows.len());

        Ok(ExtractedTable { rows, harvested })
    }

    /// Convert every value of a result set with the row as context.
    ///
    /// Every row must have one value per column.
    pub fn convert_rows(&self, table: &str, raw: &ResultSet) -> Result<ResultSet> {
        let keys: Vec<Option<String>> = raw
            .columns
            .iter()
            .map(|column| {
                let key = converter_key(table, column);
                self.converters.has_converter(&key).then_some(key)
            })
            .collect();

        let mut rows = Vec::with_capacity(raw.rows.len());
        for (index, values) in raw.rows.iter().enumerate() {
            if values.len() != raw.columns.len() {
                return Err(DumpError::MalformedRow {
                    table: table.to_string(),
                    row: index,
                    expected: raw.columns.len(),
                    actual: values.len(),
                });
            }
            let row = Row::new(&raw.columns, values);
            let mut converted = Vec::with_capacity(values.len());
            for ((column, value), key) in raw.columns.iter().zip(values).zip(&keys) {
                converted.push(match key {
                    Some(key) => {
                        let ctx = ConvertContext::new(table, column).with_row(row);
                        self.converters.convert(key, value.clone(), &ctx)?
                    }
                    None => value.clone(),
                });
            }
            rows.push(converted);
        }

        Ok(ResultSet::new(raw.columns.clone(), rows))
    }
}
