//! Configuration validation.

use std::collections::HashSet;

use super::{Config, TableConfiguration};
use crate::core::identifier::{validate_identifier, validate_order_by};
use crate::drivers::DialectImpl;
use crate::error::{DumpError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Database validation
    if config.database.host.is_empty() {
        return Err(DumpError::Config("database.host is required".into()));
    }
    if config.database.database.is_empty() {
        return Err(DumpError::Config("database.database is required".into()));
    }
    if config.database.user.is_empty() {
        return Err(DumpError::Config("database.user is required".into()));
    }
    DialectImpl::from_db_type(&config.database.r#type)?;
    if let Some(schema) = &config.database.schema {
        validate_identifier(schema)
            .map_err(|e| DumpError::Config(format!("database.schema: {}", e)))?;
    }

    let mut seen = HashSet::new();
    for table in &config.tables {
        if !seen.insert(table.name.as_str()) {
            return Err(DumpError::Config(format!(
                "table '{}' is configured more than once",
                table.name
            )));
        }
        validate_table(table)?;
    }

    Ok(())
}

/// Validate a single table policy.
pub fn validate_table(table: &TableConfiguration) -> Result<()> {
    validate_identifier(&table.name)
        .map_err(|e| DumpError::Config(format!("tables[].name: {}", e)))?;

    if let Some(query) = &table.query {
        if query.trim().is_empty() {
            return Err(DumpError::Config(format!(
                "tables.{}.query cannot be empty",
                table.name
            )));
        }
        if !table.filters.is_empty() || table.limit.is_some() || table.order_by.is_some() {
            return Err(DumpError::Config(format!(
                "tables.{}: 'query' cannot be combined with filters, limit or order_by",
                table.name
            )));
        }
    }

    if let Some(0) = table.limit {
        return Err(DumpError::Config(format!(
            "tables.{}.limit must be at least 1",
            table.name
        )));
    }

    if let Some(order_by) = &table.order_by {
        validate_order_by(order_by)?;
    }

    for filter in &table.filters {
        validate_identifier(&filter.column)?;
        if let Some(reference) = filter.referenced_column() {
            validate_identifier(&reference.table)?;
            validate_identifier(&reference.column)?;
            if reference.table == table.name {
                return Err(DumpError::Config(format!(
                    "tables.{}: filter on '{}' cannot depend on its own table",
                    table.name, filter.column
                )));
            }
        }
    }

    for (column, converters) in &table.converters {
        for conf in converters {
            if conf.converter.trim().is_empty() {
                return Err(DumpError::Config(format!(
                    "tables.{}.converters.{}: converter identifier is required",
                    table.name, column
                )));
            }
        }
    }

    Ok(())
}
