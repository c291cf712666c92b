//! # anondump
//!
//! Policy-driven row selection and value conversion for anonymized database
//! dumps.
//!
//! This library provides the parts of a dumper that decide *which* rows leave
//! the source database and *what* their values look like:
//!
//! - **Data selection** from a per-table policy of filters, limit and ordering,
//!   or a raw query override
//! - **Data dependent filters** that restrict a table to rows referencing
//!   values already dumped from another table
//! - **Converter chains** configured per column (hashing, static values,
//!   text rewriting, row-conditional replacement)
//!
//! Table ordering and output writing belong to the caller, which owns the
//! [`CollectedValues`] of a run and feeds tables in dependency order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use anondump::{CollectedValues, Config, ConverterRegistry, TableExtractor};
//! use anondump::drivers::PostgresExecutor;
//!
//! #[tokio::main]
//! async fn main() -> anondump::Result<()> {
//!     let config = Config::load("dump.yaml")?;
//!     let executor = Arc::new(PostgresExecutor::connect(&config.database).await?);
//!     let extractor =
//!         TableExtractor::from_config(&config, executor, ConverterRegistry::with_builtins())?;
//!
//!     let mut collected = CollectedValues::new();
//!     for policy in &config.tables {
//!         let table = config.table_for(policy);
//!         let extracted = extractor.extract(Some(policy), &table, &collected).await?;
//!         collected.merge(extracted.harvested);
//!         println!("{}: {} rows", table.full_name(), extracted.rows.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod converter;
pub mod core;
pub mod drivers;
pub mod error;
pub mod extract;
pub mod selector;

// Re-exports for convenient access
pub use config::{
    ColumnRef, Config, ConverterConfiguration, DatabaseConfig, Filter, FilterValue, Operator,
    TableConfiguration,
};
pub use converter::{
    ChainConverter, ConvertContext, Converter, ConverterPolicy, ConverterRegistry,
    ConverterService, TableConverterPolicy,
};
pub use crate::core::{Column, Dialect, QueryExecutor, ResultSet, Row, SqlNullType, SqlValue, Table};
pub use error::{DumpError, Result};
pub use extract::{ExtractedTable, TableExtractor};
pub use selector::{CollectedValues, DataSelector, SelectQuery};
