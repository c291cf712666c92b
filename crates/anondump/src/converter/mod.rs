//! Value converters applied to extracted columns.
//!
//! - [`Converter`]: transforms one value, optionally looking at the whole row
//! - [`ChainConverter`]: applies converters left to right
//! - [`ConverterRegistry`]: builds converters from configured identifiers
//! - [`ConverterService`]: maps column keys to converters and dispatches
//!
//! # Design Patterns
//!
//! - **Composite**: a chain is itself a converter
//! - **Factory**: the registry maps identifiers to constructor closures
//! - **Strategy**: a [`ConverterPolicy`] decides which keys get which converters

pub mod builtin;
pub mod registry;
pub mod service;
pub mod table;

pub use registry::{ConverterFactory, ConverterRegistry, Parameters};
pub use service::{ConverterPolicy, ConverterService};
pub use table::{converter_key, TableConverterPolicy};

use crate::core::result::Row;
use crate::core::value::SqlValue;
use crate::error::Result;

/// What a converter knows about the value it converts.
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'a> {
    /// Table the value was read from.
    pub table: &'a str,
    /// Column the value was read from.
    pub column: &'a str,
    /// The unconverted row, when converting row by row.
    pub row: Option<Row<'a>>,
}

impl<'a> ConvertContext<'a> {
    /// Context without row access.
    pub fn new(table: &'a str, column: &'a str) -> Self {
        Self {
            table,
            column,
            row: None,
        }
    }

    /// Attach the row being converted.
    pub fn with_row(mut self, row: Row<'a>) -> Self {
        self.row = Some(row);
        self
    }

    /// `table.column` key, as used in error messages.
    pub fn key(&self) -> String {
        converter_key(self.table, self.column)
    }
}

/// A value transformation.
///
/// Converters must not keep state between calls; the same instance converts
/// every row of a table.
pub trait Converter: Send + Sync {
    /// Transform a single value.
    fn convert(&self, value: SqlValue<'static>, ctx: &ConvertContext<'_>)
        -> Result<SqlValue<'static>>;
}

impl<F> Converter for F
where
    F: Fn(SqlValue<'static>, &ConvertContext<'_>) -> Result<SqlValue<'static>> + Send + Sync,
{
    fn convert(
        &self,
        value: SqlValue<'static>,
        ctx: &ConvertContext<'_>,
    ) -> Result<SqlValue<'static>> {
        self(value, ctx)
    }
}

/// Applies a sequence of converters, each one consuming the previous output.
#[derive(Default)]
pub struct ChainConverter {
    converters: Vec<Box<dyn Converter>>,
}

impl ChainConverter {
    /// Create an empty chain. An empty chain returns its input unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a converter to the end of the chain.
    pub fn add_converter(&mut self, converter: Box<dyn Converter>) {
        self.converters.push(converter);
    }

    /// Number of converters in the chain.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl Converter for ChainConverter {
    fn convert(
        &self,
        value: SqlValue<'static>,
        ctx: &ConvertContext<'_>,
    ) -> Result<SqlValue<'static>> {
        self.converters
            .iter()
            .try_fold(value, |value, converter| converter.convert(value, ctx))
    }
}

impl std::fmt::Debug for ChainConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConverter")
            .field("len", &self.converters.len())
            .finish()
    }
}
