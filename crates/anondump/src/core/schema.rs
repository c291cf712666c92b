//! Table metadata handed to the selector by the schema reflection layer.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::traits::Dialect;

/// Table metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Schema (namespace) name, if the table is qualified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Table name.
    pub name: String,

    /// Column definitions in ordinal order.
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Table {
    /// Create an unqualified table with no column metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Qualify the table with a schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Append a column definition.
    pub fn with_column(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let ordinal_pos = self.columns.len() as i32 + 1;
        self.columns.push(Column {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            ordinal_pos,
        });
        self
    }

    /// Get the fully qualified table name (unquoted, for logs and errors).
    pub fn full_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Quote the (optionally qualified) table name for the given dialect.
    pub fn quoted_name(&self, dialect: &dyn Dialect) -> Result<String> {
        let table = dialect.quote_ident(&self.name)?;
        match &self.schema {
            Some(schema) => Ok(format!("{}.{}", dialect.quote_ident(schema)?, table)),
            None => Ok(table),
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Data type as reported by the source (e.g., "int4", "varchar").
    pub data_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Ordinal position (1-based).
    pub ordinal_pos: i32,
}
