//! Error types for the dump library.

use thiserror::Error;

/// Main error type for selection and conversion operations.
#[derive(Error, Debug)]
pub enum DumpError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A converter was registered directly under a key that already has one
    #[error("There is already a converter with key {key}. Provide a chain if there are multiple converters.")]
    DuplicateConverterKey { key: String },

    /// The query builder was invoked on a table that defines a raw query
    #[error("Table {table} defines a raw query; the select query cannot be built for it")]
    InvalidQueryBuilderUse { table: String },

    /// A data dependent filter references values that were never collected
    #[error("Table {table} depends on {referenced_table}.{referenced_column}, but {missing} has not been dumped before it")]
    UnresolvedDependency {
        table: String,
        referenced_table: String,
        referenced_column: String,
        missing: String,
    },

    /// A configured converter identifier could not be instantiated
    #[error("Cannot create converter '{identifier}': {message}")]
    ConverterResolution { identifier: String, message: String },

    /// A converter rejected the value it was given
    #[error("Conversion failed for {key}: {message}")]
    Converter { key: String, message: String },

    /// Source database query error
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// A column of a result row could not be read into a value
    #[cfg(feature = "postgres")]
    #[error("Cannot read column {column}: {source}")]
    Decode {
        column: String,
        source: tokio_postgres::Error,
    },

    /// A result row does not have one value per column
    #[error("Row {row} of {table} has {actual} values for {expected} columns")]
    MalformedRow {
        table: String,
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DumpError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl std::fmt::Display, context: impl Into<String>) -> Self {
        DumpError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a ConverterResolution error
    pub fn resolution(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        DumpError::ConverterResolution {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Create a Converter error
    pub fn converter(key: impl Into<String>, message: impl Into<String>) -> Self {
        DumpError::Converter {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_dependency_message_names_tables() {
        let err = DumpError::UnresolvedDependency {
            table: "orders".into(),
            referenced_table: "customers".into(),
            referenced_column: "id".into(),
            missing: "table customers".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("orders"));
        assert!(msg.contains("customers.id"));
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.yaml");
        let err = DumpError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error"));
    }

    #[test]
    fn test_malformed_row_message() {
        let err = DumpError::MalformedRow {
            table: "customers".into(),
            row: 3,
            expected: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Row 3 of customers has 1 values for 2 columns"
        );
    }
}
