//! Centralized identifier validation and quoting.
//!
//! SQL identifiers (table names, column names, schema names) cannot be passed as
//! parameters in prepared statements - only data values can be parameterized.
//! Every identifier that ends up in generated SQL is therefore validated and
//! quoted here, with database-specific escaping.
//!
//! Raw `ORDER BY` fragments from table policies are the one place where
//! configuration text is spliced into a generated query; they are checked by
//! [`validate_order_by`] before use.

use crate::error::{DumpError, Result};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier for security issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes (injection vector)
/// - Identifiers exceeding maximum length
///
/// # Errors
///
/// Returns `DumpError::Config` for invalid identifiers with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DumpError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(DumpError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(DumpError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote a PostgreSQL identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// ```ignore
/// assert_eq!(quote_pg("users")?, "\"users\"");
/// assert_eq!(quote_pg("table\"name")?, "\"table\"\"name\"");
/// ```
pub fn quote_pg(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a MySQL identifier using backticks.
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Quote a SQL Server identifier using brackets.
pub fn quote_mssql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("[{}]", name.replace(']', "]]")))
}

/// Validate a raw ORDER BY fragment taken from a table policy.
///
/// The fragment is spliced into the query as-is, so anything that could end
/// the statement or hide the rest of it is rejected:
///
/// - Semicolons (multiple statement injection)
/// - SQL comments (`--`, `/*`, `*/`)
/// - Null bytes
///
/// ```ignore
/// validate_order_by("created_at DESC, id")?;
/// validate_order_by("id; DROP TABLE users").is_err();
/// ```
pub fn validate_order_by(clause: &str) -> Result<()> {
    if clause.trim().is_empty() {
        return Err(DumpError::Config("ORDER BY clause cannot be empty".into()));
    }

    if clause.contains(';') || clause.contains('\0') {
        return Err(DumpError::Config(format!(
            "SECURITY: ORDER BY clause contains a statement separator (possible injection): {:?}",
            clause
        )));
    }

    if clause.contains("--") || clause.contains("/*") || clause.contains("*/") {
        return Err(DumpError::Config(format!(
            "SECURITY: ORDER BY clause contains SQL comment markers (possible injection): {:?}",
            clause
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("my_table").is_ok());
        assert!(validate_identifier("column with spaces").is_ok());
        assert!(validate_identifier("日本語").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let result = validate_identifier("");
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let result = validate_identifier("table\0name");
        assert!(result.unwrap_err().to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_rejects_too_long() {
        let long_name = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        let result = validate_identifier(&long_name);
        assert!(result.unwrap_err().to_string().contains("maximum length"));
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
    }

    // =========================================================================
    // Quoting tests
    // =========================================================================

    #[test]
    fn test_quote_pg() {
        assert_eq!(quote_pg("users").unwrap(), "\"users\"");
        assert_eq!(quote_pg("table\"name").unwrap(), "\"table\"\"name\"");
        assert_eq!(
            quote_pg("Robert'); DROP TABLE Students;--").unwrap(),
            "\"Robert'); DROP TABLE Students;--\""
        );
    }

    #[test]
    fn test_quote_mysql() {
        assert_eq!(quote_mysql("users").unwrap(), "`users`");
        assert_eq!(quote_mysql("table`name").unwrap(), "`table``name`");
    }

    #[test]
    fn test_quote_mssql() {
        assert_eq!(quote_mssql("users").unwrap(), "[users]");
        assert_eq!(quote_mssql("table]name").unwrap(), "[table]]name]");
    }

    #[test]
    fn test_quote_rejects_invalid() {
        assert!(quote_pg("").is_err());
        assert!(quote_mysql("a\0b").is_err());
        assert!(quote_mssql("").is_err());
    }

    // =========================================================================
    // ORDER BY validation tests
    // =========================================================================

    #[test]
    fn test_order_by_valid() {
        assert!(validate_order_by("id").is_ok());
        assert!(validate_order_by("created_at DESC, id ASC").is_ok());
        assert!(validate_order_by("LOWER(name)").is_ok());
    }

    #[test]
    fn test_order_by_rejects_semicolon() {
        let result = validate_order_by("id; DROP TABLE users");
        assert!(result.unwrap_err().to_string().contains("separator"));
    }

    #[test]
    fn test_order_by_rejects_comments() {
        assert!(validate_order_by("id -- trailing").is_err());
        assert!(validate_order_by("id /* x */").is_err());
    }

    #[test]
    fn test_order_by_rejects_blank() {
        assert!(validate_order_by("   ").is_err());
    }
}
