//! Converters declared per table column in the configuration.

use crate::config::TableConfiguration;
use crate::error::Result;

use super::service::{ConverterPolicy, ConverterService};

/// Key of a table column in the converter service.
pub fn converter_key(table: &str, column: &str) -> String {
    format!("{}.{}", table, column)
}

/// Registers the `converters` section of every table policy under
/// `table.column` keys.
#[derive(Debug, Clone, Copy)]
pub struct TableConverterPolicy<'a> {
    tables: &'a [TableConfiguration],
}

impl<'a> TableConverterPolicy<'a> {
    pub fn new(tables: &'a [TableConfiguration]) -> Self {
        Self { tables }
    }
}

impl ConverterPolicy for TableConverterPolicy<'_> {
    fn init_converters(&self, service: &mut ConverterService) -> Result<()> {
        for table in self.tables {
            for (column, confs) in &table.converters {
                service.add_converters_from_config(converter_key(&table.name, column), confs)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConverterConfiguration};
    use crate::converter::{ConvertContext, ConverterRegistry};
    use crate::core::value::SqlValue;

    #[test]
    fn test_keys_per_table_column() {
        let tables = vec![
            TableConfiguration::new("customers")
                .with_converter("email", ConverterConfiguration::new("lowercase"))
                .with_converter(
                    "email",
                    ConverterConfiguration::new("append").with_parameter("value", "!"),
                ),
            TableConfiguration::new("orders")
                .with_converter("note", ConverterConfiguration::new("null")),
            TableConfiguration::new("products"),
        ];

        let service = ConverterService::from_policy(
            &TableConverterPolicy::new(&tables),
            ConverterRegistry::with_builtins(),
        )
        .unwrap();

        assert_eq!(service.len(), 2);
        assert!(service.has_converter("customers.email"));
        assert!(service.has_converter("orders.note"));
        assert!(!service.has_converter("products.name"));

        let out = service
            .convert(
                "customers.email",
                SqlValue::text_owned("A@X"),
                &ConvertContext::new("customers", "email"),
            )
            .unwrap();
        assert_eq!(out.as_str(), Some("a@x!"));
    }

    #[test]
    fn test_from_yaml_config() {
        let yaml = r#"
database:
  host: localhost
  database: shop
  user: dumper
tables:
  - name: users
    converters:
      password:
        - converter: static
          parameters:
            value: "***"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let service = ConverterService::from_policy(
            &TableConverterPolicy::new(&config.tables),
            ConverterRegistry::with_builtins(),
        )
        .unwrap();
        let out = service
            .convert(
                &converter_key("users", "password"),
                SqlValue::text_owned("hunter2"),
                &ConvertContext::new("users", "password"),
            )
            .unwrap();
        assert_eq!(out.as_str(), Some("***"));
    }
}
