//! Converter construction by configured identifier.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::config::ConverterConfiguration;
use crate::error::{DumpError, Result};

use super::builtin;
use super::Converter;

/// Construction parameters of a converter, as written in configuration.
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// Builds a converter from its parameters.
pub type ConverterFactory = Box<dyn Fn(&Parameters) -> Result<Box<dyn Converter>> + Send + Sync>;

/// Maps converter identifiers to factories.
///
/// Unknown identifiers fail with [`DumpError::ConverterResolution`] when the
/// converters are built, before any row is read.
#[derive(Default)]
pub struct ConverterRegistry {
    factories: HashMap<String, ConverterFactory>,
}

impl ConverterRegistry {
    /// Create a registry without any converters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in converters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_builtins(&mut registry);
        registry
    }

    /// Register a factory. A later registration replaces an earlier one with
    /// the same identifier.
    pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Parameters) -> Result<Box<dyn Converter>> + Send + Sync + 'static,
    {
        self.factories.insert(identifier.into(), Box::new(factory));
        self
    }

    /// Whether an identifier is registered.
    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Build a converter from an identifier and its parameters.
    pub fn create(&self, identifier: &str, parameters: &Parameters) -> Result<Box<dyn Converter>> {
        let factory = self.factories.get(identifier).ok_or_else(|| {
            DumpError::resolution(
                identifier,
                format!(
                    "unknown converter, known converters are: {}",
                    self.identifiers().join(", ")
                ),
            )
        })?;
        factory(parameters)
    }

    /// Build a converter from its configuration.
    pub fn create_from_config(&self, conf: &ConverterConfiguration) -> Result<Box<dyn Converter>> {
        self.create(&conf.converter, &conf.parameters)
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConvertContext;
    use crate::core::value::SqlValue;

    #[test]
    fn test_unknown_identifier() {
        let registry = ConverterRegistry::with_builtins();
        let err = registry
            .create("Digilist\\FakerConverter", &Parameters::new())
            .err()
            .unwrap();
        match err {
            DumpError::ConverterResolution { identifier, message } => {
                assert_eq!(identifier, "Digilist\\FakerConverter");
                assert!(message.contains("hash"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_custom_factory_receives_parameters() {
        let mut registry = ConverterRegistry::new();
        registry.register("fixed", |params: &Parameters| {
            let value = params
                .get("value")
                .and_then(|v| v.as_str())
                .unwrap_or("none")
                .to_string();
            let converter: Box<dyn Converter> = Box::new(
                move |_: SqlValue<'static>, _: &ConvertContext<'_>| -> Result<SqlValue<'static>> {
                    Ok(SqlValue::text_owned(value.clone()))
                },
            );
            Ok(converter)
        });

        let conf = ConverterConfiguration::new("fixed").with_parameter("value", "X");
        let converter = registry.create_from_config(&conf).unwrap();
        let out = converter
            .convert(SqlValue::I32(1), &ConvertContext::new("t", "c"))
            .unwrap();
        assert_eq!(out.as_str(), Some("X"));
        assert!(registry.contains("fixed"));
        assert!(!registry.contains("hash"));
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = ConverterRegistry::with_builtins();
        for id in ["null", "static", "hash", "conditional", "truncate"] {
            assert!(registry.contains(id), "missing {id}");
        }
    }
}
