//! Column key to converter mapping.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::config::ConverterConfiguration;
use crate::core::value::SqlValue;
use crate::error::{DumpError, Result};

use super::registry::ConverterRegistry;
use super::{ChainConverter, ConvertContext, Converter};

/// Decides which keys get which converters.
///
/// Implementations read their own source of configuration and register
/// converters through [`ConverterService::add_converters_from_config`].
pub trait ConverterPolicy {
    /// Register this policy's converters on the service.
    fn init_converters(&self, service: &mut ConverterService) -> Result<()>;
}

/// Owns the key to converter mapping and dispatches conversions.
///
/// Each key has at most one converter. Several converters for one key are
/// composed into a [`ChainConverter`] and registered once.
pub struct ConverterService {
    converters: HashMap<String, Box<dyn Converter>>,
    registry: ConverterRegistry,
}

impl ConverterService {
    /// Create a service without converters.
    pub fn new(registry: ConverterRegistry) -> Self {
        Self {
            converters: HashMap::new(),
            registry,
        }
    }

    /// Create a service populated by a policy.
    pub fn from_policy(policy: &dyn ConverterPolicy, registry: ConverterRegistry) -> Result<Self> {
        let mut service = Self::new(registry);
        policy.init_converters(&mut service)?;
        debug!("Registered converters for {} keys", service.len());
        Ok(service)
    }

    /// Convert a value with the converter registered for `key`.
    ///
    /// Keys without a converter return the value unchanged.
    pub fn convert(
        &self,
        key: &str,
        value: SqlValue<'static>,
        ctx: &ConvertContext<'_>,
    ) -> Result<SqlValue<'static>> {
        match self.converters.get(key) {
            Some(converter) => converter.convert(value, ctx),
            None => Ok(value),
        }
    }

    /// Whether a converter is registered for `key`.
    pub fn has_converter(&self, key: &str) -> bool {
        self.converters.contains_key(key)
    }

    /// Number of keys with a converter.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Registry used to build configured converters.
    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Register a single converter under `key`.
    ///
    /// # Errors
    ///
    /// [`DumpError::DuplicateConverterKey`] if `key` already has a converter.
    /// Use [`add_converters_from_config`](Self::add_converters_from_config) to
    /// compose several converters for one key.
    pub fn add_converter(&mut self, key: impl Into<String>, converter: Box<dyn Converter>) -> Result<()> {
        let key = key.into();
        if self.converters.contains_key(&key) {
            return Err(DumpError::DuplicateConverterKey { key });
        }
        self.converters.insert(key, converter);
        Ok(())
    }

    /// Build the configured converters and register them as one chain.
    ///
    /// A single configuration is wrapped in a chain too. An empty list
    /// registers nothing. If any converter fails to build, nothing is
    /// registered for `key`.
    pub fn add_converters_from_config(
        &mut self,
        key: impl Into<String>,
        confs: &[ConverterConfiguration],
    ) -> Result<()> {
        if confs.is_empty() {
            return Ok(());
        }

        let mut chain = ChainConverter::new();
        for conf in confs {
            chain.add_converter(self.create_converter_instance(conf)?);
        }
        self.add_converter(key, Box::new(chain))
    }

    /// Build one converter from its configuration.
    pub fn create_converter_instance(&self, conf: &ConverterConfiguration) -> Result<Box<dyn Converter>> {
        self.registry.create_from_config(conf)
    }
}

impl fmt::Debug for ConverterService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.converters.keys().collect();
        keys.sort();
        f.debug_struct("ConverterService")
            .field("keys", &keys)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ConverterService {
        ConverterService::new(ConverterRegistry::with_builtins())
    }

    fn ctx() -> ConvertContext<'static> {
        ConvertContext::new("users", "email")
    }

    #[test]
    fn test_unknown_key_passes_through() {
        let service = service();
        for value in [
            SqlValue::I32(1),
            SqlValue::text_owned("a@x"),
            SqlValue::Null(crate::core::value::SqlNullType::Date),
        ] {
            assert_eq!(
                service.convert("users.email", value.clone(), &ctx()).unwrap(),
                value
            );
        }
    }

    #[test]
    fn test_chain_from_config_applies_in_order() {
        let mut service = service();
        service
            .add_converters_from_config(
                "users.email",
                &[
                    ConverterConfiguration::new("uppercase"),
                    ConverterConfiguration::new("append").with_parameter("value", "@x"),
                    ConverterConfiguration::new("replace")
                        .with_parameter("search", "X")
                        .with_parameter("replace", "y"),
                ],
            )
            .unwrap();

        let out = service
            .convert("users.email", SqlValue::text_owned("ax"), &ctx())
            .unwrap();
        // uppercase -> "AX", append -> "AX@x", replace X -> "Ay@x"
        assert_eq!(out.as_str(), Some("Ay@x"));
    }

    #[test]
    fn test_single_config_is_registered() {
        let mut service = service();
        service
            .add_converters_from_config("users.name", &[ConverterConfiguration::new("lowercase")])
            .unwrap();
        assert!(service.has_converter("users.name"));
        assert_eq!(
            service
                .convert("users.name", SqlValue::text_owned("ABC"), &ctx())
                .unwrap()
                .as_str(),
            Some("abc")
        );
    }

    #[test]
    fn test_empty_config_registers_nothing() {
        let mut service = service();
        service.add_converters_from_config("users.name", &[]).unwrap();
        assert!(!service.has_converter("users.name"));
        assert!(service.is_empty());
    }

    #[test]
    fn test_direct_double_registration_fails() {
        let mut service = service();
        let conf = ConverterConfiguration::new("null");
        let first = service.create_converter_instance(&conf).unwrap();
        let second = service.create_converter_instance(&conf).unwrap();

        service.add_converter("users.email", first).unwrap();
        let err = service.add_converter("users.email", second).unwrap_err();
        assert!(matches!(err, DumpError::DuplicateConverterKey { ref key } if key == "users.email"));
    }

    #[test]
    fn test_config_after_direct_registration_fails() {
        let mut service = service();
        let conf = ConverterConfiguration::new("null");
        let converter = service.create_converter_instance(&conf).unwrap();
        service.add_converter("users.email", converter).unwrap();
        assert!(service
            .add_converters_from_config("users.email", &[conf.clone(), conf])
            .is_err());
    }

    #[test]
    fn test_unknown_converter_registers_nothing() {
        let mut service = service();
        let err = service
            .add_converters_from_config(
                "users.email",
                &[
                    ConverterConfiguration::new("uppercase"),
                    ConverterConfiguration::new("faker"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, DumpError::ConverterResolution { .. }));
        assert!(!service.has_converter("users.email"));
    }

    struct FixedPolicy;

    impl ConverterPolicy for FixedPolicy {
        fn init_converters(&self, service: &mut ConverterService) -> Result<()> {
            service.add_converters_from_config("a.b", &[ConverterConfiguration::new("null")])
        }
    }

    #[test]
    fn test_from_policy() {
        let service =
            ConverterService::from_policy(&FixedPolicy, ConverterRegistry::with_builtins()).unwrap();
        assert!(service.has_converter("a.b"));
        assert_eq!(service.len(), 1);
    }
}
