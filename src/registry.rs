//! Plugin registry: identifier to factory lookup for checkers and providers.
//!
//! There is no runtime discovery. `PluginRegistry::with_builtins()` registers
//! the bundled plugins; library users register their own factories on top.

use std::collections::BTreeMap;
use std::path::Path;

use crate::arguments::Arguments;
use crate::checkers::{
    Checker, CodeClean, CompleteMediation, EconomyOfMechanism, LayeredArchitecture,
    LeastCommonMechanism, LeastPrivileges, SeparationOfPrivileges,
};
use crate::error::ConfigError;
use crate::providers::{CsvInput, Provider};

/// Namespace of the bundled plugins.
pub const NAMESPACE: &str = "dsmcheck";

/// Factory function type for creating checker instances from bound arguments.
pub type CheckerFactory = fn(&Arguments) -> Result<Box<dyn Checker>, ConfigError>;

/// Factory function type for creating provider instances.
///
/// The path is the directory relative file arguments resolve against.
pub type ProviderFactory = fn(&Arguments, &Path) -> Result<Box<dyn Provider>, ConfigError>;

/// Registered checker and provider factories.
#[derive(Default)]
pub struct PluginRegistry {
    checkers: BTreeMap<String, CheckerFactory>,
    providers: BTreeMap<String, ProviderFactory>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the seven bundled checkers and the CSV provider.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_checker(CodeClean::IDENTIFIER, |args| {
            Ok(Box::new(CodeClean::from_arguments(args)?))
        });
        registry.register_checker(CompleteMediation::IDENTIFIER, |args| {
            Ok(Box::new(CompleteMediation::from_arguments(args)?))
        });
        registry.register_checker(EconomyOfMechanism::IDENTIFIER, |args| {
            Ok(Box::new(EconomyOfMechanism::from_arguments(args)?))
        });
        registry.register_checker(LayeredArchitecture::IDENTIFIER, |args| {
            Ok(Box::new(LayeredArchitecture::from_arguments(args)?))
        });
        registry.register_checker(LeastCommonMechanism::IDENTIFIER, |args| {
            Ok(Box::new(LeastCommonMechanism::from_arguments(args)?))
        });
        registry.register_checker(LeastPrivileges::IDENTIFIER, |args| {
            Ok(Box::new(LeastPrivileges::from_arguments(args)?))
        });
        registry.register_checker(SeparationOfPrivileges::IDENTIFIER, |args| {
            Ok(Box::new(SeparationOfPrivileges::from_arguments(args)?))
        });
        registry.register_provider(CsvInput::IDENTIFIER, |args, base_dir| {
            Ok(Box::new(CsvInput::from_arguments(args, base_dir)?))
        });
        registry
    }

    /// Register a checker factory. Replaces any factory with the same identifier.
    pub fn register_checker(&mut self, identifier: &str, factory: CheckerFactory) {
        self.checkers.insert(identifier.to_string(), factory);
    }

    /// Register a provider factory. Replaces any factory with the same identifier.
    pub fn register_provider(&mut self, identifier: &str, factory: ProviderFactory) {
        self.providers.insert(identifier.to_string(), factory);
    }

    /// Fully qualified identifier of a checker, accepting bare bundled names.
    pub fn resolve_checker(&self, identifier: &str) -> Option<String> {
        resolve(&self.checkers, identifier)
    }

    /// Fully qualified identifier of a provider, accepting bare bundled names.
    pub fn resolve_provider(&self, identifier: &str) -> Option<String> {
        resolve(&self.providers, identifier)
    }

    /// Build a checker from its identifier and bound arguments.
    pub fn create_checker(
        &self,
        identifier: &str,
        arguments: &Arguments,
    ) -> Result<Box<dyn Checker>, ConfigError> {
        let resolved = self
            .resolve_checker(identifier)
            .ok_or_else(|| ConfigError::UnknownPlugin(identifier.to_string()))?;
        tracing::debug!("creating checker {}", resolved);
        (self.checkers[&resolved])(arguments)
    }

    /// Build a provider from its identifier and bound arguments.
    pub fn create_provider(
        &self,
        identifier: &str,
        arguments: &Arguments,
        base_dir: &Path,
    ) -> Result<Box<dyn Provider>, ConfigError> {
        let resolved = self
            .resolve_provider(identifier)
            .ok_or_else(|| ConfigError::UnknownPlugin(identifier.to_string()))?;
        tracing::debug!("creating provider {}", resolved);
        (self.providers[&resolved])(arguments, base_dir)
    }

    /// One default instance of every registered checker, sorted by identifier.
    pub fn checkers(&self) -> Result<Vec<Box<dyn Checker>>, ConfigError> {
        self.checkers
            .values()
            .map(|factory| factory(&Arguments::new()))
            .collect()
    }

    /// One default instance of every registered provider, sorted by identifier.
    pub fn providers(&self) -> Result<Vec<Box<dyn Provider>>, ConfigError> {
        self.providers
            .values()
            .map(|factory| factory(&Arguments::new(), Path::new("")))
            .collect()
    }
}

fn resolve<F>(table: &BTreeMap<String, F>, identifier: &str) -> Option<String> {
    if table.contains_key(identifier) {
        return Some(identifier.to_string());
    }
    if identifier.contains('.') {
        return None;
    }
    let qualified = format!("{}.{}", NAMESPACE, identifier);
    table.contains_key(&qualified).then_some(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let registry = PluginRegistry::with_builtins();
        let ids: Vec<&str> = registry
            .checkers()
            .unwrap()
            .iter()
            .map(|c| c.identifier())
            .collect();
        assert_eq!(
            ids,
            vec![
                "dsmcheck.CodeClean",
                "dsmcheck.CompleteMediation",
                "dsmcheck.EconomyOfMechanism",
                "dsmcheck.LayeredArchitecture",
                "dsmcheck.LeastCommonMechanism",
                "dsmcheck.LeastPrivileges",
                "dsmcheck.SeparationOfPrivileges",
            ]
        );
        assert_eq!(registry.providers().unwrap().len(), 1);
    }

    #[test]
    fn test_bare_names_resolve() {
        let registry = PluginRegistry::with_builtins();
        assert_eq!(
            registry.resolve_checker("CodeClean").as_deref(),
            Some("dsmcheck.CodeClean")
        );
        assert_eq!(
            registry.resolve_provider("CsvInput").as_deref(),
            Some("dsmcheck.CsvInput")
        );
        assert!(registry.resolve_checker("other.CodeClean").is_none());
    }

    #[test]
    fn test_unknown_plugin() {
        let registry = PluginRegistry::with_builtins();
        let err = registry
            .create_checker("dsmcheck.Nope", &Arguments::new())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::UnknownPlugin(ref id) if id == "dsmcheck.Nope"));
    }

    #[test]
    fn test_arguments_are_bound_at_creation() {
        let registry = PluginRegistry::with_builtins();
        let args: Arguments = serde_yaml::from_str("max_reported: 0").unwrap();
        assert!(registry.create_checker("CodeClean", &args).is_err());
        let args: Arguments = serde_yaml::from_str("unknown_option: 1").unwrap();
        assert!(registry.create_checker("CodeClean", &args).is_err());
    }
}
