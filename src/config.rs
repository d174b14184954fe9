//! Configuration schema definitions.
//!
//! A configuration file lists analyzers. Each analyzer names its providers
//! and checkers (by identifier, optionally with arguments) and may override
//! the category roles and layer order checkers use.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::analyzer::{Analysis, Analyzer};
use crate::arguments::Arguments;
use crate::checkers::{
    BoundChecker, CompleteMediation, EconomyOfMechanism, LayeredArchitecture,
    LeastCommonMechanism,
};
use crate::error::ConfigError;
use crate::providers::CsvInput;
use crate::registry::PluginRegistry;
use crate::roles::{Role, RoleMap};

/// Configuration file names, in lookup order.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "dsmcheck.yml",
    "dsmcheck.yaml",
    ".dsmcheck.yml",
    ".dsmcheck.yaml",
];

/// File in the working directory naming the folder holding the configuration.
pub const FOLDER_POINTER: &str = ".dsmcheckrc";

lazy_static! {
    /// Dotted plugin identifier, e.g. `dsmcheck.CodeClean` or `CodeClean`.
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap();
}

/// Root configuration document.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub analyzers: Vec<AnalyzerConfig>,
}

/// One analyzer group.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Category glob pattern to roles. Replaces the built-in roles when set.
    #[serde(default)]
    pub roles: Option<BTreeMap<String, Vec<Role>>>,
    /// Layer labels, lowest first.
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(default)]
    pub providers: Vec<PluginRef>,
    #[serde(default)]
    pub checkers: Vec<PluginRef>,
}

/// A plugin given either as a bare identifier or as a full mapping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PluginRef {
    Id(String),
    Spec(PluginSpec),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginSpec {
    pub id: String,
    /// Display name overriding the plugin's own.
    #[serde(default)]
    pub name: Option<String>,
    /// Record failures without failing the overall result (checkers only).
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub arguments: Arguments,
}

impl PluginRef {
    pub fn id(&self) -> &str {
        match self {
            PluginRef::Id(id) => id,
            PluginRef::Spec(spec) => &spec.id,
        }
    }

    pub fn to_spec(&self) -> PluginSpec {
        match self {
            PluginRef::Id(id) => PluginSpec {
                id: id.clone(),
                name: None,
                ignore: false,
                arguments: Arguments::new(),
            },
            PluginRef::Spec(spec) => spec.clone(),
        }
    }
}

impl Config {
    /// Parse a configuration file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.display().to_string(),
            error,
        })?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Configuration used when no file is found: the CSV provider (reading
    /// `input`, or standard input) with the conventional checkers.
    pub fn default_for_input(input: Option<&Path>) -> Self {
        let mut csv_arguments = Arguments::new();
        if let Some(path) = input {
            csv_arguments.insert(
                Value::from("file_path"),
                Value::from(path.to_string_lossy().to_string()),
            );
        }

        let mut economy_arguments = Arguments::new();
        economy_arguments.insert(
            Value::from("exclude_categories"),
            Value::Sequence(vec![Value::from("framework"), Value::from("corelib")]),
        );

        Config {
            version: "1".to_string(),
            analyzers: vec![AnalyzerConfig {
                name: "default".to_string(),
                description: None,
                roles: None,
                layers: Vec::new(),
                providers: vec![PluginRef::Spec(PluginSpec {
                    id: CsvInput::IDENTIFIER.to_string(),
                    name: None,
                    ignore: false,
                    arguments: csv_arguments,
                })],
                checkers: vec![
                    PluginRef::Id(CompleteMediation::IDENTIFIER.to_string()),
                    PluginRef::Spec(PluginSpec {
                        id: EconomyOfMechanism::IDENTIFIER.to_string(),
                        name: None,
                        ignore: false,
                        arguments: economy_arguments,
                    }),
                    PluginRef::Id(LeastCommonMechanism::IDENTIFIER.to_string()),
                    PluginRef::Id(LayeredArchitecture::IDENTIFIER.to_string()),
                ],
            }],
        }
    }
}

/// Find a configuration file starting from `dir`.
///
/// The folder searched is the one named in `dir/.dsmcheckrc` when present,
/// else `dir/config` when it exists, else `dir` itself.
pub fn discover_in(dir: &Path) -> Option<PathBuf> {
    let pointer = dir.join(FOLDER_POINTER);
    let config_dir = if pointer.is_file() {
        match fs::read_to_string(&pointer) {
            Ok(content) => dir.join(content.trim()),
            Err(e) => {
                tracing::warn!("cannot read {}: {}", pointer.display(), e);
                dir.to_path_buf()
            }
        }
    } else if dir.join("config").is_dir() {
        dir.join("config")
    } else {
        dir.to_path_buf()
    };
    tracing::debug!("config folder = {}", config_dir.display());
    find_named(&config_dir)
}

/// Find a configuration file from the working directory, then the user
/// configuration directory.
pub fn discover() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    discover_in(&cwd).or_else(|| user_config_dir().and_then(|dir| find_named(&dir)))
}

fn find_named(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES.iter().map(|name| dir.join(name)).find(|path| {
        tracing::debug!("searching for config file at {}", path.display());
        path.is_file()
    })
}

/// Per-user configuration directory.
fn user_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dsmcheck").map(|d| d.config_dir().to_path_buf())
}

/// Validate a configuration against the registered plugins.
pub fn validate(config: &Config, registry: &PluginRegistry) -> Result<(), ConfigError> {
    if config.analyzers.is_empty() {
        return Err(ConfigError::Invalid("no analyzers configured".to_string()));
    }

    let mut names = std::collections::HashSet::new();
    for analyzer in &config.analyzers {
        if analyzer.name.trim().is_empty() {
            return Err(ConfigError::Invalid("analyzer without a name".to_string()));
        }
        if !names.insert(analyzer.name.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "analyzer {:?} is defined twice",
                analyzer.name
            )));
        }
        if analyzer.providers.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "analyzer {:?} has no providers",
                analyzer.name
            )));
        }
        if analyzer.checkers.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "analyzer {:?} has no checkers",
                analyzer.name
            )));
        }

        for provider in &analyzer.providers {
            check_identifier(provider.id())?;
            if registry.resolve_provider(provider.id()).is_none() {
                return Err(ConfigError::UnknownPlugin(provider.id().to_string()));
            }
            if let PluginRef::Spec(spec) = provider {
                if spec.name.is_some() || spec.ignore {
                    return Err(ConfigError::Invalid(format!(
                        "provider {:?}: name and ignore apply to checkers only",
                        spec.id
                    )));
                }
            }
        }
        for checker in &analyzer.checkers {
            check_identifier(checker.id())?;
            if registry.resolve_checker(checker.id()).is_none() {
                return Err(ConfigError::UnknownPlugin(checker.id().to_string()));
            }
        }
    }

    Ok(())
}

fn check_identifier(id: &str) -> Result<(), ConfigError> {
    if IDENTIFIER.is_match(id) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("malformed plugin identifier {:?}", id)))
    }
}

/// Validate a configuration and build the analyzers it describes.
///
/// Relative provider paths resolve against `base_dir`.
pub fn build(
    config: &Config,
    registry: &PluginRegistry,
    base_dir: &Path,
) -> Result<Analysis, ConfigError> {
    validate(config, registry)?;

    let mut analysis = Analysis::new();
    for group in &config.analyzers {
        let roles = match &group.roles {
            Some(roles) => RoleMap::new(roles, group.layers.clone())?,
            None => RoleMap::builtin().with_layers(group.layers.clone()),
        };

        let mut analyzer = Analyzer::new(group.name.clone()).with_roles(roles);
        if let Some(description) = &group.description {
            analyzer = analyzer.with_description(description.clone());
        }

        for plugin in &group.providers {
            let spec = plugin.to_spec();
            analyzer.add_provider(registry.create_provider(&spec.id, &spec.arguments, base_dir)?);
        }
        for plugin in &group.checkers {
            let spec = plugin.to_spec();
            let mut bound = BoundChecker::new(registry.create_checker(&spec.id, &spec.arguments)?)
                .ignored(spec.ignore);
            if let Some(name) = spec.name {
                bound = bound.named(name);
            }
            analyzer.add_checker(bound);
        }

        tracing::debug!(
            "built analyzer {} ({} providers, {} checkers)",
            analyzer.name(),
            analyzer.providers().len(),
            analyzer.checkers().len()
        );
        analysis.add(analyzer);
    }
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version: "1"
analyzers:
  - name: webapp
    roles:
      broker: [mediator]
      "app*": [subject]
      data: [resource, protected]
    layers: [framework, corelib, applib, data, broker, appmodule]
    providers:
      - id: dsmcheck.CsvInput
        arguments: { file_path: webapp.csv }
    checkers:
      - dsmcheck.CodeClean
      - id: LayeredArchitecture
        name: Layers
        ignore: true
        arguments: { max_reported: 5 }
"#;

    #[test]
    fn test_parse_config() {
        let config = Config::parse_str(SAMPLE).unwrap();
        assert_eq!(config.version, "1");
        assert_eq!(config.analyzers.len(), 1);
        let group = &config.analyzers[0];
        assert_eq!(group.layers.len(), 6);
        assert_eq!(group.checkers[0].id(), "dsmcheck.CodeClean");
        let spec = group.checkers[1].to_spec();
        assert_eq!(spec.name.as_deref(), Some("Layers"));
        assert!(spec.ignore);
        assert_eq!(spec.arguments.len(), 1);
    }

    #[test]
    fn test_build_config() {
        let config = Config::parse_str(SAMPLE).unwrap();
        let registry = PluginRegistry::with_builtins();
        let analysis = build(&config, &registry, Path::new("/data")).unwrap();
        let analyzer = &analysis.analyzers()[0];
        assert_eq!(analyzer.providers()[0].source(), "/data/webapp.csv");
        assert_eq!(analyzer.checkers()[1].display_name(), "Layers");
        assert!(analyzer.checkers()[1].is_ignored());
        assert_eq!(analyzer.checkers()[1].identifier(), "dsmcheck.LayeredArchitecture");
    }

    #[test]
    fn test_unknown_checker_rejected() {
        let config = Config::parse_str(
            "analyzers:\n  - name: a\n    providers: [CsvInput]\n    checkers: [NoSuchChecker]\n",
        )
        .unwrap();
        let err = validate(&config, &PluginRegistry::with_builtins()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlugin(ref id) if id == "NoSuchChecker"));
    }

    #[test]
    fn test_malformed_identifier_rejected() {
        let config = Config::parse_str(
            "analyzers:\n  - name: a\n    providers: [CsvInput]\n    checkers: ['bad id!']\n",
        )
        .unwrap();
        let err = validate(&config, &PluginRegistry::with_builtins()).unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn test_checker_only_fields_rejected_on_providers() {
        for field in ["name: input", "ignore: true"] {
            let config = Config::parse_str(&format!(
                "analyzers:\n  - name: a\n    providers:\n      - id: CsvInput\n        {}\n    checkers: [CodeClean]\n",
                field
            ))
            .unwrap();
            let err = validate(&config, &PluginRegistry::with_builtins()).unwrap_err();
            assert!(err.to_string().contains("checkers only"), "{}", err);
        }
    }

    #[test]
    fn test_empty_analyzers_rejected() {
        let config = Config::parse_str("version: '1'\n").unwrap();
        assert!(validate(&config, &PluginRegistry::with_builtins()).is_err());

        let config =
            Config::parse_str("analyzers:\n  - name: a\n    providers: [CsvInput]\n").unwrap();
        assert!(validate(&config, &PluginRegistry::with_builtins()).is_err());
    }

    #[test]
    fn test_invalid_arguments_rejected_at_build() {
        let config = Config::parse_str(
            "analyzers:\n  - name: a\n    providers: [CsvInput]\n    checkers:\n      - id: CodeClean\n        arguments: { max_reported: -1 }\n",
        )
        .unwrap();
        let err = build(&config, &PluginRegistry::with_builtins(), Path::new("")).err();
        assert!(matches!(err, Some(ConfigError::InvalidArgument { .. })));
    }

    #[test]
    fn test_unknown_analyzer_key_rejected() {
        assert!(Config::parse_str("analyzers:\n  - name: a\n    checks: []\n").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_for_input(Some(Path::new("matrix.csv")));
        let analysis = build(&config, &PluginRegistry::with_builtins(), Path::new("")).unwrap();
        let analyzer = &analysis.analyzers()[0];
        assert_eq!(analyzer.providers()[0].source(), "matrix.csv");
        let ids: Vec<&str> = analyzer.checkers().iter().map(|c| c.identifier()).collect();
        assert_eq!(
            ids,
            vec![
                "dsmcheck.CompleteMediation",
                "dsmcheck.EconomyOfMechanism",
                "dsmcheck.LeastCommonMechanism",
                "dsmcheck.LayeredArchitecture",
            ]
        );
    }

    #[test]
    fn test_discover_order() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_in(dir.path()).is_none());

        fs::write(dir.path().join(".dsmcheck.yaml"), "analyzers: []\n").unwrap();
        assert_eq!(
            discover_in(dir.path()),
            Some(dir.path().join(".dsmcheck.yaml"))
        );

        fs::write(dir.path().join("dsmcheck.yml"), "analyzers: []\n").unwrap();
        assert_eq!(discover_in(dir.path()), Some(dir.path().join("dsmcheck.yml")));

        // a config/ folder takes precedence over the working directory
        fs::create_dir(dir.path().join("config")).unwrap();
        assert!(discover_in(dir.path()).is_none());
        fs::write(dir.path().join("config").join("dsmcheck.yaml"), "").unwrap();
        assert_eq!(
            discover_in(dir.path()),
            Some(dir.path().join("config").join("dsmcheck.yaml"))
        );

        // the pointer file takes precedence over config/
        fs::create_dir(dir.path().join("ci")).unwrap();
        fs::write(dir.path().join("ci").join("dsmcheck.yml"), "").unwrap();
        fs::write(dir.path().join(FOLDER_POINTER), "ci\n").unwrap();
        assert_eq!(
            discover_in(dir.path()),
            Some(dir.path().join("ci").join("dsmcheck.yml"))
        );
    }
}
