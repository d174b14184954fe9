//! Typed plugin arguments.
//!
//! Configuration hands each plugin a YAML mapping of bound arguments. Every
//! plugin deserializes that mapping into its own typed argument struct when it
//! is constructed, so invalid arguments surface before any analysis runs.
//! `ArgumentSpec` describes the accepted options for help output.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::error::ConfigError;

/// Raw argument mapping as written in configuration.
pub type Arguments = Mapping;

/// Value type of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Integer,
    Float,
    Boolean,
    Text,
    TextList,
    Mapping,
}

impl ArgumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentKind::Integer => "int",
            ArgumentKind::Float => "float",
            ArgumentKind::Boolean => "bool",
            ArgumentKind::Text => "str",
            ArgumentKind::TextList => "list[str]",
            ArgumentKind::Mapping => "map[str, list[str]]",
        }
    }
}

impl std::fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One accepted option: name, type, default (as displayed) and description.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentSpec {
    pub name: &'static str,
    pub kind: ArgumentKind,
    pub default: &'static str,
    pub description: &'static str,
}

/// Deserialize a bound argument mapping into a plugin's typed arguments.
///
/// An empty mapping yields the defaults. Unknown keys and mistyped values are
/// reported as `ConfigError::InvalidArgument` naming the plugin.
pub fn bind<T>(identifier: &str, arguments: &Arguments) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if arguments.is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_value(Value::Mapping(arguments.clone()))
        .map_err(|e| ConfigError::argument(identifier, e.to_string()))
}
