//! Layered architecture: entities may only depend on entities in the same or
//! lower layers.

use std::collections::HashMap;

use serde::Deserialize;

use crate::arguments::{self, ArgumentKind, ArgumentSpec, Arguments};
use crate::error::{CheckerError, ConfigError};

use super::{bounded_lines, empty_matrix, AnalysisContext, Checker, Verdict};

/// Arguments of `LayeredArchitecture`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayeredArchitectureArgs {
    /// Layer labels, lowest layer first.
    pub layer_categories: Option<Vec<String>>,
    /// Whether two entities of the same layer may depend on each other.
    pub allow_same_layer: bool,
    pub max_reported: usize,
}

impl Default for LayeredArchitectureArgs {
    fn default() -> Self {
        Self {
            layer_categories: None,
            allow_same_layer: true,
            max_reported: 20,
        }
    }
}

static ARGUMENTS: &[ArgumentSpec] = &[
    ArgumentSpec {
        name: "layer_categories",
        kind: ArgumentKind::TextList,
        default: "configured layers, else order of first appearance",
        description: "Layer labels ordered from the lowest layer to the highest",
    },
    ArgumentSpec {
        name: "allow_same_layer",
        kind: ArgumentKind::Boolean,
        default: "true",
        description: "Allow dependencies between entities of the same layer",
    },
    ArgumentSpec {
        name: "max_reported",
        kind: ArgumentKind::Integer,
        default: "20",
        description: "Maximum number of violations listed in the message",
    },
];

/// Checks that dependencies only point to the same or lower layers.
#[derive(Debug, Clone, Default)]
pub struct LayeredArchitecture {
    args: LayeredArchitectureArgs,
}

impl LayeredArchitecture {
    pub const IDENTIFIER: &'static str = "dsmcheck.LayeredArchitecture";

    pub fn new(args: LayeredArchitectureArgs) -> Self {
        Self { args }
    }

    pub fn from_arguments(arguments: &Arguments) -> Result<Self, ConfigError> {
        let args: LayeredArchitectureArgs = arguments::bind(Self::IDENTIFIER, arguments)?;
        if let Some(layers) = &args.layer_categories {
            let mut seen = std::collections::HashSet::new();
            for layer in layers {
                if !seen.insert(layer.as_str()) {
                    return Err(ConfigError::argument(
                        Self::IDENTIFIER,
                        format!("layer {:?} is listed twice", layer),
                    ));
                }
            }
        }
        if args.max_reported == 0 {
            return Err(ConfigError::argument(
                Self::IDENTIFIER,
                "max_reported must be at least 1",
            ));
        }
        Ok(Self::new(args))
    }

    /// Rank of every entity. Undeclared layers get singleton ranks after the
    /// declared ones, in entity order.
    fn ranks(&self, ctx: &AnalysisContext) -> Vec<usize> {
        let matrix = ctx.matrix();
        let declared: Vec<&str> = match &self.args.layer_categories {
            Some(layers) => layers.iter().map(String::as_str).collect(),
            None if !ctx.roles().layers().is_empty() => {
                ctx.roles().layers().iter().map(String::as_str).collect()
            }
            None => matrix.category_order(),
        };
        let rank_of: HashMap<&str, usize> =
            declared.iter().enumerate().map(|(r, l)| (*l, r)).collect();

        let mut next = declared.len();
        (0..matrix.size())
            .map(|i| match matrix.category(i).and_then(|c| rank_of.get(c)) {
                Some(&rank) => rank,
                None => {
                    next += 1;
                    next - 1
                }
            })
            .collect()
    }

    fn layer_label(ctx: &AnalysisContext, i: usize) -> String {
        ctx.matrix()
            .category(i)
            .map(str::to_string)
            .unwrap_or_else(|| "uncategorized".to_string())
    }
}

impl Checker for LayeredArchitecture {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &'static str {
        "Layered Architecture"
    }

    fn description(&self) -> &'static str {
        "Entities are grouped in ordered layers. An entity may depend on \
         entities of its own layer or of lower layers, never on a higher layer."
    }

    fn hint(&self) -> &'static str {
        "Ensure that your applications are listed after your libraries and \
         that dependencies point downwards. Move shared code to a lower layer \
         or invert the dependency."
    }

    fn arguments(&self) -> &'static [ArgumentSpec] {
        ARGUMENTS
    }

    fn check(&self, ctx: &AnalysisContext) -> Result<Verdict, CheckerError> {
        if let Some(verdict) = empty_matrix(Self::IDENTIFIER, ctx) {
            return Ok(verdict);
        }

        let matrix = ctx.matrix();
        let graph = ctx.graph();
        let ranks = self.ranks(ctx);

        let mut violations = Vec::new();
        for i in 0..matrix.size() {
            for &j in graph.successors(i) {
                let upward = ranks[i] < ranks[j];
                let sideways = !self.args.allow_same_layer && ranks[i] == ranks[j];
                if !(upward || sideways) {
                    continue;
                }
                violations.push(format!(
                    "{} ({}) depends on {} ({}) with weight {}: {}",
                    matrix.entity(i),
                    Self::layer_label(ctx, i),
                    matrix.entity(j),
                    Self::layer_label(ctx, j),
                    matrix.weight(i, j),
                    if upward {
                        "dependency on a higher layer"
                    } else {
                        "dependency inside the same layer"
                    }
                ));
            }
        }

        if violations.is_empty() {
            return Ok(Verdict::passed(Self::IDENTIFIER));
        }
        Ok(Verdict::failed(
            Self::IDENTIFIER,
            bounded_lines(&violations, self.args.max_reported),
        ))
    }
}
