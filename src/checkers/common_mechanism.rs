//! Least common mechanism: entities should not be shared across categories.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::arguments::{self, ArgumentKind, ArgumentSpec, Arguments};
use crate::error::{CheckerError, ConfigError};
use crate::roles::Role;

use super::{bounded_lines, empty_matrix, AnalysisContext, Checker, Verdict};

/// Arguments of `LeastCommonMechanism`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeastCommonMechanismArgs {
    pub max_shared_categories: usize,
    pub exempt_categories: Vec<String>,
    pub max_reported: usize,
}

impl Default for LeastCommonMechanismArgs {
    fn default() -> Self {
        Self {
            max_shared_categories: 1,
            exempt_categories: Vec::new(),
            max_reported: 20,
        }
    }
}

static ARGUMENTS: &[ArgumentSpec] = &[
    ArgumentSpec {
        name: "max_shared_categories",
        kind: ArgumentKind::Integer,
        default: "1",
        description: "Maximum number of distinct categories depending on one entity",
    },
    ArgumentSpec {
        name: "exempt_categories",
        kind: ArgumentKind::TextList,
        default: "[]",
        description: "Categories meant to be shared, besides mediators and libraries",
    },
    ArgumentSpec {
        name: "max_reported",
        kind: ArgumentKind::Integer,
        default: "20",
        description: "Maximum number of shared entities listed in the message",
    },
];

/// Checks that entities are not depended upon by too many categories.
#[derive(Debug, Clone, Default)]
pub struct LeastCommonMechanism {
    args: LeastCommonMechanismArgs,
}

impl LeastCommonMechanism {
    pub const IDENTIFIER: &'static str = "dsmcheck.LeastCommonMechanism";

    pub fn new(args: LeastCommonMechanismArgs) -> Self {
        Self { args }
    }

    pub fn from_arguments(arguments: &Arguments) -> Result<Self, ConfigError> {
        let args: LeastCommonMechanismArgs = arguments::bind(Self::IDENTIFIER, arguments)?;
        if args.max_shared_categories == 0 {
            return Err(ConfigError::argument(
                Self::IDENTIFIER,
                "max_shared_categories must be at least 1",
            ));
        }
        if args.max_reported == 0 {
            return Err(ConfigError::argument(
                Self::IDENTIFIER,
                "max_reported must be at least 1",
            ));
        }
        Ok(Self::new(args))
    }

    fn is_exempt(&self, ctx: &AnalysisContext, j: usize) -> bool {
        let category = ctx.matrix().category(j);
        ctx.roles().has(category, Role::Mediator)
            || ctx.roles().has(category, Role::Library)
            || category.is_some_and(|c| self.args.exempt_categories.iter().any(|e| e == c))
    }
}

impl Checker for LeastCommonMechanism {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &'static str {
        "Least Common Mechanism"
    }

    fn description(&self) -> &'static str {
        "Minimize the amount of mechanism common to more than one user and \
         depended on by all users. Every shared mechanism is a potential \
         information path between users."
    }

    fn hint(&self) -> &'static str {
        "Give each category its own instance of the shared entity, or declare \
         it as a mediator or library if sharing is intended."
    }

    fn arguments(&self) -> &'static [ArgumentSpec] {
        ARGUMENTS
    }

    fn check(&self, ctx: &AnalysisContext) -> Result<Verdict, CheckerError> {
        if let Some(verdict) = empty_matrix(Self::IDENTIFIER, ctx) {
            return Ok(verdict);
        }
        let matrix = ctx.matrix();
        if !matrix.has_categories() {
            return Ok(Verdict::not_applicable(
                Self::IDENTIFIER,
                "matrix has no categories",
            ));
        }

        let graph = ctx.graph();
        let mut violations = Vec::new();
        for j in 0..matrix.size() {
            if self.is_exempt(ctx, j) {
                continue;
            }
            let sources: BTreeSet<String> = graph
                .predecessors(j)
                .iter()
                .map(|&i| ctx.category_label(i))
                .collect();
            if sources.len() <= self.args.max_shared_categories {
                continue;
            }
            let names: Vec<String> = sources.into_iter().collect();
            violations.push(format!(
                "{} is used by {} categories (maximum {}): {}",
                matrix.entity(j),
                names.len(),
                self.args.max_shared_categories,
                names.join(", ")
            ));
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
