//! Code clean: no circular dependencies.

use serde::Deserialize;

use crate::arguments::{self, ArgumentKind, ArgumentSpec, Arguments};
use crate::error::{CheckerError, ConfigError};

use super::{bounded_lines, empty_matrix, AnalysisContext, Checker, Verdict};

/// Arguments of `CodeClean`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodeCleanArgs {
    pub max_reported: usize,
}

impl Default for CodeCleanArgs {
    fn default() -> Self {
        Self { max_reported: 20 }
    }
}

static ARGUMENTS: &[ArgumentSpec] = &[ArgumentSpec {
    name: "max_reported",
    kind: ArgumentKind::Integer,
    default: "20",
    description: "Maximum number of cycles listed in the message",
}];

/// Checks that the dependency graph is acyclic.
#[derive(Debug, Clone, Default)]
pub struct CodeClean {
    args: CodeCleanArgs,
}

impl CodeClean {
    pub const IDENTIFIER: &'static str = "dsmcheck.CodeClean";

    pub fn new(args: CodeCleanArgs) -> Self {
        Self { args }
    }

    pub fn from_arguments(arguments: &Arguments) -> Result<Self, ConfigError> {
        let args: CodeCleanArgs = arguments::bind(Self::IDENTIFIER, arguments)?;
        if args.max_reported == 0 {
            return Err(ConfigError::argument(
                Self::IDENTIFIER,
                "max_reported must be at least 1",
            ));
        }
        Ok(Self::new(args))
    }
}

impl Checker for CodeClean {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &'static str {
        "Code Clean"
    }

    fn description(&self) -> &'static str {
        "Entities must not depend on each other in circles. Every group of \
         mutually dependent entities is reported with one cycle through it."
    }

    fn hint(&self) -> &'static str {
        "Break each cycle by removing a dependency, extracting the shared part \
         into a new entity, or inverting a dependency through an interface."
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

        let cycles: Vec<String> = graph
            .cyclic_components()
            .iter()
            .map(|component| {
                let members: Vec<&str> = component.iter().map(|&i| matrix.entity(i)).collect();
                let path: Vec<&str> = graph
                    .witness_cycle(component)
                    .into_iter()
                    .map(|i| matrix.entity(i))
                    .collect();
                format!(
                    "circular dependency among {{{}}}: {}",
                    members.join(", "),
                    path.join(" -> ")
                )
            })
            .collect();

        if cycles.is_empty() {
            return Ok(Verdict::passed(Self::IDENTIFIER));
        }
        Ok(Verdict::failed(
            Self::IDENTIFIER,
            bounded_lines(&cycles, self.args.max_reported),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::Outcome;
    use crate::matrix::Matrix;
    use crate::roles::RoleMap;

    fn chain(closed: bool) -> Matrix {
        let mut weights = vec![vec![0, 1, 0], vec![0, 0, 1], vec![0, 0, 0]];
        if closed {
            weights[2][0] = 1;
        }
        Matrix::new(vec!["A".into(), "B".into(), "C".into()], weights, None).unwrap()
    }

    fn run(m: &Matrix) -> Verdict {
        let roles = RoleMap::builtin();
        CodeClean::default()
            .check(&AnalysisContext::new(m, &roles))
            .unwrap()
    }

    #[test]
    fn test_acyclic_passes() {
        assert_eq!(run(&chain(false)).outcome, Outcome::Passed);
    }

    #[test]
    fn test_cycle_fails_with_members_and_path() {
        let v = run(&chain(true));
        assert_eq!(v.outcome, Outcome::Failed);
        assert_eq!(
            v.message(),
            "circular dependency among {A, B, C}: A -> B -> C -> A"
        );
    }

    #[test]
    fn test_self_dependency_is_not_a_cycle() {
        let m = Matrix::from_weights(vec![vec![4, 1], vec![0, 2]]).unwrap();
        assert_eq!(run(&m).outcome, Outcome::Passed);
    }

    #[test]
    fn test_empty_matrix_not_applicable() {
        let m = Matrix::from_weights(vec![]).unwrap();
        assert_eq!(run(&m).outcome, Outcome::NotApplicable);
    }
}
