//! Complete mediation: subjects reach resources only through a mediator.

use serde::Deserialize;

use crate::arguments::{self, ArgumentKind, ArgumentSpec, Arguments};
use crate::error::{CheckerError, ConfigError};
use crate::roles::Role;

use super::{bounded_lines, empty_matrix, AnalysisContext, Checker, Verdict};

/// Arguments of `CompleteMediation`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompleteMediationArgs {
    /// Category of the mediator entities. Defaults to the mediator role.
    pub mediator_category: Option<String>,
    pub subject_categories: Option<Vec<String>>,
    pub resource_categories: Option<Vec<String>>,
    pub max_reported: usize,
}

impl Default for CompleteMediationArgs {
    fn default() -> Self {
        Self {
            mediator_category: None,
            subject_categories: None,
            resource_categories: None,
            max_reported: 20,
        }
    }
}

static ARGUMENTS: &[ArgumentSpec] = &[
    ArgumentSpec {
        name: "mediator_category",
        kind: ArgumentKind::Text,
        default: "categories with the mediator role",
        description: "Category of the entities every access must go through",
    },
    ArgumentSpec {
        name: "subject_categories",
        kind: ArgumentKind::TextList,
        default: "categories with the subject role",
        description: "Categories of the entities that access resources",
    },
    ArgumentSpec {
        name: "resource_categories",
        kind: ArgumentKind::TextList,
        default: "categories with the resource role",
        description: "Categories of the entities that are accessed",
    },
    ArgumentSpec {
        name: "max_reported",
        kind: ArgumentKind::Integer,
        default: "20",
        description: "Maximum number of bypasses listed in the message",
    },
];

/// Checks that no subject depends directly on a resource.
#[derive(Debug, Clone, Default)]
pub struct CompleteMediation {
    args: CompleteMediationArgs,
}

impl CompleteMediation {
    pub const IDENTIFIER: &'static str = "dsmcheck.CompleteMediation";

    pub fn new(args: CompleteMediationArgs) -> Self {
        Self { args }
    }

    pub fn from_arguments(arguments: &Arguments) -> Result<Self, ConfigError> {
        let args: CompleteMediationArgs = arguments::bind(Self::IDENTIFIER, arguments)?;
        if args.max_reported == 0 {
            return Err(ConfigError::argument(
                Self::IDENTIFIER,
                "max_reported must be at least 1",
            ));
        }
        Ok(Self::new(args))
    }

    fn is_mediator(&self, ctx: &AnalysisContext, i: usize) -> bool {
        let category = ctx.matrix().category(i);
        match &self.args.mediator_category {
            Some(mediator) => category == Some(mediator.as_str()),
            None => ctx.roles().has(category, Role::Mediator),
        }
    }

    fn in_group(
        ctx: &AnalysisContext,
        i: usize,
        listed: &Option<Vec<String>>,
        role: Role,
    ) -> bool {
        let category = ctx.matrix().category(i);
        match listed {
            Some(categories) => category.is_some_and(|c| categories.iter().any(|l| l == c)),
            None => ctx.roles().has(category, role),
        }
    }
}

impl Checker for CompleteMediation {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &'static str {
        "Complete Mediation"
    }

    fn description(&self) -> &'static str {
        "Every access to every resource must be checked for authority. \
         Subjects may only reach resources through a mediator entity, never \
         through a direct dependency."
    }

    fn hint(&self) -> &'static str {
        "Remove the direct dependencies from subjects to resources and route \
         them through a mediator (broker, gateway, access layer)."
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

        let mediators: Vec<bool> = (0..matrix.size())
            .map(|i| self.is_mediator(ctx, i))
            .collect();
        if let Some(mediator) = &self.args.mediator_category {
            if !mediators.iter().any(|m| *m) {
                return Err(CheckerError::MissingCategory(mediator.clone()));
            }
        }

        let subjects: Vec<usize> = (0..matrix.size())
            .filter(|&i| !mediators[i])
            .filter(|&i| Self::in_group(ctx, i, &self.args.subject_categories, Role::Subject))
            .collect();
        let resources: Vec<bool> = (0..matrix.size())
            .map(|i| {
                !mediators[i]
                    && Self::in_group(ctx, i, &self.args.resource_categories, Role::Resource)
            })
            .collect();

        if subjects.is_empty() {
            return Ok(Verdict::not_applicable(Self::IDENTIFIER, "no subject entities"));
        }
        if !resources.iter().any(|r| *r) {
            return Ok(Verdict::not_applicable(Self::IDENTIFIER, "no resource entities"));
        }

        let graph = ctx.graph();
        let mut bypasses = Vec::new();
        for &s in &subjects {
            for &r in graph.successors(s) {
                if !resources[r] {
                    continue;
                }
                let via = graph.intermediaries(s, r, |m| mediators[m]);
                let path = if via.is_empty() {
                    "no mediated path exists".to_string()
                } else {
                    let names: Vec<&str> = via.iter().map(|&m| matrix.entity(m)).collect();
                    format!("a mediated path also exists via {}", names.join(", "))
                };
                bypasses.push(format!(
                    "{} accesses {} directly (weight {}); {}",
                    matrix.entity(s),
                    matrix.entity(r),
                    matrix.weight(s, r),
                    path
                ));
            }
        }

        if bypasses.is_empty() {
            return Ok(Verdict::passed(Self::IDENTIFIER));
        }
        Ok(Verdict::failed(
            Self::IDENTIFIER,
            bounded_lines(&bypasses, self.args.max_reported),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::Outcome;
    use crate::matrix::Matrix;
    use crate::roles::RoleMap;

    /// S -> M -> R, optionally with a direct S -> R edge.
    fn mediated(direct: bool) -> Matrix {
        Matrix::new(
            vec!["S".into(), "M".into(), "R".into()],
            vec![
                vec![0, 1, if direct { 1 } else { 0 }],
                vec![0, 0, 1],
                vec![0, 0, 0],
            ],
            Some(vec!["appmodule".into(), "broker".into(), "data".into()]),
        )
        .unwrap()
    }

    fn run(checker: &CompleteMediation, m: &Matrix) -> Result<Verdict, CheckerError> {
        let roles = RoleMap::builtin();
        checker.check(&AnalysisContext::new(m, &roles))
    }

    #[test]
    fn test_mediated_access_passes() {
        let v = run(&CompleteMediation::default(), &mediated(false)).unwrap();
        assert_eq!(v.outcome, Outcome::Passed);
    }

    #[test]
    fn test_direct_access_fails_even_when_mediated() {
        let v = run(&CompleteMediation::default(), &mediated(true)).unwrap();
        assert_eq!(v.outcome, Outcome::Failed);
        assert!(v.message().contains("S accesses R directly"));
        assert!(v.message().contains("via M"));
    }

    #[test]
    fn test_unmediated_bypass_message() {
        let m = Matrix::new(
            vec!["S".into(), "R".into()],
            vec![vec![0, 1], vec![0, 0]],
            Some(vec!["appmodule".into(), "data".into()]),
        )
        .unwrap();
        let v = run(&CompleteMediation::default(), &m).unwrap();
        assert!(v.message().contains("no mediated path exists"));
    }

    #[test]
    fn test_explicit_categories() {
        let m = Matrix::new(
            vec!["user".into(), "gate".into(), "file".into()],
            vec![vec![0, 1, 0], vec![0, 0, 1], vec![0, 0, 0]],
            Some(vec!["people".into(), "guard".into(), "store".into()]),
        )
        .unwrap();
        let checker = CompleteMediation::new(CompleteMediationArgs {
            mediator_category: Some("guard".into()),
            subject_categories: Some(vec!["people".into()]),
            resource_categories: Some(vec!["store".into()]),
            ..Default::default()
        });
        assert_eq!(run(&checker, &m).unwrap().outcome, Outcome::Passed);
    }

    #[test]
    fn test_missing_mediator_category_is_error() {
        let checker = CompleteMediation::new(CompleteMediationArgs {
            mediator_category: Some("gateway".into()),
            ..Default::default()
        });
        let err = run(&checker, &mediated(false)).unwrap_err();
        assert_eq!(err, CheckerError::MissingCategory("gateway".into()));
    }

    #[test]
    fn test_not_applicable_without_categories() {
        let m = Matrix::from_weights(vec![vec![0, 1], vec![0, 0]]).unwrap();
        let v = run(&CompleteMediation::default(), &m).unwrap();
        assert_eq!(v.outcome, Outcome::NotApplicable);
    }

    #[test]
    fn test_not_applicable_without_resources() {
        let m = Matrix::new(
            vec!["a".into(), "b".into()],
            vec![vec![0, 1], vec![0, 0]],
            Some(vec!["appmodule".into(), "broker".into()]),
        )
        .unwrap();
        let v = run(&CompleteMediation::default(), &m).unwrap();
        assert_eq!(v.outcome, Outcome::NotApplicable);
    }
}
