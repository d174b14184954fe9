//! Privilege checkers: separation of privileges and least privileges.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Deserialize;

use crate::arguments::{self, ArgumentKind, ArgumentSpec, Arguments};
use crate::error::{CheckerError, ConfigError};
use crate::roles::Role;

use super::{bounded_lines, empty_matrix, AnalysisContext, Checker, Verdict};

fn not_categorized(identifier: &str, ctx: &AnalysisContext) -> Option<Verdict> {
    (!ctx.matrix().has_categories())
        .then(|| Verdict::not_applicable(identifier, "matrix has no categories"))
}

fn listed_or_role(
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

fn is_mediator(ctx: &AnalysisContext, i: usize) -> bool {
    ctx.roles().has(ctx.matrix().category(i), Role::Mediator)
}

fn lookup(ctx: &AnalysisContext, name: &str) -> Result<usize, CheckerError> {
    ctx.matrix()
        .index_of(name)
        .ok_or_else(|| CheckerError::UnknownEntity(name.to_string()))
}

// ---------------------------------------------------------------------------
// SeparationOfPrivileges
// ---------------------------------------------------------------------------

/// Arguments of `SeparationOfPrivileges`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeparationOfPrivilegesArgs {
    pub protected_categories: Option<Vec<String>>,
    pub subject_categories: Option<Vec<String>>,
    /// Resources whose access is already combined ("and"-gated) by the caller.
    pub gated_resources: Vec<String>,
    pub min_categories: usize,
    pub max_reported: usize,
}

impl Default for SeparationOfPrivilegesArgs {
    fn default() -> Self {
        Self {
            protected_categories: None,
            subject_categories: None,
            gated_resources: Vec::new(),
            min_categories: 2,
            max_reported: 20,
        }
    }
}

static SEPARATION_ARGUMENTS: &[ArgumentSpec] = &[
    ArgumentSpec {
        name: "protected_categories",
        kind: ArgumentKind::TextList,
        default: "categories with the protected role",
        description: "Categories of the resources that need separated privileges",
    },
    ArgumentSpec {
        name: "subject_categories",
        kind: ArgumentKind::TextList,
        default: "categories with the subject role",
        description: "Categories of the entities holding privileges",
    },
    ArgumentSpec {
        name: "gated_resources",
        kind: ArgumentKind::TextList,
        default: "[]",
        description: "Resources whose access already combines several privileges",
    },
    ArgumentSpec {
        name: "min_categories",
        kind: ArgumentKind::Integer,
        default: "2",
        description: "Minimum number of distinct privilege categories per protected resource",
    },
    ArgumentSpec {
        name: "max_reported",
        kind: ArgumentKind::Integer,
        default: "20",
        description: "Maximum number of resources listed in the message",
    },
];

/// Checks that protected resources cannot be reached through a single
/// privilege category.
#[derive(Debug, Clone, Default)]
pub struct SeparationOfPrivileges {
    args: SeparationOfPrivilegesArgs,
}

impl SeparationOfPrivileges {
    pub const IDENTIFIER: &'static str = "dsmcheck.SeparationOfPrivileges";

    pub fn new(args: SeparationOfPrivilegesArgs) -> Self {
        Self { args }
    }

    pub fn from_arguments(arguments: &Arguments) -> Result<Self, ConfigError> {
        let args: SeparationOfPrivilegesArgs = arguments::bind(Self::IDENTIFIER, arguments)?;
        if args.min_categories == 0 {
            return Err(ConfigError::argument(
                Self::IDENTIFIER,
                "min_categories must be at least 1",
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
}

impl Checker for SeparationOfPrivileges {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &'static str {
        "Separation of Privileges"
    }

    fn description(&self) -> &'static str {
        "A protection mechanism that requires two keys is more robust than one \
         that allows access to the presenter of a single key. Protected \
         resources must not be reachable by a single privilege category."
    }

    fn hint(&self) -> &'static str {
        "Require access from several privilege categories for each protected \
         resource, or declare the resource as gated when access is already \
         combined elsewhere."
    }

    fn arguments(&self) -> &'static [ArgumentSpec] {
        SEPARATION_ARGUMENTS
    }

    fn check(&self, ctx: &AnalysisContext) -> Result<Verdict, CheckerError> {
        if let Some(verdict) = empty_matrix(Self::IDENTIFIER, ctx)
            .or_else(|| not_categorized(Self::IDENTIFIER, ctx))
        {
            return Ok(verdict);
        }
        let matrix = ctx.matrix();

        let gated = self
            .args
            .gated_resources
            .iter()
            .map(|name| lookup(ctx, name))
            .collect::<Result<BTreeSet<usize>, _>>()?;

        let protected: Vec<usize> = (0..matrix.size())
            .filter(|&r| {
                listed_or_role(ctx, r, &self.args.protected_categories, Role::Protected)
            })
            .collect();
        if protected.is_empty() {
            return Ok(Verdict::not_applicable(
                Self::IDENTIFIER,
                "no protected resources",
            ));
        }

        let graph = ctx.graph();
        let mut violations = Vec::new();
        for &r in &protected {
            if gated.contains(&r) {
                tracing::debug!("{} is gated, skipping", matrix.entity(r));
                continue;
            }
            let accessors: BTreeSet<&str> = graph
                .predecessors(r)
                .iter()
                .copied()
                .filter(|&s| !is_mediator(ctx, s))
                .filter(|&s| listed_or_role(ctx, s, &self.args.subject_categories, Role::Subject))
                .filter_map(|s| matrix.category(s))
                .collect();
            if accessors.is_empty() || accessors.len() >= self.args.min_categories {
                continue;
            }
            let names: Vec<&str> = accessors.into_iter().collect();
            violations.push(format!(
                "{} is accessible with privileges of {} only (at least {} categories required)",
                matrix.entity(r),
                names.join(", "),
                self.args.min_categories
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

// ---------------------------------------------------------------------------
// LeastPrivileges
// ---------------------------------------------------------------------------

/// Arguments of `LeastPrivileges`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeastPrivilegesArgs {
    /// Explicit footprint: subject name to the resource names it may access.
    pub allowed: Option<BTreeMap<String, Vec<String>>>,
    pub subject_categories: Option<Vec<String>>,
    pub resource_categories: Option<Vec<String>>,
    pub max_reported: usize,
}

impl Default for LeastPrivilegesArgs {
    fn default() -> Self {
        Self {
            allowed: None,
            subject_categories: None,
            resource_categories: None,
            max_reported: 20,
        }
    }
}

static LEAST_ARGUMENTS: &[ArgumentSpec] = &[
    ArgumentSpec {
        name: "allowed",
        kind: ArgumentKind::Mapping,
        default: "inferred from same-category peers",
        description: "Resources each subject is allowed to access",
    },
    ArgumentSpec {
        name: "subject_categories",
        kind: ArgumentKind::TextList,
        default: "categories with the subject role",
        description: "Categories of the entities holding privileges",
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
        description: "Maximum number of subjects listed in the message",
    },
];

/// Checks that subjects access no more resources than they need.
#[derive(Debug, Clone, Default)]
pub struct LeastPrivileges {
    args: LeastPrivilegesArgs,
}

impl LeastPrivileges {
    pub const IDENTIFIER: &'static str = "dsmcheck.LeastPrivileges";

    pub fn new(args: LeastPrivilegesArgs) -> Self {
        Self { args }
    }

    pub fn from_arguments(arguments: &Arguments) -> Result<Self, ConfigError> {
        let args: LeastPrivilegesArgs = arguments::bind(Self::IDENTIFIER, arguments)?;
        if args.max_reported == 0 {
            return Err(ConfigError::argument(
                Self::IDENTIFIER,
                "max_reported must be at least 1",
            ));
        }
        Ok(Self::new(args))
    }

    fn accessed(&self, ctx: &AnalysisContext, s: usize) -> BTreeSet<usize> {
        ctx.graph()
            .successors(s)
            .iter()
            .copied()
            .filter(|&r| {
                !is_mediator(ctx, r)
                    && listed_or_role(ctx, r, &self.args.resource_categories, Role::Resource)
            })
            .collect()
    }

    /// Required resources per subject, from the explicit footprint. Subjects
    /// missing from the mapping require nothing.
    fn explicit_footprint(
        &self,
        ctx: &AnalysisContext,
        allowed: &BTreeMap<String, Vec<String>>,
        subjects: &[usize],
    ) -> Result<BTreeMap<usize, BTreeSet<usize>>, CheckerError> {
        let mut footprint: BTreeMap<usize, BTreeSet<usize>> =
            subjects.iter().map(|&s| (s, BTreeSet::new())).collect();
        for (subject, resources) in allowed {
            let s = lookup(ctx, subject)?;
            let required = resources
                .iter()
                .map(|name| lookup(ctx, name))
                .collect::<Result<BTreeSet<usize>, _>>()?;
            footprint.insert(s, required);
        }
        Ok(footprint)
    }

    /// Required resources per subject, as the union of what its same-category
    /// peers access. Subjects without peers are left out.
    fn inferred_footprint(
        &self,
        ctx: &AnalysisContext,
        subjects: &[usize],
    ) -> BTreeMap<usize, BTreeSet<usize>> {
        let matrix = ctx.matrix();
        let mut by_category: HashMap<&str, Vec<usize>> = HashMap::new();
        for &s in subjects {
            if let Some(category) = matrix.category(s) {
                by_category.entry(category).or_default().push(s);
            }
        }

        let mut footprint = BTreeMap::new();
        for &s in subjects {
            let Some(peers) = matrix.category(s).and_then(|c| by_category.get(c)) else {
                continue;
            };
            if peers.len() < 2 {
                continue;
            }
            let required: BTreeSet<usize> = peers
                .iter()
                .filter(|&&p| p != s)
                .flat_map(|&p| self.accessed(ctx, p))
                .collect();
            footprint.insert(s, required);
        }
        footprint
    }
}

impl Checker for LeastPrivileges {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &'static str {
        "Least Privileges"
    }

    fn description(&self) -> &'static str {
        "Every program and every user of the system should operate using the \
         least set of privileges necessary to complete the job."
    }

    fn hint(&self) -> &'static str {
        "Remove the dependencies on resources the subject does not need, or \
         add them to its allowed footprint if they are legitimate."
    }

    fn arguments(&self) -> &'static [ArgumentSpec] {
        LEAST_ARGUMENTS
    }

    fn check(&self, ctx: &AnalysisContext) -> Result<Verdict, CheckerError> {
        if let Some(verdict) = empty_matrix(Self::IDENTIFIER, ctx)
            .or_else(|| not_categorized(Self::IDENTIFIER, ctx))
        {
            return Ok(verdict);
        }
        let matrix = ctx.matrix();

        let subjects: Vec<usize> = (0..matrix.size())
            .filter(|&s| !is_mediator(ctx, s))
            .filter(|&s| listed_or_role(ctx, s, &self.args.subject_categories, Role::Subject))
            .collect();

        let footprint = match &self.args.allowed {
            Some(allowed) => self.explicit_footprint(ctx, allowed, &subjects)?,
            None => {
                if subjects.is_empty() {
                    return Ok(Verdict::not_applicable(Self::IDENTIFIER, "no subject entities"));
                }
                self.inferred_footprint(ctx, &subjects)
            }
        };

        let mut violations = Vec::new();
        for (&s, required) in &footprint {
            let excess: Vec<&str> = self
                .accessed(ctx, s)
                .difference(required)
                .map(|&r| matrix.entity(r))
                .collect();
            if excess.is_empty() {
                continue;
            }
            violations.push(format!(
                "{} accesses resources it does not need: {}",
                matrix.entity(s),
                excess.join(", ")
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkers::Outcome;
    use crate::matrix::Matrix;
    use crate::roles::RoleMap;

    fn ctx_run<C: Checker>(checker: &C, m: &Matrix) -> Result<Verdict, CheckerError> {
        let roles = RoleMap::builtin();
        checker.check(&AnalysisContext::new(m, &roles))
    }

    /// Two front-end modules of the same category and one admin module, all
    /// touching the `db` resource.
    fn shop(web_b_to_logs: bool) -> Matrix {
        Matrix::new(
            vec![
                "web_a".into(),
                "web_b".into(),
                "admin".into(),
                "db".into(),
                "logs".into(),
            ],
            vec![
                vec![0, 0, 0, 1, 0],
                vec![0, 0, 0, 1, if web_b_to_logs { 1 } else { 0 }],
                vec![0, 0, 0, 1, 0],
                vec![0, 0, 0, 0, 0],
                vec![0, 0, 0, 0, 0],
            ],
            Some(vec![
                "appmodule".into(),
                "appmodule".into(),
                "admin".into(),
                "data".into(),
                "data".into(),
            ]),
        )
        .unwrap()
    }

    fn admin_is_subject() -> RoleMap {
        let mut map = BTreeMap::new();
        map.insert("appmodule".to_string(), vec![Role::Subject]);
        map.insert("admin".to_string(), vec![Role::Subject]);
        map.insert("data".to_string(), vec![Role::Resource, Role::Protected]);
        RoleMap::new(&map, vec![]).unwrap()
    }

    #[test]
    fn test_separation_fails_for_single_category() {
        // with builtin roles only appmodule reaches db
        let v = ctx_run(&SeparationOfPrivileges::default(), &shop(false)).unwrap();
        assert_eq!(v.outcome, Outcome::Failed);
        assert!(v.message().contains("db is accessible with privileges of appmodule only"));
        assert!(!v.message().contains("logs"));
    }

    #[test]
    fn test_separation_passes_with_two_categories() {
        let m = shop(false);
        let roles = admin_is_subject();
        let v = SeparationOfPrivileges::default()
            .check(&AnalysisContext::new(&m, &roles))
            .unwrap();
        assert_eq!(v.outcome, Outcome::Passed);
    }

    #[test]
    fn test_separation_gated_resource_is_skipped() {
        let checker = SeparationOfPrivileges::new(SeparationOfPrivilegesArgs {
            gated_resources: vec!["db".into()],
            ..Default::default()
        });
        let v = ctx_run(&checker, &shop(false)).unwrap();
        assert_eq!(v.outcome, Outcome::Passed);
    }

    #[test]
    fn test_separation_unknown_gated_resource() {
        let checker = SeparationOfPrivileges::new(SeparationOfPrivilegesArgs {
            gated_resources: vec!["vault".into()],
            ..Default::default()
        });
        let err = ctx_run(&checker, &shop(false)).unwrap_err();
        assert_eq!(err, CheckerError::UnknownEntity("vault".into()));
    }

    #[test]
    fn test_separation_not_applicable_without_categories() {
        let m = Matrix::from_weights(vec![vec![0, 1], vec![0, 0]]).unwrap();
        let v = ctx_run(&SeparationOfPrivileges::default(), &m).unwrap();
        assert_eq!(v.outcome, Outcome::NotApplicable);
    }

    #[test]
    fn test_least_privileges_inferred_from_peers() {
        let v = ctx_run(&LeastPrivileges::default(), &shop(false)).unwrap();
        assert_eq!(v.outcome, Outcome::Passed);

        let v = ctx_run(&LeastPrivileges::default(), &shop(true)).unwrap();
        assert_eq!(v.outcome, Outcome::Failed);
        assert_eq!(v.message(), "web_b accesses resources it does not need: logs");
    }

    #[test]
    fn test_least_privileges_explicit_footprint() {
        let allowed: BTreeMap<String, Vec<String>> = [
            ("web_a".to_string(), vec!["db".to_string()]),
            ("web_b".to_string(), vec!["db".to_string()]),
            ("admin".to_string(), vec![]),
        ]
        .into_iter()
        .collect();
        let checker = LeastPrivileges::new(LeastPrivilegesArgs {
            allowed: Some(allowed),
            ..Default::default()
        });
        let m = shop(false);
        let roles = admin_is_subject();
        let v = checker.check(&AnalysisContext::new(&m, &roles)).unwrap();
        assert_eq!(v.outcome, Outcome::Failed);
        assert_eq!(v.message(), "admin accesses resources it does not need: db");
    }

    #[test]
    fn test_least_privileges_unlisted_subject_requires_nothing() {
        let allowed: BTreeMap<String, Vec<String>> =
            [("admin".to_string(), vec!["db".to_string()])].into_iter().collect();
        let checker = LeastPrivileges::new(LeastPrivilegesArgs {
            allowed: Some(allowed),
            ..Default::default()
        });
        let m = shop(true);
        let roles = admin_is_subject();
        let v = checker.check(&AnalysisContext::new(&m, &roles)).unwrap();
        assert_eq!(v.outcome, Outcome::Failed);
        assert!(v.message().contains("web_a accesses resources it does not need: db"));
        assert!(v.message().contains("web_b accesses resources it does not need: db, logs"));
        assert!(!v.message().contains("admin"));
    }

    #[test]
    fn test_least_privileges_unknown_entity() {
        let allowed: BTreeMap<String, Vec<String>> =
            [("web_a".to_string(), vec!["ghost".to_string()])]
                .into_iter()
                .collect();
        let checker = LeastPrivileges::new(LeastPrivilegesArgs {
            allowed: Some(allowed),
            ..Default::default()
        });
        let err = ctx_run(&checker, &shop(false)).unwrap_err();
        assert_eq!(err, CheckerError::UnknownEntity("ghost".into()));
    }

    #[test]
    fn test_least_privileges_no_subjects() {
        let m = Matrix::new(
            vec!["a".into(), "b".into()],
            vec![vec![0, 1], vec![0, 0]],
            Some(vec!["corelib".into(), "data".into()]),
        )
        .unwrap();
        let v = ctx_run(&LeastPrivileges::default(), &m).unwrap();
        assert_eq!(v.outcome, Outcome::NotApplicable);
    }
}
