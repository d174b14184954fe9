//! Semantic roles assigned to categories.
//!
//! Checkers never match on raw category strings. Configuration tags each
//! category (or glob pattern of categories) with a small closed set of roles,
//! and checkers query those roles through `RoleMap`.

use std::collections::{BTreeMap, BTreeSet};

use globset::{Glob, GlobMatcher};
use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matrix::Matrix;

/// Role a category plays in an architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Every access from subjects to resources must go through it.
    Mediator,
    /// Entity that accesses resources.
    Subject,
    /// Entity that is accessed.
    Resource,
    /// Resource whose access requires separated privileges.
    Protected,
    /// Shared infrastructure (frameworks, libraries).
    Library,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mediator => "mediator",
            Role::Subject => "subject",
            Role::Resource => "resource",
            Role::Protected => "protected",
            Role::Library => "library",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Roles of the conventional categories used when no roles are configured.
static BUILTIN_ROLES: phf::Map<&'static str, &'static [Role]> = phf_map! {
    "framework" => &[Role::Library],
    "corelib" => &[Role::Library],
    "applib" => &[Role::Library],
    "appmodule" => &[Role::Subject],
    "broker" => &[Role::Mediator],
    "data" => &[Role::Resource, Role::Protected],
};

#[derive(Debug, Clone)]
struct RoleRule {
    matcher: GlobMatcher,
    roles: Vec<Role>,
}

/// Category to role assignment plus an optional explicit layer order.
#[derive(Debug, Clone, Default)]
pub struct RoleMap {
    rules: Vec<RoleRule>,
    layers: Vec<String>,
}

impl RoleMap {
    /// Build a role map from `pattern -> roles` entries.
    ///
    /// Patterns are globs; a category matching several patterns gets the
    /// union of their roles.
    pub fn new(
        roles: &BTreeMap<String, Vec<Role>>,
        layers: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(roles.len());
        for (pattern, assigned) in roles {
            let glob = Glob::new(pattern).map_err(|e| {
                ConfigError::Invalid(format!("invalid role pattern {:?}: {}", pattern, e))
            })?;
            rules.push(RoleRule {
                matcher: glob.compile_matcher(),
                roles: assigned.clone(),
            });
        }
        Ok(Self { rules, layers })
    }

    /// Role map for the conventional framework/corelib/applib/appmodule/broker/data categories.
    pub fn builtin() -> Self {
        let mut entries: Vec<(&str, &[Role])> =
            BUILTIN_ROLES.entries().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(k, _)| *k);

        let rules = entries
            .into_iter()
            .filter_map(|(category, roles)| {
                Glob::new(category).ok().map(|glob| RoleRule {
                    matcher: glob.compile_matcher(),
                    roles: roles.to_vec(),
                })
            })
            .collect();
        Self {
            rules,
            layers: Vec::new(),
        }
    }

    /// Replace the explicit layer order.
    pub fn with_layers(mut self, layers: Vec<String>) -> Self {
        self.layers = layers;
        self
    }

    /// Explicit layer order, lowest layer first. Empty when not configured.
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    /// All roles of a category.
    pub fn roles_of(&self, category: &str) -> BTreeSet<Role> {
        self.rules
            .iter()
            .filter(|rule| rule.matcher.is_match(category))
            .flat_map(|rule| rule.roles.iter().copied())
            .collect()
    }

    /// Whether a (possibly absent) category has the given role.
    pub fn has(&self, category: Option<&str>, role: Role) -> bool {
        match category {
            Some(cat) => self
                .rules
                .iter()
                .any(|rule| rule.roles.contains(&role) && rule.matcher.is_match(cat)),
            None => false,
        }
    }

    /// Indices of the matrix entities whose category has the given role.
    pub fn entities_with(&self, matrix: &Matrix, role: Role) -> Vec<usize> {
        (0..matrix.size())
            .filter(|&i| self.has(matrix.category(i), role))
            .collect()
    }
}
