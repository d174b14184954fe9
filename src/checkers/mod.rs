//! Architecture checkers.
//!
//! Each checker evaluates one design principle against a matrix and returns a
//! `Verdict`. Checkers are constructed from their bound arguments and never
//! mutate shared state, so one instance can be run against many matrices (and
//! from several threads at once).

mod code_clean;
mod common_mechanism;
mod context;
mod economy;
mod layered;
mod mediation;
mod privileges;
mod types;

pub use code_clean::{CodeClean, CodeCleanArgs};
pub use common_mechanism::{LeastCommonMechanism, LeastCommonMechanismArgs};
pub use context::AnalysisContext;
pub use economy::{EconomyOfMechanism, EconomyOfMechanismArgs};
pub use layered::{LayeredArchitecture, LayeredArchitectureArgs};
pub use mediation::{CompleteMediation, CompleteMediationArgs};
pub use privileges::{
    LeastPrivileges, LeastPrivilegesArgs, SeparationOfPrivileges, SeparationOfPrivilegesArgs,
};
pub use types::{Outcome, Verdict};

pub(crate) use types::bounded_lines;

use crate::arguments::ArgumentSpec;
use crate::error::CheckerError;

/// A pass/fail architecture criterion.
pub trait Checker: Send + Sync {
    /// Fully qualified identifier, e.g. `dsmcheck.CodeClean`.
    fn identifier(&self) -> &'static str;

    /// Human readable name.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Advice shown next to a failed verdict.
    fn hint(&self) -> &'static str;

    /// Options accepted at construction time.
    fn arguments(&self) -> &'static [ArgumentSpec] {
        &[]
    }

    /// Evaluate the criterion.
    ///
    /// Returns `Err` only when a precondition the checker was configured with
    /// does not hold for this matrix (for example an unknown entity name).
    fn check(&self, ctx: &AnalysisContext) -> Result<Verdict, CheckerError>;
}

/// Verdict for an empty matrix, shared by every checker.
pub(crate) fn empty_matrix(identifier: &str, ctx: &AnalysisContext) -> Option<Verdict> {
    ctx.matrix()
        .is_empty()
        .then(|| Verdict::not_applicable(identifier, "matrix has no entities"))
}

/// A checker registered in an analyzer, with its display name and ignore flag.
pub struct BoundChecker {
    checker: Box<dyn Checker>,
    name: Option<String>,
    ignore: bool,
}

impl BoundChecker {
    pub fn new(checker: Box<dyn Checker>) -> Self {
        Self {
            checker,
            name: None,
            ignore: false,
        }
    }

    /// Override the display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Record failures of this checker without failing the overall result.
    pub fn ignored(mut self, ignore: bool) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn identifier(&self) -> &'static str {
        self.checker.identifier()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.checker.name())
    }

    pub fn hint(&self) -> &'static str {
        self.checker.hint()
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    pub fn checker(&self) -> &dyn Checker {
        self.checker.as_ref()
    }

    /// Run the checker, turning a `CheckerError` into a failed verdict.
    pub fn run(&self, ctx: &AnalysisContext) -> Verdict {
        let identifier = self.identifier();
        tracing::debug!("running checker {}", identifier);
        match self.checker.check(ctx) {
            Ok(verdict) => {
                tracing::debug!("checker {} -> {}", identifier, verdict.outcome);
                verdict
            }
            Err(e) => {
                tracing::warn!("checker {} could not run: {}", identifier, e);
                Verdict::failed(identifier, format!("checker error: {}", e))
            }
        }
    }
}

impl std::fmt::Debug for BoundChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundChecker")
            .field("identifier", &self.identifier())
            .field("name", &self.display_name())
            .field("ignore", &self.ignore)
            .finish()
    }
}
