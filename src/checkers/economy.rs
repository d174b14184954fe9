//! Economy of mechanism: keep the design small and simple.

use serde::Deserialize;

use crate::arguments::{self, ArgumentKind, ArgumentSpec, Arguments};
use crate::error::{CheckerError, ConfigError};
use crate::graph::DependencyGraph;
use crate::matrix::Matrix;

use super::{AnalysisContext, Checker, Verdict};

/// Arguments of `EconomyOfMechanism`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomyOfMechanismArgs {
    pub max_density: f64,
    pub max_fan_out: Option<usize>,
    /// Fail when dependencies reach `entities * simplicity_factor`.
    pub simplicity_factor: Option<u32>,
    pub exclude_categories: Vec<String>,
}

impl Default for EconomyOfMechanismArgs {
    fn default() -> Self {
        Self {
            max_density: 0.3,
            max_fan_out: None,
            simplicity_factor: None,
            exclude_categories: Vec::new(),
        }
    }
}

static ARGUMENTS: &[ArgumentSpec] = &[
    ArgumentSpec {
        name: "max_density",
        kind: ArgumentKind::Float,
        default: "0.3",
        description: "Maximum ratio of dependencies to possible off-diagonal cells",
    },
    ArgumentSpec {
        name: "max_fan_out",
        kind: ArgumentKind::Integer,
        default: "unbounded",
        description: "Maximum number of entities a single entity may depend on",
    },
    ArgumentSpec {
        name: "simplicity_factor",
        kind: ArgumentKind::Integer,
        default: "unset",
        description: "Fail when dependencies >= entities * simplicity_factor",
    },
    ArgumentSpec {
        name: "exclude_categories",
        kind: ArgumentKind::TextList,
        default: "[]",
        description: "Categories left out of the measure (e.g. framework, corelib)",
    },
];

/// Checks that the dependency structure stays sparse.
#[derive(Debug, Clone, Default)]
pub struct EconomyOfMechanism {
    args: EconomyOfMechanismArgs,
}

impl EconomyOfMechanism {
    pub const IDENTIFIER: &'static str = "dsmcheck.EconomyOfMechanism";

    pub fn new(args: EconomyOfMechanismArgs) -> Self {
        Self { args }
    }

    pub fn from_arguments(arguments: &Arguments) -> Result<Self, ConfigError> {
        let args: EconomyOfMechanismArgs = arguments::bind(Self::IDENTIFIER, arguments)?;
        if !(0.0..=1.0).contains(&args.max_density) {
            return Err(ConfigError::argument(
                Self::IDENTIFIER,
                format!("max_density must be between 0 and 1, got {}", args.max_density),
            ));
        }
        if args.simplicity_factor == Some(0) {
            return Err(ConfigError::argument(
                Self::IDENTIFIER,
                "simplicity_factor must be at least 1",
            ));
        }
        Ok(Self::new(args))
    }

    fn kept(&self, matrix: &Matrix) -> Vec<usize> {
        (0..matrix.size())
            .filter(|&i| match matrix.category(i) {
                Some(c) => !self.args.exclude_categories.iter().any(|e| e == c),
                None => true,
            })
            .collect()
    }
}

/// First entity with the highest degree.
fn busiest(n: usize, degree: impl Fn(usize) -> usize) -> (usize, usize) {
    let mut best = (0, 0);
    for i in 0..n {
        let d = degree(i);
        if d > best.1 {
            best = (i, d);
        }
    }
    best
}

impl Checker for EconomyOfMechanism {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &'static str {
        "Economy of Mechanism"
    }

    fn description(&self) -> &'static str {
        "Keep the design as simple and small as possible. The matrix must not \
         be too dense and no entity should depend on too many others."
    }

    fn hint(&self) -> &'static str {
        "Reduce the number of dependencies in your own code or increase the \
         thresholds. Frameworks and core libraries can be excluded with \
         exclude_categories."
    }

    fn arguments(&self) -> &'static [ArgumentSpec] {
        ARGUMENTS
    }

    fn check(&self, ctx: &AnalysisContext) -> Result<Verdict, CheckerError> {
        let restricted;
        let own_graph;
        let (matrix, graph): (&Matrix, &DependencyGraph) =
            if self.args.exclude_categories.is_empty() {
                (ctx.matrix(), ctx.graph())
            } else {
                restricted = ctx.matrix().restricted(&self.kept(ctx.matrix()));
                own_graph = DependencyGraph::build(&restricted);
                (&restricted, &own_graph)
            };

        let n = matrix.size();
        if n < 2 {
            return Ok(Verdict::not_applicable(
                Self::IDENTIFIER,
                format!("{} entities left, at least 2 required", n),
            ));
        }

        let dependencies = graph.edge_count();
        let possible = n * n - n;
        let density = dependencies as f64 / possible as f64;
        let (max_out, out_degree) = busiest(n, |i| graph.out_degree(i));
        let (max_in, in_degree) = busiest(n, |i| graph.in_degree(i));

        let mut problems = Vec::new();
        if density > self.args.max_density {
            problems.push(format!(
                "density {:.3} ({} dependencies over {} possible) exceeds {:.3}",
                density, dependencies, possible, self.args.max_density
            ));
        }
        if let Some(limit) = self.args.max_fan_out {
            for i in 0..n {
                if graph.out_degree(i) > limit {
                    problems.push(format!(
                        "{} depends on {} entities (maximum fan-out {})",
                        matrix.entity(i),
                        graph.out_degree(i),
                        limit
                    ));
                }
            }
        }
        if let Some(factor) = self.args.simplicity_factor {
            let allowed = n * factor as usize;
            if dependencies >= allowed {
                problems.push(format!(
                    "{} dependencies >= {} entities * simplicity factor {} = {}",
                    dependencies, n, factor, allowed
                ));
            }
        }

        let summary = format!(
            "density {:.3}, max fan-out {} ({}), max fan-in {} ({})",
            density,
            out_degree,
            matrix.entity(max_out),
            in_degree,
            matrix.entity(max_in)
        );

        if problems.is_empty() {
            return Ok(Verdict::passed_with(Self::IDENTIFIER, summary));
        }
        problems.push(summary);
        Ok(Verdict::failed(Self::IDENTIFIER, problems.join("\n")))
    }
}
