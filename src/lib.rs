//! dsmcheck - architecture quality gate for Design Structure Matrices.
//!
//! A Design Structure Matrix (DSM) is a square table of dependency weights
//! between named entities (modules, services, users, resources), optionally
//! grouped in categories. dsmcheck evaluates a DSM against classical design
//! principles and reports a pass/fail verdict per principle.
//!
//! # Architecture
//!
//! - `matrix`: the immutable matrix data model
//! - `roles`: semantic roles (mediator, subject, resource, ...) of categories
//! - `graph`: dependency graph shared by checkers (cycles, mediation paths)
//! - `checkers`: the `Checker` contract and the bundled checkers
//! - `providers`: the `Provider` contract and the CSV provider
//! - `registry`: identifier to factory lookup for plugins
//! - `analyzer`: runs checkers against provider matrices into a `Report`
//! - `config`: YAML configuration schema, discovery and validation
//! - `report`: output formatting (pretty, JSON, TAP)
//!
//! # Example
//!
//! ```
//! use dsmcheck::{Analyzer, BoundChecker, CodeClean, Matrix, StaticMatrix};
//!
//! let matrix = Matrix::new(
//!     vec!["A".into(), "B".into()],
//!     vec![vec![0, 1], vec![0, 0]],
//!     None,
//! )
//! .unwrap();
//!
//! let mut analyzer = Analyzer::new("example");
//! analyzer
//!     .add_provider(Box::new(StaticMatrix::new("in-memory", matrix)))
//!     .add_checker(BoundChecker::new(Box::new(CodeClean::default())));
//! assert!(analyzer.run().passed());
//! ```

pub mod analyzer;
pub mod arguments;
pub mod checkers;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod providers;
pub mod registry;
pub mod report;
pub mod roles;

pub use analyzer::{Analysis, Analyzer};
pub use checkers::{
    AnalysisContext, BoundChecker, Checker, CodeClean, CompleteMediation, EconomyOfMechanism,
    LayeredArchitecture, LeastCommonMechanism, LeastPrivileges, Outcome, SeparationOfPrivileges,
    Verdict,
};
pub use config::Config;
pub use error::{CheckerError, ConfigError, MatrixError, ProviderError};
pub use matrix::Matrix;
pub use providers::{CsvInput, Provider, StaticMatrix};
pub use registry::PluginRegistry;
pub use report::Report;
pub use roles::{Role, RoleMap};
