//! Matrix providers.
//!
//! A provider produces the matrix an analyzer checks. Only CSV ingestion is
//! bundled; library users can implement `Provider` for other sources.

mod csv;

pub use self::csv::{CsvInput, CsvInputArgs};

use crate::arguments::ArgumentSpec;
use crate::error::ProviderError;
use crate::matrix::Matrix;

/// Source of a Design Structure Matrix.
pub trait Provider: Send + Sync {
    /// Fully qualified identifier, e.g. `dsmcheck.CsvInput`.
    fn identifier(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn arguments(&self) -> &'static [ArgumentSpec] {
        &[]
    }

    /// Where the matrix comes from, for reports (a path, `<stdin>`, ...).
    fn source(&self) -> String;

    fn produce(&self) -> Result<Matrix, ProviderError>;
}

/// Provider handing out a matrix built in memory.
#[derive(Debug, Clone)]
pub struct StaticMatrix {
    source: String,
    matrix: Matrix,
}

impl StaticMatrix {
    pub const IDENTIFIER: &'static str = "dsmcheck.StaticMatrix";

    pub fn new(source: impl Into<String>, matrix: Matrix) -> Self {
        Self {
            source: source.into(),
            matrix,
        }
    }
}

impl Provider for StaticMatrix {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &'static str {
        "Static matrix"
    }

    fn description(&self) -> &'static str {
        "Matrix built in memory by the caller."
    }

    fn source(&self) -> String {
        self.source.clone()
    }

    fn produce(&self) -> Result<Matrix, ProviderError> {
        Ok(self.matrix.clone())
    }
}
