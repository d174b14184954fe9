//! CSV matrix provider.
//!
//! Expected layout:
//!
//! ```text
//! ,A,B,C
//! A,0,1,0
//! B,0,0,2
//! C,0,0,0
//! ```
//!
//! The first header cell is a corner and is ignored. Categories come either
//! from header cells split on `categories_delimiter` (`A:core`) or from a row
//! whose first cell is `category_row`.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::arguments::{self, ArgumentKind, ArgumentSpec, Arguments};
use crate::error::{ConfigError, ProviderError};
use crate::matrix::Matrix;

use super::Provider;

/// Arguments of `CsvInput`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvInputArgs {
    /// File to read. Standard input when unset.
    pub file_path: Option<PathBuf>,
    pub delimiter: String,
    pub categories_delimiter: Option<String>,
    pub category_row: String,
}

impl Default for CsvInputArgs {
    fn default() -> Self {
        Self {
            file_path: None,
            delimiter: ",".to_string(),
            categories_delimiter: None,
            category_row: "categories".to_string(),
        }
    }
}

static ARGUMENTS: &[ArgumentSpec] = &[
    ArgumentSpec {
        name: "file_path",
        kind: ArgumentKind::Text,
        default: "standard input",
        description: "Path to the CSV file, relative to the configuration file",
    },
    ArgumentSpec {
        name: "delimiter",
        kind: ArgumentKind::Text,
        default: ",",
        description: "Cell delimiter",
    },
    ArgumentSpec {
        name: "categories_delimiter",
        kind: ArgumentKind::Text,
        default: "unset",
        description: "Separator between entity name and category in header cells",
    },
    ArgumentSpec {
        name: "category_row",
        kind: ArgumentKind::Text,
        default: "categories",
        description: "First cell of the optional row holding category labels",
    },
];

/// Reads a matrix from a CSV file or standard input.
#[derive(Debug, Clone, Default)]
pub struct CsvInput {
    args: CsvInputArgs,
}

impl CsvInput {
    pub const IDENTIFIER: &'static str = "dsmcheck.CsvInput";

    pub fn new(args: CsvInputArgs) -> Self {
        Self { args }
    }

    /// Bind arguments, resolving a relative `file_path` against `base_dir`.
    pub fn from_arguments(arguments: &Arguments, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut args: CsvInputArgs = arguments::bind(Self::IDENTIFIER, arguments)?;
        if args.delimiter.is_empty() {
            return Err(ConfigError::argument(Self::IDENTIFIER, "delimiter is empty"));
        }
        if let Some(categories) = &args.categories_delimiter {
            if categories.is_empty() || *categories == args.delimiter {
                return Err(ConfigError::argument(
                    Self::IDENTIFIER,
                    "categories_delimiter must be non-empty and differ from delimiter",
                ));
            }
        }
        if let Some(path) = &args.file_path {
            if path.is_relative() {
                args.file_path = Some(base_dir.join(path));
            }
        }
        Ok(Self::new(args))
    }

    fn read(&self) -> Result<String, ProviderError> {
        match &self.args.file_path {
            Some(path) => std::fs::read_to_string(path).map_err(|error| ProviderError::Io {
                source_name: path.display().to_string(),
                error,
            }),
            None => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .map_err(|error| ProviderError::Io {
                        source_name: "<stdin>".to_string(),
                        error,
                    })?;
                Ok(text)
            }
        }
    }

    /// Parse CSV text into a matrix.
    pub fn parse(&self, text: &str) -> Result<Matrix, ProviderError> {
        let delimiter = self.args.delimiter.as_str();
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(n, line)| (n + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header)) = lines.next() else {
            return Ok(Matrix::new(Vec::new(), Vec::new(), None)?);
        };

        let mut entities = Vec::new();
        let mut header_categories = Vec::new();
        for cell in header.split(delimiter).skip(1) {
            let cell = cell.trim();
            match &self.args.categories_delimiter {
                Some(sep) => {
                    let (name, category) = cell.split_once(sep.as_str()).unwrap_or((cell, ""));
                    entities.push(name.trim().to_string());
                    header_categories.push(category.trim().to_string());
                }
                None => entities.push(cell.to_string()),
            }
        }

        let mut categories = self
            .args
            .categories_delimiter
            .is_some()
            .then_some(header_categories);
        let mut weights = Vec::with_capacity(entities.len());

        for (line_no, line) in lines {
            let mut cells = line.split(delimiter).map(str::trim);
            let label = cells.next().unwrap_or("");

            // the categories row trails the weight rows, so an entity may
            // share its label
            if label == self.args.category_row && weights.len() >= entities.len() {
                if categories.is_some() {
                    return Err(ProviderError::Malformed {
                        line: line_no,
                        reason: "categories given twice".to_string(),
                    });
                }
                categories = Some(cells.map(str::to_string).collect());
                continue;
            }

            let row_index = weights.len();
            if let Some(expected) = entities.get(row_index) {
                if !label.is_empty() && label != expected {
                    tracing::warn!(
                        "line {}: row label {:?} differs from column {:?}",
                        line_no,
                        label,
                        expected
                    );
                }
            }

            let row = cells
                .map(|cell| parse_weight(cell, line_no))
                .collect::<Result<Vec<u32>, _>>()?;
            weights.push(row);
        }

        tracing::debug!("parsed {} entities", entities.len());
        Ok(Matrix::new(entities, weights, categories)?)
    }
}

fn parse_weight(cell: &str, line: usize) -> Result<u32, ProviderError> {
    let value: i64 = cell.parse().map_err(|_| ProviderError::Malformed {
        line,
        reason: format!("{:?} is not an integer", cell),
    })?;
    if value < 0 {
        return Err(ProviderError::Malformed {
            line,
            reason: format!("negative weight {}", value),
        });
    }
    u32::try_from(value).map_err(|_| ProviderError::Malformed {
        line,
        reason: format!("weight {} is too large", value),
    })
}

impl Provider for CsvInput {
    fn identifier(&self) -> &'static str {
        Self::IDENTIFIER
    }

    fn name(&self) -> &'static str {
        "CSV input"
    }

    fn description(&self) -> &'static str {
        "Read a Design Structure Matrix from a CSV file or standard input. \
         The first row holds the entity names after a corner cell, every \
         following row an entity name and its integer weights."
    }

    fn arguments(&self) -> &'static [ArgumentSpec] {
        ARGUMENTS
    }

    fn source(&self) -> String {
        match &self.args.file_path {
            Some(path) => path.display().to_string(),
            None => "<stdin>".to_string(),
        }
    }

    fn produce(&self) -> Result<Matrix, ProviderError> {
        tracing::info!("reading matrix from {}", self.source());
        let text = self.read()?;
        self.parse(&text)
    }
}
