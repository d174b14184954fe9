//! Design Structure Matrix data model.
//!
//! A matrix is a square table of dependency weights between named entities.
//! `weight(i, j)` is the strength of the dependency from entity `i` to entity
//! `j`. Entities may carry a category label used by role-aware checkers.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::MatrixError;

/// An immutable Design Structure Matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Matrix {
    entities: Vec<String>,
    /// One slot per entity when present; `None` slots are uncategorized.
    categories: Option<Vec<Option<String>>>,
    weights: Vec<Vec<u32>>,
}

impl Matrix {
    /// Build a matrix from entity names, weights and optional category labels.
    ///
    /// Empty category labels are treated as "uncategorized".
    pub fn new(
        entities: Vec<String>,
        weights: Vec<Vec<u32>>,
        categories: Option<Vec<String>>,
    ) -> Result<Self, MatrixError> {
        let n = weights.len();

        for (i, row) in weights.iter().enumerate() {
            if row.len() != n {
                return Err(MatrixError::Shape(format!(
                    "row {} has {} cells, expected {} (matrix must be square)",
                    i,
                    row.len(),
                    n
                )));
            }
        }

        if entities.len() != n {
            return Err(MatrixError::Shape(format!(
                "number of entities: {} != number of rows: {}",
                entities.len(),
                n
            )));
        }

        let mut seen = HashSet::with_capacity(n);
        for name in &entities {
            if !seen.insert(name.as_str()) {
                return Err(MatrixError::Label(format!(
                    "duplicate entity name {:?}",
                    name
                )));
            }
        }

        let categories = match categories {
            Some(labels) => {
                if labels.len() != n {
                    return Err(MatrixError::Label(format!(
                        "number of categories: {} != number of entities: {}",
                        labels.len(),
                        n
                    )));
                }
                Some(
                    labels
                        .into_iter()
                        .map(|label| {
                            let label = label.trim().to_string();
                            (!label.is_empty()).then_some(label)
                        })
                        .collect(),
                )
            }
            None => None,
        };

        Ok(Self {
            entities,
            categories,
            weights,
        })
    }

    /// Build an uncategorized matrix whose entities are named "0".."N-1".
    pub fn from_weights(weights: Vec<Vec<u32>>) -> Result<Self, MatrixError> {
        let entities = (0..weights.len()).map(|i| i.to_string()).collect();
        Self::new(entities, weights, None)
    }

    /// Number of entities (rows and columns).
    pub fn size(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Dependency weight from entity `i` to entity `j`.
    ///
    /// Panics if either index is out of range.
    pub fn weight(&self, i: usize, j: usize) -> u32 {
        self.weights[i][j]
    }

    /// Whether a nonzero dependency exists from `i` to `j`.
    pub fn depends(&self, i: usize, j: usize) -> bool {
        self.weights[i][j] > 0
    }

    pub fn row(&self, i: usize) -> &[u32] {
        &self.weights[i]
    }

    pub fn weights(&self) -> &[Vec<u32>] {
        &self.weights
    }

    pub fn entity(&self, i: usize) -> &str {
        &self.entities[i]
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Position of the entity with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entities.iter().position(|e| e == name)
    }

    /// Category label of entity `i`, if any.
    pub fn category(&self, i: usize) -> Option<&str> {
        self.categories
            .as_ref()
            .and_then(|c| c[i].as_deref())
    }

    /// Whether category labels were supplied and at least one is set.
    pub fn has_categories(&self) -> bool {
        self.categories
            .as_ref()
            .map(|c| c.iter().any(Option::is_some))
            .unwrap_or(false)
    }

    /// Distinct category labels in order of first appearance.
    pub fn category_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = Vec::new();
        for i in 0..self.size() {
            if let Some(cat) = self.category(i) {
                if !order.contains(&cat) {
                    order.push(cat);
                }
            }
        }
        order
    }

    /// Count of nonzero cells outside the diagonal.
    pub fn dependency_count(&self) -> usize {
        let mut count = 0;
        for (i, row) in self.weights.iter().enumerate() {
            count += row
                .iter()
                .enumerate()
                .filter(|(j, w)| *j != i && **w > 0)
                .count();
        }
        count
    }

    /// Build a private copy restricted to the given entity indices, in order.
    pub fn restricted(&self, keep: &[usize]) -> Matrix {
        let entities = keep.iter().map(|&i| self.entities[i].clone()).collect();
        let weights = keep
            .iter()
            .map(|&i| keep.iter().map(|&j| self.weights[i][j]).collect())
            .collect();
        let categories = self
            .categories
            .as_ref()
            .map(|c| keep.iter().map(|&i| c[i].clone()).collect());
        Matrix {
            entities,
            categories,
            weights,
        }
    }
}
