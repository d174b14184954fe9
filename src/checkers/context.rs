//! Shared, read-only view of one matrix during an analysis run.

use once_cell::sync::OnceCell;

use crate::graph::DependencyGraph;
use crate::matrix::Matrix;
use crate::roles::RoleMap;

/// Matrix, role assignment and lazily built dependency graph.
///
/// The graph is built at most once, on first use, and then shared by every
/// checker running against the same matrix (including checkers running in
/// parallel).
pub struct AnalysisContext<'a> {
    matrix: &'a Matrix,
    roles: &'a RoleMap,
    graph: OnceCell<DependencyGraph>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(matrix: &'a Matrix, roles: &'a RoleMap) -> Self {
        Self {
            matrix,
            roles,
            graph: OnceCell::new(),
        }
    }

    pub fn matrix(&self) -> &'a Matrix {
        self.matrix
    }

    pub fn roles(&self) -> &'a RoleMap {
        self.roles
    }

    pub fn graph(&self) -> &DependencyGraph {
        self.graph.get_or_init(|| DependencyGraph::build(self.matrix))
    }

    /// Category of entity `i`, or a bracketed entity name when uncategorized.
    pub fn category_label(&self, i: usize) -> String {
        match self.matrix.category(i) {
            Some(cat) => cat.to_string(),
            None => format!("<{}>", self.matrix.entity(i)),
        }
    }
}
