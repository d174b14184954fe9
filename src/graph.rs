//! Dependency graph built once per matrix and shared by checkers.
//!
//! Nodes are entity indices; an edge `i -> j` exists for every nonzero
//! off-diagonal cell. Self-dependencies are not edges.

use std::collections::{HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::matrix::Matrix;

/// Adjacency view of a matrix.
pub struct DependencyGraph {
    graph: DiGraph<usize, u32>,
    /// Sorted successor lists, indexed by entity.
    successors: Vec<Vec<usize>>,
    /// Sorted predecessor lists, indexed by entity.
    predecessors: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build the graph from the nonzero off-diagonal cells of a matrix.
    pub fn build(matrix: &Matrix) -> Self {
        let n = matrix.size();
        let mut graph = DiGraph::with_capacity(n, n);
        let nodes: Vec<NodeIndex> = (0..n).map(|i| graph.add_node(i)).collect();
        let mut successors = vec![Vec::new(); n];
        let mut predecessors = vec![Vec::new(); n];

        for i in 0..n {
            for j in 0..n {
                if i == j || !matrix.depends(i, j) {
                    continue;
                }
                graph.add_edge(nodes[i], nodes[j], matrix.weight(i, j));
                successors[i].push(j);
                predecessors[j].push(i);
            }
        }

        tracing::debug!(
            "built dependency graph: {} nodes, {} edges",
            n,
            graph.edge_count()
        );

        Self {
            graph,
            successors,
            predecessors,
        }
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn successors(&self, i: usize) -> &[usize] {
        &self.successors[i]
    }

    pub fn predecessors(&self, i: usize) -> &[usize] {
        &self.predecessors[i]
    }

    pub fn out_degree(&self, i: usize) -> usize {
        self.successors[i].len()
    }

    pub fn in_degree(&self, i: usize) -> usize {
        self.predecessors[i].len()
    }

    /// Entities `m` accepted by `is_mediator` with edges `from -> m` and `m -> to`.
    ///
    /// This is a two-hop lookup, not a transitive reachability query.
    pub fn intermediaries<F>(&self, from: usize, to: usize, is_mediator: F) -> Vec<usize>
    where
        F: Fn(usize) -> bool,
    {
        let into_target: HashSet<usize> = self.predecessors[to].iter().copied().collect();
        self.successors[from]
            .iter()
            .copied()
            .filter(|m| *m != from && *m != to && into_target.contains(m) && is_mediator(*m))
            .collect()
    }

    /// Strongly connected components with more than one entity.
    ///
    /// Each component is sorted by entity index and components are ordered by
    /// their smallest member. Runs Tarjan's algorithm in O(N + E).
    pub fn cyclic_components(&self) -> Vec<Vec<usize>> {
        let mut components: Vec<Vec<usize>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut members: Vec<usize> = scc.into_iter().map(|n| self.graph[n]).collect();
                members.sort_unstable();
                members
            })
            .collect();
        components.sort_by_key(|c| c[0]);
        components
    }

    /// A shortest cycle through the first member of a strongly connected component.
    ///
    /// The returned path starts and ends with the same entity.
    pub fn witness_cycle(&self, component: &[usize]) -> Vec<usize> {
        let Some(&start) = component.first() else {
            return Vec::new();
        };
        let inside: HashSet<usize> = component.iter().copied().collect();
        let mut parent: Vec<Option<usize>> = vec![None; self.node_count()];
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for &next in &self.successors[node] {
                if next == start {
                    let mut path = vec![start];
                    let mut cursor = node;
                    let mut back = Vec::new();
                    while cursor != start {
                        back.push(cursor);
                        cursor = match parent[cursor] {
                            Some(p) => p,
                            None => break,
                        };
                    }
                    back.reverse();
                    path.extend(back);
                    path.push(start);
                    return path;
                }
                if inside.contains(&next) && visited.insert(next) {
                    parent[next] = Some(node);
                    queue.push_back(next);
                }
            }
        }

        // Not a cycle: fall back to the members themselves.
        component.to_vec()
    }
}
