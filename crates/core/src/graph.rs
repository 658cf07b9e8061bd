//! Sparse undirected graph over dense indices.
//!
//! The merge engine models "these bounding boxes overlap" as edges between
//! item indices and asks for the connected components. Vertices are the
//! indices `0..n`; isolated vertices appear as singleton components.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

/// Undirected graph whose vertices are dense `usize` indices.
#[derive(Debug, Default)]
pub struct SparseIndexGraph {
    graph: UnGraph<usize, ()>,
}

impl SparseIndexGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
        }
    }

    /// Creates a graph with vertices `0..count` and no edges.
    pub fn with_vertices(count: usize) -> Self {
        let mut graph = UnGraph::new_undirected();
        for index in 0..count {
            graph.add_node(index);
        }
        Self { graph }
    }

    /// Grows the vertex set so that `index` is a valid vertex.
    pub fn ensure_vertex(&mut self, index: usize) {
        while self.graph.node_count() <= index {
            let next = self.graph.node_count();
            self.graph.add_node(next);
        }
    }

    /// Adds the undirected edge `a - b`, growing the vertex set as needed.
    /// Parallel edges are collapsed.
    pub fn add_edge(&mut self, a: usize, b: usize) {
        self.ensure_vertex(a.max(b));
        self.graph
            .update_edge(NodeIndex::new(a), NodeIndex::new(b), ());
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Connected components, each with ascending indices, ordered by their
    /// minimum index.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let count = self.graph.node_count();
        if count == 0 {
            return Vec::new();
        }

        let mut sets: UnionFind<usize> = UnionFind::new(count);
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
        for index in 0..count {
            groups.entry(sets.find_mut(index)).or_default().push(index);
        }

        let mut components: Vec<Vec<usize>> = groups.into_values().collect();
        components.sort_by_key(|component| component[0]);
        components
    }
}
