//! Owned directed graph with typed node and edge payloads.
//!
//! [`DirectedGraph`] stores node payloads in insertion order and keeps both outgoing and
//! incoming adjacency lists, so successor and predecessor queries are O(degree). Parallel edges
//! are allowed and keep their own payloads, which the control-flow graph relies on when a
//! conditional branch targets the block that also follows it.

use crate::{
    utils::graph::{
        node::{EdgeId, NodeId},
        traits::{GraphBase, Predecessors, Successors},
    },
    Error, Result,
};

#[derive(Debug, Clone)]
struct EdgeData<E> {
    source: NodeId,
    target: NodeId,
    data: E,
}

/// A directed graph with node payloads `N` and edge payloads `E`.
///
/// # Examples
///
/// ```rust
/// use tacflow::utils::graph::{DirectedGraph, Successors};
///
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let a = graph.add_node("a");
/// let b = graph.add_node("b");
/// graph.add_edge(a, b, ())?;
///
/// assert_eq!(graph.successors(a).collect::<Vec<_>>(), vec![b]);
/// # Ok::<(), tacflow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirectedGraph<N, E> {
    nodes: Vec<N>,
    edges: Vec<EdgeData<E>>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
}

impl<N, E> Default for DirectedGraph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> DirectedGraph<N, E> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Creates an empty graph with room for the given number of nodes and edges.
    #[must_use]
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        DirectedGraph {
            nodes: Vec::with_capacity(node_capacity),
            edges: Vec::with_capacity(edge_capacity),
            outgoing: Vec::with_capacity(node_capacity),
            incoming: Vec::with_capacity(node_capacity),
        }
    }

    /// Adds a node and returns its id.
    pub fn add_node(&mut self, data: N) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(data);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Adds an edge from `source` to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] if either endpoint does not exist.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId, data: E) -> Result<EdgeId> {
        for (role, node) in [("source", source), ("target", target)] {
            if node.index() >= self.nodes.len() {
                return Err(Error::GraphError(format!(
                    "{role} node {node} does not exist in graph with {} nodes",
                    self.nodes.len()
                )));
            }
        }

        let id = EdgeId::new(self.edges.len());
        self.edges.push(EdgeData {
            source,
            target,
            data,
        });
        self.outgoing[source.index()].push(id);
        self.incoming[target.index()].push(id);
        Ok(id)
    }

    /// Returns the payload of a node.
    #[must_use]
    pub fn node(&self, node: NodeId) -> Option<&N> {
        self.nodes.get(node.index())
    }

    /// Iterates `(id, payload)` for every node.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, data)| (NodeId::new(i), data))
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of edges, parallel edges counted individually.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the payload of an edge.
    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> Option<&E> {
        self.edges.get(edge.index()).map(|e| &e.data)
    }

    /// Returns `(source, target)` of an edge.
    #[must_use]
    pub fn edge_endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        self.edges.get(edge.index()).map(|e| (e.source, e.target))
    }

    /// Iterates `(target, payload)` for the outgoing edges of `node`, in insertion order.
    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &E)> + '_ {
        self.outgoing[node.index()].iter().map(|&edge_id| {
            let edge = &self.edges[edge_id.index()];
            (edge.target, &edge.data)
        })
    }

    /// Returns the number of outgoing edges of `node`.
    #[must_use]
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outgoing[node.index()].len()
    }

    /// Returns the number of incoming edges of `node`.
    #[must_use]
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.incoming[node.index()].len()
    }
}

impl<N, E> GraphBase for DirectedGraph<N, E> {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl<N, E> Successors for DirectedGraph<N, E> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.outgoing[node.index()]
            .iter()
            .map(|&edge_id| self.edges[edge_id.index()].target)
    }
}

impl<N, E> Predecessors for DirectedGraph<N, E> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.incoming[node.index()]
            .iter()
            .map(|&edge_id| self.edges[edge_id.index()].source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> DirectedGraph<&'static str, u8> {
        let mut graph = DirectedGraph::new();
        let a = graph.add_node("A");
        let b = graph.add_node("B");
        let c = graph.add_node("C");
        let d = graph.add_node("D");
        graph.add_edge(a, b, 0).unwrap();
        graph.add_edge(a, c, 1).unwrap();
        graph.add_edge(b, d, 2).unwrap();
        graph.add_edge(c, d, 3).unwrap();
        graph
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph: DirectedGraph<(), ()> = DirectedGraph::default();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_diamond_adjacency() {
        let graph = diamond();
        let a = NodeId::new(0);
        let d = NodeId::new(3);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.out_degree(a), 2);
        assert_eq!(graph.in_degree(d), 2);

        let preds: Vec<NodeId> = graph.predecessors(d).collect();
        assert_eq!(preds, vec![NodeId::new(1), NodeId::new(2)]);
        assert_eq!(graph.node(d), Some(&"D"));
    }

    #[test]
    fn test_parallel_edges_keep_payloads() {
        let mut graph: DirectedGraph<(), &str> = DirectedGraph::new();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let e1 = graph.add_edge(a, b, "true").unwrap();
        let e2 = graph.add_edge(a, b, "false").unwrap();

        assert_ne!(e1, e2);
        assert_eq!(graph.successors(a).count(), 2);
        let payloads: Vec<&str> = graph.outgoing_edges(a).map(|(_, e)| *e).collect();
        assert_eq!(payloads, vec!["true", "false"]);
        assert_eq!(graph.edge_endpoints(e2), Some((a, b)));
        assert_eq!(graph.edge(e1), Some(&"true"));
    }

    #[test]
    fn test_edge_to_missing_node() {
        let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
        let a = graph.add_node(());
        let err = graph.add_edge(a, NodeId::new(5), ()).unwrap_err();
        assert!(matches!(err, Error::GraphError(_)));
    }
}
