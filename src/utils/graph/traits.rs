//! Trait definitions for graph abstractions.
//!
//! Algorithms in [`crate::utils::graph::algorithms`] are written against these traits rather
//! than a concrete graph type:
//!
//! - [`GraphBase`] - node count and node iteration
//! - [`Successors`] - outgoing adjacency
//! - [`Predecessors`] - incoming adjacency
//! - [`RootedGraph`] - a designated entry node, as required for dominators

use crate::utils::graph::NodeId;

/// Core properties shared by every graph.
pub trait GraphBase {
    /// Returns the number of nodes. Node ids are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Iterates all node ids in ascending order.
    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.node_count()).map(NodeId::new)
    }
}

/// Graphs that can enumerate the targets of a node's outgoing edges.
pub trait Successors: GraphBase {
    /// Iterates the successors of `node`. Parallel edges yield the target once per edge.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Graphs that can enumerate the sources of a node's incoming edges.
pub trait Predecessors: GraphBase {
    /// Iterates the predecessors of `node`. Parallel edges yield the source once per edge.
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// A graph with a single designated entry node.
pub trait RootedGraph: Successors + Predecessors {
    /// Returns the entry node.
    fn entry(&self) -> NodeId;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EdgeList {
        nodes: usize,
        edges: Vec<(usize, usize)>,
    }

    impl GraphBase for EdgeList {
        fn node_count(&self) -> usize {
            self.nodes
        }
    }

    impl Successors for EdgeList {
        fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
            self.edges
                .iter()
                .filter(move |(src, _)| *src == node.index())
                .map(|&(_, dst)| NodeId::new(dst))
        }
    }

    impl Predecessors for EdgeList {
        fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
            self.edges
                .iter()
                .filter(move |(_, dst)| *dst == node.index())
                .map(|&(src, _)| NodeId::new(src))
        }
    }

    impl RootedGraph for EdgeList {
        fn entry(&self) -> NodeId {
            NodeId::new(0)
        }
    }

    #[test]
    fn test_default_node_ids() {
        let graph = EdgeList {
            nodes: 3,
            edges: vec![],
        };
        let ids: Vec<NodeId> = graph.node_ids().collect();
        assert_eq!(ids, vec![NodeId::new(0), NodeId::new(1), NodeId::new(2)]);
    }

    #[test]
    fn test_adjacency() {
        let graph = EdgeList {
            nodes: 3,
            edges: vec![(0, 1), (0, 2), (1, 2)],
        };
        assert_eq!(graph.successors(NodeId::new(0)).count(), 2);
        let preds: Vec<NodeId> = graph.predecessors(NodeId::new(2)).collect();
        assert_eq!(preds, vec![NodeId::new(0), NodeId::new(1)]);
        assert_eq!(graph.entry(), NodeId::new(0));
    }
}
