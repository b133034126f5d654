//! Depth-first orderings.
//!
//! - [`postorder`] - every node after all nodes reachable from it along tree edges
//! - [`reverse_postorder`] - the usual iteration order for forward data flow
//! - [`reachable`] - the set of nodes reachable from a start node
//!
//! All traversals are iterative, so deeply nested control flow cannot overflow the stack.
//! Successors are visited in the order the graph yields them.

use crate::utils::{
    graph::{NodeId, Successors},
    BitSet,
};

#[derive(Clone, Copy)]
enum Visit {
    Enter(NodeId),
    Exit(NodeId),
}

/// Returns the nodes reachable from `start` in depth-first postorder.
///
/// Returns an empty vector if `start` is not a node of the graph.
#[must_use]
pub fn postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let node_count = graph.node_count();
    if start.index() >= node_count {
        return Vec::new();
    }

    let mut visited: BitSet<NodeId> = BitSet::new(node_count);
    let mut order = Vec::with_capacity(node_count);
    let mut stack = vec![Visit::Enter(start)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(node) => {
                if !visited.insert(node) {
                    continue;
                }
                stack.push(Visit::Exit(node));

                let successors: Vec<NodeId> = graph.successors(node).collect();
                for &succ in successors.iter().rev() {
                    if !visited.contains(succ) {
                        stack.push(Visit::Enter(succ));
                    }
                }
            }
            Visit::Exit(node) => order.push(node),
        }
    }

    order
}

/// Returns the nodes reachable from `start` in reverse postorder.
///
/// In an acyclic graph this is a topological order; in general every node appears before its
/// successors except along back edges.
#[must_use]
pub fn reverse_postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut order = postorder(graph, start);
    order.reverse();
    order
}

/// Returns the set of nodes reachable from `start`, `start` included.
#[must_use]
pub fn reachable<G: Successors>(graph: &G, start: NodeId) -> BitSet<NodeId> {
    let node_count = graph.node_count();
    let mut seen = BitSet::new(node_count);
    if start.index() >= node_count {
        return seen;
    }

    let mut stack = vec![start];
    seen.insert(start);
    while let Some(node) = stack.pop() {
        for succ in graph.successors(node) {
            if seen.insert(succ) {
                stack.push(succ);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::DirectedGraph;

    fn graph_from(nodes: usize, edges: &[(usize, usize)]) -> DirectedGraph<(), ()> {
        let mut graph = DirectedGraph::new();
        for _ in 0..nodes {
            graph.add_node(());
        }
        for &(src, dst) in edges {
            graph
                .add_edge(NodeId::new(src), NodeId::new(dst), ())
                .unwrap();
        }
        graph
    }

    fn ids(order: &[NodeId]) -> Vec<usize> {
        order.iter().map(|n| n.index()).collect()
    }

    #[test]
    fn test_postorder_diamond() {
        let graph = graph_from(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        assert_eq!(ids(&postorder(&graph, NodeId::new(0))), vec![3, 1, 2, 0]);
        assert_eq!(
            ids(&reverse_postorder(&graph, NodeId::new(0))),
            vec![0, 2, 1, 3]
        );
    }

    #[test]
    fn test_postorder_with_loop() {
        // 0 -> 1 -> 2 -> 1, 1 -> 3
        let graph = graph_from(4, &[(0, 1), (1, 2), (2, 1), (1, 3)]);
        let order = reverse_postorder(&graph, NodeId::new(0));
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], NodeId::new(0));
        assert_eq!(order[1], NodeId::new(1));
    }

    #[test]
    fn test_postorder_skips_unreachable() {
        let graph = graph_from(3, &[(0, 1)]);
        assert_eq!(ids(&postorder(&graph, NodeId::new(0))), vec![1, 0]);
        assert!(postorder(&graph, NodeId::new(9)).is_empty());
    }

    #[test]
    fn test_reachable() {
        let graph = graph_from(4, &[(0, 1), (2, 3)]);
        let seen = reachable(&graph, NodeId::new(0));
        assert_eq!(seen.iter().collect::<Vec<_>>(), vec![NodeId::new(0), NodeId::new(1)]);
    }
}
