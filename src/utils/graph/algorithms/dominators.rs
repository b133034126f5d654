//! Dominator tree computation using the Lengauer-Tarjan algorithm.
//!
//! A node `d` **dominates** a node `n` if every path from the entry node to `n` passes through
//! `d`. The **immediate dominator** of `n` is the unique strict dominator of `n` that does not
//! strictly dominate any other strict dominator of `n`. Making every node's immediate dominator
//! its parent yields the dominator tree, rooted at the entry.
//!
//! # Algorithm
//!
//! Lengauer-Tarjan with path compression ("simple" variant), O(E log V):
//!
//! 1. **DFS numbering** from the entry, recording the spanning-tree parent of every node
//! 2. **Semidominators** in reverse DFS order via a link-eval forest
//! 3. **Implicit idoms** from the bucket of each node's parent
//! 4. **Explicit idoms** in DFS order
//!
//! # Several roots
//!
//! [`compute_dominator_forest`] accepts more than one root, for graphs holding several
//! independent single-entry regions. A virtual node with an edge to every root is added and the
//! algorithm runs from it; every root then is its own immediate dominator and the dominators of
//! any other node stop at the root of its region. A node reached from two roots without a common
//! dominator below the virtual node becomes a root itself.
//!
//! Nodes that are not reachable from any root have no dominators; queries that require one
//! treat such a request as a caller bug.

use std::collections::BTreeSet;

use crate::utils::graph::{NodeId, Predecessors, RootedGraph, Successors};

const UNDEFINED: usize = usize::MAX;

/// Result of dominator tree computation.
///
/// # Examples
///
/// ```rust
/// use tacflow::utils::graph::{algorithms::compute_dominators, DirectedGraph};
///
/// // entry -> a -> b
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let entry = graph.add_node("entry");
/// let a = graph.add_node("a");
/// let b = graph.add_node("b");
/// graph.add_edge(entry, a, ())?;
/// graph.add_edge(a, b, ())?;
///
/// let tree = compute_dominators(&graph, entry);
/// assert!(tree.dominates(entry, b));
/// assert_eq!(tree.idom(b), a);
/// assert_eq!(tree.idom(entry), entry);
/// # Ok::<(), tacflow::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DominatorTree {
    entry: NodeId,
    /// `Some(node)` for roots, `None` for nodes no root reaches.
    idom: Vec<Option<NodeId>>,
}

impl DominatorTree {
    /// Returns the primary entry node of the dominator tree.
    #[inline]
    #[must_use]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns `true` if `node` is a root, i.e. its own immediate dominator.
    #[must_use]
    pub fn is_root(&self, node: NodeId) -> bool {
        self.idom.get(node.index()).copied().flatten() == Some(node)
    }

    /// Returns every root in ascending order.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        (0..self.idom.len())
            .map(NodeId::new)
            .filter(|&node| self.is_root(node))
            .collect()
    }

    /// Returns the number of nodes of the analyzed graph.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.idom.len()
    }

    /// Returns `true` if `node` is reachable from a root.
    #[must_use]
    pub fn is_reachable(&self, node: NodeId) -> bool {
        self.idom.get(node.index()).is_some_and(Option::is_some)
    }

    /// Returns the immediate dominator of `node`, or `None` for roots and for unreachable
    /// nodes.
    #[must_use]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        self.idom
            .get(node.index())
            .copied()
            .flatten()
            .filter(|&idom| idom != node)
    }

    /// Returns the immediate dominator of `node`, where a root is its own immediate dominator.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not reachable from a root.
    #[must_use]
    pub fn idom(&self, node: NodeId) -> NodeId {
        match self.idom.get(node.index()).copied().flatten() {
            Some(idom) => idom,
            None => panic!("{node} is unreachable from every root and has no dominator"),
        }
    }

    /// Checks whether `a` dominates `b`. Every reachable node dominates itself.
    ///
    /// Returns `false` if `b` is unreachable.
    #[must_use]
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        if !self.is_reachable(b) {
            return false;
        }
        self.dominators(b).any(|d| d == a)
    }

    /// Checks whether `a` dominates `b` and `a != b`.
    #[inline]
    #[must_use]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Iterates the dominators of `node`, from `node` itself up to and including its root.
    ///
    /// The walk stops at the first node that is its own immediate dominator, comparing node
    /// ids. An unreachable node yields only itself.
    pub fn dominators(&self, node: NodeId) -> DominatorIterator<'_> {
        DominatorIterator {
            tree: self,
            current: Some(node),
        }
    }

    /// Returns the dominator set of `node`: the node, its idom chain and its root.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not reachable from a root.
    #[must_use]
    pub fn dom_set(&self, node: NodeId) -> BTreeSet<NodeId> {
        assert!(
            self.is_reachable(node),
            "{node} is unreachable from every root and has no dominator set"
        );
        self.dominators(node).collect()
    }

    /// Returns the depth of `node` in the dominator tree; roots have depth 0.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not reachable from a root.
    #[must_use]
    pub fn depth(&self, node: NodeId) -> usize {
        self.dom_set(node).len() - 1
    }

    /// Returns the nodes whose immediate dominator is `node`, in ascending order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.idom
            .iter()
            .enumerate()
            .filter(|&(i, idom)| *idom == Some(node) && i != node.index())
            .map(|(i, _)| NodeId::new(i))
            .collect()
    }
}

/// Iterator over the dominators of a node, from the node up to its root.
pub struct DominatorIterator<'a> {
    tree: &'a DominatorTree,
    current: Option<NodeId>,
}

impl Iterator for DominatorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.current?;
        self.current = match self.tree.idom.get(current.index()).copied().flatten() {
            Some(idom) if idom != current => Some(idom),
            _ => None,
        };
        Some(current)
    }
}

/// Computes the dominator tree of `graph` rooted at `entry`.
///
/// # Examples
///
/// ```rust
/// use tacflow::utils::graph::{algorithms::compute_dominators, DirectedGraph};
///
/// //      entry
/// //      /   \
/// //     a     b
/// //      \   /
/// //       exit
/// let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
/// let entry = graph.add_node(());
/// let a = graph.add_node(());
/// let b = graph.add_node(());
/// let exit = graph.add_node(());
/// graph.add_edge(entry, a, ())?;
/// graph.add_edge(entry, b, ())?;
/// graph.add_edge(a, exit, ())?;
/// graph.add_edge(b, exit, ())?;
///
/// let tree = compute_dominators(&graph, entry);
/// assert_eq!(tree.immediate_dominator(exit), Some(entry));
/// assert!(!tree.strictly_dominates(a, exit));
/// # Ok::<(), tacflow::Error>(())
/// ```
pub fn compute_dominators<G>(graph: &G, entry: NodeId) -> DominatorTree
where
    G: Successors + Predecessors,
{
    compute_dominator_forest(graph, &[entry])
}

/// Computes dominators of `graph` from several roots; `roots[0]` is reported as the entry.
///
/// Roots out of range are ignored. With a single root this is [`compute_dominators`].
///
/// # Examples
///
/// ```rust
/// use tacflow::utils::graph::{algorithms::compute_dominator_forest, DirectedGraph};
///
/// // f -> a, g -> b: two regions without edges between them
/// let mut graph: DirectedGraph<(), ()> = DirectedGraph::new();
/// let f = graph.add_node(());
/// let a = graph.add_node(());
/// let g = graph.add_node(());
/// let b = graph.add_node(());
/// graph.add_edge(f, a, ())?;
/// graph.add_edge(g, b, ())?;
///
/// let tree = compute_dominator_forest(&graph, &[f, g]);
/// assert_eq!(tree.idom(g), g);
/// assert_eq!(tree.idom(b), g);
/// assert!(!tree.dominates(f, b));
/// # Ok::<(), tacflow::Error>(())
/// ```
pub fn compute_dominator_forest<G>(graph: &G, roots: &[NodeId]) -> DominatorTree
where
    G: Successors + Predecessors,
{
    let node_count = graph.node_count();
    let entry = roots.first().copied().unwrap_or_else(|| NodeId::new(0));

    // Node `node_count` is the virtual root.
    let virtual_root = node_count;
    let mut succs: Vec<Vec<usize>> = (0..node_count)
        .map(|node| {
            graph
                .successors(NodeId::new(node))
                .map(NodeId::index)
                .collect()
        })
        .collect();
    let mut preds: Vec<Vec<usize>> = (0..node_count)
        .map(|node| {
            graph
                .predecessors(NodeId::new(node))
                .map(NodeId::index)
                .collect()
        })
        .collect();
    let mut virtual_succs = Vec::with_capacity(roots.len());
    for root in roots.iter().map(|root| root.index()) {
        if root < node_count && !virtual_succs.contains(&root) {
            virtual_succs.push(root);
            preds[root].push(virtual_root);
        }
    }
    succs.push(virtual_succs);
    preds.push(Vec::new());

    let mut lt = LengauerTarjan::new(node_count + 1);
    lt.compute(&succs, &preds, virtual_root);

    let idom = (0..node_count)
        .map(|node| match (lt.dfnum[node], lt.idom[node]) {
            (0, _) => None,
            (_, idom) if idom == virtual_root => Some(NodeId::new(node)),
            (_, idom) => Some(NodeId::new(idom)),
        })
        .collect();

    DominatorTree { entry, idom }
}

/// Computes the dominator tree of a [`RootedGraph`] from its own entry.
pub fn compute_dominators_rooted<G: RootedGraph>(graph: &G) -> DominatorTree {
    compute_dominators(graph, graph.entry())
}

/// Working state of the Lengauer-Tarjan algorithm. All vectors are indexed by node index and
/// hold node indices, with [`UNDEFINED`] as the absent value.
struct LengauerTarjan {
    /// 1-based DFS preorder number, 0 = not reached
    dfnum: Vec<usize>,
    /// Node carrying each DFS number (shifted by one)
    vertex: Vec<usize>,
    parent: Vec<usize>,
    semi: Vec<usize>,
    idom: Vec<usize>,
    /// Link-eval forest
    ancestor: Vec<usize>,
    best: Vec<usize>,
    bucket: Vec<Vec<usize>>,
    reached: usize,
}

impl LengauerTarjan {
    fn new(n: usize) -> Self {
        Self {
            dfnum: vec![0; n],
            vertex: vec![UNDEFINED; n],
            parent: vec![UNDEFINED; n],
            semi: (0..n).collect(),
            idom: vec![UNDEFINED; n],
            ancestor: vec![UNDEFINED; n],
            best: (0..n).collect(),
            bucket: vec![Vec::new(); n],
            reached: 0,
        }
    }

    fn compute(&mut self, succs: &[Vec<usize>], preds: &[Vec<usize>], entry: usize) {
        self.number(succs, entry);

        for i in (1..self.reached).rev() {
            let w = self.vertex[i];
            let p = self.parent[w];

            for &v in &preds[w] {
                if self.dfnum[v] == 0 {
                    continue;
                }
                let u = self.eval(v);
                if self.dfnum[self.semi[u]] < self.dfnum[self.semi[w]] {
                    self.semi[w] = self.semi[u];
                }
            }

            let s = self.semi[w];
            self.bucket[s].push(w);
            self.ancestor[w] = p;

            for v in std::mem::take(&mut self.bucket[p]) {
                let u = self.eval(v);
                self.idom[v] = if self.semi[u] == self.semi[v] { p } else { u };
            }
        }

        for i in 1..self.reached {
            let w = self.vertex[i];
            if self.idom[w] != self.semi[w] {
                self.idom[w] = self.idom[self.idom[w]];
            }
        }

        self.idom[entry] = entry;
    }

    /// Iterative DFS assigning preorder numbers and spanning-tree parents.
    fn number(&mut self, succs: &[Vec<usize>], entry: usize) {
        let mut stack = vec![(entry, UNDEFINED)];

        while let Some((node, parent)) = stack.pop() {
            if self.dfnum[node] != 0 {
                continue;
            }
            self.reached += 1;
            self.dfnum[node] = self.reached;
            self.vertex[self.reached - 1] = node;
            self.parent[node] = parent;

            for &succ in succs[node].iter().rev() {
                if self.dfnum[succ] == 0 {
                    stack.push((succ, node));
                }
            }
        }
    }

    /// Returns the node with the smallest semidominator on the forest path above `v`.
    fn eval(&mut self, v: usize) -> usize {
        if self.ancestor[v] == UNDEFINED {
            return v;
        }
        self.compress(v);
        self.best[v]
    }

    fn compress(&mut self, v: usize) {
        let mut path = Vec::new();
        let mut x = v;
        while self.ancestor[self.ancestor[x]] != UNDEFINED {
            path.push(x);
            x = self.ancestor[x];
        }

        for &y in path.iter().rev() {
            let a = self.ancestor[y];
            if self.dfnum[self.semi[self.best[a]]] < self.dfnum[self.semi[self.best[y]]] {
                self.best[y] = self.best[a];
            }
            self.ancestor[y] = self.ancestor[a];
        }
    }
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

    fn n(i: usize) -> NodeId {
        NodeId::new(i)
    }

    #[test]
    fn test_dominator_single_node() {
        let graph = graph_from(1, &[]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.entry(), n(0));
        assert_eq!(tree.immediate_dominator(n(0)), None);
        assert_eq!(tree.idom(n(0)), n(0));
        assert_eq!(tree.dom_set(n(0)), BTreeSet::from([n(0)]));
        assert_eq!(tree.depth(n(0)), 0);
    }

    #[test]
    fn test_dominator_linear_chain() {
        let graph = graph_from(4, &[(0, 1), (1, 2), (2, 3)]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(tree.immediate_dominator(n(2)), Some(n(1)));
        assert_eq!(tree.immediate_dominator(n(3)), Some(n(2)));
        assert!(tree.dominates(n(1), n(3)));
        assert!(!tree.dominates(n(3), n(1)));
        assert_eq!(tree.depth(n(3)), 3);
        assert_eq!(
            tree.dominators(n(3)).collect::<Vec<_>>(),
            vec![n(3), n(2), n(1), n(0)]
        );
    }

    #[test]
    fn test_dominator_if_then_else() {
        //   0 -> 1 -> {2, 3} -> 4 -> 5
        let graph = graph_from(6, &[(0, 1), (1, 2), (1, 3), (2, 4), (3, 4), (4, 5)]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.idom(n(2)), n(1));
        assert_eq!(tree.idom(n(3)), n(1));
        assert_eq!(tree.idom(n(4)), n(1));
        assert_eq!(tree.idom(n(5)), n(4));
        assert!(!tree.strictly_dominates(n(2), n(4)));
        assert_eq!(tree.children(n(1)), vec![n(2), n(3), n(4)]);
    }

    #[test]
    fn test_dominator_loop() {
        // 0 -> 1 (header) -> 2 (body) -> 1, 1 -> 3 (exit)
        let graph = graph_from(4, &[(0, 1), (1, 2), (2, 1), (1, 3)]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.idom(n(1)), n(0));
        assert_eq!(tree.idom(n(2)), n(1));
        assert_eq!(tree.idom(n(3)), n(1));
        assert!(tree.dominates(n(1), n(2)));
        assert!(!tree.dominates(n(2), n(1)));
    }

    #[test]
    fn test_dominator_two_diamonds() {
        // Two sequential if/else diamonds sharing the join block 3.
        let graph = graph_from(
            7,
            &[
                (0, 1),
                (0, 2),
                (1, 3),
                (2, 3),
                (3, 4),
                (3, 5),
                (4, 6),
                (5, 6),
            ],
        );
        let tree = compute_dominators(&graph, n(0));

        let idoms: Vec<usize> = (0..7).map(|i| tree.idom(n(i)).index()).collect();
        assert_eq!(idoms, vec![0, 0, 0, 0, 3, 3, 3]);
        assert_eq!(tree.dom_set(n(6)), BTreeSet::from([n(0), n(3), n(6)]));
    }

    #[test]
    fn test_dominator_irreducible() {
        // 0 -> 1, 0 -> 2, 1 <-> 2, both -> 3
        let graph = graph_from(4, &[(0, 1), (0, 2), (1, 2), (2, 1), (1, 3), (2, 3)]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.idom(n(1)), n(0));
        assert_eq!(tree.idom(n(2)), n(0));
        assert_eq!(tree.idom(n(3)), n(0));
    }

    #[test]
    fn test_dominator_nested_semidominator() {
        // Block 2 is entered both from 1 and from the 3 -> 4 path, so its semidominator
        // differs from the DFS parent.
        let graph = graph_from(5, &[(0, 1), (1, 2), (2, 3), (0, 3), (3, 4), (4, 2)]);
        let tree = compute_dominators(&graph, n(0));

        assert_eq!(tree.idom(n(1)), n(0));
        assert_eq!(tree.idom(n(2)), n(0));
        assert_eq!(tree.idom(n(3)), n(0));
        assert_eq!(tree.idom(n(4)), n(3));
    }

    #[test]
    fn test_dominator_unreachable_node() {
        let graph = graph_from(3, &[(0, 1)]);
        let tree = compute_dominators(&graph, n(0));

        assert!(tree.is_reachable(n(1)));
        assert!(!tree.is_reachable(n(2)));
        assert_eq!(tree.immediate_dominator(n(2)), None);
        assert!(!tree.dominates(n(0), n(2)));
    }

    #[test]
    fn test_dominator_forest_separate_regions() {
        // 0 -> 1 -> {2, 3}; 4 -> 5 -> 4 (loop at the second root), 5 -> 6
        let graph = graph_from(7, &[(0, 1), (1, 2), (1, 3), (4, 5), (5, 4), (5, 6)]);
        let tree = compute_dominator_forest(&graph, &[n(0), n(4)]);

        assert_eq!(tree.entry(), n(0));
        assert_eq!(tree.roots(), vec![n(0), n(4)]);
        assert_eq!(tree.idom(n(3)), n(1));
        assert_eq!(tree.idom(n(4)), n(4));
        assert_eq!(tree.immediate_dominator(n(4)), None);
        assert_eq!(tree.idom(n(5)), n(4));
        assert_eq!(tree.idom(n(6)), n(5));
        assert_eq!(tree.dom_set(n(6)), BTreeSet::from([n(4), n(5), n(6)]));
        assert!(!tree.dominates(n(0), n(6)));
        assert!((0..7).all(|i| tree.is_reachable(n(i))));
    }

    #[test]
    fn test_dominator_forest_matches_single_root() {
        let graph = graph_from(5, &[(0, 1), (1, 2), (2, 3), (0, 3), (3, 4), (4, 2)]);
        assert_eq!(
            compute_dominator_forest(&graph, &[n(0), n(0)]),
            compute_dominators(&graph, n(0))
        );
    }

    #[test]
    fn test_dominator_forest_shared_node_becomes_root() {
        // both roots reach 2
        let graph = graph_from(4, &[(0, 2), (1, 2), (2, 3)]);
        let tree = compute_dominator_forest(&graph, &[n(0), n(1)]);

        assert!(tree.is_root(n(2)));
        assert_eq!(tree.idom(n(3)), n(2));
        assert_eq!(tree.roots(), vec![n(0), n(1), n(2)]);
    }

    #[test]
    fn test_dominator_entry_out_of_range() {
        let graph = graph_from(2, &[(0, 1)]);
        let tree = compute_dominators(&graph, n(5));
        assert_eq!(tree.entry(), n(5));
        assert!(!tree.is_reachable(n(0)));
        assert!(tree.roots().is_empty());
    }

    #[test]
    #[should_panic(expected = "unreachable")]
    fn test_dominator_idom_of_unreachable_panics() {
        let graph = graph_from(2, &[]);
        let tree = compute_dominators(&graph, n(0));
        let _ = tree.idom(n(1));
    }
}
