//! Node and edge identifiers for directed graphs.
//!
//! [`NodeId`] and [`EdgeId`] are strongly-typed indices into a graph's node and edge tables.
//! In a control-flow graph the node index is the basic block id, so `NodeId::new(3)` is block 3.

use std::fmt;

index_type! {
    /// A unique identifier for a node within a directed graph.
    ///
    /// Nodes are numbered densely from zero in insertion order.
    pub struct NodeId;
}

index_type! {
    /// A unique identifier for an edge within a directed graph.
    ///
    /// Edges are numbered densely from zero in insertion order. Parallel edges between the same
    /// pair of nodes receive distinct identifiers.
    pub struct EdgeId;
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::utils::{BitSet, Idx};

    #[test]
    fn test_node_id_roundtrip() {
        let node = NodeId::new(42);
        assert_eq!(node.index(), 42);
        assert_eq!(usize::from(node), 42);
        assert_eq!(NodeId::from(42), node);
    }

    #[test]
    fn test_node_id_ordering() {
        let nodes: BTreeSet<NodeId> = [3, 1, 2].into_iter().map(NodeId::new).collect();
        let ordered: Vec<usize> = nodes.into_iter().map(NodeId::index).collect();
        assert_eq!(ordered, vec![1, 2, 3]);
    }

    #[test]
    fn test_id_formatting() {
        assert_eq!(format!("{:?}", NodeId::new(7)), "NodeId(7)");
        assert_eq!(format!("{}", NodeId::new(7)), "B7");
        assert_eq!(format!("{:?}", EdgeId::new(2)), "EdgeId(2)");
        assert_eq!(format!("{}", EdgeId::new(2)), "e2");
    }

    #[test]
    fn test_node_id_in_bitset() {
        let mut set: BitSet<NodeId> = BitSet::new(4);
        set.insert(NodeId::new(2));
        assert!(set.contains(NodeId::from_index(2)));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![NodeId::new(2)]);
    }
}
