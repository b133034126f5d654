//! Control flow edge types for the CFG.
//!
//! This module defines the edge representations used in the control flow graph, recording why
//! control can pass from one basic block to another.

use strum::{Display, EnumIter};

use crate::ir::BlockId;

/// The kind of control flow represented by an edge.
///
/// # Examples
///
/// ```rust
/// use tacflow::analysis::CfgEdgeKind;
///
/// let edge_kind = CfgEdgeKind::ConditionalTrue;
/// assert!(edge_kind.is_conditional());
/// assert_eq!(edge_kind.to_string(), "true");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum CfgEdgeKind {
    /// Control runs off the end of a block into the next one.
    #[strum(serialize = "fallthrough")]
    Fallthrough,

    /// An unconditional `jump L` to the block defining `L`.
    #[strum(serialize = "jump")]
    Jump,

    /// The not-taken side of `jumpfalse c L`: the condition was non-zero and control continues
    /// with the block after the branch.
    #[strum(serialize = "true")]
    ConditionalTrue,

    /// The taken side of `jumpfalse c L`: the condition was zero and control moves to the block
    /// defining `L`.
    #[strum(serialize = "false")]
    ConditionalFalse,
}

impl CfgEdgeKind {
    /// Returns `true` if this is a conditional branch edge.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tacflow::analysis::CfgEdgeKind;
    ///
    /// assert!(CfgEdgeKind::ConditionalTrue.is_conditional());
    /// assert!(CfgEdgeKind::ConditionalFalse.is_conditional());
    /// assert!(!CfgEdgeKind::Jump.is_conditional());
    /// ```
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        matches!(self, Self::ConditionalTrue | Self::ConditionalFalse)
    }

    /// Returns `true` if the edge was created by an explicit branch instruction.
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        !matches!(self, Self::Fallthrough)
    }
}

/// An edge in the control flow graph.
///
/// # Examples
///
/// ```rust
/// use tacflow::{analysis::{CfgEdge, CfgEdgeKind}, ir::BlockId};
///
/// let edge = CfgEdge::new(BlockId::new(0), BlockId::new(1), CfgEdgeKind::Fallthrough);
/// assert_eq!(edge.target(), BlockId::new(1));
/// assert!(!edge.kind().is_conditional());
/// assert_eq!(edge.to_string(), "B0 -> B1 (fallthrough)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CfgEdge {
    /// The source block of this edge.
    source: BlockId,
    /// The target block of this edge.
    target: BlockId,
    /// The kind of control flow this edge represents.
    kind: CfgEdgeKind,
}

impl CfgEdge {
    /// Creates a new CFG edge.
    #[must_use]
    pub const fn new(source: BlockId, target: BlockId, kind: CfgEdgeKind) -> Self {
        Self {
            source,
            target,
            kind,
        }
    }

    /// Returns the source block of this edge.
    #[must_use]
    pub const fn source(&self) -> BlockId {
        self.source
    }

    /// Returns the target block of this edge.
    #[must_use]
    pub const fn target(&self) -> BlockId {
        self.target
    }

    /// Returns the kind of control flow this edge represents.
    #[must_use]
    pub const fn kind(&self) -> CfgEdgeKind {
        self.kind
    }
}

impl std::fmt::Display for CfgEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {} ({})", self.source, self.target, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_edge_kind_classification() {
        let conditional: Vec<_> = CfgEdgeKind::iter().filter(CfgEdgeKind::is_conditional).collect();
        assert_eq!(
            conditional,
            vec![CfgEdgeKind::ConditionalTrue, CfgEdgeKind::ConditionalFalse]
        );
        assert_eq!(CfgEdgeKind::iter().filter(CfgEdgeKind::is_branch).count(), 3);
    }

    #[test]
    fn test_edge_accessors() {
        let edge = CfgEdge::new(BlockId::new(2), BlockId::new(5), CfgEdgeKind::ConditionalFalse);
        assert_eq!(edge.source(), BlockId::new(2));
        assert_eq!(edge.target(), BlockId::new(5));
        assert_eq!(edge.kind(), CfgEdgeKind::ConditionalFalse);
        assert_eq!(edge.to_string(), "B2 -> B5 (false)");
    }
}
