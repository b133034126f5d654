//! Data flow analysis framework trait and direction.
//!
//! This module defines the core abstraction for data flow analyses. A specific analysis
//! (liveness, available expressions) implements [`DataFlowAnalysis`] and is driven to a fixpoint
//! by the [`DataFlowSolver`](super::DataFlowSolver) over any graph implementing
//! [`DataFlowCfg`].

use std::collections::BTreeSet;

use crate::{
    analysis::dataflow::lattice::MeetSemiLattice,
    ir::{BasicBlock, BlockId},
};

/// Direction of data flow analysis.
///
/// The direction determines how information propagates through the CFG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Information flows forward, from entry to exit.
    ///
    /// At join points (blocks with multiple predecessors), values from all predecessors are
    /// combined using the meet operation.
    ///
    /// Examples: available expressions.
    Forward,

    /// Information flows backward, from exit to entry.
    ///
    /// At split points (blocks with multiple successors), values from all successors are
    /// combined.
    ///
    /// Examples: live variables.
    Backward,
}

/// The view of a control-flow graph the solver needs.
///
/// Blocks are identified by dense ids `0..blocks().len()`; adjacency is returned as ordered
/// sets so every strategy visits neighbors in the same order.
pub trait DataFlowCfg {
    /// Returns the blocks, indexed by block id.
    fn blocks(&self) -> &[BasicBlock];

    /// Returns the entry block.
    fn entry(&self) -> BlockId;

    /// Returns the number of variables the per-block `def`/`ue_var` sets range over.
    fn variable_count(&self) -> usize;

    /// Returns the successors of `block`.
    fn block_successors(&self, block: BlockId) -> &BTreeSet<BlockId>;

    /// Returns the predecessors of `block`.
    fn block_predecessors(&self, block: BlockId) -> &BTreeSet<BlockId>;
}

/// A data flow analysis over basic blocks.
///
/// Implementations provide the transfer function and boundary conditions; the solver handles
/// iteration to a fixpoint.
///
/// For forward analyses: `out[B] = transfer(B, in[B])`.
/// For backward analyses: `in[B] = transfer(B, out[B])`.
///
/// # Boundary
///
/// Forward analyses assign [`boundary`](Self::boundary) to the input of the entry block and of
/// every block without predecessors. Backward analyses assign it to the output of every block
/// without successors. All other states start at [`initial`](Self::initial).
pub trait DataFlowAnalysis {
    /// The abstract value tracked per program point.
    type Lattice: MeetSemiLattice;

    /// Propagation direction.
    const DIRECTION: Direction;

    /// Short name used in log output.
    const NAME: &'static str;

    /// The value at the boundary of the graph.
    fn boundary(&self, cfg: &dyn DataFlowCfg) -> Self::Lattice;

    /// The value every non-boundary state starts from.
    fn initial(&self, cfg: &dyn DataFlowCfg) -> Self::Lattice;

    /// Transforms the state flowing through `block`.
    fn transfer(&self, block: &BasicBlock, input: &Self::Lattice) -> Self::Lattice;
}

/// Results of a data flow analysis: the state before and after every block.
///
/// "Before" and "after" follow program order regardless of direction, so for a backward
/// analysis `in_state` is the value at the top of the block.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResults<L> {
    /// Input state for each block (top of the block).
    pub in_states: Vec<L>,
    /// Output state for each block (bottom of the block).
    pub out_states: Vec<L>,
}

impl<L> AnalysisResults<L> {
    /// Creates new analysis results with the given states.
    #[must_use]
    pub fn new(in_states: Vec<L>, out_states: Vec<L>) -> Self {
        Self {
            in_states,
            out_states,
        }
    }

    /// Returns the input state for a block, or `None` if the id is out of bounds.
    #[must_use]
    pub fn in_state(&self, block: BlockId) -> Option<&L> {
        self.in_states.get(block.index())
    }

    /// Returns the output state for a block, or `None` if the id is out of bounds.
    #[must_use]
    pub fn out_state(&self, block: BlockId) -> Option<&L> {
        self.out_states.get(block.index())
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.in_states.len()
    }
}
