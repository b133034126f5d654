//! Live variable analysis.
//!
//! A variable is *live* at a program point if some path from that point reads it before
//! assigning it. The IR is not in SSA form, so a block both kills and generates liveness.
//!
//! # Algorithm
//!
//! This is a backward data flow analysis over every variable of the unit, temporaries and
//! parameters included:
//!
//! - `ueVar(b)` = variables read in `b` before any assignment in `b`
//! - `notKilled(b)` = variables not assigned in `b`
//! - `LiveOut(b)` = ∪ { `LiveIn(s)` | `s` is a successor of `b` }
//! - `LiveIn(b)` = `ueVar(b)` ∪ (`LiveOut(b)` ∩ `notKilled(b)`)
//!
//! Blocks without successors have an empty `LiveOut`.

use crate::{
    analysis::dataflow::{
        framework::{DataFlowAnalysis, DataFlowCfg, Direction},
        solver::{DataFlowSolver, LivenessStrategy},
        AnalysisResults,
    },
    ir::{BasicBlock, BlockId, CompilationUnit, InstrId, VarId},
    utils::BitSet,
};

/// Live variable analysis, to be run by a [`DataFlowSolver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveVariables;

impl DataFlowAnalysis for LiveVariables {
    type Lattice = BitSet<VarId>;
    const DIRECTION: Direction = Direction::Backward;
    const NAME: &'static str = "liveness";

    fn boundary(&self, cfg: &dyn DataFlowCfg) -> Self::Lattice {
        BitSet::new(cfg.variable_count())
    }

    fn initial(&self, cfg: &dyn DataFlowCfg) -> Self::Lattice {
        BitSet::new(cfg.variable_count())
    }

    fn transfer(&self, block: &BasicBlock, live_out: &Self::Lattice) -> Self::Lattice {
        let mut live_in = live_out.clone();
        live_in.intersect_with(&block.not_killed());
        live_in.union_with(block.ue_var());
        live_in
    }
}

/// The liveness fixpoint: `LiveIn` and `LiveOut` for every block.
///
/// Two results are equal when every block has the same sets, which is how the worklist and
/// full-pass strategies are checked against each other.
#[derive(Debug, Clone, PartialEq)]
pub struct Liveness {
    live_in: Vec<BitSet<VarId>>,
    live_out: Vec<BitSet<VarId>>,
}

impl Liveness {
    /// Variables live on entry to `block`.
    ///
    /// # Panics
    ///
    /// Panics if `block` is out of range.
    #[must_use]
    pub fn live_in(&self, block: BlockId) -> &BitSet<VarId> {
        &self.live_in[block.index()]
    }

    /// Variables live on exit from `block`.
    ///
    /// # Panics
    ///
    /// Panics if `block` is out of range.
    #[must_use]
    pub fn live_out(&self, block: BlockId) -> &BitSet<VarId> {
        &self.live_out[block.index()]
    }

    /// Returns the number of blocks covered.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.live_in.len()
    }

    /// Variables live immediately before `instr`.
    ///
    /// Starts from `LiveOut` of the instruction's block and walks the block backward down to and
    /// including `instr`; each instruction first adds every variable it reads and then removes
    /// the variable it assigns. A self-copy `x = x` therefore leaves `x` dead before it, and for
    /// a block containing such an instruction the set before its first instruction can be
    /// smaller than `LiveIn`.
    ///
    /// # Panics
    ///
    /// Panics if `instr` does not appear in the block it is stamped with.
    #[must_use]
    pub fn live_set_at(
        &self,
        unit: &CompilationUnit,
        blocks: &[BasicBlock],
        instr: InstrId,
    ) -> BitSet<VarId> {
        let (block, position) = Self::locate(unit, blocks, instr);
        let mut live = self.live_out(block.id()).clone();
        for &id in block.instructions()[position..].iter().rev() {
            let current = &unit[id];
            for used in unit.used_variables(current) {
                live.insert(used);
            }
            if let Some(defined) = current.target_var() {
                live.remove(defined);
            }
        }
        live
    }

    /// Variables live immediately after `instr`.
    ///
    /// This is `LiveOut` of the block for its last instruction, and the live set before the next
    /// instruction otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `instr` does not appear in the block it is stamped with.
    #[must_use]
    pub fn live_set_after(
        &self,
        unit: &CompilationUnit,
        blocks: &[BasicBlock],
        instr: InstrId,
    ) -> BitSet<VarId> {
        let (block, position) = Self::locate(unit, blocks, instr);
        match block.instructions().get(position + 1) {
            Some(&next) => self.live_set_at(unit, blocks, next),
            None => self.live_out(block.id()).clone(),
        }
    }

    fn locate<'b>(
        unit: &CompilationUnit,
        blocks: &'b [BasicBlock],
        instr: InstrId,
    ) -> (&'b BasicBlock, usize) {
        let stamped = unit[instr].block();
        let position = blocks
            .get(stamped.index())
            .and_then(|block| block.position(instr).map(|pos| (block, pos)));
        match position {
            Some(found) => found,
            None => panic!("instruction {instr} is not in its recorded block {stamped}"),
        }
    }
}

impl From<AnalysisResults<BitSet<VarId>>> for Liveness {
    fn from(results: AnalysisResults<BitSet<VarId>>) -> Self {
        Self {
            live_in: results.in_states,
            live_out: results.out_states,
        }
    }
}

/// Solves liveness over `cfg` with the given strategy, without any caching.
#[must_use]
pub fn compute_liveness(cfg: &dyn DataFlowCfg, strategy: LivenessStrategy) -> Liveness {
    DataFlowSolver::new(LiveVariables, strategy).solve(cfg).into()
}

/// Solves liveness with both strategies and returns the result.
///
/// # Panics
///
/// Panics if the two strategies produce different fixpoints.
#[must_use]
pub fn verify_liveness(cfg: &dyn DataFlowCfg) -> Liveness {
    let worklist = compute_liveness(cfg, LivenessStrategy::Worklist);
    let full_pass = compute_liveness(cfg, LivenessStrategy::FullPass);
    if let Some(block) = (0..worklist.block_count()).find(|&b| {
        worklist.live_in[b] != full_pass.live_in[b] || worklist.live_out[b] != full_pass.live_out[b]
    }) {
        panic!(
            "liveness strategies disagree at block B{block}: worklist in={:?} out={:?}, \
             full pass in={:?} out={:?}",
            worklist.live_in[block],
            worklist.live_out[block],
            full_pass.live_in[block],
            full_pass.live_out[block]
        );
    }
    worklist
}
