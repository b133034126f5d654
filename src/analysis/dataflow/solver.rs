//! Iterative data flow solver.
//!
//! The solver computes fixpoints for any [`DataFlowAnalysis`] using one of two strategies:
//!
//! - [`SolverStrategy::Worklist`]: a pending set seeded with every block. The smallest pending
//!   block is processed; when its propagated state changes, its dependents (predecessors for a
//!   backward analysis, successors for a forward one) are added back.
//! - [`SolverStrategy::FullPass`]: round-robin sweeps. Each sweep applies the transfer function
//!   to every block and then recombines every meet, stopping once a sweep changes no combined
//!   state.
//!
//! Both strategies start from the same initial states and apply the same monotone equations,
//! so for a given analysis they reach the same fixpoint.

use std::collections::BTreeSet;

use strum::{Display, EnumIter};

use crate::{
    analysis::dataflow::{
        framework::{AnalysisResults, DataFlowAnalysis, DataFlowCfg, Direction},
        lattice::MeetSemiLattice,
    },
    ir::BlockId,
};

/// How the solver iterates to a fixpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum SolverStrategy {
    /// Revisit only blocks whose inputs changed.
    #[default]
    #[strum(serialize = "worklist")]
    Worklist,
    /// Sweep over all blocks until a sweep changes nothing.
    #[strum(serialize = "full-pass")]
    FullPass,
}

/// Strategy selector for liveness; liveness is solved by the generic solver.
pub type LivenessStrategy = SolverStrategy;

/// Data flow solver for one analysis.
///
/// # Usage
///
/// ```rust
/// use tacflow::{
///     analysis::{DataFlowSolver, LiveVariables, SolverStrategy},
///     ast::{Expr, Stmt},
///     CompilationUnit, ControlFlowGraph,
/// };
///
/// let program = Stmt::compound(vec![
///     Stmt::decl_int("x", Some(Expr::int(1))),
///     Stmt::while_loop(Expr::var("x"), Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(0)))),
/// ]);
/// let unit = CompilationUnit::from_ast(&program.into())?;
/// let cfg = ControlFlowGraph::new(&unit)?;
///
/// let mut solver = DataFlowSolver::new(LiveVariables, SolverStrategy::FullPass);
/// let results = solver.solve(&cfg);
/// assert_eq!(results.block_count(), cfg.block_count());
/// assert!(solver.iterations() > 0);
/// # Ok::<(), tacflow::Error>(())
/// ```
pub struct DataFlowSolver<A: DataFlowAnalysis> {
    /// The analysis being solved.
    analysis: A,
    /// Iteration scheme.
    strategy: SolverStrategy,
    /// Input state for each block.
    in_states: Vec<A::Lattice>,
    /// Output state for each block.
    out_states: Vec<A::Lattice>,
    /// Number of block visits (worklist) or sweeps (full pass) performed.
    iterations: usize,
}

impl<A: DataFlowAnalysis> DataFlowSolver<A> {
    /// Creates a new solver for the given analysis.
    #[must_use]
    pub fn new(analysis: A, strategy: SolverStrategy) -> Self {
        Self {
            analysis,
            strategy,
            in_states: Vec::new(),
            out_states: Vec::new(),
            iterations: 0,
        }
    }

    /// Returns the analysis this solver drives.
    #[must_use]
    pub fn analysis(&self) -> &A {
        &self.analysis
    }

    /// Solves the analysis to a fixpoint over `cfg`.
    ///
    /// The solver can be reused; each call starts from fresh initial states.
    pub fn solve(&mut self, cfg: &dyn DataFlowCfg) -> AnalysisResults<A::Lattice> {
        self.iterations = 0;
        if cfg.blocks().is_empty() {
            return AnalysisResults::new(Vec::new(), Vec::new());
        }

        self.initialize(cfg);
        match self.strategy {
            SolverStrategy::Worklist => self.iterate_worklist(cfg),
            SolverStrategy::FullPass => self.iterate_full_pass(cfg),
        }

        log::debug!(
            "{} ({}) reached a fixpoint over {} blocks after {} iterations",
            A::NAME,
            self.strategy,
            cfg.blocks().len(),
            self.iterations
        );

        AnalysisResults::new(
            std::mem::take(&mut self.in_states),
            std::mem::take(&mut self.out_states),
        )
    }

    /// Returns the number of iterations the last [`solve`](Self::solve) performed.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Initializes the solver state.
    fn initialize(&mut self, cfg: &dyn DataFlowCfg) {
        let num_blocks = cfg.blocks().len();
        let initial = self.analysis.initial(cfg);
        let boundary = self.analysis.boundary(cfg);

        self.in_states = vec![initial.clone(); num_blocks];
        self.out_states = vec![initial; num_blocks];

        for block in cfg.blocks() {
            let id = block.id();
            if Self::is_boundary(cfg, id) {
                match A::DIRECTION {
                    Direction::Forward => self.in_states[id.index()] = boundary.clone(),
                    Direction::Backward => self.out_states[id.index()] = boundary.clone(),
                }
            }
        }
    }

    /// Returns `true` if `block` holds the boundary value on its incoming side.
    fn is_boundary(cfg: &dyn DataFlowCfg, block: BlockId) -> bool {
        match A::DIRECTION {
            Direction::Forward => {
                block == cfg.entry() || cfg.block_predecessors(block).is_empty()
            }
            Direction::Backward => cfg.block_successors(block).is_empty(),
        }
    }

    /// Meets the states flowing into `block`, or `None` for boundary blocks.
    fn combine(&self, cfg: &dyn DataFlowCfg, block: BlockId) -> Option<A::Lattice> {
        if Self::is_boundary(cfg, block) {
            return None;
        }
        let (sources, states) = match A::DIRECTION {
            Direction::Forward => (cfg.block_predecessors(block), &self.out_states),
            Direction::Backward => (cfg.block_successors(block), &self.in_states),
        };

        let mut result: Option<A::Lattice> = None;
        for source in sources {
            let state = &states[source.index()];
            match result.as_mut() {
                None => result = Some(state.clone()),
                Some(acc) => {
                    acc.meet_with(state);
                }
            }
        }
        result
    }

    /// Recombines the incoming side of `block`. Returns `true` if it changed.
    fn update_meet(&mut self, cfg: &dyn DataFlowCfg, block: BlockId) -> bool {
        let Some(combined) = self.combine(cfg, block) else {
            return false;
        };
        let slot = match A::DIRECTION {
            Direction::Forward => &mut self.in_states[block.index()],
            Direction::Backward => &mut self.out_states[block.index()],
        };
        if *slot == combined {
            false
        } else {
            *slot = combined;
            true
        }
    }

    /// Applies the transfer function of `block`. Returns `true` if the result changed.
    fn update_transfer(&mut self, cfg: &dyn DataFlowCfg, block: BlockId) -> bool {
        let data = &cfg.blocks()[block.index()];
        let (source, target) = match A::DIRECTION {
            Direction::Forward => (&self.in_states, &mut self.out_states),
            Direction::Backward => (&self.out_states, &mut self.in_states),
        };
        let result = self.analysis.transfer(data, &source[block.index()]);
        let slot = &mut target[block.index()];
        if *slot == result {
            false
        } else {
            *slot = result;
            true
        }
    }

    /// Worklist iteration: the smallest pending block is processed first.
    fn iterate_worklist(&mut self, cfg: &dyn DataFlowCfg) {
        let mut pending: BTreeSet<BlockId> = cfg.blocks().iter().map(|b| b.id()).collect();

        while let Some(block) = pending.pop_first() {
            self.iterations += 1;
            self.update_meet(cfg, block);
            if self.update_transfer(cfg, block) {
                log::trace!("{}: state of {block} changed", A::NAME);
                let affected = match A::DIRECTION {
                    Direction::Forward => cfg.block_successors(block),
                    Direction::Backward => cfg.block_predecessors(block),
                };
                pending.extend(affected.iter().copied());
            }
        }
    }

    /// Full-pass iteration: transfer every block, then meet every block, until the meets are
    /// stable.
    fn iterate_full_pass(&mut self, cfg: &dyn DataFlowCfg) {
        let ids: Vec<BlockId> = cfg.blocks().iter().map(|b| b.id()).collect();
        loop {
            self.iterations += 1;
            for &block in &ids {
                self.update_transfer(cfg, block);
            }
            let mut changed = false;
            for &block in &ids {
                changed |= self.update_meet(cfg, block);
            }
            if !changed {
                break;
            }
            log::trace!("{}: full pass {} changed", A::NAME, self.iterations);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{dataflow::MustSet, ControlFlowGraph},
        ast::{Expr, Stmt},
        ir::{BasicBlock, CompilationUnit},
        utils::BitSet,
    };

    /// Forward reachability: a block is marked once any path from the entry reaches it.
    struct Reached;

    impl DataFlowAnalysis for Reached {
        type Lattice = BitSet;
        const DIRECTION: Direction = Direction::Forward;
        const NAME: &'static str = "reached";

        fn boundary(&self, cfg: &dyn DataFlowCfg) -> BitSet {
            BitSet::new(cfg.blocks().len())
        }

        fn initial(&self, cfg: &dyn DataFlowCfg) -> BitSet {
            BitSet::new(cfg.blocks().len())
        }

        fn transfer(&self, block: &BasicBlock, input: &BitSet) -> BitSet {
            let mut out = input.clone();
            out.insert(block.id().index());
            out
        }
    }

    /// Forward must-analysis: blocks on every path from the entry.
    struct OnEveryPath;

    impl DataFlowAnalysis for OnEveryPath {
        type Lattice = MustSet;
        const DIRECTION: Direction = Direction::Forward;
        const NAME: &'static str = "on-every-path";

        fn boundary(&self, cfg: &dyn DataFlowCfg) -> MustSet {
            MustSet(BitSet::new(cfg.blocks().len()))
        }

        fn initial(&self, cfg: &dyn DataFlowCfg) -> MustSet {
            MustSet(BitSet::full(cfg.blocks().len()))
        }

        fn transfer(&self, block: &BasicBlock, input: &MustSet) -> MustSet {
            let mut out = input.clone();
            out.0.insert(block.id().index());
            out
        }
    }

    fn diamond_in_loop() -> CompilationUnit {
        let program = Stmt::compound(vec![
            Stmt::decl_int("i", Some(Expr::int(0))),
            Stmt::while_loop(
                Expr::lt(Expr::var("i"), Expr::int(3)),
                Stmt::if_else(
                    Expr::var("i"),
                    Stmt::expr(Expr::assign(Expr::var("i"), Expr::int(5))),
                    Stmt::expr(Expr::assign(
                        Expr::var("i"),
                        Expr::add(Expr::var("i"), Expr::int(1)),
                    )),
                ),
            ),
        ]);
        CompilationUnit::from_ast(&program.into()).unwrap()
    }

    #[test]
    fn test_strategies_agree() {
        let unit = diamond_in_loop();
        let cfg = ControlFlowGraph::new(&unit).unwrap();

        let worklist = DataFlowSolver::new(OnEveryPath, SolverStrategy::Worklist).solve(&cfg);
        let full = DataFlowSolver::new(OnEveryPath, SolverStrategy::FullPass).solve(&cfg);
        assert_eq!(worklist, full);

        let worklist = DataFlowSolver::new(Reached, SolverStrategy::Worklist).solve(&cfg);
        let full = DataFlowSolver::new(Reached, SolverStrategy::FullPass).solve(&cfg);
        assert_eq!(worklist, full);
    }

    #[test]
    fn test_must_analysis_is_dominance() {
        let unit = diamond_in_loop();
        let cfg = ControlFlowGraph::new(&unit).unwrap();
        let results = DataFlowSolver::new(OnEveryPath, SolverStrategy::Worklist).solve(&cfg);
        let dominators = cfg.dominators();

        for block in cfg.blocks() {
            let on_every_path = &results.out_state(block.id()).unwrap().0;
            for other in cfg.blocks() {
                assert_eq!(
                    on_every_path.contains(other.id().index()),
                    dominators.dominates(other.id(), block.id()),
                    "{} vs {}",
                    other.id(),
                    block.id()
                );
            }
        }
    }

    #[test]
    fn test_boundary_is_kept() {
        let unit = diamond_in_loop();
        let cfg = ControlFlowGraph::new(&unit).unwrap();
        let results = DataFlowSolver::new(Reached, SolverStrategy::Worklist).solve(&cfg);
        let entry = results.in_state(cfg.entry()).unwrap();
        assert!(entry.is_empty());
    }

    #[test]
    fn test_iterations_are_counted() {
        let unit = diamond_in_loop();
        let cfg = ControlFlowGraph::new(&unit).unwrap();
        let mut solver = DataFlowSolver::new(Reached, SolverStrategy::Worklist);
        solver.solve(&cfg);
        assert!(solver.iterations() >= cfg.block_count());

        let mut solver = DataFlowSolver::new(Reached, SolverStrategy::FullPass);
        solver.solve(&cfg);
        assert!(solver.iterations() >= 1);
    }
}
