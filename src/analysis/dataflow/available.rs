//! Available expressions.
//!
//! A binary computation `a op b` is *available* at a point if every path from the entry computes
//! it and no path redefines `a` or `b` after the last computation. This is a forward must
//! analysis:
//!
//! - `gen(b)`: computations in `b` whose operands are not reassigned later in `b`
//! - `kill(b)`: every computation of the unit reading a variable assigned in `b`
//! - `AvailIn(entry)` = ∅, all other blocks start at the full set
//! - `AvailIn(b)` = ∩ { `AvailOut(p)` | `p` is a predecessor of `b` }
//! - `AvailOut(b)` = `gen(b)` ∪ (`AvailIn(b)` − `kill(b)`)
//!
//! Blocks without predecessors (the entries of later functions) are treated like the entry.

use std::{collections::HashMap, fmt};

use crate::{
    analysis::dataflow::{
        framework::{DataFlowAnalysis, DataFlowCfg, Direction},
        lattice::MustSet,
        solver::{DataFlowSolver, SolverStrategy},
    },
    ir::{BasicBlock, BlockId, CompilationUnit, ExpressionKey},
    utils::BitSet,
};

index_type! {
    /// Identifies a distinct computation in an [`AvailableExpressions`] table.
    pub struct ExprId;
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.index())
    }
}

/// The table of distinct computations of a unit, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
struct ExpressionTable {
    keys: Vec<ExpressionKey>,
    index: HashMap<ExpressionKey, ExprId>,
}

impl ExpressionTable {
    fn intern(&mut self, key: ExpressionKey) -> ExprId {
        *self.index.entry(key).or_insert_with(|| {
            self.keys.push(key);
            ExprId::new(self.keys.len() - 1)
        })
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Forward analysis state: the expression table plus per-block `gen` and `kill` sets.
#[derive(Debug, Clone)]
pub struct AvailableExprAnalysis {
    table: ExpressionTable,
    gen: Vec<BitSet<ExprId>>,
    kill: Vec<BitSet<ExprId>>,
}

impl AvailableExprAnalysis {
    /// Collects the computations of `unit` and the `gen`/`kill` sets of every block.
    #[must_use]
    pub fn new(unit: &CompilationUnit, blocks: &[BasicBlock]) -> Self {
        let mut table = ExpressionTable::default();
        for instr in unit.instructions() {
            if let Some(key) = ExpressionKey::of(unit, instr) {
                table.intern(key);
            }
        }

        let universe = table.len();
        let mut gen = Vec::with_capacity(blocks.len());
        let mut kill = Vec::with_capacity(blocks.len());
        for block in blocks {
            let mut block_gen = BitSet::new(universe);
            let mut block_kill = BitSet::new(universe);
            for &id in block.instructions() {
                let instr = &unit[id];
                if let Some(key) = ExpressionKey::of(unit, instr) {
                    if let Some(&expr) = table.index.get(&key) {
                        block_gen.insert(expr);
                    }
                }
                if let Some(defined) = instr.target_var() {
                    for (position, key) in table.keys.iter().enumerate() {
                        if key.reads(defined) {
                            let expr = ExprId::new(position);
                            block_gen.remove(expr);
                            block_kill.insert(expr);
                        }
                    }
                }
            }
            gen.push(block_gen);
            kill.push(block_kill);
        }

        Self { table, gen, kill }
    }

    /// Computations generated by `block`.
    #[must_use]
    pub fn gen(&self, block: BlockId) -> &BitSet<ExprId> {
        &self.gen[block.index()]
    }

    /// Computations killed by `block`.
    #[must_use]
    pub fn kill(&self, block: BlockId) -> &BitSet<ExprId> {
        &self.kill[block.index()]
    }
}

impl DataFlowAnalysis for AvailableExprAnalysis {
    type Lattice = MustSet<ExprId>;
    const DIRECTION: Direction = Direction::Forward;
    const NAME: &'static str = "available expressions";

    fn boundary(&self, _cfg: &dyn DataFlowCfg) -> Self::Lattice {
        MustSet(BitSet::new(self.table.len()))
    }

    fn initial(&self, _cfg: &dyn DataFlowCfg) -> Self::Lattice {
        MustSet(BitSet::full(self.table.len()))
    }

    fn transfer(&self, block: &BasicBlock, avail_in: &Self::Lattice) -> Self::Lattice {
        let mut out = avail_in.0.clone();
        out.difference_with(self.kill(block.id()));
        out.union_with(self.gen(block.id()));
        MustSet(out)
    }
}

/// Available expressions on entry to and exit from every block.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailableExpressions {
    table: ExpressionTable,
    avail_in: Vec<BitSet<ExprId>>,
    avail_out: Vec<BitSet<ExprId>>,
}

impl AvailableExpressions {
    /// Computations available on entry to `block`.
    ///
    /// # Panics
    ///
    /// Panics if `block` is out of range.
    #[must_use]
    pub fn available_in(&self, block: BlockId) -> &BitSet<ExprId> {
        &self.avail_in[block.index()]
    }

    /// Computations available on exit from `block`.
    ///
    /// # Panics
    ///
    /// Panics if `block` is out of range.
    #[must_use]
    pub fn available_out(&self, block: BlockId) -> &BitSet<ExprId> {
        &self.avail_out[block.index()]
    }

    /// Returns the distinct computations of the unit, indexed by [`ExprId`].
    #[must_use]
    pub fn expressions(&self) -> &[ExpressionKey] {
        &self.table.keys
    }

    /// Returns the computation with the given id.
    #[must_use]
    pub fn expression(&self, id: ExprId) -> Option<&ExpressionKey> {
        self.table.keys.get(id.index())
    }

    /// Returns the id of a computation, if the unit performs it anywhere.
    #[must_use]
    pub fn lookup(&self, key: &ExpressionKey) -> Option<ExprId> {
        self.table.index.get(key).copied()
    }

    /// Returns `true` if `key` is available on entry to `block`.
    #[must_use]
    pub fn is_available_in(&self, block: BlockId, key: &ExpressionKey) -> bool {
        self.lookup(key)
            .is_some_and(|id| self.available_in(block).contains(id))
    }

    /// Returns a value that prints the table and the per-block sets.
    #[must_use]
    pub fn display<'a>(&'a self, unit: &'a CompilationUnit) -> DisplayAvailable<'a> {
        DisplayAvailable { result: self, unit }
    }
}

/// Helper returned by [`AvailableExpressions::display`].
pub struct DisplayAvailable<'a> {
    result: &'a AvailableExpressions,
    unit: &'a CompilationUnit,
}

impl fmt::Display for DisplayAvailable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, key) in self.result.table.keys.iter().enumerate() {
            writeln!(f, "{}: {}", ExprId::new(position), key.display(self.unit))?;
        }
        let ids = |set: &BitSet<ExprId>| {
            set.iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        for block in 0..self.result.avail_in.len() {
            writeln!(
                f,
                "{}: in {{{}}} out {{{}}}",
                BlockId::new(block),
                ids(&self.result.avail_in[block]),
                ids(&self.result.avail_out[block])
            )?;
        }
        Ok(())
    }
}

/// Solves available expressions for `unit` over `cfg`.
#[must_use]
pub fn compute_available_expressions(
    unit: &CompilationUnit,
    cfg: &dyn DataFlowCfg,
    strategy: SolverStrategy,
) -> AvailableExpressions {
    let analysis = AvailableExprAnalysis::new(unit, cfg.blocks());
    let mut solver = DataFlowSolver::new(analysis, strategy);
    let results = solver.solve(cfg);
    AvailableExpressions {
        table: solver.analysis().table.clone(),
        avail_in: results.in_states.into_iter().map(|set| set.0).collect(),
        avail_out: results.out_states.into_iter().map(|set| set.0).collect(),
    }
}
