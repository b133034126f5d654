//! Control Flow Graph implementation.
//!
//! This module provides the main [`ControlFlowGraph`] structure that wraps the basic blocks of a
//! [`CompilationUnit`] with graph semantics and gives access to dominators, liveness and
//! available expressions.

use std::{collections::BTreeSet, fmt::Write, sync::OnceLock};

use crate::{
    analysis::{
        cfg::{CfgEdge, CfgEdgeKind},
        dataflow::{
            compute_available_expressions, compute_liveness, verify_liveness,
            AvailableExpressions, DataFlowCfg, Liveness, LivenessStrategy,
        },
    },
    config::AnalysisConfig,
    ir::{partition, BasicBlock, BlockId, CompilationUnit, InstrId, Instruction, Operator, VarId},
    utils::{
        graph::{
            algorithms::{self, DominatorTree},
            DirectedGraph, GraphBase, NodeId, Predecessors, RootedGraph, Successors,
        },
        BitSet,
    },
    Error::{self, GraphError},
    Result,
};

/// A control flow graph over the basic blocks of a compilation unit.
///
/// The graph borrows the unit it was built from, so the unit cannot be mutated while an
/// analysis over it is alive. Vertex ids are block ids `0..n`; block 0 is the entry.
///
/// # Edge construction
///
/// Every block ends in at most one control transfer:
///
/// - `jump L` adds a [`CfgEdgeKind::Jump`] edge to the block of `L`.
/// - `jumpfalse c L` adds a [`CfgEdgeKind::ConditionalTrue`] edge to the next block and a
///   [`CfgEdgeKind::ConditionalFalse`] edge to the block of `L`. Both are kept when they share a
///   target.
/// - `return` adds no edge.
/// - Any other last instruction adds a [`CfgEdgeKind::Fallthrough`] edge to the next block.
///
/// Functions after the first begin with a block that has no predecessors. Together with block 0
/// these blocks are the [`entries`](Self::entries) of the graph: each one roots its own part of
/// the dominator tree and is a boundary of the data flow analyses.
///
/// # Lazy Computation
///
/// Dominators, liveness and available expressions are computed on first access and cached
/// with [`OnceLock`] for the lifetime of the graph.
///
/// # Examples
///
/// ```rust
/// use tacflow::{ast::{Expr, Stmt}, ir::BlockId, CompilationUnit, ControlFlowGraph};
///
/// // { int x = 1; if (x > 0) { x = 2; } else { x = 3; } }
/// let program = Stmt::compound(vec![
///     Stmt::decl_int("x", Some(Expr::int(1))),
///     Stmt::if_else(
///         Expr::gt(Expr::var("x"), Expr::int(0)),
///         Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(2))),
///         Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(3))),
///     ),
/// ]);
/// let unit = CompilationUnit::from_ast(&program.into())?;
/// let cfg = ControlFlowGraph::new(&unit)?;
///
/// assert_eq!(cfg.block_count(), 4);
/// let succs: Vec<_> = cfg.successors(cfg.entry()).iter().copied().collect();
/// assert_eq!(succs, vec![BlockId::new(1), BlockId::new(2)]);
/// assert_eq!(cfg.idom(BlockId::new(3)), BlockId::new(0));
/// # Ok::<(), tacflow::Error>(())
/// ```
#[derive(Debug)]
pub struct ControlFlowGraph<'u> {
    /// The unit the blocks index into.
    unit: &'u CompilationUnit,
    /// Blocks indexed by block id.
    blocks: Vec<BasicBlock>,
    /// Edges with their kinds; node payloads are unused.
    graph: DirectedGraph<(), CfgEdgeKind>,
    /// Distinct successors of each block.
    successors: Vec<BTreeSet<BlockId>>,
    /// Distinct predecessors of each block.
    predecessors: Vec<BTreeSet<BlockId>>,
    /// Block 0 and the first block of every function, ascending.
    entries: Vec<BlockId>,
    /// Blocks without successors.
    exits: Vec<BlockId>,
    /// Solver settings for the cached analyses.
    config: AnalysisConfig,
    /// Lazily computed dominator tree.
    dominators: OnceLock<DominatorTree>,
    /// Lazily computed liveness.
    liveness: OnceLock<Liveness>,
    /// Lazily computed available expressions.
    available: OnceLock<AvailableExpressions>,
}

impl<'u> ControlFlowGraph<'u> {
    /// Builds the control flow graph of `unit` with the default analysis configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the unit has no instructions, and [`Error::GraphError`] if a
    /// branch targets a label that is never placed.
    pub fn new(unit: &'u CompilationUnit) -> Result<Self> {
        Self::with_config(unit, AnalysisConfig::default())
    }

    /// Builds the control flow graph of `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the unit has no instructions, and [`Error::GraphError`] if a
    /// branch targets a label that is never placed.
    pub fn with_config(unit: &'u CompilationUnit, config: AnalysisConfig) -> Result<Self> {
        let blocks = partition(unit);
        if blocks.is_empty() {
            return Err(Error::Empty);
        }

        let block_count = blocks.len();
        let mut graph = DirectedGraph::with_capacity(block_count, block_count * 2);
        for _ in 0..block_count {
            graph.add_node(());
        }

        for block in &blocks {
            let Some(last) = block.last() else {
                continue;
            };
            let instr = &unit[last];
            let source = block.id();
            let next = BlockId::new(source.index() + 1);
            let has_next = next.index() < block_count;

            match instr.op() {
                Operator::Jump => {
                    let target = Self::branch_block(unit, instr)?;
                    graph.add_edge(source, target, CfgEdgeKind::Jump)?;
                }
                Operator::JumpFalse => {
                    if has_next {
                        graph.add_edge(source, next, CfgEdgeKind::ConditionalTrue)?;
                    }
                    let target = Self::branch_block(unit, instr)?;
                    graph.add_edge(source, target, CfgEdgeKind::ConditionalFalse)?;
                }
                Operator::Return => {}
                _ if has_next => {
                    graph.add_edge(source, next, CfgEdgeKind::Fallthrough)?;
                }
                _ => {}
            }
        }

        let mut successors = vec![BTreeSet::new(); block_count];
        let mut predecessors = vec![BTreeSet::new(); block_count];
        for block in &blocks {
            let source = block.id();
            for (target, _) in graph.outgoing_edges(source) {
                successors[source.index()].insert(target);
                predecessors[target.index()].insert(source);
            }
        }
        let exits: Vec<BlockId> = blocks
            .iter()
            .map(BasicBlock::id)
            .filter(|id| successors[id.index()].is_empty())
            .collect();

        let mut entries: Vec<BlockId> = unit
            .functions()
            .iter()
            .filter_map(|(_, signature)| unit.label_block(signature.label))
            .chain(std::iter::once(BlockId::new(0)))
            .collect();
        entries.sort_unstable();
        entries.dedup();

        log::debug!(
            "built CFG with {} blocks, {} edges and {} exits",
            block_count,
            graph.edge_count(),
            exits.len()
        );

        Ok(Self {
            unit,
            blocks,
            graph,
            successors,
            predecessors,
            entries,
            exits,
            config,
            dominators: OnceLock::new(),
            liveness: OnceLock::new(),
            available: OnceLock::new(),
        })
    }

    /// Resolves the block a branch instruction transfers control to.
    fn branch_block(unit: &CompilationUnit, instr: &Instruction) -> Result<BlockId> {
        let Some(label) = instr.branch_target() else {
            return Err(GraphError(format!(
                "branch {} has no label operand",
                instr.display(unit)
            )));
        };
        unit.label_block(label).ok_or_else(|| {
            GraphError(format!(
                "branch {} targets label {} which is never placed",
                instr.display(unit),
                unit.labels()[label]
            ))
        })
    }

    /// Returns the unit this graph was built from.
    #[must_use]
    pub fn unit(&self) -> &'u CompilationUnit {
        self.unit
    }

    /// Returns the analysis configuration.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Returns the entry block, always block 0.
    #[must_use]
    pub const fn entry(&self) -> BlockId {
        BlockId::new(0)
    }

    /// Returns block 0 followed by the first block of every later function.
    #[must_use]
    pub fn entries(&self) -> &[BlockId] {
        &self.entries
    }

    /// Returns the blocks without successors.
    #[must_use]
    pub fn exits(&self) -> &[BlockId] {
        &self.exits
    }

    /// Returns the blocks, indexed by block id.
    #[must_use]
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    /// Returns a block by id.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the number of edges, parallel edges included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the distinct successors of `block`.
    ///
    /// # Panics
    ///
    /// Panics if `block` is out of range.
    #[must_use]
    pub fn successors(&self, block: BlockId) -> &BTreeSet<BlockId> {
        &self.successors[block.index()]
    }

    /// Returns the distinct predecessors of `block`.
    ///
    /// # Panics
    ///
    /// Panics if `block` is out of range.
    #[must_use]
    pub fn predecessors(&self, block: BlockId) -> &BTreeSet<BlockId> {
        &self.predecessors[block.index()]
    }

    /// Iterates the outgoing edges of `block` in creation order.
    pub fn outgoing_edges(&self, block: BlockId) -> impl Iterator<Item = CfgEdge> + '_ {
        self.graph
            .outgoing_edges(block)
            .map(move |(target, &kind)| CfgEdge::new(block, target, kind))
    }

    /// Returns every edge, ordered by source block and then creation order.
    #[must_use]
    pub fn edges(&self) -> Vec<CfgEdge> {
        self.blocks
            .iter()
            .flat_map(|block| self.outgoing_edges(block.id()))
            .collect()
    }

    /// Returns the blocks reachable from the entry in reverse postorder.
    #[must_use]
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        algorithms::reverse_postorder(&self.graph, self.entry())
    }

    /// Returns the blocks reachable from the entry in postorder.
    #[must_use]
    pub fn postorder(&self) -> Vec<BlockId> {
        algorithms::postorder(&self.graph, self.entry())
    }

    /// Returns the set of blocks reachable from any of the [`entries`](Self::entries).
    #[must_use]
    pub fn reachable_blocks(&self) -> BitSet<BlockId> {
        let mut reachable = BitSet::new(self.block_count());
        for &entry in &self.entries {
            reachable.union_with(&algorithms::reachable(&self.graph, entry));
        }
        reachable
    }

    /// Returns the dominator tree rooted at the [`entries`](Self::entries), computing it on
    /// first use.
    #[must_use]
    pub fn dominators(&self) -> &DominatorTree {
        self.dominators
            .get_or_init(|| algorithms::compute_dominator_forest(&self.graph, &self.entries))
    }

    /// Returns the immediate dominator of `block`; every entry is its own immediate dominator.
    ///
    /// # Panics
    ///
    /// Panics if `block` is not reachable from any entry.
    #[must_use]
    pub fn idom(&self, block: BlockId) -> BlockId {
        self.dominators().idom(block)
    }

    /// Returns every block dominating `block`, `block` itself included.
    ///
    /// # Panics
    ///
    /// Panics if `block` is not reachable from any entry.
    #[must_use]
    pub fn dom_set(&self, block: BlockId) -> BTreeSet<BlockId> {
        self.dominators().dom_set(block)
    }

    /// Returns liveness computed with the configured strategy, computing it on first use.
    ///
    /// # Panics
    ///
    /// With [`AnalysisConfig::verify_liveness`] set, panics if the worklist and full-pass
    /// strategies disagree.
    #[must_use]
    pub fn liveness(&self) -> &Liveness {
        self.liveness.get_or_init(|| {
            if self.config.verify_liveness {
                verify_liveness(self)
            } else {
                compute_liveness(self, self.config.liveness)
            }
        })
    }

    /// Solves liveness afresh with `strategy`, bypassing the cache.
    #[must_use]
    pub fn compute_liveness(&self, strategy: LivenessStrategy) -> Liveness {
        compute_liveness(self, strategy)
    }

    /// Variables live on entry to `block`.
    #[must_use]
    pub fn live_in(&self, block: BlockId) -> &BitSet<VarId> {
        self.liveness().live_in(block)
    }

    /// Variables live on exit from `block`.
    #[must_use]
    pub fn live_out(&self, block: BlockId) -> &BitSet<VarId> {
        self.liveness().live_out(block)
    }

    /// Variables live immediately before `instr`.
    ///
    /// # Panics
    ///
    /// Panics if `instr` is not in the block it is stamped with.
    #[must_use]
    pub fn live_set_at(&self, instr: InstrId) -> BitSet<VarId> {
        self.liveness().live_set_at(self.unit, &self.blocks, instr)
    }

    /// Variables live immediately after `instr`.
    ///
    /// # Panics
    ///
    /// Panics if `instr` is not in the block it is stamped with.
    #[must_use]
    pub fn live_set_after(&self, instr: InstrId) -> BitSet<VarId> {
        self.liveness().live_set_after(self.unit, &self.blocks, instr)
    }

    /// Returns available expressions, computing them on first use.
    #[must_use]
    pub fn available_expressions(&self) -> &AvailableExpressions {
        self.available.get_or_init(|| {
            compute_available_expressions(self.unit, self, self.config.liveness)
        })
    }

    /// Generates a DOT representation of this CFG for visualization with Graphviz.
    ///
    /// Each block lists its instructions; the entry is green, exits are red, and conditional
    /// edges are labeled `true`/`false`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tacflow::{ast::{Expr, Stmt}, CompilationUnit, ControlFlowGraph};
    ///
    /// let program = Stmt::compound(vec![Stmt::decl_int("x", Some(Expr::int(1)))]);
    /// let unit = CompilationUnit::from_ast(&program.into())?;
    /// let dot = ControlFlowGraph::new(&unit)?.to_dot(Some("demo"));
    /// assert!(dot.starts_with("digraph CFG {"));
    /// # Ok::<(), tacflow::Error>(())
    /// ```
    #[must_use]
    pub fn to_dot(&self, title: Option<&str>) -> String {
        let mut dot = String::new();

        dot.push_str("digraph CFG {\n");
        if let Some(name) = title {
            let _ = writeln!(dot, "    label=\"CFG: {}\";", escape_dot(name));
        }
        dot.push_str("    labelloc=t;\n");
        dot.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n");
        dot.push_str("    edge [fontname=\"Courier\", fontsize=9];\n\n");

        for block in &self.blocks {
            let id = block.id();
            let is_entry = id == self.entry();
            let is_exit = self.exits.contains(&id);

            let mut label = id.to_string();
            if is_entry {
                label.push_str(" (entry)");
            }
            if is_exit {
                label.push_str(" (exit)");
            }
            label.push_str("\\l");
            for &instr in block.instructions() {
                let text = self.unit[instr].display(self.unit).to_string();
                let _ = write!(label, "{}\\l", escape_dot(&text));
            }

            let style = if is_entry {
                ", style=filled, fillcolor=lightgreen"
            } else if is_exit {
                ", style=filled, fillcolor=lightcoral"
            } else {
                ""
            };
            let _ = writeln!(dot, "    {id} [label=\"{label}\"{style}];");
        }

        dot.push('\n');

        for edge in self.edges() {
            let (edge_label, color) = match edge.kind() {
                CfgEdgeKind::Fallthrough | CfgEdgeKind::Jump => ("", "black"),
                CfgEdgeKind::ConditionalTrue => ("true", "green"),
                CfgEdgeKind::ConditionalFalse => ("false", "red"),
            };
            let _ = writeln!(
                dot,
                "    {} -> {} [label=\"{edge_label}\", color={color}];",
                edge.source(),
                edge.target()
            );
        }

        dot.push_str("}\n");
        dot
    }
}

/// Escapes a string for use inside a quoted DOT label.
fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "")
        .replace('<', "\\<")
        .replace('>', "\\>")
}

impl GraphBase for ControlFlowGraph<'_> {
    fn node_count(&self) -> usize {
        self.blocks.len()
    }
}

impl Successors for ControlFlowGraph<'_> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.successors[node.index()].iter().copied()
    }
}

impl Predecessors for ControlFlowGraph<'_> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.predecessors[node.index()].iter().copied()
    }
}

impl RootedGraph for ControlFlowGraph<'_> {
    fn entry(&self) -> NodeId {
        BlockId::new(0)
    }
}

impl DataFlowCfg for ControlFlowGraph<'_> {
    fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    fn entry(&self) -> BlockId {
        BlockId::new(0)
    }

    fn variable_count(&self) -> usize {
        self.unit.variables().len()
    }

    fn block_successors(&self, block: BlockId) -> &BTreeSet<BlockId> {
        &self.successors[block.index()]
    }

    fn block_predecessors(&self, block: BlockId) -> &BTreeSet<BlockId> {
        &self.predecessors[block.index()]
    }
}
