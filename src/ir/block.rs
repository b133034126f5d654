//! Basic blocks and the block partitioner.
//!
//! The builder stamps every instruction with its block id while emitting it, so partitioning is a
//! single scan that starts a new block whenever the stamped id changes. Block ids are dense,
//! start at 0 and never decrease along the stream.

use crate::{
    ir::{CompilationUnit, InstrId, VarId},
    utils::{graph::NodeId, BitSet},
};

/// Identifier of a basic block; also the vertex id of the block in the control-flow graph.
pub type BlockId = NodeId;

/// A maximal straight-line run of instructions.
///
/// Besides its instructions a block caches the two sets liveness needs:
///
/// - `def`: variables assigned anywhere in the block
/// - `ue_var`: variables read in the block before any assignment to them in the block
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    id: BlockId,
    instructions: Vec<InstrId>,
    def: BitSet<VarId>,
    ue_var: BitSet<VarId>,
}

impl BasicBlock {
    /// Returns the block id.
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the instruction ids in program order.
    #[must_use]
    pub fn instructions(&self) -> &[InstrId] {
        &self.instructions
    }

    /// Returns the first instruction.
    #[must_use]
    pub fn first(&self) -> Option<InstrId> {
        self.instructions.first().copied()
    }

    /// Returns the last instruction.
    #[must_use]
    pub fn last(&self) -> Option<InstrId> {
        self.instructions.last().copied()
    }

    /// Returns the number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` if the block holds no instruction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Returns the position of `instr` within the block.
    #[must_use]
    pub fn position(&self, instr: InstrId) -> Option<usize> {
        self.instructions.iter().position(|&id| id == instr)
    }

    /// Variables assigned in this block.
    #[must_use]
    pub fn def(&self) -> &BitSet<VarId> {
        &self.def
    }

    /// Variables read in this block before being assigned in it.
    #[must_use]
    pub fn ue_var(&self) -> &BitSet<VarId> {
        &self.ue_var
    }

    /// Variables of the universe not assigned in this block.
    #[must_use]
    pub fn not_killed(&self) -> BitSet<VarId> {
        let mut kept = BitSet::full(self.def.domain_size());
        kept.difference_with(&self.def);
        kept
    }
}

/// Splits the stream of `unit` into basic blocks by the block ids it is stamped with.
///
/// The result is indexed by block id. Each block's `def` and `ue_var` sets range over all
/// variables of the unit.
///
/// # Examples
///
/// ```rust
/// use tacflow::{ast::{Expr, Stmt}, ir::partition, CompilationUnit};
///
/// let program = Stmt::compound(vec![
///     Stmt::decl_int("x", Some(Expr::int(1))),
///     Stmt::if_then(Expr::var("x"), Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(2)))),
/// ]);
/// let unit = CompilationUnit::from_ast(&program.into())?;
///
/// let blocks = partition(&unit);
/// assert_eq!(blocks.len(), 3);
/// assert_eq!(blocks[1].len(), 1);
/// # Ok::<(), tacflow::Error>(())
/// ```
#[must_use]
pub fn partition(unit: &CompilationUnit) -> Vec<BasicBlock> {
    let universe = unit.variables().len();
    let mut blocks: Vec<BasicBlock> = Vec::with_capacity(unit.block_count());

    for instr in unit.instructions() {
        let stamped = instr.block();
        if !matches!(blocks.last(), Some(block) if block.id == stamped) {
            debug_assert_eq!(
                stamped.index(),
                blocks.len(),
                "block ids must be dense and non-decreasing along the stream"
            );
            blocks.push(BasicBlock {
                id: stamped,
                instructions: Vec::new(),
                def: BitSet::new(universe),
                ue_var: BitSet::new(universe),
            });
        }

        let Some(block) = blocks.last_mut() else {
            unreachable!("a block was pushed above");
        };
        for used in unit.used_variables(instr) {
            if !block.def.contains(used) {
                block.ue_var.insert(used);
            }
        }
        if let Some(defined) = instr.target_var() {
            block.def.insert(defined);
        }
        block.instructions.push(instr.id());
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Stmt};

    fn unit_of(stmts: Vec<Stmt>) -> CompilationUnit {
        CompilationUnit::from_ast(&Stmt::compound(stmts).into()).unwrap()
    }

    #[test]
    fn test_partition_follows_stamps() {
        let unit = unit_of(vec![
            Stmt::decl_int("x", Some(Expr::int(1))),
            Stmt::if_else(
                Expr::var("x"),
                Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(2))),
                Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(3))),
            ),
        ]);
        let blocks = partition(&unit);

        assert_eq!(blocks.len(), unit.block_count());
        for (i, block) in blocks.iter().enumerate() {
            assert_eq!(block.id().index(), i);
            assert!(!block.is_empty());
            for &instr in block.instructions() {
                assert_eq!(unit[instr].block(), block.id());
            }
        }
        let total: usize = blocks.iter().map(BasicBlock::len).sum();
        assert_eq!(total, unit.len());
    }

    #[test]
    fn test_def_and_upward_exposed() {
        // a is read before the block assigns it; x and y are assigned before their reads
        let unit = unit_of(vec![
            Stmt::decl_int("a", None),
            Stmt::decl_int("x", Some(Expr::var("a"))),
            Stmt::decl_int("y", Some(Expr::add(Expr::var("x"), Expr::int(1)))),
            Stmt::expr(Expr::assign(Expr::var("a"), Expr::var("y"))),
        ]);
        let blocks = partition(&unit);
        assert_eq!(blocks.len(), 1);

        let var = |name: &str| {
            unit.variables()
                .iter()
                .find(|v| v.name() == Some(name))
                .map(|v| v.id())
                .unwrap()
        };
        let block = &blocks[0];
        assert!(block.ue_var().contains(var("a")));
        assert!(!block.ue_var().contains(var("x")));
        assert!(!block.ue_var().contains(var("y")));
        assert!(block.def().contains(var("a")));
        assert!(block.def().contains(var("x")));
        assert!(!block.not_killed().contains(var("y")));
        assert_eq!(block.not_killed().count(), 0);
    }

    #[test]
    fn test_empty_unit_has_no_blocks() {
        assert!(partition(&CompilationUnit::new()).is_empty());
    }
}
