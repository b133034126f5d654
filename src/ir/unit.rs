//! The compilation unit: owner of all IR of one program.

use std::fmt;

use crate::{
    ast::Node,
    ir::{
        builder::IrBuilder, ArrayTable, BlockId, FunctionSignature, FunctionTable, InstrId,
        Instruction, LabelId, LabelTable, Operand, Operator, Type, VarFlags, VarId, VariableStore,
    },
    Result,
};

/// All IR of one translated program.
///
/// The unit owns the instruction arena, the program-order stream of instruction ids, and the
/// variable, array, function and label tables. Analyses such as the
/// [`ControlFlowGraph`](crate::analysis::ControlFlowGraph) borrow the unit immutably; passes
/// such as local value numbering borrow it mutably, so an analysis can never observe a stream
/// that changed after it was built.
///
/// # Examples
///
/// ```rust
/// use tacflow::{ast::{Expr, Stmt}, CompilationUnit};
///
/// // { int x = 1; int y = x + 2; }
/// let program = Stmt::compound(vec![
///     Stmt::decl_int("x", Some(Expr::int(1))),
///     Stmt::decl_int("y", Some(Expr::add(Expr::var("x"), Expr::int(2)))),
/// ]);
///
/// let unit = CompilationUnit::from_ast(&program.into())?;
/// assert_eq!(unit.to_string(), "x0:1:0 = 1\ny0:1:0 = x0:1:0 + 2\n");
/// # Ok::<(), tacflow::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    arena: Vec<Instruction>,
    stream: Vec<InstrId>,
    variables: VariableStore,
    arrays: ArrayTable,
    functions: FunctionTable,
    labels: LabelTable,
}

impl CompilationUnit {
    /// Creates an empty unit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowers an AST into a new unit.
    ///
    /// # Errors
    ///
    /// Returns a translation error (see [`crate::Error`]) for undeclared names, type mismatches,
    /// duplicate declarations, arity mismatches and non-assignable targets.
    pub fn from_ast(root: &Node) -> Result<Self> {
        IrBuilder::new().build(root)
    }

    /// Returns the number of instructions in the stream.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stream.len()
    }

    /// Returns `true` if the stream holds no instruction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    /// Returns the instruction ids in program order.
    #[must_use]
    pub fn stream(&self) -> &[InstrId] {
        &self.stream
    }

    /// Iterates the instructions in program order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.stream.iter().map(|&id| &self.arena[id.index()])
    }

    /// Returns an instruction by id.
    #[must_use]
    pub fn instruction(&self, id: InstrId) -> Option<&Instruction> {
        self.arena.get(id.index())
    }

    pub(crate) fn instruction_mut(&mut self, id: InstrId) -> &mut Instruction {
        &mut self.arena[id.index()]
    }

    /// Returns the variable arena.
    #[must_use]
    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub(crate) fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.variables
    }

    /// Returns the array table.
    #[must_use]
    pub fn arrays(&self) -> &ArrayTable {
        &self.arrays
    }

    pub(crate) fn arrays_mut(&mut self) -> &mut ArrayTable {
        &mut self.arrays
    }

    /// Returns the function table.
    #[must_use]
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Registers a function prototype or definition, creating its entry label on first sight.
    pub(crate) fn declare_function(
        &mut self,
        name: &str,
        return_type: Type,
        params: Vec<Type>,
        define: bool,
    ) -> Result<FunctionSignature> {
        self.functions
            .declare(name, return_type, params, define, || {
                self.labels.function(name)
            })
            .cloned()
    }

    /// Returns the label table.
    #[must_use]
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub(crate) fn labels_mut(&mut self) -> &mut LabelTable {
        &mut self.labels
    }

    /// Returns the number of basic blocks the stream is stamped with.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.instructions()
            .last()
            .map_or(0, |instr| instr.block().index() + 1)
    }

    /// Returns the block of the instruction defining `label`, if the label has been placed.
    #[must_use]
    pub fn label_block(&self, label: LabelId) -> Option<BlockId> {
        let site = self.labels.get(label)?.site?;
        self.instruction(site).map(Instruction::block)
    }

    /// Returns the type of an operand.
    #[must_use]
    pub fn operand_type(&self, operand: &Operand) -> Type {
        match operand {
            Operand::IntLiteral(_) => Type::Int,
            Operand::FloatLiteral(_) => Type::Float,
            Operand::Variable(var) => self.variables[*var].ty(),
            Operand::Array(array) | Operand::ArrayAccess { array, .. } => {
                self.arrays[*array].element
            }
            Operand::Instruction(id) => self.arena[id.index()].ty(),
            Operand::Label(_) => Type::None,
        }
    }

    /// Returns the scalar variable an operand denotes: the variable itself, or the target of
    /// the referenced instruction.
    #[must_use]
    pub fn resolve_variable(&self, operand: &Operand) -> Option<VarId> {
        match operand {
            Operand::Variable(var) => Some(*var),
            Operand::Instruction(id) => self.instruction(*id).and_then(Instruction::target_var),
            _ => None,
        }
    }

    /// Returns the scalar variables an instruction reads, in operand order.
    ///
    /// Array element operands contribute their index variable, on either side of the
    /// instruction. Duplicates are kept.
    #[must_use]
    pub fn used_variables(&self, instr: &Instruction) -> Vec<VarId> {
        let mut uses = Vec::with_capacity(2);
        for operand in instr.args() {
            self.collect_uses(operand, &mut uses);
        }
        if let Some(Operand::ArrayAccess { index, .. }) = instr.target() {
            self.collect_uses(index, &mut uses);
        }
        uses
    }

    fn collect_uses(&self, operand: &Operand, uses: &mut Vec<VarId>) {
        match operand {
            Operand::ArrayAccess { index, .. } => self.collect_uses(index, uses),
            _ => uses.extend(self.resolve_variable(operand)),
        }
    }

    /// Appends a new instruction stamped with `block` and returns its id.
    ///
    /// The result type is derived from the operator and the argument types.
    ///
    /// # Panics
    ///
    /// Panics if a binary instruction is given arguments of different types.
    pub(crate) fn emit(
        &mut self,
        op: Operator,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        target: Option<Operand>,
        block: BlockId,
    ) -> InstrId {
        let instr = self.make(op, arg1, arg2, target, block);
        let id = instr.id;
        self.arena.push(instr);
        self.stream.push(id);
        id
    }

    /// Places a new copy `target = value` at stream position `position`, shifting the
    /// instructions from `position` on by one.
    pub(crate) fn insert_copy(
        &mut self,
        position: usize,
        target: VarId,
        value: Operand,
        block: BlockId,
    ) -> InstrId {
        let instr = self.make(
            Operator::Assign,
            Some(value),
            None,
            Some(Operand::Variable(target)),
            block,
        );
        let id = instr.id;
        self.arena.push(instr);
        self.stream.insert(position, id);
        id
    }

    /// Creates a temporary of the given type.
    pub(crate) fn new_temporary(&mut self, ty: Type, flags: VarFlags) -> VarId {
        self.variables.temporary(ty, flags)
    }

    fn make(
        &self,
        op: Operator,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        target: Option<Operand>,
        block: BlockId,
    ) -> Instruction {
        let arg_type = |arg: &Option<Operand>| {
            arg.as_ref()
                .map_or(Type::None, |operand| self.operand_type(operand))
        };

        let ty = match op {
            _ if op.is_binary() => {
                let (lhs, rhs) = (arg_type(&arg1), arg_type(&arg2));
                assert_eq!(
                    lhs, rhs,
                    "binary `{op}` instruction built from {lhs} and {rhs} operands"
                );
                op.result_type(lhs)
            }
            Operator::Assign | Operator::Minus | Operator::Not => op.result_type(arg_type(&arg1)),
            Operator::Param | Operator::Call => arg_type(&target),
            _ => Type::None,
        };

        Instruction {
            id: InstrId::new(self.arena.len()),
            op,
            arg1,
            arg2,
            target,
            ty,
            block,
        }
    }
}

impl std::ops::Index<InstrId> for CompilationUnit {
    type Output = Instruction;

    fn index(&self, id: InstrId) -> &Instruction {
        &self.arena[id.index()]
    }
}

impl fmt::Display for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in self.instructions() {
            writeln!(f, "{}", instr.display(self))?;
        }
        Ok(())
    }
}
