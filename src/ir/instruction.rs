//! Three-address instructions.
//!
//! An [`Instruction`] is a triple `target = arg1 op arg2` where, depending on the operator, the
//! second argument or the target may be absent. Instructions live in the arena of their
//! [`CompilationUnit`] under a stable [`InstrId`]; program order is given separately by the
//! unit's stream, so inserting an instruction never changes the ids of the others.
//!
//! # Operand layout
//!
//! | Operator | `arg1` | `arg2` | `target` |
//! |----------|--------|--------|----------|
//! | binary (`+`, `<`, ...) | lhs | rhs | variable |
//! | `Assign` | value | - | variable or array element |
//! | `Minus`, `Not` | value | - | variable |
//! | `Jump` | label | - | - |
//! | `JumpFalse` | condition | label | - |
//! | `Label` | label | - | - |
//! | `Push` | argument | - | - |
//! | `Call` | function label | - | variable, unless `void` |
//! | `Param` | - | - | parameter variable |
//! | `Return` | optional value | - | - |

use std::fmt;

use crate::ir::{BlockId, CompilationUnit, LabelId, Operand, Operator, Type, VarId};

index_type! {
    /// Identifies an instruction in the arena of a [`CompilationUnit`].
    pub struct InstrId;
}

impl fmt::Display for InstrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

/// A single three-address instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub(crate) id: InstrId,
    pub(crate) op: Operator,
    pub(crate) arg1: Option<Operand>,
    pub(crate) arg2: Option<Operand>,
    pub(crate) target: Option<Operand>,
    pub(crate) ty: Type,
    pub(crate) block: BlockId,
}

impl Instruction {
    /// Returns the stable id of this instruction.
    #[must_use]
    pub fn id(&self) -> InstrId {
        self.id
    }

    /// Returns the operator.
    #[must_use]
    pub fn op(&self) -> Operator {
        self.op
    }

    /// Returns the first argument.
    #[must_use]
    pub fn arg1(&self) -> Option<&Operand> {
        self.arg1.as_ref()
    }

    /// Returns the second argument.
    #[must_use]
    pub fn arg2(&self) -> Option<&Operand> {
        self.arg2.as_ref()
    }

    /// Returns the written location.
    #[must_use]
    pub fn target(&self) -> Option<&Operand> {
        self.target.as_ref()
    }

    /// Returns the type of the produced value, [`Type::None`] if there is none.
    #[must_use]
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// Returns the basic block this instruction was stamped with.
    #[must_use]
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Returns the scalar variable written by this instruction.
    ///
    /// Stores into array elements write memory, not a variable, and return `None`.
    #[must_use]
    pub fn target_var(&self) -> Option<VarId> {
        self.target.as_ref().and_then(Operand::as_variable)
    }

    /// Iterates the present arguments, `arg1` first.
    pub fn args(&self) -> impl Iterator<Item = &Operand> + '_ {
        self.arg1.iter().chain(self.arg2.iter())
    }

    /// Returns the label a branch transfers control to.
    #[must_use]
    pub fn branch_target(&self) -> Option<LabelId> {
        match self.op {
            Operator::Jump => self.arg1.as_ref().and_then(Operand::as_label),
            Operator::JumpFalse => self.arg2.as_ref().and_then(Operand::as_label),
            _ => None,
        }
    }

    /// Returns the label defined by a `label` instruction.
    #[must_use]
    pub fn defined_label(&self) -> Option<LabelId> {
        match self.op {
            Operator::Label => self.arg1.as_ref().and_then(Operand::as_label),
            _ => None,
        }
    }

    /// Returns `true` for a binary instruction whose arguments are both scalars.
    #[must_use]
    pub fn is_scalar_binary(&self) -> bool {
        self.op.is_binary()
            && self.arg1.as_ref().is_some_and(Operand::is_scalar)
            && self.arg2.as_ref().is_some_and(Operand::is_scalar)
    }

    /// Rewrites this instruction into the copy `target = value`, keeping its target, type and
    /// block.
    pub(crate) fn rewrite_as_copy(&mut self, value: Operand) {
        self.op = Operator::Assign;
        self.arg1 = Some(value);
        self.arg2 = None;
    }

    /// Returns a value that prints this instruction the way the IR dump does.
    #[must_use]
    pub fn display<'a>(&'a self, unit: &'a CompilationUnit) -> DisplayInstruction<'a> {
        DisplayInstruction { instr: self, unit }
    }
}

/// Printable view of an [`Instruction`] within its unit, see [`Instruction::display`].
pub struct DisplayInstruction<'a> {
    instr: &'a Instruction,
    unit: &'a CompilationUnit,
}

impl DisplayInstruction<'_> {
    fn operand(&self, operand: Option<&Operand>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match operand {
            Some(operand) => write!(f, "{}", operand.display(self.unit)),
            None => f.write_str("?"),
        }
    }
}

impl fmt::Display for DisplayInstruction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instr = self.instr;
        let op = instr.op;

        match op {
            Operator::Label => {
                self.operand(instr.arg1(), f)?;
                f.write_str(":")
            }
            Operator::Jump | Operator::Push => {
                write!(f, "{op} ")?;
                self.operand(instr.arg1(), f)
            }
            Operator::JumpFalse => {
                write!(f, "{op} ")?;
                self.operand(instr.arg1(), f)?;
                f.write_str(" ")?;
                self.operand(instr.arg2(), f)
            }
            Operator::Param => {
                write!(f, "{op} ")?;
                self.operand(instr.target(), f)
            }
            Operator::Return => {
                write!(f, "{op}")?;
                match instr.arg1() {
                    Some(value) => write!(f, " {}", value.display(self.unit)),
                    None => Ok(()),
                }
            }
            Operator::Call => {
                if let Some(target) = instr.target() {
                    write!(f, "{} = ", target.display(self.unit))?;
                }
                write!(f, "{op} ")?;
                self.operand(instr.arg1(), f)
            }
            Operator::Assign => {
                self.operand(instr.target(), f)?;
                f.write_str(" = ")?;
                self.operand(instr.arg1(), f)
            }
            Operator::Minus | Operator::Not => {
                self.operand(instr.target(), f)?;
                write!(f, " = {op}")?;
                self.operand(instr.arg1(), f)
            }
            _ => {
                self.operand(instr.target(), f)?;
                f.write_str(" = ")?;
                self.operand(instr.arg1(), f)?;
                write!(f, " {op} ")?;
                self.operand(instr.arg2(), f)
            }
        }
    }
}
