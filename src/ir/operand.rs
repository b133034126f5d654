//! Instruction operands.
//!
//! An [`Operand`] is what an instruction reads or writes. Literals and labels carry their value
//! directly; variables, arrays and instructions are ids into the arenas of the owning
//! [`CompilationUnit`], which is why type and text resolution go through the unit
//! ([`CompilationUnit::operand_type`], [`Operand::display`]).
//!
//! An `Instruction(id)` operand denotes the value computed by instruction `id`, i.e. that
//! instruction's target variable. The builder itself always refers to temporaries by variable,
//! but the form is kept so consumers can refer to results without knowing their targets.

use std::fmt;

use crate::ir::{ArrayId, CompilationUnit, InstrId, LabelId, VarId};

/// A value read or written by an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// 32-bit integer constant
    IntLiteral(i32),
    /// 32-bit float constant
    FloatLiteral(f32),
    /// Scalar variable
    Variable(VarId),
    /// A whole array; only meaningful as a declaration reference
    Array(ArrayId),
    /// Element `array[index]`
    ArrayAccess {
        /// The indexed array
        array: ArrayId,
        /// Element index, an `int` literal or variable
        index: Box<Operand>,
    },
    /// The result of another instruction
    Instruction(InstrId),
    /// A branch target or function entry
    Label(LabelId),
}

impl Operand {
    /// Returns `true` for integer and float literals.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Operand::IntLiteral(_) | Operand::FloatLiteral(_))
    }

    /// Returns `true` for operands that denote a single scalar value: literals, variables and
    /// instruction results.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Operand::IntLiteral(_)
                | Operand::FloatLiteral(_)
                | Operand::Variable(_)
                | Operand::Instruction(_)
        )
    }

    /// Returns the variable if this is a [`Operand::Variable`].
    #[must_use]
    pub const fn as_variable(&self) -> Option<VarId> {
        match self {
            Operand::Variable(var) => Some(*var),
            _ => None,
        }
    }

    /// Returns the label if this is a [`Operand::Label`].
    #[must_use]
    pub const fn as_label(&self) -> Option<LabelId> {
        match self {
            Operand::Label(label) => Some(*label),
            _ => None,
        }
    }

    /// Returns a value that prints this operand the way the IR dump does.
    #[must_use]
    pub fn display<'a>(&'a self, unit: &'a CompilationUnit) -> DisplayOperand<'a> {
        DisplayOperand {
            operand: self,
            unit,
        }
    }
}

impl From<VarId> for Operand {
    fn from(var: VarId) -> Self {
        Operand::Variable(var)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::IntLiteral(value)
    }
}

impl From<f32> for Operand {
    fn from(value: f32) -> Self {
        Operand::FloatLiteral(value)
    }
}

/// Printable view of an [`Operand`] within its unit, see [`Operand::display`].
pub struct DisplayOperand<'a> {
    operand: &'a Operand,
    unit: &'a CompilationUnit,
}

impl fmt::Display for DisplayOperand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::IntLiteral(value) => write!(f, "{value}"),
            Operand::FloatLiteral(value) => write!(f, "{value:?}"),
            Operand::Variable(var) => write!(f, "{}", self.unit.variables()[*var]),
            Operand::Array(array) => write!(f, "{}", self.unit.arrays()[*array]),
            Operand::ArrayAccess { array, index } => write!(
                f,
                "{}[{}]",
                self.unit.arrays()[*array],
                index.display(self.unit)
            ),
            Operand::Instruction(id) => match self.unit.resolve_variable(self.operand) {
                Some(var) => write!(f, "{}", self.unit.variables()[var]),
                None => write!(f, "#{}", id.index()),
            },
            Operand::Label(label) => write!(f, "{}", self.unit.labels()[*label]),
        }
    }
}
