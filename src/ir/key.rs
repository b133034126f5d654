//! Hashable keys for scalar operands and binary computations.
//!
//! Local value numbering and available expressions both identify a computation by its operator
//! and the *values* it reads, not by the instruction that computes it. An operand that refers to
//! an earlier instruction is keyed by the variable that instruction assigned, so `x + 1` written
//! against `x` directly and against the instruction that defined `x` produce the same key.

use std::fmt;

use crate::ir::{CompilationUnit, Instruction, Operand, Operator, VarId};

/// The value identity of a scalar operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperandKey {
    /// An integer literal.
    Int(i32),
    /// A float literal, keyed by its bit pattern.
    Float(u32),
    /// A scalar variable.
    Var(VarId),
}

impl OperandKey {
    /// Keys a scalar operand, or returns `None` for array, label and dangling operands.
    #[must_use]
    pub fn of(unit: &CompilationUnit, operand: &Operand) -> Option<Self> {
        match operand {
            Operand::IntLiteral(value) => Some(Self::Int(*value)),
            Operand::FloatLiteral(value) => Some(Self::Float(value.to_bits())),
            Operand::Variable(_) | Operand::Instruction(_) => {
                unit.resolve_variable(operand).map(Self::Var)
            }
            Operand::Array(_) | Operand::ArrayAccess { .. } | Operand::Label(_) => None,
        }
    }

    /// Returns the variable this key reads, if any.
    #[must_use]
    pub fn variable(self) -> Option<VarId> {
        match self {
            Self::Var(var) => Some(var),
            Self::Int(_) | Self::Float(_) => None,
        }
    }

    /// Rebuilds the operand this key denotes.
    #[must_use]
    pub fn to_operand(self) -> Operand {
        match self {
            Self::Int(value) => Operand::IntLiteral(value),
            Self::Float(bits) => Operand::FloatLiteral(f32::from_bits(bits)),
            Self::Var(var) => Operand::Variable(var),
        }
    }
}

/// The value identity of a binary computation: `(lhs, operator, rhs)`.
///
/// Operand order is significant; `a + b` and `b + a` are distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionKey {
    /// Key of the first operand.
    pub lhs: OperandKey,
    /// The binary operator.
    pub op: Operator,
    /// Key of the second operand.
    pub rhs: OperandKey,
}

impl ExpressionKey {
    /// Keys a binary instruction whose operands are both scalar.
    #[must_use]
    pub fn of(unit: &CompilationUnit, instr: &Instruction) -> Option<Self> {
        if !instr.is_scalar_binary() {
            return None;
        }
        Some(Self {
            lhs: OperandKey::of(unit, instr.arg1()?)?,
            op: instr.op(),
            rhs: OperandKey::of(unit, instr.arg2()?)?,
        })
    }

    /// Returns `true` if the computation reads `var`.
    #[must_use]
    pub fn reads(&self, var: VarId) -> bool {
        self.lhs.variable() == Some(var) || self.rhs.variable() == Some(var)
    }

    /// Returns `true` if both operands are literals.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.lhs.variable().is_none() && self.rhs.variable().is_none()
    }

    /// Returns a value that prints this key with the unit's variable names.
    #[must_use]
    pub fn display<'a>(&'a self, unit: &'a CompilationUnit) -> DisplayExpression<'a> {
        DisplayExpression { key: self, unit }
    }
}

/// Helper returned by [`ExpressionKey::display`].
pub struct DisplayExpression<'a> {
    key: &'a ExpressionKey,
    unit: &'a CompilationUnit,
}

impl fmt::Display for DisplayExpression<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lhs = self.key.lhs.to_operand();
        let rhs = self.key.rhs.to_operand();
        write!(
            f,
            "{} {} {}",
            lhs.display(self.unit),
            self.key.op,
            rhs.display(self.unit)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Stmt};

    #[test]
    fn test_instruction_operands_key_by_variable() {
        // { int x = 1; int y = x + 2; }
        let program = Stmt::compound(vec![
            Stmt::decl_int("x", Some(Expr::int(1))),
            Stmt::decl_int("y", Some(Expr::add(Expr::var("x"), Expr::int(2)))),
        ]);
        let unit = CompilationUnit::from_ast(&program.into()).unwrap();
        let x = unit[unit.stream()[0]].target_var().unwrap();
        let add = &unit[unit.stream()[1]];

        let key = ExpressionKey::of(&unit, add).unwrap();
        assert_eq!(key.lhs, OperandKey::Var(x));
        assert_eq!(key.op, Operator::Add);
        assert_eq!(key.rhs, OperandKey::Int(2));
        assert!(key.reads(x));
        assert!(!key.is_constant());
        assert_eq!(key.display(&unit).to_string(), "x0:1:0 + 2");

        let via_instruction = Operand::Instruction(unit.stream()[0]);
        assert_eq!(
            OperandKey::of(&unit, &via_instruction),
            Some(OperandKey::Var(x))
        );
    }

    #[test]
    fn test_non_binary_has_no_key() {
        let program = Stmt::compound(vec![Stmt::decl_int("x", Some(Expr::int(1)))]);
        let unit = CompilationUnit::from_ast(&program.into()).unwrap();
        assert!(ExpressionKey::of(&unit, &unit[unit.stream()[0]]).is_none());
    }

    #[test]
    fn test_float_keys_round_trip() {
        let key = OperandKey::of(&CompilationUnit::new(), &Operand::FloatLiteral(2.5)).unwrap();
        assert_eq!(key.to_operand(), Operand::FloatLiteral(2.5));
        assert_eq!(key.variable(), None);
    }
}
