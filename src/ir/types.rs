//! Value types and operators of the three-address IR.
//!
//! The IR distinguishes only two value types, [`Type::Int`] (32-bit two's complement) and
//! [`Type::Float`] (IEEE single precision), plus [`Type::None`] for instructions that produce no
//! value. Comparisons and logical negation always produce [`Type::Int`], so conditions are plain
//! integers where zero means false.

use strum::{Display, EnumCount, EnumIter};

/// Type of an IR value.
///
/// # Examples
///
/// ```rust
/// use tacflow::ir::Type;
///
/// assert_eq!(Type::Float.to_string(), "float");
/// assert!(Type::Int.is_value());
/// assert!(!Type::None.is_value());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
pub enum Type {
    /// 32-bit signed integer
    #[strum(to_string = "int")]
    Int,
    /// 32-bit IEEE float
    #[strum(to_string = "float")]
    Float,
    /// No value: labels, branches, calls of `void` functions
    #[strum(to_string = "none")]
    None,
}

impl Type {
    /// Returns `true` for [`Type::Int`] and [`Type::Float`].
    #[must_use]
    pub const fn is_value(self) -> bool {
        !matches!(self, Type::None)
    }
}

/// Operation performed by an [`Instruction`](crate::ir::Instruction).
///
/// The `Display` form is the symbol used in the textual IR dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumCount)]
pub enum Operator {
    /// `t = a + b`
    #[strum(to_string = "+")]
    Add,
    /// `t = a - b`
    #[strum(to_string = "-")]
    Sub,
    /// `t = a * b`
    #[strum(to_string = "*")]
    Mul,
    /// `t = a / b`
    #[strum(to_string = "/")]
    Div,
    /// `t = a == b`
    #[strum(to_string = "==")]
    Eq,
    /// `t = a != b`
    #[strum(to_string = "!=")]
    Ne,
    /// `t = a <= b`
    #[strum(to_string = "<=")]
    Le,
    /// `t = a >= b`
    #[strum(to_string = ">=")]
    Ge,
    /// `t = a < b`
    #[strum(to_string = "<")]
    Lt,
    /// `t = a > b`
    #[strum(to_string = ">")]
    Gt,
    /// `t = a`
    #[strum(to_string = "=")]
    Assign,
    /// `t = -a`
    #[strum(to_string = "-")]
    Minus,
    /// `t = !a`
    #[strum(to_string = "!")]
    Not,
    /// `jump L`
    #[strum(to_string = "jump")]
    Jump,
    /// `jumpfalse c L`
    #[strum(to_string = "jumpfalse")]
    JumpFalse,
    /// `L:`
    #[strum(to_string = "label")]
    Label,
    /// `push a`, one per call argument
    #[strum(to_string = "push")]
    Push,
    /// `t = call f` or `call f`
    #[strum(to_string = "call")]
    Call,
    /// `param p`, binds one function parameter
    #[strum(to_string = "param")]
    Param,
    /// `return [v]`
    #[strum(to_string = "return")]
    Return,
}

impl Operator {
    /// Returns `true` for the two-operand arithmetic and comparison operators.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        self.is_arithmetic() || self.is_comparison()
    }

    /// Returns `true` for `+ - * /`.
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div
        )
    }

    /// Returns `true` for the six comparisons, which always yield [`Type::Int`].
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Eq
                | Operator::Ne
                | Operator::Le
                | Operator::Ge
                | Operator::Lt
                | Operator::Gt
        )
    }

    /// Returns `true` for unary minus and logical not.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Operator::Minus | Operator::Not)
    }

    /// Returns `true` for `jump` and `jumpfalse`.
    #[must_use]
    pub const fn is_branch(self) -> bool {
        matches!(self, Operator::Jump | Operator::JumpFalse)
    }

    /// Returns `true` if no instruction may follow this one in the same basic block.
    #[must_use]
    pub const fn ends_block(self) -> bool {
        matches!(self, Operator::Jump | Operator::JumpFalse | Operator::Return)
    }

    /// Returns the type of the value produced from operands of type `operand`.
    #[must_use]
    pub const fn result_type(self, operand: Type) -> Type {
        match self {
            _ if self.is_comparison() => Type::Int,
            Operator::Not => Type::Int,
            Operator::Add
            | Operator::Sub
            | Operator::Mul
            | Operator::Div
            | Operator::Assign
            | Operator::Minus
            | Operator::Param => operand,
            _ => Type::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_operator_classes_are_disjoint() {
        for op in Operator::iter() {
            let classes = [op.is_binary(), op.is_unary(), op.is_branch()];
            assert!(classes.iter().filter(|&&c| c).count() <= 1, "{op:?}");
        }
        assert_eq!(Operator::iter().filter(|op| op.is_binary()).count(), 10);
        assert_eq!(Operator::COUNT, 20);
    }

    #[test]
    fn test_result_types() {
        assert_eq!(Operator::Add.result_type(Type::Float), Type::Float);
        assert_eq!(Operator::Lt.result_type(Type::Float), Type::Int);
        assert_eq!(Operator::Not.result_type(Type::Float), Type::Int);
        assert_eq!(Operator::Minus.result_type(Type::Float), Type::Float);
        assert_eq!(Operator::Jump.result_type(Type::Int), Type::None);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(Operator::Le.to_string(), "<=");
        assert_eq!(Operator::JumpFalse.to_string(), "jumpfalse");
        assert_eq!(Type::Int.to_string(), "int");
    }

    #[test]
    fn test_block_terminators() {
        let terminators: Vec<Operator> = Operator::iter().filter(|op| op.ends_block()).collect();
        assert_eq!(
            terminators,
            vec![Operator::Jump, Operator::JumpFalse, Operator::Return]
        );
    }
}
