//! Three-address intermediate representation.
//!
//! This module holds the linear IR the rest of the crate works on:
//!
//! - [`Type`] and [`Operator`] - the value types and operations
//! - [`Operand`] - literals, variables, array elements, instruction results and labels
//! - [`VariableStore`], [`ScopeStack`], [`ArrayTable`], [`FunctionTable`], [`LabelTable`] -
//!   symbol tables
//! - [`Instruction`] - one three-address triple
//! - [`ExpressionKey`] - value identity of a binary computation
//! - [`CompilationUnit`] - owner of the instruction stream and all tables
//! - [`partition`] / [`BasicBlock`] - the block view of the stream
//!
//! A unit is produced by [`CompilationUnit::from_ast`], which lowers an [`crate::ast::Node`]
//! and stamps every instruction with its basic block.
//!
//! # Example
//!
//! ```rust
//! use tacflow::{ast::{Expr, Stmt}, CompilationUnit};
//!
//! let program = Stmt::compound(vec![
//!     Stmt::decl_int("x", Some(Expr::int(1))),
//!     Stmt::while_loop(
//!         Expr::lt(Expr::var("x"), Expr::int(10)),
//!         Stmt::expr(Expr::assign(Expr::var("x"), Expr::mul(Expr::var("x"), Expr::int(2)))),
//!     ),
//! ]);
//!
//! let unit = CompilationUnit::from_ast(&program.into())?;
//! assert_eq!(unit.block_count(), 4);
//! println!("{unit}");
//! # Ok::<(), tacflow::Error>(())
//! ```

mod block;
mod builder;
mod instruction;
mod key;
mod operand;
mod symbols;
mod types;
mod unit;
mod variable;

pub use block::{partition, BasicBlock, BlockId};
pub use instruction::{DisplayInstruction, InstrId, Instruction};
pub use key::{DisplayExpression, ExpressionKey, OperandKey};
pub use operand::{DisplayOperand, Operand};
pub use symbols::{
    ArrayId, ArrayInfo, ArrayTable, FunctionSignature, FunctionTable, LabelId, LabelInfo,
    LabelKind, LabelTable, ScopeStack, Symbol,
};
pub use types::{Operator, Type};
pub use unit::CompilationUnit;
pub use variable::{Scope, VarFlags, VarId, Variable, VariableKind, VariableStore};
