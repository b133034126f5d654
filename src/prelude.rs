//! # tacflow Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! of the crate. Import it to get quick access to the AST constructors, the IR, the analyses
//! and the pipeline.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all tacflow operations
pub use crate::Error;

/// The result type used throughout tacflow
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Pipeline orchestration and its configuration
pub use crate::{
    AnalysisConfig, CompilationReport, LvnConfig, Pipeline, PipelineConfig,
};

// ================================================================================================
// Syntax Tree
// ================================================================================================

/// AST node types and constructors
pub use crate::ast::{
    AstType, BinaryOp, Expr, FunctionDef, FunctionPrototype, Item, Node, Parameter, Stmt,
    UnaryOp,
};

// ================================================================================================
// Intermediate Representation
// ================================================================================================

/// The compilation unit and its instructions
pub use crate::ir::{
    partition, BasicBlock, BlockId, CompilationUnit, ExpressionKey, InstrId, Instruction,
    Operand, Operator, Type, VarId, Variable,
};

// ================================================================================================
// Analysis
// ================================================================================================

/// Control flow graph and data flow results
pub use crate::analysis::{
    AvailableExpressions, CfgEdge, CfgEdgeKind, ControlFlowGraph, Liveness, LivenessStrategy,
};

/// Dominator tree
pub use crate::utils::graph::algorithms::DominatorTree;

/// Dense bit sets used by the analyses
pub use crate::utils::BitSet;

// ================================================================================================
// Optimization
// ================================================================================================

/// Passes, scheduling and change events
pub use crate::compiler::{EventKind, EventLog, IrPass, LocalValueNumberingPass, PassScheduler};
