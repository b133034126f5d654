//! Program analysis over the three-address IR.
//!
//! # Architecture
//!
//! The analysis module is organized into focused sub-modules:
//!
//! - [`cfg`] - Control flow graph construction, edge kinds and dominators
//! - [`dataflow`] - The generic solver plus liveness and available expressions
//!
//! Analyses borrow the [`CompilationUnit`](crate::CompilationUnit) they describe and never
//! mutate it.
//!
//! # Usage
//!
//! ```rust
//! use tacflow::{ast::{Expr, Stmt}, CompilationUnit, ControlFlowGraph};
//!
//! let program = Stmt::compound(vec![
//!     Stmt::decl_int("x", Some(Expr::int(1))),
//!     Stmt::if_then(Expr::var("x"), Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(2)))),
//! ]);
//! let unit = CompilationUnit::from_ast(&program.into())?;
//! let cfg = ControlFlowGraph::new(&unit)?;
//!
//! let dominators = cfg.dominators();
//! for block in cfg.blocks() {
//!     assert!(dominators.dominates(cfg.entry(), block.id()));
//! }
//! # Ok::<(), tacflow::Error>(())
//! ```

pub mod cfg;
pub mod dataflow;

pub use cfg::{CfgEdge, CfgEdgeKind, ControlFlowGraph};
pub use dataflow::{
    compute_available_expressions, compute_liveness, verify_liveness, AnalysisResults,
    AvailableExprAnalysis, AvailableExpressions, DataFlowAnalysis, DataFlowCfg, DataFlowSolver,
    Direction, ExprId, LiveVariables, Liveness, LivenessStrategy, MeetSemiLattice, MustSet,
    SolverStrategy,
};
