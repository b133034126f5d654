//! Data flow analysis framework over basic blocks.
//!
//! This module provides a generic framework for computing properties that propagate along
//! control-flow edges. It supports both forward and backward analyses.
//!
//! # Architecture
//!
//! The framework is built around three core abstractions:
//!
//! - **Lattice**: the domain of abstract values and how they combine at merge points
//! - **Analysis**: transfer functions and boundary conditions
//! - **Solver**: iterates to a fixpoint with a worklist or with full passes
//!
//! # Analyses Provided
//!
//! - [`LiveVariables`] / [`Liveness`]: which variables may still be read at each block boundary
//! - [`AvailableExprAnalysis`] / [`AvailableExpressions`]: which computations are already
//!   available on every incoming path
//!
//! # Example
//!
//! ```rust
//! use tacflow::{
//!     analysis::{compute_liveness, LivenessStrategy},
//!     ast::{Expr, Stmt},
//!     CompilationUnit, ControlFlowGraph,
//! };
//!
//! let program = Stmt::compound(vec![
//!     Stmt::decl_int("x", Some(Expr::int(1))),
//!     Stmt::if_then(Expr::var("x"), Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(2)))),
//! ]);
//! let unit = CompilationUnit::from_ast(&program.into())?;
//! let cfg = ControlFlowGraph::new(&unit)?;
//!
//! let liveness = compute_liveness(&cfg, LivenessStrategy::FullPass);
//! assert_eq!(&liveness, cfg.liveness());
//! # Ok::<(), tacflow::Error>(())
//! ```

mod available;
mod framework;
mod lattice;
mod liveness;
mod solver;

pub use available::{
    compute_available_expressions, AvailableExprAnalysis, AvailableExpressions,
    DisplayAvailable, ExprId,
};
pub use framework::{AnalysisResults, DataFlowAnalysis, DataFlowCfg, Direction};
pub use lattice::{MeetSemiLattice, MustSet};
pub use liveness::{compute_liveness, verify_liveness, LiveVariables, Liveness};
pub use solver::{DataFlowSolver, LivenessStrategy, SolverStrategy};
