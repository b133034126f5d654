//! Control Flow Graph (CFG) construction and analysis.
//!
//! This module builds a graph over the basic blocks of a
//! [`CompilationUnit`](crate::CompilationUnit), with traversal, dominator and data flow queries.
//!
//! # Architecture
//!
//! The CFG builds upon the generic [`crate::utils::graph::DirectedGraph`] infrastructure,
//! recording edge kinds as payloads, and keeps ordered successor and predecessor sets per block
//! for the data flow solver.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - The main CFG structure over a borrowed unit
//! - [`CfgEdge`] - Edge representation with control flow semantics
//! - [`CfgEdgeKind`] - Classification of edges (fallthrough, jump, conditional)
//!
//! # Lazy Computation
//!
//! Dominator trees, liveness and available expressions are computed lazily on first access and
//! cached for subsequent queries, using [`std::sync::OnceLock`].
//!
//! # Examples
//!
//! ```rust
//! use tacflow::{ast::{Expr, Stmt}, CompilationUnit, ControlFlowGraph};
//!
//! let program = Stmt::compound(vec![
//!     Stmt::decl_int("i", Some(Expr::int(0))),
//!     Stmt::while_loop(
//!         Expr::lt(Expr::var("i"), Expr::int(3)),
//!         Stmt::expr(Expr::assign(Expr::var("i"), Expr::add(Expr::var("i"), Expr::int(1)))),
//!     ),
//! ]);
//! let unit = CompilationUnit::from_ast(&program.into())?;
//! let cfg = ControlFlowGraph::new(&unit)?;
//!
//! for block in cfg.reverse_postorder() {
//!     println!("{block}: idom {}, live in {:?}", cfg.idom(block), cfg.live_in(block));
//! }
//! # Ok::<(), tacflow::Error>(())
//! ```
//!
//! # Thread Safety
//!
//! [`ControlFlowGraph`] is [`Send`] and [`Sync`], enabling concurrent read access after
//! construction.

mod edge;
mod graph;

pub use edge::{CfgEdge, CfgEdgeKind};
pub use graph::ControlFlowGraph;
