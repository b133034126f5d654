// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # tacflow
//!
//! A compiler middle end for a small C-like language. `tacflow` lowers an abstract syntax tree
//! into linear three-address code, partitions it into basic blocks, builds a control-flow graph
//! with dominator and live-variable information, and optimizes blocks with local value
//! numbering.
//!
//! ## Features
//!
//! - **Three-address IR** - Typed triples with scoped variables, shadowing and block stamps
//! - **Control flow graph** - Fallthrough, jump and conditional edges with DOT output
//! - **Dominators** - Lengauer-Tarjan immediate dominators and dominator sets
//! - **Data flow** - A generic solver with liveness and available expressions
//! - **Local value numbering** - Common subexpression elimination and constant folding
//!
//! ## Quick Start
//!
//! ### Using the Prelude
//!
//! ```rust
//! use tacflow::prelude::*;
//!
//! // { int x = 1; float y = 3.0; if (x > 0) { y = y * 1.5; } else { y = y + 2.0; } }
//! let program = Stmt::compound(vec![
//!     Stmt::decl_int("x", Some(Expr::int(1))),
//!     Stmt::decl_float("y", Some(Expr::float(3.0))),
//!     Stmt::if_else(
//!         Expr::gt(Expr::var("x"), Expr::int(0)),
//!         Stmt::expr(Expr::assign(Expr::var("y"), Expr::mul(Expr::var("y"), Expr::float(1.5)))),
//!         Stmt::expr(Expr::assign(Expr::var("y"), Expr::add(Expr::var("y"), Expr::float(2.0)))),
//!     ),
//! ]);
//!
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let unit = pipeline.compile(&program.into())?;
//! let cfg = pipeline.analyze(&unit)?;
//!
//! assert_eq!(cfg.block_count(), 4);
//! assert_eq!(cfg.idom(BlockId::new(3)), BlockId::new(0));
//! # Ok::<(), tacflow::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `tacflow` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`ast`] - The input syntax tree
//! - [`ir`] - Three-address code, symbol tables and the block partition
//! - [`analysis`] - CFG, dominators and data flow analyses
//! - [`compiler`] - Optimization passes, the pass scheduler and change events
//! - [`Pipeline`] and [`PipelineConfig`] - End-to-end orchestration
//! - [`Error`] and [`Result`] - Error handling
//!
//! ### Staleness
//!
//! Analyses borrow the [`CompilationUnit`] they were built from, and passes take it mutably.
//! A [`ControlFlowGraph`] built before an optimization run therefore cannot be used after it.
//!
//! ## Error Handling
//!
//! Translation problems in the input program are reported through [`Error`]. Violated internal
//! invariants, such as a dominator query on an unreachable block, panic and are documented under
//! `# Panics` on the affected methods.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and never installs a logger.
#[macro_use]
pub(crate) mod macros;

pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use tacflow::prelude::*;
///
/// let unit = CompilationUnit::from_ast(&Stmt::compound(vec![]).into())?;
/// assert!(unit.is_empty());
/// # Ok::<(), tacflow::Error>(())
/// ```
pub mod prelude;

/// Abstract syntax tree consumed by the IR builder.
pub mod ast;

/// Three-address intermediate representation.
pub mod ir;

/// Control flow and data flow analysis over the IR.
pub mod analysis;

/// Optimization passes and their scheduling.
pub mod compiler;

/// Pipeline configuration.
pub mod config;

/// End-to-end orchestration.
pub mod pipeline;

/// Generic utilities: dense bit sets and graph algorithms.
pub mod utils;

/// `tacflow` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust
/// use tacflow::{ast::Node, CompilationUnit, Result};
///
/// fn lower(root: &Node) -> Result<usize> {
///     Ok(CompilationUnit::from_ast(root)?.len())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `tacflow` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;

pub use analysis::ControlFlowGraph;
pub use config::{AnalysisConfig, LvnConfig, PipelineConfig};
pub use ir::CompilationUnit;
pub use pipeline::{CompilationReport, Pipeline};
