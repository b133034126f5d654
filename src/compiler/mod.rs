//! Optimization infrastructure over the three-address IR.
//!
//! This module sits between IR construction and analysis:
//!
//! - [`crate::ir`] - AST lowering and the instruction stream
//! - [`compiler`](self) - passes that rewrite the stream
//! - [`crate::analysis`] - CFG, dominators and data flow over the rewritten stream
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Optimization Pipeline                   │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  PassScheduler          Fixpoint execution               │
//! │    └─ rounds of all passes until none reports a change   │
//! │                                                          │
//! │  IrPass trait           Interface for all passes         │
//! │    └─ run()             Whole-unit transformation        │
//! │                                                          │
//! │  Passes                                                  │
//! │    └─ LocalValueNumberingPass   CSE and folding          │
//! │                                                          │
//! │  EventLog               Change tracking and diagnostics  │
//! │                                                          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A pass mutates the [`CompilationUnit`](crate::CompilationUnit) in place, which invalidates
//! every block partition and CFG built before it ran.

mod events;
mod pass;
mod passes;
mod scheduler;

pub use events::{Event, EventBuilder, EventKind, EventLog};
pub use pass::IrPass;
pub use passes::LocalValueNumberingPass;
pub use scheduler::PassScheduler;
