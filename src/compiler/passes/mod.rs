//! Optimization passes.
//!
//! - [`LocalValueNumberingPass`] - Per-block redundancy elimination and constant folding

mod lvn;

pub use lvn::LocalValueNumberingPass;
