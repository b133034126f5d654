//! Generic directed-graph infrastructure.
//!
//! The control-flow graph is a [`DirectedGraph`] of basic blocks; the algorithms in
//! [`algorithms`] only depend on the traits in this module, so they can be tested on small
//! hand-built graphs.

mod directed;
mod node;
mod traits;

pub mod algorithms;

pub use directed::DirectedGraph;
pub use node::{EdgeId, NodeId};
pub use traits::{GraphBase, Predecessors, RootedGraph, Successors};
