//! Graph algorithms used by the control-flow analyses.
//!
//! # Available Algorithms
//!
//! ## Traversal
//!
//! - [`postorder`] - Depth-first postorder
//! - [`reverse_postorder`] - Reverse postorder (iteration order for forward data flow)
//! - [`reachable`] - Nodes reachable from a start node
//!
//! ## Dominator Analysis
//!
//! - [`compute_dominators`] - Compute the dominator tree using Lengauer-Tarjan
//! - [`compute_dominator_forest`] - The same from several roots
//! - [`DominatorTree`] - Result of dominator computation
//!
//! | Algorithm | Time Complexity |
//! |-----------|-----------------|
//! | Traversals | O(V + E) |
//! | Dominators | O(E log V) |

mod dominators;
mod traversal;

pub use dominators::{
    compute_dominator_forest, compute_dominators, compute_dominators_rooted, DominatorIterator,
    DominatorTree,
};
pub use traversal::{postorder, reachable, reverse_postorder};
