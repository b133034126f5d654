//! Shared infrastructure: dense bit sets over typed indices and generic graph algorithms.

pub mod bitset;
pub mod graph;

pub use bitset::{BitSet, Idx};
