//! Configuration for the compilation pipeline.
//!
//! This module provides configuration types for controlling the pipeline: whether the optimizer
//! runs, which local value numbering rewrites are enabled, and how data flow analyses over the
//! control-flow graph are solved.

use crate::analysis::LivenessStrategy;

/// Configuration for the whole pipeline.
///
/// # Examples
///
/// ```rust
/// use tacflow::{analysis::LivenessStrategy, PipelineConfig};
///
/// let mut config = PipelineConfig::default();
/// assert!(config.optimize);
///
/// config.analysis.liveness = LivenessStrategy::FullPass;
/// config.lvn.fold_constants = false;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Run the optimization passes after lowering (default: true).
    pub optimize: bool,

    /// Maximum rounds for the pass scheduler (default: 10).
    pub max_pass_iterations: usize,

    /// Local value numbering configuration.
    pub lvn: LvnConfig,

    /// Analysis configuration for control-flow graphs built by the pipeline.
    pub analysis: AnalysisConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            max_pass_iterations: 10,
            lvn: LvnConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that lowers without optimizing.
    #[must_use]
    pub fn unoptimized() -> Self {
        Self {
            optimize: false,
            ..Self::default()
        }
    }
}

/// Configuration for local value numbering.
///
/// Both rewrites are enabled by default. With both disabled the pass leaves the unit unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LvnConfig {
    /// Evaluate binary instructions whose operands are both literals.
    pub fold_constants: bool,

    /// Replace recomputations of a value already held in a variable by copies.
    pub eliminate_redundancy: bool,
}

impl Default for LvnConfig {
    fn default() -> Self {
        Self {
            fold_constants: true,
            eliminate_redundancy: true,
        }
    }
}

impl LvnConfig {
    /// Creates a configuration with every rewrite disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            fold_constants: false,
            eliminate_redundancy: false,
        }
    }
}

/// Configuration for analyses over a [`ControlFlowGraph`](crate::ControlFlowGraph).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Solver strategy for the cached liveness and available-expressions results
    /// (default: worklist).
    pub liveness: LivenessStrategy,

    /// Solve liveness with both strategies and panic if they disagree (slow).
    pub verify_liveness: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new();
        assert!(config.optimize);
        assert_eq!(config.max_pass_iterations, 10);
        assert_eq!(config.lvn, LvnConfig::default());
        assert_eq!(config.analysis.liveness, LivenessStrategy::Worklist);
        assert!(!config.analysis.verify_liveness);
    }

    #[test]
    fn test_presets() {
        assert!(!PipelineConfig::unoptimized().optimize);
        let lvn = LvnConfig::disabled();
        assert!(!lvn.fold_constants && !lvn.eliminate_redundancy);
    }
}
