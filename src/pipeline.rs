//! The end-to-end pipeline: lowering, optimization and analysis.

use std::{fmt, time::Duration, time::Instant};

use crate::{
    analysis::ControlFlowGraph,
    ast::Node,
    compiler::{EventLog, LocalValueNumberingPass, PassScheduler},
    config::PipelineConfig,
    ir::CompilationUnit,
    Result,
};

/// What a [`Pipeline::compile_with_report`] run did.
#[derive(Debug, Clone, Default)]
pub struct CompilationReport {
    /// Events recorded by the passes.
    pub events: EventLog,
    /// Scheduler rounds; 0 when optimization is disabled.
    pub rounds: usize,
    /// Wall time spent lowering and optimizing.
    pub elapsed: Duration,
}

impl fmt::Display for CompilationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {} round(s), {:.2?}",
            self.events.summary(),
            self.rounds,
            self.elapsed
        )
    }
}

/// Lowers ASTs into optimized IR and builds control-flow graphs over the result.
///
/// # Examples
///
/// ```rust
/// use tacflow::{ast::{Expr, Stmt}, Pipeline, PipelineConfig};
///
/// // { int x = 5; int y = x + 12; int z = x + 12; }
/// let program = Stmt::compound(vec![
///     Stmt::decl_int("x", Some(Expr::int(5))),
///     Stmt::decl_int("y", Some(Expr::add(Expr::var("x"), Expr::int(12)))),
///     Stmt::decl_int("z", Some(Expr::add(Expr::var("x"), Expr::int(12)))),
/// ]);
///
/// let pipeline = Pipeline::new(PipelineConfig::default());
/// let unit = pipeline.compile(&program.into())?;
/// assert_eq!(unit.to_string(), "x0:1:0 = 5\ny0:1:0 = x0:1:0 + 12\nz0:1:0 = y0:1:0\n");
///
/// let cfg = pipeline.analyze(&unit)?;
/// assert_eq!(cfg.block_count(), 1);
/// # Ok::<(), tacflow::Error>(())
/// ```
pub struct Pipeline {
    /// Configuration.
    config: PipelineConfig,
    /// Scheduler holding the enabled passes.
    scheduler: PassScheduler,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    /// Creates a pipeline with the given configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let mut scheduler = PassScheduler::new(config.max_pass_iterations);
        if config.optimize {
            scheduler.add_pass(Box::new(LocalValueNumberingPass::new(config.lvn)));
        }
        Self { config, scheduler }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Lowers `root` and, if enabled, optimizes the result.
    ///
    /// # Errors
    ///
    /// Returns a translation error if `root` cannot be lowered.
    pub fn compile(&self, root: &Node) -> Result<CompilationUnit> {
        self.compile_with_report(root).map(|(unit, _)| unit)
    }

    /// Like [`compile`](Self::compile), also returning the recorded events and timing.
    ///
    /// # Errors
    ///
    /// Returns a translation error if `root` cannot be lowered, or the first pass error.
    pub fn compile_with_report(&self, root: &Node) -> Result<(CompilationUnit, CompilationReport)> {
        let start = Instant::now();
        let mut unit = CompilationUnit::from_ast(root)?;
        log::debug!(
            "lowered {} instruction(s) into {} block(s)",
            unit.len(),
            unit.block_count()
        );

        let mut events = EventLog::new();
        let rounds = self.scheduler.run(&mut unit, &mut events)?;

        let report = CompilationReport {
            events,
            rounds,
            elapsed: start.elapsed(),
        };
        log::debug!("compiled: {report}");
        Ok((unit, report))
    }

    /// Builds the control-flow graph of `unit` with the configured analysis settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`](crate::Error::Empty) if `unit` has no instructions, or a graph
    /// error if a branch targets a label that was never placed.
    pub fn analyze<'u>(&self, unit: &'u CompilationUnit) -> Result<ControlFlowGraph<'u>> {
        ControlFlowGraph::with_config(unit, self.config.analysis)
    }
}
