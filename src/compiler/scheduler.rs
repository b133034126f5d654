//! Pass scheduler for orchestrating pass execution.
//!
//! The `PassScheduler` runs a list of passes in order and repeats the list until a whole round
//! changes nothing or the round limit is reached.

use crate::{
    compiler::{pass::IrPass, EventKind, EventLog},
    ir::CompilationUnit,
    Result,
};

/// Runs optimization passes to a fixpoint.
///
/// # Examples
///
/// ```rust
/// use tacflow::{
///     ast::{Expr, Stmt},
///     compiler::{EventLog, LocalValueNumberingPass, PassScheduler},
///     CompilationUnit,
/// };
///
/// let program = Stmt::compound(vec![Stmt::decl_int("y", Some(Expr::add(Expr::int(5), Expr::int(3))))]);
/// let mut unit = CompilationUnit::from_ast(&program.into())?;
///
/// let scheduler = PassScheduler::new(10).with_pass(LocalValueNumberingPass::default());
/// let mut events = EventLog::new();
/// let rounds = scheduler.run(&mut unit, &mut events)?;
///
/// assert_eq!(rounds, 2);
/// assert_eq!(unit.to_string(), "y0:1:0 = 8\n");
/// # Ok::<(), tacflow::Error>(())
/// ```
pub struct PassScheduler {
    /// Maximum rounds before giving up on a fixpoint.
    max_iterations: usize,
    /// The passes, in execution order.
    passes: Vec<Box<dyn IrPass>>,
}

impl Default for PassScheduler {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PassScheduler {
    /// Creates a scheduler without passes that runs at most `max_iterations` rounds.
    #[must_use]
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            passes: Vec::new(),
        }
    }

    /// Appends a pass and returns the scheduler.
    #[must_use]
    pub fn with_pass(mut self, pass: impl IrPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Appends a pass.
    pub fn add_pass(&mut self, pass: Box<dyn IrPass>) {
        self.passes.push(pass);
    }

    /// Returns the round limit.
    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Returns the pass names in execution order.
    #[must_use]
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Runs all passes once, in order.
    ///
    /// Returns `true` if any pass made changes, `false` otherwise.
    fn run_passes_once(&self, unit: &mut CompilationUnit, events: &mut EventLog) -> Result<bool> {
        let mut any_changed = false;

        for pass in &self.passes {
            events.record(EventKind::PassStarted).pass(pass.name());
            let changed = pass.run(unit, events)?;
            events
                .record(EventKind::PassCompleted)
                .pass(pass.name())
                .message(if changed { "changed" } else { "unchanged" });
            log::debug!(
                "pass `{}` finished ({})",
                pass.name(),
                if changed { "changed" } else { "unchanged" }
            );
            any_changed |= changed;
        }

        Ok(any_changed)
    }

    /// Runs the passes until a round makes no change.
    ///
    /// Returns the number of rounds run. Events are accumulated in `events`.
    ///
    /// # Errors
    ///
    /// Returns an error if any pass fails during execution.
    pub fn run(&self, unit: &mut CompilationUnit, events: &mut EventLog) -> Result<usize> {
        if self.passes.is_empty() {
            return Ok(0);
        }

        for round in 1..=self.max_iterations {
            if !self.run_passes_once(unit, events)? {
                log::debug!("pass scheduler reached a fixpoint after {round} round(s)");
                return Ok(round);
            }
        }

        log::warn!(
            "pass scheduler stopped after {} rounds without reaching a fixpoint",
            self.max_iterations
        );
        Ok(self.max_iterations)
    }
}
