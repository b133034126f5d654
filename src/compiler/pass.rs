//! The interface every optimization pass implements.

use crate::{compiler::EventLog, ir::CompilationUnit, Result};

/// An optimization pass over a whole compilation unit.
///
/// Passes receive exclusive access to the unit, so no analysis built over an earlier state of
/// the unit can be alive while they run. Every change should be recorded in `events`.
///
/// # Pipeline Integration
///
/// The [`PassScheduler`](crate::compiler::PassScheduler) runs its passes in order and repeats
/// the whole sequence until a round reports no change. A pass that reports a change on every
/// run therefore keeps the scheduler busy until its round limit.
pub trait IrPass: Send + Sync {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }

    /// Runs the pass.
    ///
    /// Returns `true` if any changes were made, `false` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the pass cannot process the unit.
    fn run(&self, unit: &mut CompilationUnit, events: &mut EventLog) -> Result<bool>;
}
