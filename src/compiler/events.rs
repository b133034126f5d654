//! Change tracking for optimization passes.
//!
//! Passes record what they did into an [`EventLog`] through a small builder:
//!
//! ```rust
//! use tacflow::{compiler::{EventKind, EventLog}, ir::BlockId};
//!
//! let mut log = EventLog::new();
//! log.record(EventKind::ConstantFolded)
//!     .block(BlockId::new(0))
//!     .message("y = 5 + 3 folded to 8");
//!
//! assert!(log.has_changes());
//! assert_eq!(log.count_kind(EventKind::ConstantFolded), 1);
//! assert_eq!(log.summary(), "1 constant-folded");
//! ```

use std::fmt;

use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

use crate::ir::{BlockId, InstrId};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
#[strum(serialize_all = "kebab-case")]
pub enum EventKind {
    /// A binary instruction over two literals was replaced by its result.
    ConstantFolded,
    /// A recomputation was replaced by a copy of an earlier result.
    ExpressionEliminated,
    /// A synthetic temporary was inserted to preserve a value whose holder was overwritten.
    CopyMaterialized,
    /// A pass began a run.
    PassStarted,
    /// A pass finished a run.
    PassCompleted,
}

impl EventKind {
    /// Returns `true` for kinds that describe a change to the IR.
    #[must_use]
    pub const fn is_change(self) -> bool {
        matches!(
            self,
            Self::ConstantFolded | Self::ExpressionEliminated | Self::CopyMaterialized
        )
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The event kind.
    pub kind: EventKind,
    /// Name of the pass that recorded it, if known.
    pub pass: Option<&'static str>,
    /// Block the event concerns.
    pub block: Option<BlockId>,
    /// Instruction the event concerns.
    pub instruction: Option<InstrId>,
    /// Free-form detail.
    pub message: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(pass) = self.pass {
            write!(f, " {pass}")?;
        }
        match (self.block, self.instruction) {
            (Some(block), Some(instr)) => write!(f, " {block}/{instr}")?,
            (Some(block), None) => write!(f, " {block}")?,
            (None, Some(instr)) => write!(f, " {instr}")?,
            (None, None) => {}
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

/// An append-only list of events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event of `kind` and returns a builder to fill in its details.
    pub fn record(&mut self, kind: EventKind) -> EventBuilder<'_> {
        self.events.push(Event {
            kind,
            pass: None,
            block: None,
            instruction: None,
            message: String::new(),
        });
        EventBuilder { log: self }
    }

    /// Returns the number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterates the events in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter()
    }

    /// Returns the number of events of `kind`.
    #[must_use]
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Returns the number of events that describe IR changes.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.events.iter().filter(|e| e.kind.is_change()).count()
    }

    /// Returns `true` if any event describes an IR change.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.events.iter().any(|e| e.kind.is_change())
    }

    /// Moves every event of `other` to the end of this log.
    pub fn merge(&mut self, mut other: EventLog) {
        self.events.append(&mut other.events);
    }

    /// Removes all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Summarizes the change events as `"<count> <kind>"` pairs, or `"no changes"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let parts: Vec<String> = EventKind::iter()
            .filter(|kind| kind.is_change())
            .filter_map(|kind| match self.count_kind(kind) {
                0 => None,
                count => Some(format!("{count} {kind}")),
            })
            .collect();
        if parts.is_empty() {
            "no changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Fills in the most recently recorded event.
pub struct EventBuilder<'a> {
    log: &'a mut EventLog,
}

impl EventBuilder<'_> {
    fn event(&mut self) -> &mut Event {
        let Some(event) = self.log.events.last_mut() else {
            unreachable!("an event is pushed before the builder is created");
        };
        event
    }

    /// Sets the recording pass.
    pub fn pass(mut self, name: &'static str) -> Self {
        self.event().pass = Some(name);
        self
    }

    /// Sets the block.
    pub fn block(mut self, block: BlockId) -> Self {
        self.event().block = Some(block);
        self
    }

    /// Sets block and instruction.
    pub fn at(mut self, block: BlockId, instr: InstrId) -> Self {
        let event = self.event();
        event.block = Some(block);
        event.instruction = Some(instr);
        self
    }

    /// Sets the detail message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.event().message = message.into();
        self
    }
}
