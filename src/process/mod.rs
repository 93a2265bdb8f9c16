//! Tree-aware processing of the diff unit stream
//!
//! The engine walks the unit stream depth-first. Each context (an equal run,
//! an insert or delete run, a replace run, one block or skipped subtree) is
//! handled by a [`Processor`] of the matching [`ProcessorKind`]. A processor
//! that meets a unit outside its competence yields it; the engine resolves it
//! with a nested processor and injects the flushed result back.
//!
//! ```text
//! Root ──▶ Equal ──yield──▶ Insert ──yield──▶ Block
//!            ▲                │ ▲               │
//!            └──── inject ────┘ └──── inject ───┘
//! ```
//!
//! The stream is expected to be reconciled (see [`crate::algo::reconcile`]):
//! shared elements open and close at the same units on both sides, and a
//! one-sided block or skipped subtree holds no units of the other side.
//! Change runs then never cross the boundaries of the context they start in,
//! and each run nests nothing but opaque subtrees.

mod cursor;
mod processor;

use std::fmt;

pub use cursor::{UnitCounts, UnitCursor};
pub use processor::{Placement, Processor, Step};

use crate::algo::{DiffUnit, Operation};
use crate::buffer::Fragment;
use crate::config::DiffConfig;
use crate::content::{ContentBehavior, behavior};
use crate::diagnostics::Diagnostics;
use crate::error::DiffResult;
use crate::event::Event;

// =============================================================================
// ProcessorKind
// =============================================================================

/// Processor variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    Root,
    Equal,
    Insert,
    Delete,
    Replace,
    Block,
    Skip,
}

impl ProcessorKind {
    /// Choose the processor for a unit.
    ///
    /// The operation picks the plain processor; opening a block or skipped
    /// element overrides it. Replacements are classified by the new event.
    pub fn select(unit: &DiffUnit) -> Self {
        let plain = match unit.op() {
            Operation::Equal => Self::Equal,
            Operation::Insert => Self::Insert,
            Operation::Delete => Self::Delete,
            Operation::Replace => Self::Replace,
        };
        match unit.this_event().opened_tag().map(|tag| behavior(tag)) {
            Some(ContentBehavior::Skip) => Self::Skip,
            Some(ContentBehavior::AsBlock) => Self::Block,
            _ => plain,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Equal => "equal",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Replace => "replace",
            Self::Block => "block",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Flushed
// =============================================================================

/// Result of a finished processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flushed {
    /// Content without markers of its own
    Unchanged(Vec<Event>),
    /// A run of one operation
    Marked { op: Operation, fragment: Fragment },
    /// Old content removed and new content inserted, in that order
    Split { deleted: Fragment, inserted: Fragment },
}

impl Flushed {
    /// Events in output order.
    pub fn into_events(self) -> Vec<Event> {
        match self {
            Self::Unchanged(events) => events,
            Self::Marked { fragment, .. } => fragment.events,
            Self::Split { deleted, inserted } => {
                let mut events = deleted.events;
                events.extend(inserted.events);
                events
            }
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

/// State shared by all processors of one invocation
pub struct Context<'c> {
    pub config: &'c DiffConfig,
    pub diagnostics: Diagnostics,
}

/// Result of one engine run
#[derive(Debug)]
pub struct EngineOutput {
    pub events: Vec<Event>,
    pub diagnostics: Diagnostics,
    pub counts: UnitCounts,
}

/// Drives processors over one unit stream
pub struct Engine<'c, I> {
    cursor: UnitCursor<I>,
    ctx: Context<'c>,
}

impl<'c, I: Iterator<Item = DiffUnit>> Engine<'c, I> {
    pub fn new(units: I, config: &'c DiffConfig) -> Self {
        let diagnostics = if config.strict {
            Diagnostics::strict()
        } else {
            Diagnostics::new()
        };
        Self {
            cursor: UnitCursor::new(units),
            ctx: Context { config, diagnostics },
        }
    }

    /// Process the whole stream with a root processor.
    pub fn run(mut self) -> DiffResult<EngineOutput> {
        let mut root = Processor::new(ProcessorKind::Root, Placement::Under(None), &mut self.ctx)?;
        self.drive(&mut root)?;
        let events = root.flush(&mut self.ctx)?.into_events();
        Ok(EngineOutput {
            events,
            diagnostics: self.ctx.diagnostics,
            counts: self.cursor.counts(),
        })
    }

    /// Feed units to `processor` until it stops or the stream ends.
    fn drive(&mut self, processor: &mut Processor) -> DiffResult<()> {
        while let Some(unit) = self.cursor.next() {
            if processor.should_stop(&unit) {
                self.cursor.go_back(unit)?;
                break;
            }
            if let Step::Yield(unit) = processor.process(unit, &mut self.ctx)? {
                let placement = processor.child_placement();
                let flushed = self.subprocess(unit, placement)?;
                processor.inject(flushed, &mut self.ctx)?;
            }
        }
        Ok(())
    }

    /// Resolve a yielded unit with a fresh processor that sees it first.
    fn subprocess(&mut self, unit: DiffUnit, placement: Placement) -> DiffResult<Flushed> {
        let kind = ProcessorKind::select(&unit);
        self.cursor.go_back(unit)?;

        debug!(kind = kind.name(), placement = ?placement, "-> entering processor");
        let mut processor = Processor::new(kind, placement, &mut self.ctx)?;
        self.drive(&mut processor)?;
        let flushed = processor.flush(&mut self.ctx)?;
        debug!(kind = kind.name(), "<- leaving processor");

        Ok(flushed)
    }
}

// =============================================================================
// Tests
// =============================================================================
