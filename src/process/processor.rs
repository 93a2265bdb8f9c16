//! Processor variants and their per-unit rules
//!
//! | Kind | Stops when | Handles | Yields |
//! |------|------------|---------|--------|
//! | Root | never | nothing | every unit |
//! | Equal | non-equal unit, nothing open | equal | changes, opaque opens |
//! | Insert/Delete/Replace | foreign unit, nothing open on either side | all ops | opaque opens |
//! | Block | subtree closed on both sides | all ops | nothing |
//! | Skip | subtree closed on both sides | all ops | nothing |
//!
//! Insert, Delete and Replace share one change sink with a channel per
//! version. The kind only decides which operation starts the run; inside
//! it, an element opened on one side keeps the run alive until it closes,
//! whatever the units in between. The result is a deletion, an insertion or
//! both, depending on which channels received changed content.

use rustc_hash::FxHashSet;

use crate::algo::{DiffUnit, Operation};
use crate::buffer::{Buffer, DiffBuffer, Fragment};
use crate::config::MarkerNames;
use crate::content::opens_opaque;
use crate::diagnostics::Diagnostics;
use crate::error::{DiffError, DiffResult};
use crate::event::{Event, Tag};

use super::{Context, Flushed, ProcessorKind};

/// Outcome of feeding one unit to a processor
#[derive(Debug)]
pub enum Step {
    Handled,
    /// The unit belongs to another processor; the caller resolves it and
    /// injects the result
    Yield(DiffUnit),
}

/// Where the result of a processor ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Among unchanged content inside `parent`; the result carries its own
    /// markers
    Under(Option<Tag>),
    /// Inside a change run, whose markers already cover it
    InRun,
}

impl Placement {
    #[inline]
    pub fn parent(&self) -> Option<&Tag> {
        match self {
            Self::Under(parent) => parent.as_ref(),
            Self::InRun => None,
        }
    }
}

/// One version's side of a change run.
///
/// Diagnostics are held back until the channel is known to be emitted, so a
/// side that never receives a change reports nothing.
#[derive(Debug)]
struct Channel {
    buffer: DiffBuffer,
    diagnostics: Diagnostics,
    changed: bool,
}

impl Channel {
    fn new(op: Operation, parent: Option<&str>, names: &MarkerNames) -> DiffResult<Self> {
        let mut diagnostics = Diagnostics::new();
        let buffer = DiffBuffer::new(op, parent, names, &mut diagnostics)?;
        Ok(Self {
            buffer,
            diagnostics,
            changed: false,
        })
    }

    fn append(&mut self, event: Event, changed: bool) -> DiffResult<()> {
        self.changed |= changed;
        self.buffer.append(event, changed, &mut self.diagnostics)
    }

    fn extend(&mut self, events: Vec<Event>, changed: bool) -> DiffResult<()> {
        self.changed |= changed && !events.is_empty();
        self.buffer.extend(events, changed, &mut self.diagnostics)
    }

    fn finish(self, ctx: &mut Context<'_>) -> DiffResult<Fragment> {
        let Self { buffer, mut diagnostics, .. } = self;
        let fragment = buffer.finish(&mut diagnostics)?;
        ctx.diagnostics.absorb(diagnostics)?;
        Ok(fragment)
    }
}

/// Output state of a processor
enum Sink {
    /// Root and Equal
    Collect(Buffer),
    /// Insert, Delete and Replace
    Change {
        /// Operation that started the run
        own: Operation,
        deleted: Channel,
        inserted: Channel,
    },
    /// Block and Skip: both versions of one subtree
    Subtree {
        old: Buffer,
        new: Buffer,
        ops: FxHashSet<Operation>,
        trigger: Option<Operation>,
    },
}

/// One processing context over a run of units
pub struct Processor {
    kind: ProcessorKind,
    placement: Placement,
    sink: Sink,
}

impl Processor {
    pub fn new(kind: ProcessorKind, placement: Placement, ctx: &mut Context<'_>) -> DiffResult<Self> {
        let own = match kind {
            ProcessorKind::Insert => Some(Operation::Insert),
            ProcessorKind::Delete => Some(Operation::Delete),
            ProcessorKind::Replace => Some(Operation::Replace),
            _ => None,
        };
        let sink = match (kind, own) {
            (_, Some(own)) => {
                if placement == Placement::InRun {
                    return Err(DiffError::invariant(format!("{kind} run started inside another change run")));
                }
                let parent = placement.parent().map(Tag::as_str);
                let names = &ctx.config.markers;
                Sink::Change {
                    own,
                    deleted: Channel::new(Operation::Delete, parent, names)?,
                    inserted: Channel::new(Operation::Insert, parent, names)?,
                }
            }
            (ProcessorKind::Block | ProcessorKind::Skip, None) => Sink::Subtree {
                old: Buffer::new(),
                new: Buffer::new(),
                ops: FxHashSet::default(),
                trigger: None,
            },
            _ => Sink::Collect(Buffer::new()),
        };
        Ok(Self { kind, placement, sink })
    }

    #[inline]
    pub fn kind(&self) -> ProcessorKind {
        self.kind
    }

    /// Whether `unit` lies outside this processor's context.
    pub fn should_stop(&self, unit: &DiffUnit) -> bool {
        let op = unit.op();
        match &self.sink {
            Sink::Collect(buffer) => self.kind == ProcessorKind::Equal && op != Operation::Equal && buffer.is_stack_empty(),
            Sink::Change { own, deleted, inserted } => {
                op != *own && deleted.buffer.is_stack_empty() && inserted.buffer.is_stack_empty()
            }
            // The first unit opens the subtree
            Sink::Subtree { old, new, trigger, .. } => {
                trigger.is_some() && old.is_stack_empty() && new.is_stack_empty()
            }
        }
    }

    /// Innermost open element, falling back to the processor's parent.
    pub fn current_element(&self) -> Option<&Tag> {
        let own = match &self.sink {
            Sink::Collect(buffer) => buffer.current_element(),
            Sink::Change { deleted, inserted, .. } => {
                inserted.buffer.current_element().or(deleted.buffer.current_element())
            }
            Sink::Subtree { new, .. } => new.current_element(),
        };
        own.or(self.placement.parent())
    }

    /// Placement of results this processor receives through [`inject`](Self::inject).
    pub fn child_placement(&self) -> Placement {
        match self.sink {
            Sink::Change { .. } => Placement::InRun,
            _ => Placement::Under(self.current_element().cloned()),
        }
    }

    /// Feed one unit.
    pub fn process(&mut self, unit: DiffUnit, ctx: &mut Context<'_>) -> DiffResult<Step> {
        trace!(kind = self.kind.name(), op = %unit.op(), event = %unit.this_event(), "unit");

        if !matches!(self.sink, Sink::Subtree { .. }) && opens_opaque(unit.this_event()) {
            return Ok(Step::Yield(unit));
        }

        match &mut self.sink {
            Sink::Collect(_) if self.kind == ProcessorKind::Root => return Ok(Step::Yield(unit)),
            Sink::Collect(buffer) => match unit {
                DiffUnit::Equal(event) => buffer.append(event, &mut ctx.diagnostics)?,
                other => return Ok(Step::Yield(other)),
            },
            Sink::Change { deleted, inserted, .. } => match unit {
                DiffUnit::Equal(event) => {
                    deleted.append(event.clone(), false)?;
                    inserted.append(event, false)?;
                }
                DiffUnit::Replace { old, new } => {
                    deleted.append(old, true)?;
                    inserted.append(new, true)?;
                }
                DiffUnit::Delete(event) => deleted.append(event, true)?,
                DiffUnit::Insert(event) => inserted.append(event, true)?,
            },
            Sink::Subtree { old, new, ops, trigger } => {
                let op = unit.op();
                if trigger.is_none() {
                    *trigger = Some(op);
                }
                ops.insert(op);
                let diagnostics = &mut ctx.diagnostics;
                match unit {
                    DiffUnit::Equal(event) => {
                        old.append(event.clone(), diagnostics)?;
                        new.append(event, diagnostics)?;
                    }
                    DiffUnit::Replace { old: before, new: after } => {
                        old.append(before, diagnostics)?;
                        new.append(after, diagnostics)?;
                    }
                    DiffUnit::Delete(event) => old.append(event, diagnostics)?,
                    DiffUnit::Insert(event) => new.append(event, diagnostics)?,
                }
            }
        }
        Ok(Step::Handled)
    }

    /// Splice the flushed result of a sub-processor.
    pub fn inject(&mut self, flushed: Flushed, ctx: &mut Context<'_>) -> DiffResult<()> {
        match &mut self.sink {
            Sink::Collect(buffer) => buffer.inject(flushed.into_events(), &mut ctx.diagnostics)?,
            Sink::Change { deleted, inserted, .. } => match flushed {
                Flushed::Unchanged(events) => {
                    deleted.extend(events.clone(), false)?;
                    inserted.extend(events, false)?;
                }
                Flushed::Marked { op: Operation::Delete, fragment } => deleted.extend(fragment.unwrap_marker(), true)?,
                Flushed::Marked { op: Operation::Insert, fragment } => {
                    inserted.extend(fragment.unwrap_marker(), true)?
                }
                Flushed::Marked { op, .. } => return Err(DiffError::UnsupportedMarker(op)),
                Flushed::Split { deleted: old, inserted: new } => {
                    deleted.extend(old.unwrap_marker(), true)?;
                    inserted.extend(new.unwrap_marker(), true)?;
                }
            },
            Sink::Subtree { .. } => {
                return Err(DiffError::invariant(format!(
                    "{} processor handles every unit and cannot accept injected results",
                    self.kind.name()
                )));
            }
        }
        Ok(())
    }

    /// Finish the context and hand back its result.
    pub fn flush(self, ctx: &mut Context<'_>) -> DiffResult<Flushed> {
        let flushed = match self.sink {
            Sink::Collect(buffer) => Flushed::Unchanged(buffer.into_events()),
            Sink::Change { deleted, inserted, .. } => match (deleted.changed, inserted.changed) {
                (true, true) => Flushed::Split {
                    deleted: deleted.finish(ctx)?,
                    inserted: inserted.finish(ctx)?,
                },
                (true, false) => Flushed::Marked {
                    op: Operation::Delete,
                    fragment: deleted.finish(ctx)?,
                },
                (false, true) => Flushed::Marked {
                    op: Operation::Insert,
                    fragment: inserted.finish(ctx)?,
                },
                (false, false) => Flushed::Unchanged(inserted.finish(ctx)?.events),
            },
            Sink::Subtree { old, new, ops, trigger } => match self.kind {
                ProcessorKind::Skip => flush_skip(trigger, new.into_events(), &self.placement, ctx)?,
                _ => flush_block(&ops, old.into_events(), new.into_events(), &self.placement, ctx)?,
            },
        };
        Ok(flushed)
    }
}

/// Mark a whole subtree as `op`.
///
/// Inside a change run the run's own marker covers it, so the events are
/// returned as they are.
fn place(op: Operation, placement: &Placement, events: Vec<Event>, ctx: &mut Context<'_>) -> DiffResult<Fragment> {
    let parent = match placement {
        Placement::InRun => return Ok(Fragment::unwrapped(events)),
        Placement::Under(parent) => parent.as_deref(),
    };
    let mut buffer = DiffBuffer::new(op, parent, &ctx.config.markers, &mut ctx.diagnostics)?;
    buffer.extend(events, true, &mut ctx.diagnostics)?;
    buffer.finish(&mut ctx.diagnostics)
}

/// A block is unchanged, inserted or deleted as a whole; anything else
/// replaces the old block by the new one.
fn flush_block(
    ops: &FxHashSet<Operation>,
    old: Vec<Event>,
    new: Vec<Event>,
    placement: &Placement,
    ctx: &mut Context<'_>,
) -> DiffResult<Flushed> {
    let only = |op| ops.len() == 1 && ops.contains(&op);
    let flushed = if only(Operation::Equal) {
        Flushed::Unchanged(new)
    } else if only(Operation::Insert) {
        Flushed::Marked {
            op: Operation::Insert,
            fragment: place(Operation::Insert, placement, new, ctx)?,
        }
    } else if only(Operation::Delete) {
        Flushed::Marked {
            op: Operation::Delete,
            fragment: place(Operation::Delete, placement, old, ctx)?,
        }
    } else {
        Flushed::Split {
            deleted: place(Operation::Delete, placement, old, ctx)?,
            inserted: place(Operation::Insert, placement, new, ctx)?,
        }
    };
    Ok(flushed)
}

/// Skipped content is never diffed: the new version passes through, and
/// only the element's presence is marked.
fn flush_skip(
    trigger: Option<Operation>,
    new: Vec<Event>,
    placement: &Placement,
    ctx: &mut Context<'_>,
) -> DiffResult<Flushed> {
    match trigger {
        Some(Operation::Insert | Operation::Replace) => Ok(Flushed::Marked {
            op: Operation::Insert,
            fragment: place(Operation::Insert, placement, new, ctx)?,
        }),
        // A deleted skip element leaves only what survives in the new version
        Some(Operation::Equal | Operation::Delete) | None => Ok(Flushed::Unchanged(new)),
    }
}
