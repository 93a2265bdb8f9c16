//! Structural reconciliation of the diff unit stream
//!
//! Processors walk one merged stream while tracking nesting per version, so
//! an element present in both versions must open and close at the same units
//! on both sides. Alignment does not guarantee that: for
//! `<p>a</p><p>b</p>` against `<p>a b</p>` the first `<p>` is paired with the
//! only `<p>`, but its `</p>` is paired with the second paragraph's.
//!
//! Two passes restore a shape the processors can consume:
//!
//! 1. **Shared elements.** Tags are matched with a stack on each side. A
//!    two-sided tag unit stays two-sided only when both sides close (or open)
//!    it at the same unit; otherwise it becomes `Delete` then `Insert`.
//! 2. **Opaque subtrees.** A block or skipped element opened on one side
//!    only may not enclose units of the other side. Those move out of its
//!    range, after it for a deleted element and before it for an inserted
//!    one.
//!
//! ```text
//! D<img> I"x" D</img>   ->   D<img> D</img> I"x"
//! E<p> E"a" D</p> D<p> I" " E"b" E</p>
//!                        ->   D<p> I<p> E"a" D</p> D<p> I" " E"b" D</p> I</p>
//! ```
//!
//! Neither pass reorders events within one version.

use crate::content::opens_opaque;
use crate::event::{Event, Tag};

use super::pairs::DiffUnit;

/// Make every two-sided element and every opaque subtree consistent on both
/// sides of the stream.
pub fn reconcile(units: Vec<DiffUnit>) -> Vec<DiffUnit> {
    isolate_opaque(split_unshared(units))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Old,
    New,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::Old => Side::New,
            Side::New => Side::Old,
        }
    }

    fn event(self, unit: &DiffUnit) -> Option<&Event> {
        match self {
            Side::Old => unit.old_event(),
            Side::New => unit.new_event(),
        }
    }

    /// Split into the part on this side and the part on the other one.
    fn split(self, unit: DiffUnit) -> (Option<DiffUnit>, Option<DiffUnit>) {
        let (deleted, inserted) = halves(unit);
        match self {
            Side::Old => (deleted, inserted),
            Side::New => (inserted, deleted),
        }
    }
}

/// Old and new halves of a unit, each as a one-sided unit.
fn halves(unit: DiffUnit) -> (Option<DiffUnit>, Option<DiffUnit>) {
    match unit {
        DiffUnit::Equal(event) => (Some(DiffUnit::Delete(event.clone())), Some(DiffUnit::Insert(event))),
        DiffUnit::Replace { old, new } => (Some(DiffUnit::Delete(old)), Some(DiffUnit::Insert(new))),
        DiffUnit::Delete(event) => (Some(DiffUnit::Delete(event)), None),
        DiffUnit::Insert(event) => (None, Some(DiffUnit::Insert(event))),
    }
}

// =============================================================================
// Shared elements
// =============================================================================

/// For each unit, the index of the unit holding the matching tag on `side`.
///
/// A close that does not match the innermost open element stays unmatched.
fn partners(units: &[DiffUnit], side: Side) -> Vec<Option<usize>> {
    let mut partner = vec![None; units.len()];
    let mut stack: Vec<(&Tag, usize)> = Vec::new();
    for (i, unit) in units.iter().enumerate() {
        match side.event(unit) {
            Some(Event::Open { tag, .. }) => stack.push((tag, i)),
            Some(Event::Close { tag, .. }) if stack.last().is_some_and(|(open, _)| *open == tag) => {
                if let Some((_, open)) = stack.pop() {
                    partner[i] = Some(open);
                    partner[open] = Some(i);
                }
            }
            _ => {}
        }
    }
    partner
}

fn split_unshared(units: Vec<DiffUnit>) -> Vec<DiffUnit> {
    let old = partners(&units, Side::Old);
    let new = partners(&units, Side::New);

    let mut out = Vec::with_capacity(units.len());
    for (i, unit) in units.into_iter().enumerate() {
        let two_sided = matches!(unit, DiffUnit::Equal(_) | DiffUnit::Replace { .. });
        if two_sided && unit.this_event().tag().is_some() && old[i] != new[i] {
            trace!(at = i, event = %unit.this_event(), "element not shared by both versions");
            let (deleted, inserted) = halves(unit);
            out.extend(deleted);
            out.extend(inserted);
        } else {
            out.push(unit);
        }
    }
    out
}

// =============================================================================
// Opaque subtrees
// =============================================================================

/// Offset of the unit closing the subtree opened by `units[0]` on `side`.
fn subtree_end(units: &[DiffUnit], side: Side) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, unit) in units.iter().enumerate() {
        match side.event(unit) {
            Some(Event::Open { .. }) => depth += 1,
            Some(Event::Close { .. }) => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn isolate_opaque(mut units: Vec<DiffUnit>) -> Vec<DiffUnit> {
    let mut i = 0;
    while i < units.len() {
        let side = match &units[i] {
            DiffUnit::Delete(event) if opens_opaque(event) => Side::Old,
            DiffUnit::Insert(event) if opens_opaque(event) => Side::New,
            _ => {
                i += 1;
                continue;
            }
        };
        let Some(end) = subtree_end(&units[i..], side).map(|len| i + len) else {
            i += 1;
            continue;
        };
        if units[i..=end].iter().all(|unit| side.other().event(unit).is_none()) {
            i = end + 1;
            continue;
        }

        let tail = units.split_off(end + 1);
        let range = units.split_off(i);
        let mut own = Vec::with_capacity(range.len());
        let mut foreign = Vec::new();
        for unit in range {
            let (mine, other) = side.split(unit);
            own.extend(mine);
            foreign.extend(other);
        }
        trace!(at = i, moved = foreign.len(), "isolated one-sided opaque subtree");

        match side {
            Side::Old => {
                i += own.len();
                units.extend(own);
                units.extend(foreign);
            }
            // Rescan the moved units; the subtree is met again afterwards
            Side::New => {
                units.extend(foreign);
                units.extend(own);
            }
        }
        units.extend(tail);
    }
    units
}

// =============================================================================
// Tests
// =============================================================================
