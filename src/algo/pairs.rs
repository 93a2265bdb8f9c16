//! Diff pair iterator
//!
//! Flattens opcodes into one [`DiffUnit`] per aligned position.
//!
//! # Replace runs
//!
//! The two slices of a `replace` opcode are zipped aligned to their
//! *trailing* ends. Surplus positions at the front of the longer side become
//! plain deletions or insertions, so prepended content reads as an insertion
//! rather than as a replacement of the first word:
//!
//! ```text
//! old:        [awesome]            -> insert "My", insert " ", replace ...
//! new:  [My][ ][awesome]
//! ```
//!
//! Aligned positions are then classified:
//!
//! | Old / new | Unit |
//! |-----------|------|
//! | equal events | `Equal` |
//! | same-tag opens differing only in diffable attributes | `Equal`, annotated |
//! | same event kind and tag | `Replace` |
//!
//! A run is zipped only when every aligned pair is parallel: same event kind
//! and, for tags, same element. Otherwise the whole old slice becomes
//! `Delete` units followed by the whole new slice as `Insert` units, so no
//! unit ever pairs an element with text or with a different element.
//!
//! # Boundary correction
//!
//! When a middle element among same-tag siblings is removed, the aligner
//! pairs the *next* sibling's opening tag with the removed one's. Before an
//! `equal` run followed by a `delete` run is emitted, if both runs end in the
//! same opening tag, one position moves from the equal run into the deletion.

use std::collections::VecDeque;

use crate::attr::AttrsExt;
use crate::attr_diff;
use crate::config::{AttrDiffConfig, DiffConfig};
use crate::event::Event;

use super::matcher::SequenceMatcher;
use super::opcodes::{Opcode, OpcodeCursor, Operation};

// =============================================================================
// DiffUnit
// =============================================================================

/// One aligned position of the two token streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffUnit {
    /// Present in both versions
    Equal(Event),
    /// Only in the new version
    Insert(Event),
    /// Only in the old version
    Delete(Event),
    /// Old event replaced by a new event of the same kind
    Replace { old: Event, new: Event },
}

impl DiffUnit {
    #[inline]
    pub fn op(&self) -> Operation {
        match self {
            Self::Equal(_) => Operation::Equal,
            Self::Insert(_) => Operation::Insert,
            Self::Delete(_) => Operation::Delete,
            Self::Replace { .. } => Operation::Replace,
        }
    }

    /// Event that decides how this unit is processed.
    ///
    /// The new side wins for replacements.
    #[inline]
    pub fn this_event(&self) -> &Event {
        match self {
            Self::Equal(event) | Self::Insert(event) | Self::Delete(event) => event,
            Self::Replace { new, .. } => new,
        }
    }

    /// Event as seen in the old version, if present
    pub fn old_event(&self) -> Option<&Event> {
        match self {
            Self::Equal(event) | Self::Delete(event) => Some(event),
            Self::Replace { old, .. } => Some(old),
            Self::Insert(_) => None,
        }
    }

    /// Event as seen in the new version, if present
    pub fn new_event(&self) -> Option<&Event> {
        match self {
            Self::Equal(event) | Self::Insert(event) => Some(event),
            Self::Replace { new, .. } => Some(new),
            Self::Delete(_) => None,
        }
    }
}

// =============================================================================
// Alignment entry point
// =============================================================================

/// Align two token streams with the matcher options from `config`.
pub fn align(old: &[Event], new: &[Event], config: &DiffConfig) -> Vec<Opcode> {
    let is_junk = |event: &Event| event.is_whitespace();
    let junk: Option<&dyn Fn(&Event) -> bool> = if config.junk_whitespace { Some(&is_junk) } else { None };
    SequenceMatcher::with_options(old, new, junk, config.autojunk).opcodes()
}

// =============================================================================
// DiffPairs
// =============================================================================

/// Iterator of [`DiffUnit`]s over two aligned token streams
pub struct DiffPairs<'a> {
    old: &'a [Event],
    new: &'a [Event],
    cursor: OpcodeCursor,
    pending: VecDeque<DiffUnit>,
    attributes: &'a AttrDiffConfig,
}

impl<'a> DiffPairs<'a> {
    pub fn new(old: &'a [Event], new: &'a [Event], opcodes: Vec<Opcode>, attributes: &'a AttrDiffConfig) -> Self {
        Self {
            old,
            new,
            cursor: OpcodeCursor::new(opcodes),
            pending: VecDeque::new(),
            attributes,
        }
    }

    /// Align and pair in one step.
    pub fn from_config(old: &'a [Event], new: &'a [Event], config: &'a DiffConfig) -> Self {
        Self::new(old, new, align(old, new, config), &config.attributes)
    }

    /// Move a repeated opening tag from an equal run into the deletion after it.
    ///
    /// Both opening tags must be fully equal, attributes included: rotating
    /// the boundary is only sound when the moved event is identical to the
    /// one it replaces in the deleted run.
    fn correct_boundary(&mut self) {
        let (Some(equal), Some(delete)) = (self.cursor.peek().copied(), self.cursor.peek_second().copied())
        else {
            return;
        };
        if equal.op != Operation::Equal || delete.op != Operation::Delete || equal.old_len() == 0 {
            return;
        }
        let last_equal = &self.old[equal.old_end - 1];
        let last_deleted = &self.old[delete.old_end - 1];
        if last_equal.is_open() && last_equal == last_deleted && self.cursor.shift_boundary(1) {
            trace!(at = equal.old_end - 1, "moved repeated opening tag into deletion");
        }
    }

    fn fill(&mut self) -> bool {
        self.correct_boundary();
        let Some(opcode) = self.cursor.next() else {
            return false;
        };
        let old = &self.old[opcode.old_start..opcode.old_end];
        let new = &self.new[opcode.new_start..opcode.new_end];

        match opcode.op {
            Operation::Equal => self.pending.extend(old.iter().cloned().map(DiffUnit::Equal)),
            Operation::Delete => self.pending.extend(old.iter().cloned().map(DiffUnit::Delete)),
            Operation::Insert => self.pending.extend(new.iter().cloned().map(DiffUnit::Insert)),
            Operation::Replace => self.fill_replace(old, new),
        }
        true
    }

    fn fill_replace(&mut self, old: &[Event], new: &[Event]) {
        // Trailing alignment: the surplus sits at the front of the longer side
        let common = old.len().min(new.len());
        let (old_extra, old_aligned) = old.split_at(old.len() - common);
        let (new_extra, new_aligned) = new.split_at(new.len() - common);

        if !old_aligned.iter().zip(new_aligned).all(|(old, new)| parallel(old, new)) {
            trace!(old = old.len(), new = new.len(), "replace run split into delete and insert");
            self.pending.extend(old.iter().cloned().map(DiffUnit::Delete));
            self.pending.extend(new.iter().cloned().map(DiffUnit::Insert));
            return;
        }

        self.pending.extend(old_extra.iter().cloned().map(DiffUnit::Delete));
        self.pending.extend(new_extra.iter().cloned().map(DiffUnit::Insert));

        for (old, new) in old_aligned.iter().zip(new_aligned) {
            if old == new {
                self.pending.push_back(DiffUnit::Equal(new.clone()));
            } else if let Some(annotated) = self.attribute_change(old, new) {
                self.pending.push_back(DiffUnit::Equal(annotated));
            } else {
                self.pending.push_back(DiffUnit::Replace {
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }
    }

    /// New opening tag annotated with `x-diff-*` attributes, when the two
    /// opening tags differ only in diffable attributes.
    fn attribute_change(&self, old: &Event, new: &Event) -> Option<Event> {
        let (
            Event::Open { tag: old_tag, attrs: old_attrs, .. },
            Event::Open { tag, attrs, span },
        ) = (old, new)
        else {
            return None;
        };
        if old_tag != tag {
            return None;
        }
        let names = self.attributes.attributes_for(tag);
        if names.is_empty() || !old_attrs.same_except(attrs, &names) {
            return None;
        }
        let annotated = attr_diff::annotate(old_attrs, attrs, &names)?;
        debug!(tag = %tag, "attribute-only change");
        Some(Event::Open {
            tag: tag.clone(),
            attrs: annotated,
            span: *span,
        })
    }
}

/// Same event kind, and the same element for opening and closing tags.
#[inline]
fn parallel(old: &Event, new: &Event) -> bool {
    old.same_kind(new) && old.tag() == new.tag()
}

impl Iterator for DiffPairs<'_> {
    type Item = DiffUnit;

    fn next(&mut self) -> Option<DiffUnit> {
        loop {
            if let Some(unit) = self.pending.pop_front() {
                return Some(unit);
            }
            if !self.fill() {
                return None;
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
