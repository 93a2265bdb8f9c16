//! Unit cursor with a one-step rewind

use crate::algo::{DiffUnit, Operation};
use crate::error::{DiffError, DiffResult};

/// Number of units pulled per operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UnitCounts {
    pub equal: usize,
    pub inserted: usize,
    pub deleted: usize,
    pub replaced: usize,
}

impl UnitCounts {
    fn record(&mut self, op: Operation) {
        match op {
            Operation::Equal => self.equal += 1,
            Operation::Insert => self.inserted += 1,
            Operation::Delete => self.deleted += 1,
            Operation::Replace => self.replaced += 1,
        }
    }
}

/// Shared reader over the diff unit stream.
///
/// A processor that sees a unit it does not own hands it back with
/// [`go_back`](Self::go_back) so the caller reads it next. Only one unit can
/// be handed back at a time.
pub struct UnitCursor<I> {
    units: I,
    pending: Option<DiffUnit>,
    counts: UnitCounts,
}

impl<I: Iterator<Item = DiffUnit>> UnitCursor<I> {
    pub fn new(units: I) -> Self {
        Self {
            units,
            pending: None,
            counts: UnitCounts::default(),
        }
    }

    /// Return `unit` to the cursor so the next read yields it again.
    pub fn go_back(&mut self, unit: DiffUnit) -> DiffResult<()> {
        if self.pending.is_some() {
            return Err(DiffError::RewindDepth);
        }
        self.pending = Some(unit);
        Ok(())
    }

    /// Units pulled from the underlying stream so far
    pub fn counts(&self) -> UnitCounts {
        self.counts
    }
}

impl<I: Iterator<Item = DiffUnit>> Iterator for UnitCursor<I> {
    type Item = DiffUnit;

    fn next(&mut self) -> Option<DiffUnit> {
        if let Some(unit) = self.pending.take() {
            return Some(unit);
        }
        let unit = self.units.next()?;
        self.counts.record(unit.op());
        Some(unit)
    }
}
