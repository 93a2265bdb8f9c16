//! Opcodes: classified regions of two aligned sequences
//!
//! An opcode says how `old[old_start..old_end]` relates to
//! `new[new_start..new_end]`. A complete opcode list covers both sequences
//! contiguously and exhaustively, in order.

use std::fmt;

// =============================================================================
// Operation
// =============================================================================

/// Classification of an aligned region or of a single diff unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Equal,
    Insert,
    Delete,
    Replace,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Opcode
// =============================================================================

/// One classified region: `(op, old_start, old_end, new_start, new_end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub op: Operation,
    pub old_start: usize,
    pub old_end: usize,
    pub new_start: usize,
    pub new_end: usize,
}

impl Opcode {
    pub fn new(op: Operation, old_start: usize, old_end: usize, new_start: usize, new_end: usize) -> Self {
        Self { op, old_start, old_end, new_start, new_end }
    }

    #[inline]
    pub fn old_len(&self) -> usize {
        self.old_end - self.old_start
    }

    #[inline]
    pub fn new_len(&self) -> usize {
        self.new_end - self.new_start
    }

    /// Check if the opcode covers nothing on either side
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.old_len() == 0 && self.new_len() == 0
    }

    /// Shift the whole region by a signed offset on both sides
    fn shifted(self, offset: isize) -> Self {
        Self {
            old_start: self.old_start.saturating_add_signed(offset),
            old_end: self.old_end.saturating_add_signed(offset),
            new_start: self.new_start.saturating_add_signed(offset),
            new_end: self.new_end.saturating_add_signed(offset),
            ..self
        }
    }
}

// =============================================================================
// OpcodeCursor
// =============================================================================

/// Sequential reader over opcodes with one-step lookahead
///
/// Besides plain consumption, the cursor can move the boundary between the
/// current opcode and the following one, which the pair iterator uses to
/// re-attribute a repeated opening tag from an equal run to a deletion.
#[derive(Debug, Clone)]
pub struct OpcodeCursor {
    opcodes: Vec<Opcode>,
    pos: usize,
}

impl OpcodeCursor {
    pub fn new(opcodes: Vec<Opcode>) -> Self {
        Self { opcodes, pos: 0 }
    }

    /// Look at the opcode `next()` would return, without consuming it
    pub fn peek(&self) -> Option<&Opcode> {
        self.opcodes.get(self.pos)
    }

    /// Look one past the next opcode
    pub fn peek_second(&self) -> Option<&Opcode> {
        self.opcodes.get(self.pos + 1)
    }

    /// Remaining opcodes, including the one `next()` would return
    pub fn remaining(&self) -> &[Opcode] {
        &self.opcodes[self.pos.min(self.opcodes.len())..]
    }

    /// Move `by` positions from the end of the next opcode into the one after it.
    ///
    /// The next opcode shrinks by `by` on both sides, the following opcode is
    /// shifted back by `by` on both sides, and whatever comes after it grows
    /// at its front so coverage stays contiguous. If nothing comes after, or
    /// what comes after is not an equal run, a new equal run is spliced in.
    ///
    /// Callers must guarantee that the events moved across the boundary are
    /// equal to the ones uncovered at the far end.
    pub fn shift_boundary(&mut self, by: usize) -> bool {
        let (Some(current), Some(following)) = (self.peek().copied(), self.peek_second().copied())
        else {
            return false;
        };
        if by == 0 || current.old_len() < by || current.new_len() < by {
            return false;
        }

        let offset = -(by as isize);
        let shifted = following.shifted(offset);
        self.opcodes[self.pos] = Opcode {
            old_end: current.old_end - by,
            new_end: current.new_end - by,
            ..current
        };
        self.opcodes[self.pos + 1] = shifted;

        let after = self.pos + 2;
        match self.opcodes.get_mut(after) {
            Some(next) if next.op == Operation::Equal => {
                next.old_start = shifted.old_end;
                next.new_start = shifted.new_end;
            }
            _ => {
                let filler = Opcode::new(
                    Operation::Equal,
                    shifted.old_end,
                    following.old_end,
                    shifted.new_end,
                    following.new_end,
                );
                self.opcodes.insert(after, filler);
            }
        }
        true
    }
}

impl Iterator for OpcodeCursor {
    type Item = Opcode;

    fn next(&mut self) -> Option<Opcode> {
        let opcode = self.opcodes.get(self.pos).copied()?;
        self.pos += 1;
        Some(opcode)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use Operation::*;

    #[test]
    fn test_consume_and_peek() {
        let mut cursor = OpcodeCursor::new(vec![
            Opcode::new(Equal, 0, 2, 0, 2),
            Opcode::new(Insert, 2, 2, 2, 3),
        ]);
        assert_eq!(cursor.peek().map(|o| o.op), Some(Equal));
        assert_eq!(cursor.peek_second().map(|o| o.op), Some(Insert));
        assert_eq!(cursor.next().map(|o| o.op), Some(Equal));
        assert_eq!(cursor.remaining().len(), 1);
        assert_eq!(cursor.next().map(|o| o.op), Some(Insert));
        assert!(cursor.next().is_none());
        assert!(cursor.peek().is_none());
    }

    #[test]
    fn test_shift_boundary_into_following_equal() {
        // equal(0,5,0,5) delete(5,8,5,5) equal(8,11,5,8)
        let mut cursor = OpcodeCursor::new(vec![
            Opcode::new(Equal, 0, 5, 0, 5),
            Opcode::new(Delete, 5, 8, 5, 5),
            Opcode::new(Equal, 8, 11, 5, 8),
        ]);
        assert!(cursor.shift_boundary(1));
        assert_eq!(
            cursor.remaining(),
            &[
                Opcode::new(Equal, 0, 4, 0, 4),
                Opcode::new(Delete, 4, 7, 4, 4),
                Opcode::new(Equal, 7, 11, 4, 8),
            ]
        );
    }

    #[test]
    fn test_shift_boundary_at_end_splices_equal() {
        let mut cursor = OpcodeCursor::new(vec![
            Opcode::new(Equal, 0, 3, 0, 3),
            Opcode::new(Delete, 3, 6, 3, 3),
        ]);
        assert!(cursor.shift_boundary(1));
        assert_eq!(
            cursor.remaining(),
            &[
                Opcode::new(Equal, 0, 2, 0, 2),
                Opcode::new(Delete, 2, 5, 2, 2),
                Opcode::new(Equal, 5, 6, 2, 3),
            ]
        );
    }

    #[test]
    fn test_shift_boundary_rejects_short_run() {
        let mut cursor = OpcodeCursor::new(vec![
            Opcode::new(Equal, 0, 0, 0, 0),
            Opcode::new(Delete, 0, 1, 0, 0),
        ]);
        assert!(!cursor.shift_boundary(1));
        assert!(!OpcodeCursor::new(vec![Opcode::new(Equal, 0, 1, 0, 1)]).shift_boundary(1));
    }
}
