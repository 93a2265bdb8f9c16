//! Longest-matching-block sequence alignment
//!
//! Classifies two sequences into opcodes by repeatedly finding the longest
//! contiguous run common to both, then recursing on what lies before and
//! after it. Regions between matches become `replace`, `insert` or `delete`.
//!
//! # Junk
//!
//! Elements of the new sequence can be declared *junk* (for example pure
//! whitespace tokens). A junk element never anchors a match on its own, but a
//! match that has been found is still extended over adjacent equal junk. This
//! keeps incidental whitespace from pairing up unrelated words.
//!
//! With `autojunk` enabled, elements that make up more than 1% of a new
//! sequence of at least 200 elements are treated as popular and likewise
//! excluded from anchoring.
//!
//! # Complexity
//!
//! - Time: O(n * m) worst case, close to linear for similar sequences
//! - Space: O(m) for the index of the new sequence

use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use super::opcodes::{Opcode, Operation};

/// Minimum sequence length before popular elements are auto-junked
const AUTOJUNK_MIN_LEN: usize = 200;

// =============================================================================
// Public Types
// =============================================================================

/// A common run: `old[a..a + size] == new[b..b + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

/// Aligns an old and a new sequence
pub struct SequenceMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    /// Positions of each anchoring element in `b`, ascending
    b2j: FxHashMap<&'a T, Vec<usize>>,
    /// Elements declared junk by the predicate
    junk: FxHashSet<&'a T>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    /// Matcher without junk, with popular-element auto-junk enabled
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        Self::with_options(a, b, None, true)
    }

    /// Matcher with an optional junk predicate and auto-junk switch
    pub fn with_options(
        a: &'a [T],
        b: &'a [T],
        is_junk: Option<&dyn Fn(&T) -> bool>,
        autojunk: bool,
    ) -> Self {
        let mut b2j: FxHashMap<&'a T, Vec<usize>> = FxHashMap::default();
        for (j, elt) in b.iter().enumerate() {
            b2j.entry(elt).or_default().push(j);
        }

        let mut junk = FxHashSet::default();
        if let Some(is_junk) = is_junk {
            junk.extend(b2j.keys().copied().filter(|elt| is_junk(elt)));
            b2j.retain(|elt, _| !junk.contains(elt));
        }

        if autojunk && b.len() >= AUTOJUNK_MIN_LEN {
            let threshold = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= threshold);
        }

        Self { a, b, b2j, junk }
    }

    #[inline]
    fn is_junk(&self, elt: &T) -> bool {
        self.junk.contains(elt)
    }

    /// Find the longest matching block in `old[alo..ahi]` and `new[blo..bhi]`.
    ///
    /// Among equally long blocks the one starting earliest in `old` wins, and
    /// among those the one starting earliest in `new`.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let (a, b) = (self.a, self.b);
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);

        // j2len[j] = length of the longest match ending with a[i-1] and b[j]
        let mut j2len: FxHashMap<usize, usize> = FxHashMap::default();
        for i in alo..ahi {
            let mut new_j2len: FxHashMap<usize, usize> = FxHashMap::default();
            if let Some(positions) = self.b2j.get(&a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j > 0 { j2len.get(&(j - 1)).copied().unwrap_or(0) } else { 0 };
                    let k = prev + 1;
                    new_j2len.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // Extend over equal non-junk neighbours (popular elements end up here),
        // then over equal junk.
        for want_junk in [false, true] {
            while besti > alo
                && bestj > blo
                && self.is_junk(&b[bestj - 1]) == want_junk
                && a[besti - 1] == b[bestj - 1]
            {
                besti -= 1;
                bestj -= 1;
                bestsize += 1;
            }
            while besti + bestsize < ahi
                && bestj + bestsize < bhi
                && self.is_junk(&b[bestj + bestsize]) == want_junk
                && a[besti + bestsize] == b[bestj + bestsize]
            {
                bestsize += 1;
            }
        }

        Match { a: besti, b: bestj, size: bestsize }
    }

    /// All maximal matching blocks in ascending order, adjacent blocks merged,
    /// terminated by the sentinel `(old.len(), new.len(), 0)`.
    pub fn matching_blocks(&self) -> Vec<Match> {
        let (la, lb) = (self.a.len(), self.b.len());

        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            blocks.push(m);
            if alo < m.a && blo < m.b {
                queue.push((alo, m.a, blo, m.b));
            }
            if m.a + m.size < ahi && m.b + m.size < bhi {
                queue.push((m.a + m.size, ahi, m.b + m.size, bhi));
            }
        }
        blocks.sort_unstable();

        let mut merged: Vec<Match> = Vec::with_capacity(blocks.len() + 1);
        for block in blocks {
            match merged.last_mut() {
                Some(last) if last.a + last.size == block.a && last.b + last.size == block.b => {
                    last.size += block.size;
                }
                _ => merged.push(block),
            }
        }
        merged.push(Match { a: la, b: lb, size: 0 });
        merged
    }

    /// Opcodes covering both sequences contiguously.
    pub fn opcodes(&self) -> Vec<Opcode> {
        let mut opcodes = Vec::new();
        let (mut i, mut j) = (0, 0);
        for m in self.matching_blocks() {
            let op = match (i < m.a, j < m.b) {
                (true, true) => Some(Operation::Replace),
                (true, false) => Some(Operation::Delete),
                (false, true) => Some(Operation::Insert),
                (false, false) => None,
            };
            if let Some(op) = op {
                opcodes.push(Opcode::new(op, i, m.a, j, m.b));
            }
            i = m.a + m.size;
            j = m.b + m.size;
            if m.size > 0 {
                opcodes.push(Opcode::new(Operation::Equal, m.a, i, m.b, j));
            }
        }
        opcodes
    }
}

// =============================================================================
// Tests
// =============================================================================
