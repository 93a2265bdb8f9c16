//! Sequence alignment for token streams.
//!
//! - `matcher`: longest-matching-block alignment with junk handling
//! - `opcodes`: classified regions and a cursor over them
//! - `pairs`: per-position diff units with replace-run alignment
//! - `reconcile`: makes shared elements and opaque subtrees consistent per side

mod matcher;
mod opcodes;
mod pairs;
mod reconcile;

pub use matcher::{Match, SequenceMatcher};
pub use opcodes::{Opcode, OpcodeCursor, Operation};
pub use pairs::{DiffPairs, DiffUnit, align};
pub use reconcile::reconcile;
