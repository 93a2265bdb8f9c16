//! Source positions attached to structural events.
//!
//! A `SourceSpan` records where an event came from in the markup the external
//! parser read. It is carried through the diff untouched so diagnostics can
//! point back at the input, but it never takes part in event equality or
//! alignment.

use std::fmt;

/// Source location of a structural event
///
/// Stores a byte offset (or any parser-defined position) or nothing at all
/// for synthetic events such as diff markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceSpan {
    inner: Option<u64>,
}

impl SourceSpan {
    /// Create a detached span (no source location)
    pub const fn detached() -> Self {
        Self { inner: None }
    }

    /// Create from a raw position value
    pub const fn from_raw(value: u64) -> Self {
        Self { inner: Some(value) }
    }

    /// Check if this span is detached (has no source location)
    pub fn is_detached(&self) -> bool {
        self.inner.is_none()
    }

    /// Get the raw position value (if any)
    pub fn raw(&self) -> Option<u64> {
        self.inner
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Some(pos) => write!(f, "@{pos}"),
            None => f.write_str("@detached"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_span() {
        let span = SourceSpan::detached();
        assert!(span.is_detached());
        assert_eq!(span.raw(), None);
        assert_eq!(span.to_string(), "@detached");
    }

    #[test]
    fn test_raw_span() {
        let span = SourceSpan::from_raw(42);
        assert!(!span.is_detached());
        assert_eq!(span.raw(), Some(42));
        assert_eq!(span.to_string(), "@42");
    }
}
