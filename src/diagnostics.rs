//! Structured diagnostics collected during a diff.
//!
//! Recoverable problems (mismatched closing tags, unknown content models,
//! markers that cannot be placed) do not abort the diff. They are recorded
//! here and returned alongside the result so callers can decide how much
//! they trust the output.

use std::fmt;

use crate::error::{DiffError, DiffResult};
use crate::event::Tag;
use crate::span::SourceSpan;

/// Category of a recoverable problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Closing tag does not match the innermost open element
    UnmatchedClose,
    /// Closing tag arrived with no open element at all
    StackUnderflow,
    /// Element is missing from the content model
    UnknownContentModel,
    /// A marker could not be placed and further placement was suppressed
    MarkerSuppressed,
    /// Buffer describing another operation was injected into a context
    MismatchedInjection,
    /// A marker was still open when the buffer was finished
    UnclosedMarker,
}

impl DiagnosticKind {
    /// Structural faults may be escalated to errors in strict mode
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::UnmatchedClose | Self::StackUnderflow)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UnmatchedClose => "unmatched-close",
            Self::StackUnderflow => "stack-underflow",
            Self::UnknownContentModel => "unknown-content-model",
            Self::MarkerSuppressed => "marker-suppressed",
            Self::MismatchedInjection => "mismatched-injection",
            Self::UnclosedMarker => "unclosed-marker",
        }
    }
}

/// One recoverable problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Element involved, if any
    pub tag: Option<Tag>,
    /// Source position of the offending event
    pub span: SourceSpan,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tag: None,
            span: SourceSpan::detached(),
        }
    }

    /// Attach the element involved.
    pub fn with_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Attach the source position.
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = span;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)?;
        if let Some(tag) = &self.tag {
            write!(f, " [<{tag}>]")?;
        }
        if !self.span.is_detached() {
            write!(f, " ({})", self.span)?;
        }
        Ok(())
    }
}

// =============================================================================
// Diagnostics sink
// =============================================================================

/// Diagnostics collected over one diff invocation
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    strict: bool,
}

impl Diagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that escalates structural faults to errors.
    pub fn strict() -> Self {
        Self {
            items: Vec::new(),
            strict: true,
        }
    }

    /// Record a diagnostic.
    ///
    /// Fails only for structural faults in strict mode.
    pub fn report(&mut self, diagnostic: Diagnostic) -> DiffResult<()> {
        warning!(kind = diagnostic.kind.name(), "{}", diagnostic);
        if self.strict && diagnostic.kind.is_structural() {
            return Err(DiffError::Structural(diagnostic));
        }
        self.items.push(diagnostic);
        Ok(())
    }

    /// Record a diagnostic that can never be escalated.
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        warning!(kind = diagnostic.kind.name(), "{}", diagnostic);
        self.items.push(diagnostic);
    }

    /// Take over the diagnostics recorded by another sink.
    ///
    /// Already logged items are not logged again. Structural faults still
    /// fail in strict mode.
    pub fn absorb(&mut self, other: Diagnostics) -> DiffResult<()> {
        for diagnostic in other.items {
            if self.strict && diagnostic.kind.is_structural() {
                return Err(DiffError::Structural(diagnostic));
            }
            self.items.push(diagnostic);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Get diagnostics of one kind.
    pub fn by_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    /// Check whether any diagnostic of the given kind was recorded.
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.by_kind(kind).next().is_some()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_collects() {
        let mut diags = Diagnostics::new();
        diags
            .report(Diagnostic::new(DiagnosticKind::UnmatchedClose, "expected </b>").with_tag("i"))
            .unwrap();
        diags.warn(Diagnostic::new(DiagnosticKind::UnknownContentModel, "no entry"));

        assert_eq!(diags.len(), 2);
        assert!(diags.has(DiagnosticKind::UnmatchedClose));
        assert_eq!(diags.by_kind(DiagnosticKind::UnknownContentModel).count(), 1);
        assert!(!diags.has(DiagnosticKind::StackUnderflow));
    }

    #[test]
    fn test_strict_escalates_structural_only() {
        let mut diags = Diagnostics::strict();
        let err = diags
            .report(Diagnostic::new(DiagnosticKind::StackUnderflow, "nothing open"))
            .unwrap_err();
        assert!(matches!(err, DiffError::Structural(_)));

        diags
            .report(Diagnostic::new(DiagnosticKind::MarkerSuppressed, "in <pre>"))
            .unwrap();
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_absorb_keeps_strictness() {
        let mut local = Diagnostics::new();
        local.warn(Diagnostic::new(DiagnosticKind::MarkerSuppressed, "in <pre>"));
        let mut diags = Diagnostics::new();
        diags.absorb(local.clone()).unwrap();
        assert_eq!(diags.len(), 1);

        local.report(Diagnostic::new(DiagnosticKind::StackUnderflow, "nothing open")).unwrap();
        let mut strict = Diagnostics::strict();
        assert!(matches!(strict.absorb(local), Err(DiffError::Structural(_))));
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::new(DiagnosticKind::UnmatchedClose, "expected </b>")
            .with_tag("i")
            .with_span(SourceSpan::from_raw(7));
        assert_eq!(diag.to_string(), "unmatched-close: expected </b> [<i>] (@7)");
    }
}
