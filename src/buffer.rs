//! Output buffers that track element nesting
//!
//! [`Buffer`] accumulates events and mirrors the currently open elements on
//! a stack, reporting closing tags that do not match.
//!
//! [`DiffBuffer`] additionally places a marker (`<ins>` or `<del>`) lazily:
//! the marker opens at the first position where the content model allows one
//! and closes when nesting returns to that position.
//!
//! ```text
//!            Open (marker allowed here)
//!   Closed ─────────────────────────────▶ Buffering
//!     ▲                                     │
//!     └─────────────────────────────────────┘
//!        Close with nothing open inside the marker
//! ```
//!
//! While buffering, events go to an inner [`Buffer`]. On close the marker is
//! rendered around them: plain if every event belonged to the buffer's own
//! operation, formatting if changed and unchanged events were mixed, and no
//! marker at all if nothing changed.

use smallvec::SmallVec;

use crate::algo::Operation;
use crate::attr::Attrs;
use crate::config::MarkerNames;
use crate::content::{ContentBehavior, behavior_of};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{DiffError, DiffResult};
use crate::event::{Event, Tag};
use crate::marker;

// =============================================================================
// Buffer
// =============================================================================

/// Event accumulator with an open-element stack
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    events: Vec<Event>,
    stack: SmallVec<[Tag; 8]>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event, validating closing tags.
    ///
    /// A close matching an element further down also closes the elements
    /// above it; a close matching nothing open is dropped.
    pub fn append(&mut self, event: Event, diagnostics: &mut Diagnostics) -> DiffResult<()> {
        self.push(event, None, diagnostics)
    }

    /// Append events one by one, validating each.
    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>, diagnostics: &mut Diagnostics) -> DiffResult<()> {
        events.into_iter().try_for_each(|event| self.append(event, diagnostics))
    }

    /// Append events produced by a nested context.
    ///
    /// They are expected to be balanced; a close that is not is recovered as
    /// in [`append`](Self::append) and reported as a mismatched injection.
    pub fn inject(&mut self, events: impl IntoIterator<Item = Event>, diagnostics: &mut Diagnostics) -> DiffResult<()> {
        events
            .into_iter()
            .try_for_each(|event| self.push(event, Some(DiagnosticKind::MismatchedInjection), diagnostics))
    }

    fn push(&mut self, event: Event, fault: Option<DiagnosticKind>, diagnostics: &mut Diagnostics) -> DiffResult<()> {
        let close = match &event {
            Event::Open { tag, .. } => {
                self.stack.push(tag.clone());
                None
            }
            Event::Close { tag, span } => Some((tag.clone(), *span)),
            Event::Text { .. } => None,
        };
        let Some((tag, span)) = close else {
            self.events.push(event);
            return Ok(());
        };

        let found = self.stack.iter().rposition(|open| *open == tag);
        if found.is_none_or(|pos| pos + 1 != self.stack.len()) {
            let (kind, message) = match self.stack.last() {
                Some(top) => (DiagnosticKind::UnmatchedClose, format!("closing </{tag}> while <{top}> is open")),
                None => (DiagnosticKind::StackUnderflow, format!("closing </{tag}> with nothing open")),
            };
            diagnostics.report(
                Diagnostic::new(fault.unwrap_or(kind), message)
                    .with_tag(tag.clone())
                    .with_span(span),
            )?;
            let Some(pos) = found else {
                trace!(tag = %tag, "dropped close without open element");
                return Ok(());
            };
            for open in self.stack.drain(pos + 1..).rev() {
                self.events.push(Event::close(open));
            }
        }
        self.stack.pop();
        self.events.push(event);
        Ok(())
    }

    /// Close every element still open.
    fn close_open(&mut self) {
        while let Some(tag) = self.stack.pop() {
            self.events.push(Event::close(tag));
        }
    }

    #[inline]
    pub fn is_stack_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Innermost open element
    #[inline]
    pub fn current_element(&self) -> Option<&Tag> {
        self.stack.last()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

// =============================================================================
// DiffBuffer
// =============================================================================

/// Entry of the [`DiffBuffer`] nesting stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEntry {
    Element(Tag),
    /// Position where the pending marker is open
    Marker,
}

/// Events produced by a [`DiffBuffer`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub events: Vec<Event>,
    /// First and last events are one marker spanning the whole fragment
    pub wrapped: bool,
}

impl Fragment {
    /// Events that carry no marker of their own.
    pub fn unwrapped(events: Vec<Event>) -> Self {
        Self { events, wrapped: false }
    }

    /// Events without the spanning marker, if there is one.
    pub fn unwrap_marker(self) -> Vec<Event> {
        let mut events = self.events;
        if self.wrapped && events.len() >= 2 {
            events.pop();
            events.remove(0);
        }
        events
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Content buffered inside an open marker
#[derive(Debug, Default)]
struct MarkerContent {
    buffer: Buffer,
    changed: bool,
    unchanged: bool,
    /// Innermost changed element seen so far
    node: Option<(Tag, Attrs)>,
}

impl MarkerContent {
    fn record(&mut self, event: &Event, changed: bool) {
        if changed {
            self.changed = true;
            if let Event::Open { tag, attrs, .. } = event {
                self.node = Some((tag.clone(), attrs.clone()));
            }
        } else {
            self.unchanged = true;
        }
    }
}

/// Buffer for one insert or delete run that places its marker lazily
#[derive(Debug)]
pub struct DiffBuffer {
    op: Operation,
    names: MarkerNames,
    events: Vec<Event>,
    stack: SmallVec<[StackEntry; 8]>,
    content: Option<MarkerContent>,
    /// No further marker may be opened until the current one closes
    rendered: bool,
    /// The marker opened at construction is still the only one
    spanning: bool,
}

impl DiffBuffer {
    /// Create a buffer for `op` whose output goes inside `parent`.
    ///
    /// The marker opens immediately when `parent` permits markers.
    pub fn new(
        op: Operation,
        parent: Option<&str>,
        names: &MarkerNames,
        diagnostics: &mut Diagnostics,
    ) -> DiffResult<Self> {
        marker::marker_tag(op, names)?;

        let mut buffer = Self {
            op,
            names: names.clone(),
            events: Vec::new(),
            stack: SmallVec::new(),
            content: None,
            rendered: false,
            spanning: false,
        };
        if buffer.can_hold_marker(parent, diagnostics) {
            buffer.open_marker();
            buffer.spanning = true;
        }
        Ok(buffer)
    }

    #[inline]
    pub fn op(&self) -> Operation {
        self.op
    }

    /// Whether a marker may open as a direct child of `element`.
    ///
    /// Blocks, skipped elements and unknown elements suppress markers for
    /// the rest of the run.
    fn can_hold_marker(&mut self, element: Option<&str>, diagnostics: &mut Diagnostics) -> bool {
        match behavior_of(element) {
            ContentBehavior::Internally => true,
            ContentBehavior::StepInside => false,
            other => {
                let tag = element.unwrap_or_default();
                let diagnostic = if other == ContentBehavior::Unknown {
                    Diagnostic::new(
                        DiagnosticKind::UnknownContentModel,
                        format!("<{tag}> is not in the content model; no {} marker placed inside", self.op),
                    )
                } else {
                    Diagnostic::new(
                        DiagnosticKind::MarkerSuppressed,
                        format!("<{tag}> is {} and cannot hold a {} marker", other.name(), self.op),
                    )
                };
                diagnostics.warn(diagnostic.with_tag(tag));
                self.rendered = true;
                false
            }
        }
    }

    fn open_marker(&mut self) {
        trace!(op = %self.op, "marker opened");
        self.stack.push(StackEntry::Marker);
        self.content = Some(MarkerContent::default());
        self.rendered = true;
    }

    /// Render the pending marker around its buffered content.
    fn close_marker(&mut self, finishing: bool) -> DiffResult<()> {
        let Some(content) = self.content.take() else {
            return Ok(());
        };
        if self.stack.pop() != Some(StackEntry::Marker) {
            return Err(DiffError::invariant("marker closed while an element above it is open"));
        }
        self.rendered = false;

        let events = content.buffer.into_events();
        let open = match (content.changed, content.unchanged) {
            (true, false) => Some(marker::open_plain(self.op, &self.names)?),
            (true, true) => Some(match &content.node {
                Some((tag, attrs)) => marker::open_formatting(self.op, &self.names, tag, attrs)?,
                None => marker::open_plain(self.op, &self.names)?,
            }),
            (false, _) => None,
        };
        trace!(op = %self.op, wrapped = open.is_some(), len = events.len(), "marker closed");

        self.spanning &= finishing && open.is_some();
        match open {
            Some(open) => {
                self.events.push(open);
                self.events.extend(events);
                self.events.push(marker::close(self.op, &self.names)?);
            }
            None => self.events.extend(events),
        }
        Ok(())
    }

    /// Append one event. `changed` is true when the event belongs to this
    /// buffer's operation rather than to unchanged content.
    pub fn append(&mut self, event: Event, changed: bool, diagnostics: &mut Diagnostics) -> DiffResult<()> {
        if let Some(content) = &mut self.content {
            if !(event.is_close() && content.buffer.is_stack_empty()) {
                content.record(&event, changed);
                return content.buffer.append(event, diagnostics);
            }
            self.close_marker(false)?;
        }

        match &event {
            Event::Open { tag, .. } => {
                self.stack.push(StackEntry::Element(tag.clone()));
                let tag = tag.clone();
                self.events.push(event);
                if !self.rendered && self.can_hold_marker(Some(&tag), diagnostics) {
                    self.open_marker();
                }
                return Ok(());
            }
            Event::Close { tag, span } => {
                if self.stack.last() == Some(&StackEntry::Marker) {
                    return Err(DiffError::invariant("marker on the stack without buffered content"));
                }
                let found = self
                    .stack
                    .iter()
                    .rposition(|entry| matches!(entry, StackEntry::Element(open) if open == tag));
                if found.is_none_or(|pos| pos + 1 != self.stack.len()) {
                    let diagnostic = match self.stack.last() {
                        Some(_) => Diagnostic::new(DiagnosticKind::UnmatchedClose, format!("closing </{tag}> out of order")),
                        None => Diagnostic::new(
                            DiagnosticKind::StackUnderflow,
                            format!("closing </{tag}> outside the {} run", self.op),
                        ),
                    };
                    diagnostics.report(diagnostic.with_tag(tag.clone()).with_span(*span))?;
                    let Some(pos) = found else {
                        return Ok(());
                    };
                    for entry in self.stack.drain(pos + 1..).rev() {
                        if let StackEntry::Element(open) = entry {
                            self.events.push(Event::close(open));
                        }
                    }
                }
                self.stack.pop();
            }
            Event::Text { .. } => {}
        }
        self.events.push(event);
        Ok(())
    }

    /// Append events that are already balanced.
    pub fn extend(
        &mut self,
        events: impl IntoIterator<Item = Event>,
        changed: bool,
        diagnostics: &mut Diagnostics,
    ) -> DiffResult<()> {
        events.into_iter().try_for_each(|event| self.append(event, changed, diagnostics))
    }

    /// Whether nothing is open apart from the pending marker.
    pub fn is_stack_empty(&self) -> bool {
        let outer = match self.stack.as_slice() {
            [] | [StackEntry::Marker] => true,
            _ => false,
        };
        outer && self.content.as_ref().is_none_or(|c| c.buffer.is_stack_empty())
    }

    /// Innermost open element, inside or outside the marker.
    pub fn current_element(&self) -> Option<&Tag> {
        if let Some(tag) = self.content.as_ref().and_then(|c| c.buffer.current_element()) {
            return Some(tag);
        }
        self.stack.iter().rev().find_map(|entry| match entry {
            StackEntry::Element(tag) => Some(tag),
            StackEntry::Marker => None,
        })
    }

    /// Close a pending marker and return the produced events.
    pub fn finish(mut self, diagnostics: &mut Diagnostics) -> DiffResult<Fragment> {
        if let Some(content) = &mut self.content {
            if !content.buffer.is_stack_empty() {
                diagnostics.warn(Diagnostic::new(
                    DiagnosticKind::UnclosedMarker,
                    format!("{} marker finished with elements still open inside", self.op),
                ));
                content.buffer.close_open();
            }
            if self.stack.last() != Some(&StackEntry::Marker) {
                diagnostics.warn(Diagnostic::new(
                    DiagnosticKind::UnclosedMarker,
                    format!("{} marker finished inside an open element", self.op),
                ));
                // Drop the elements above the marker so it can be rendered
                while self.stack.last().is_some_and(|e| *e != StackEntry::Marker) {
                    self.stack.pop();
                }
            }
            self.close_marker(true)?;
        } else {
            self.spanning = false;
        }

        Ok(Fragment {
            events: self.events,
            wrapped: self.spanning,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> MarkerNames {
        MarkerNames::default()
    }

    fn html(events: &[Event]) -> String {
        crate::render::render_html(events)
    }

    #[test]
    fn test_buffer_tracks_nesting() {
        let mut diags = Diagnostics::new();
        let mut buffer = Buffer::new();
        buffer.append(Event::open("p"), &mut diags).unwrap();
        assert_eq!(buffer.current_element().map(|t| t.as_str()), Some("p"));
        buffer.append(Event::text("x"), &mut diags).unwrap();
        buffer.append(Event::close("p"), &mut diags).unwrap();
        assert!(buffer.is_stack_empty());
        assert!(diags.is_empty());
        assert_eq!(buffer.events().len(), 3);
    }

    #[test]
    fn test_buffer_unmatched_close_recovers() {
        let mut diags = Diagnostics::new();
        let mut buffer = Buffer::new();
        buffer
            .extend([Event::open("div"), Event::open("b"), Event::close("div")], &mut diags)
            .unwrap();
        assert!(buffer.is_stack_empty());
        assert!(diags.has(DiagnosticKind::UnmatchedClose));
        // </b> is supplied before </div>
        assert_eq!(html(buffer.events()), "<div><b></b></div>");
        assert!(crate::node::is_balanced(buffer.events()));
    }

    #[test]
    fn test_buffer_drops_close_without_open() {
        let mut diags = Diagnostics::new();
        let mut buffer = Buffer::new();
        buffer
            .extend([Event::open("p"), Event::close("em"), Event::close("p")], &mut diags)
            .unwrap();
        assert!(diags.has(DiagnosticKind::UnmatchedClose));
        assert_eq!(html(buffer.events()), "<p></p>");
    }

    #[test]
    fn test_buffer_underflow() {
        let mut diags = Diagnostics::new();
        let mut buffer = Buffer::new();
        buffer.append(Event::close("p"), &mut diags).unwrap();
        assert!(diags.has(DiagnosticKind::StackUnderflow));
        assert!(buffer.events().is_empty());

        let mut strict = Diagnostics::strict();
        assert!(matches!(
            Buffer::new().append(Event::close("p"), &mut strict),
            Err(DiffError::Structural(_))
        ));
    }

    #[test]
    fn test_buffer_inject_reports_mismatch() {
        let mut diags = Diagnostics::new();
        let mut buffer = Buffer::new();
        buffer.inject([Event::close("p")], &mut diags).unwrap();
        assert!(buffer.events().is_empty());
        assert!(diags.has(DiagnosticKind::MismatchedInjection));

        let mut diags = Diagnostics::new();
        buffer.append(Event::open("div"), &mut diags).unwrap();
        buffer.append(Event::open("p"), &mut diags).unwrap();
        buffer
            .inject([Event::close("p"), Event::open("p"), Event::text("b")], &mut diags)
            .unwrap();
        assert_eq!(buffer.current_element().map(|t| t.as_str()), Some("p"));
        buffer.append(Event::close("p"), &mut diags).unwrap();
        buffer.append(Event::close("div"), &mut diags).unwrap();
        assert!(buffer.is_stack_empty());
        assert!(diags.is_empty());
        assert_eq!(html(buffer.events()), "<div><p></p><p>b</p></div>");
    }

    #[test]
    fn test_mismatched_injection_never_escalates() {
        let mut strict = Diagnostics::strict();
        let mut buffer = Buffer::new();
        buffer.append(Event::open("p"), &mut strict).unwrap();
        buffer.inject([Event::close("b")], &mut strict).unwrap();
        assert!(strict.has(DiagnosticKind::MismatchedInjection));
    }

    #[test]
    fn test_diff_buffer_rejects_replace() {
        let mut diags = Diagnostics::new();
        assert!(matches!(
            DiffBuffer::new(Operation::Replace, None, &names(), &mut diags),
            Err(DiffError::UnsupportedMarker(Operation::Replace))
        ));
        assert!(DiffBuffer::new(Operation::Equal, None, &names(), &mut diags).is_err());
    }

    #[test]
    fn test_marker_wraps_run_at_root() {
        let mut diags = Diagnostics::new();
        let mut buffer = DiffBuffer::new(Operation::Insert, None, &names(), &mut diags).unwrap();
        buffer
            .extend([Event::open("em"), Event::text("B"), Event::close("em")], true, &mut diags)
            .unwrap();
        assert!(buffer.is_stack_empty());
        let fragment = buffer.finish(&mut diags).unwrap();
        assert!(fragment.wrapped);
        assert_eq!(html(&fragment.events), "<ins><em>B</em></ins>");
        assert_eq!(html(&fragment.unwrap_marker()), "<em>B</em>");
    }

    #[test]
    fn test_marker_deferred_inside_step_inside_parent() {
        // <li> inserted into a <ul>: the marker goes inside the <li>
        let mut diags = Diagnostics::new();
        let mut buffer = DiffBuffer::new(Operation::Insert, Some("ul"), &names(), &mut diags).unwrap();
        buffer.append(Event::open("li"), true, &mut diags).unwrap();
        assert!(!buffer.is_stack_empty());
        assert_eq!(buffer.current_element().map(|t| t.as_str()), Some("li"));
        buffer.append(Event::text("x"), true, &mut diags).unwrap();
        buffer.append(Event::close("li"), true, &mut diags).unwrap();
        assert!(buffer.is_stack_empty());

        let fragment = buffer.finish(&mut diags).unwrap();
        assert!(!fragment.wrapped);
        assert_eq!(html(&fragment.events), "<li><ins>x</ins></li>");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_formatting_marker_for_mixed_content() {
        let mut diags = Diagnostics::new();
        let mut buffer = DiffBuffer::new(Operation::Insert, Some("p"), &names(), &mut diags).unwrap();
        buffer.append(Event::open("b"), true, &mut diags).unwrap();
        buffer.append(Event::text("x"), false, &mut diags).unwrap();
        buffer.append(Event::close("b"), true, &mut diags).unwrap();

        let fragment = buffer.finish(&mut diags).unwrap();
        assert!(fragment.wrapped);
        let open = &fragment.events[0];
        assert_eq!(open.opened_tag().map(|t| t.as_str()), Some("ins"));
        assert!(open.attrs().unwrap().iter().any(|(k, v)| k == "x-diff-node" && v == "b"));
        assert_eq!(html(&fragment.events[1..4]), "<b>x</b>");
    }

    #[test]
    fn test_unchanged_content_has_no_marker() {
        let mut diags = Diagnostics::new();
        let mut buffer = DiffBuffer::new(Operation::Delete, None, &names(), &mut diags).unwrap();
        buffer.append(Event::text("x"), false, &mut diags).unwrap();
        let fragment = buffer.finish(&mut diags).unwrap();
        assert!(!fragment.wrapped);
        assert_eq!(fragment.events, vec![Event::text("x")]);
    }

    #[test]
    fn test_block_parent_suppresses_markers() {
        let mut diags = Diagnostics::new();
        let mut buffer = DiffBuffer::new(Operation::Delete, Some("pre"), &names(), &mut diags).unwrap();
        buffer.append(Event::open("b"), true, &mut diags).unwrap();
        buffer.append(Event::close("b"), true, &mut diags).unwrap();
        let fragment = buffer.finish(&mut diags).unwrap();
        assert_eq!(html(&fragment.events), "<b></b>");
        assert!(diags.has(DiagnosticKind::MarkerSuppressed));
    }

    #[test]
    fn test_unknown_parent_warns() {
        let mut diags = Diagnostics::new();
        let buffer = DiffBuffer::new(Operation::Insert, Some("x-widget"), &names(), &mut diags).unwrap();
        assert!(buffer.finish(&mut diags).unwrap().is_empty());
        assert!(diags.has(DiagnosticKind::UnknownContentModel));
    }

    #[test]
    fn test_close_outside_run_is_dropped() {
        let mut diags = Diagnostics::new();
        let mut buffer = DiffBuffer::new(Operation::Delete, Some("p"), &names(), &mut diags).unwrap();
        buffer.append(Event::close("p"), true, &mut diags).unwrap();
        buffer.append(Event::open("p"), true, &mut diags).unwrap();
        assert!(!buffer.is_stack_empty());
        buffer.append(Event::text("b"), false, &mut diags).unwrap();
        buffer.append(Event::close("p"), false, &mut diags).unwrap();

        let fragment = buffer.finish(&mut diags).unwrap();
        assert!(!fragment.wrapped);
        assert_eq!(html(&fragment.events), "<p>b</p>");
        assert!(diags.has(DiagnosticKind::StackUnderflow));
    }

    #[test]
    fn test_finish_closes_elements_left_open() {
        let mut diags = Diagnostics::new();
        let mut buffer = DiffBuffer::new(Operation::Insert, None, &names(), &mut diags).unwrap();
        buffer.append(Event::open("b"), true, &mut diags).unwrap();
        buffer.append(Event::text("x"), true, &mut diags).unwrap();

        let fragment = buffer.finish(&mut diags).unwrap();
        assert_eq!(html(&fragment.events), "<ins><b>x</b></ins>");
        assert!(diags.has(DiagnosticKind::UnclosedMarker));
    }
}
