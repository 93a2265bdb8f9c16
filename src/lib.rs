//! tola-htmldiff - Tag-aware structural HTML diff
//!
//! Compares two versions of a document given as structural event streams and
//! produces one stream in which inserted and removed content is wrapped in
//! `<ins>`/`<del>` markers, placed only where the content model allows them.
//!
//! ## Pipeline
//!
//! ```text
//! old events ─┐                                                 ┌─ marked events
//!             ├─ tokenize ─ align ─ pair ─ reconcile ─ process ─┤
//! new events ─┘                                                 └─ diagnostics
//! ```
//!
//! ## Modules
//! - `event`: structural events (`Open`, `Close`, `Text`)
//! - `node`: small tree builder flattening into events
//! - `tokenize`: word-level splitting of text events
//! - `algo`: sequence alignment and diff units
//! - `content`: per-tag content model
//! - `process`: tree-aware processor state machine
//! - `buffer`: nesting-aware output buffers and lazy markers
//! - `attr_diff`: sub-diffing of style/class/span attributes
//! - `render`: serialization back to HTML
//!
//! ## Usage
//!
//! ```
//! use tola_htmldiff::node::{Element, Node};
//!
//! let old = Node::from(Element::new("p").text("the quick fox")).to_events();
//! let new = Node::from(Element::new("p").text("the slow fox")).to_events();
//!
//! let output = tola_htmldiff::diff(&old, &new).unwrap();
//! assert_eq!(output.to_html(), "<p>the <del>quick</del><ins>slow</ins> fox</p>");
//! ```

#[macro_use]
mod tracing_macros;

// =============================================================================
// Core modules
// =============================================================================

/// Structural events
pub mod event;

/// Node tree builder
pub mod node;

/// Attribute types
pub mod attr;

/// Source span information
pub mod span;

/// Text tokenization
pub mod tokenize;

/// Algorithms: matcher, opcodes, diff units
pub mod algo;

/// Content model table
pub mod content;

/// Output buffers and lazy markers
pub mod buffer;

/// Marker element construction
pub mod marker;

/// Attribute sub-diffing
pub mod attr_diff;

/// Processor state machine
pub mod process;

/// Configuration
pub mod config;

/// Recoverable diagnostics
pub mod diagnostics;

/// Error types
pub mod error;

/// HTML rendering
pub mod render;

/// Prelude for common imports
pub mod prelude;

// =============================================================================
// Re-exports
// =============================================================================

pub use algo::{DiffUnit, Operation};
pub use attr::{Attrs, AttrsExt};
pub use config::{AttrDiffConfig, DiffConfig, MarkerNames};
pub use content::{ContentBehavior, ROOT_TAG};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{DiffError, DiffResult};
pub use event::{Event, Tag};
pub use node::{Element, Node, Text};
pub use span::SourceSpan;

use algo::{DiffPairs, reconcile};
use process::{Engine, UnitCounts};

// =============================================================================
// Diff entry points
// =============================================================================

/// Statistics from a diff, counted in tokens
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct DiffStats {
    /// Tokens kept unchanged (including attribute-only changes)
    pub equal: usize,
    /// Tokens only in the new version
    pub inserted: usize,
    /// Tokens only in the old version
    pub deleted: usize,
    /// Aligned token pairs replaced
    pub replaced: usize,
}

impl DiffStats {
    fn from_counts(counts: UnitCounts) -> Self {
        Self {
            // The synthetic root contributes one open and one close
            equal: counts.equal.saturating_sub(2),
            inserted: counts.inserted,
            deleted: counts.deleted,
            replaced: counts.replaced,
        }
    }

    /// Check if anything differs between the versions.
    pub fn has_changes(&self) -> bool {
        self.inserted + self.deleted + self.replaced > 0
    }
}

/// Result of a diff
#[derive(Debug, Clone)]
pub struct DiffOutput {
    /// Marked event stream
    pub events: Vec<Event>,
    /// Recoverable problems met on the way
    pub diagnostics: Diagnostics,
    pub stats: DiffStats,
}

impl DiffOutput {
    /// Render the marked stream to HTML.
    pub fn to_html(&self) -> String {
        render::render_html(&self.events)
    }
}

/// Differ holding one configuration.
#[derive(Debug, Clone, Default)]
pub struct HtmlDiff {
    config: DiffConfig,
}

impl HtmlDiff {
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Diff two event streams.
    ///
    /// Both streams are wrapped in a synthetic root element, tokenized,
    /// aligned, reconciled and processed; the root is removed from the
    /// result.
    pub fn diff(&self, old: &[Event], new: &[Event]) -> DiffResult<DiffOutput> {
        self.config.validate()?;
        debug!(old = old.len(), new = new.len(), "diff start");

        let old = tokenize::tokenize(&with_root(old));
        let new = tokenize::tokenize(&with_root(new));

        let units = reconcile(DiffPairs::from_config(&old, &new, &self.config).collect());
        let output = Engine::new(units.into_iter(), &self.config).run()?;

        let mut events = output.events;
        events.retain(|event| event.tag().is_none_or(|tag| tag != ROOT_TAG));

        let stats = DiffStats::from_counts(output.counts);
        debug!(?stats, diagnostics = output.diagnostics.len(), "diff done");
        Ok(DiffOutput {
            events,
            diagnostics: output.diagnostics,
            stats,
        })
    }

    /// Diff two sequences of sibling nodes.
    pub fn diff_nodes(&self, old: &[Node], new: &[Node]) -> DiffResult<DiffOutput> {
        self.diff(&node::to_events(old), &node::to_events(new))
    }
}

fn with_root(events: &[Event]) -> Vec<Event> {
    let mut wrapped = Vec::with_capacity(events.len() + 2);
    wrapped.push(Event::open(ROOT_TAG));
    wrapped.extend_from_slice(events);
    wrapped.push(Event::close(ROOT_TAG));
    wrapped
}

/// Diff two event streams with the default configuration.
pub fn diff(old: &[Event], new: &[Event]) -> DiffResult<DiffOutput> {
    HtmlDiff::default().diff(old, new)
}

/// Diff two event streams with a custom configuration.
pub fn diff_with_config(old: &[Event], new: &[Event], config: &DiffConfig) -> DiffResult<DiffOutput> {
    HtmlDiff::new(config.clone()).diff(old, new)
}

/// Diff many independent document pairs in parallel.
///
/// Results keep the order of `pairs`.
#[cfg(feature = "parallel")]
pub fn diff_batch(pairs: &[(Vec<Event>, Vec<Event>)], config: &DiffConfig) -> Vec<DiffResult<DiffOutput>> {
    use rayon::prelude::*;

    let differ = HtmlDiff::new(config.clone());
    pairs.par_iter().map(|(old, new)| differ.diff(old, new)).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn p(text: &str) -> Vec<Event> {
        Node::from(Element::new("p").text(text)).to_events()
    }

    #[test]
    fn test_identity_has_no_changes() {
        let events = p("hello big world");
        let output = diff(&events, &events).unwrap();
        assert_eq!(output.to_html(), "<p>hello big world</p>");
        assert!(!output.stats.has_changes());
        assert_eq!(output.stats.equal, 7);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_root_is_stripped() {
        let output = diff(&p("a"), &p("b")).unwrap();
        assert!(output.events.iter().all(|e| e.tag().is_none_or(|t| t != ROOT_TAG)));
        assert_eq!(output.to_html(), "<p><del>a</del><ins>b</ins></p>");
        assert_eq!(output.stats.replaced, 1);
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let markers = MarkerNames {
            insert: "x".into(),
            delete: "x".into(),
            ..MarkerNames::default()
        };
        let config = DiffConfig::default().with_markers(markers);
        assert!(matches!(diff_with_config(&p("a"), &p("b"), &config), Err(DiffError::Config(_))));
    }

    #[test]
    fn test_diff_nodes() {
        let old = [Node::from(Element::new("p").text("A"))];
        let new = [Node::from(Element::new("p").text("A").child(Element::new("em").text("B")))];
        let output = HtmlDiff::default().diff_nodes(&old, &new).unwrap();
        assert_eq!(output.to_html(), "<p>A<ins><em>B</em></ins></p>");
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_diff_batch_keeps_order() {
        let pairs = vec![(p("a"), p("a")), (p("a"), p("b"))];
        let results = diff_batch(&pairs, &DiffConfig::default());
        assert!(!results[0].as_ref().unwrap().stats.has_changes());
        assert!(results[1].as_ref().unwrap().stats.has_changes());
    }
}
