//! Element type with a builder-style API

use smallvec::SmallVec;

use crate::attr::{Attrs, AttrsExt};
use crate::event::Tag;
use crate::span::SourceSpan;

use super::{Node, Text};

// =============================================================================
// Element
// =============================================================================

/// HTML element with children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// HTML tag name
    pub tag: Tag,
    /// Element attributes, in source order
    pub attrs: Attrs,
    /// Child nodes
    pub children: SmallVec<[Node; 8]>,
    pub span: SourceSpan,
}

impl Element {
    pub fn new(tag: impl Into<Tag>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attrs::new(),
            children: SmallVec::new(),
            span: SourceSpan::detached(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an attribute (builder)
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.set_attr(name, value);
        self
    }

    /// Append a child element (builder)
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(Box::new(child)));
        self
    }

    /// Append a text child (builder)
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.children.push(Node::Text(Text::new(content)));
        self
    }

    /// Attach a source position (builder)
    pub fn at(mut self, span: SourceSpan) -> Self {
        self.span = span;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Get attribute value by name
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get_attr(name)
    }

    /// Check if element has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
