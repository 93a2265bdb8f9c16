//! Structural events
//!
//! A document is diffed as the flat, depth-first sequence of its structural
//! events: opening an element, closing an element, or a text leaf.
//!
//! # Equality
//!
//! Equality (and hashing) deliberately ignores [`SourceSpan`]:
//!
//! - `Text` events are equal iff their fragments are equal
//! - `Close` events are equal iff their tags are equal
//! - `Open` events are equal iff tags and attribute lists are equal bytewise

use std::fmt;
use std::hash::{Hash, Hasher};

use compact_str::CompactString;

use crate::attr::Attrs;
use crate::span::SourceSpan;

/// Element tag name
pub type Tag = CompactString;

// =============================================================================
// Event
// =============================================================================

/// One atomic step of a document's depth-first walk
#[derive(Debug, Clone)]
pub enum Event {
    /// Opening an element
    Open {
        tag: Tag,
        attrs: Attrs,
        span: SourceSpan,
    },
    /// Closing an element
    Close { tag: Tag, span: SourceSpan },
    /// Text leaf
    Text { content: String, span: SourceSpan },
}

impl Event {
    /// Opening tag without attributes or source position
    pub fn open(tag: impl Into<Tag>) -> Self {
        Self::Open {
            tag: tag.into(),
            attrs: Attrs::new(),
            span: SourceSpan::detached(),
        }
    }

    /// Opening tag with attributes
    pub fn open_with(tag: impl Into<Tag>, attrs: Attrs) -> Self {
        Self::Open {
            tag: tag.into(),
            attrs,
            span: SourceSpan::detached(),
        }
    }

    /// Closing tag
    pub fn close(tag: impl Into<Tag>) -> Self {
        Self::Close {
            tag: tag.into(),
            span: SourceSpan::detached(),
        }
    }

    /// Text leaf
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            span: SourceSpan::detached(),
        }
    }

    /// Attach a source position
    pub fn with_span(mut self, pos: SourceSpan) -> Self {
        match &mut self {
            Self::Open { span, .. } | Self::Close { span, .. } | Self::Text { span, .. } => {
                *span = pos;
            }
        }
        self
    }

    /// Source position of this event
    pub fn span(&self) -> SourceSpan {
        match self {
            Self::Open { span, .. } | Self::Close { span, .. } | Self::Text { span, .. } => *span,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    #[inline]
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close { .. })
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    /// Tag of an `Open` or `Close` event
    pub fn tag(&self) -> Option<&Tag> {
        match self {
            Self::Open { tag, .. } | Self::Close { tag, .. } => Some(tag),
            Self::Text { .. } => None,
        }
    }

    /// Tag of an `Open` event only
    pub fn opened_tag(&self) -> Option<&Tag> {
        match self {
            Self::Open { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Attributes of an `Open` event
    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            Self::Open { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    /// Text fragment of a `Text` event
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Check if this is a text event made only of whitespace
    pub fn is_whitespace(&self) -> bool {
        match self {
            Self::Text { content, .. } => !content.is_empty() && content.chars().all(char::is_whitespace),
            _ => false,
        }
    }

    /// Check if two events are of the same variant (open/close/text)
    pub fn same_kind(&self, other: &Event) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Open { tag: a, attrs: aa, .. },
                Self::Open { tag: b, attrs: ba, .. },
            ) => a == b && aa == ba,
            (Self::Close { tag: a, .. }, Self::Close { tag: b, .. }) => a == b,
            (Self::Text { content: a, .. }, Self::Text { content: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Open { tag, attrs, .. } => {
                tag.hash(state);
                attrs.hash(state);
            }
            Self::Close { tag, .. } => tag.hash(state),
            Self::Text { content, .. } => content.hash(state),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { tag, attrs, .. } => {
                write!(f, "<{tag}")?;
                for (name, value) in attrs {
                    write!(f, " {name}=\"{value}\"")?;
                }
                f.write_str(">")
            }
            Self::Close { tag, .. } => write!(f, "</{tag}>"),
            Self::Text { content, .. } => write!(f, "{content:?}"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
