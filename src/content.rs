//! Content model: where diff markers may legally appear
//!
//! Every element is classified into one of four behaviors that govern how
//! the diff engine treats its contents:
//!
//! | Behavior | Diffed inside | Markers as direct content |
//! |----------|---------------|---------------------------|
//! | `Internally` | yes | yes |
//! | `StepInside` | yes | no (maybe deeper) |
//! | `AsBlock` | no, compared as a whole | no |
//! | `Skip` | no, new version copied | no |
//!
//! Tags missing from the table resolve to `Unknown`, which callers must
//! treat as "markers cannot be placed here".

use crate::event::Event;

/// Tag of the synthetic element wrapping both documents during a diff
pub const ROOT_TAG: &str = "#root";

/// Per-element diff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentBehavior {
    /// Contents are diffed and may directly hold markers
    Internally,
    /// Contents are diffed but markers must go deeper (lists, tables)
    StepInside,
    /// Element is an indivisible unit compared as a whole
    AsBlock,
    /// Element is not diffed; the new version is passed through
    Skip,
    /// Element is absent from the content model
    Unknown,
}

impl ContentBehavior {
    /// Whether a marker may be opened as a direct child of this element
    #[inline]
    pub fn permits_markers(&self) -> bool {
        matches!(self, Self::Internally)
    }

    /// Whether the element is handled as a whole subtree
    #[inline]
    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::AsBlock | Self::Skip)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Internally => "internally",
            Self::StepInside => "step-inside",
            Self::AsBlock => "as-block",
            Self::Skip => "skip",
            Self::Unknown => "unknown",
        }
    }
}

/// Check if `event` opens an element handled as a whole subtree.
#[inline]
pub fn opens_opaque(event: &Event) -> bool {
    event.opened_tag().is_some_and(|tag| behavior(tag).is_opaque())
}

/// Look up the content behavior of a parent element.
///
/// `None` is the document root, which always permits markers.
pub fn behavior_of(tag: Option<&str>) -> ContentBehavior {
    match tag {
        None => ContentBehavior::Internally,
        Some(tag) => behavior(tag),
    }
}

/// Look up the content behavior of a tag.
pub fn behavior(tag: &str) -> ContentBehavior {
    use ContentBehavior::*;

    match tag {
        ROOT_TAG => Internally,

        // Sectioning
        "article" | "section" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "header" | "footer"
        | "address" => Internally,
        // nav and aside are not supported
        "nav" | "aside" => Unknown,

        // Grouping
        "p" | "blockquote" | "li" | "dt" | "dd" | "figure" | "figcaption" | "div" | "main" => {
            Internally
        }
        // hr holds nothing, pre does not accept markup inside
        "hr" | "pre" => AsBlock,
        "ol" | "ul" | "dl" => StepInside,

        // Text level
        "a" | "em" | "strong" | "small" | "s" | "cite" | "q" | "dfn" | "code" | "samp" | "sub"
        | "sup" | "i" | "b" | "u" | "mark" | "bdi" | "bdo" | "span" => Internally,
        "data" => Skip,
        "br" | "wbr" => AsBlock,
        // diffing these inside would be misleading or break them
        "abbr" | "time" | "kbd" | "var" | "ruby" => AsBlock,

        // Edits
        "ins" | "del" => Internally,

        // Embedded
        "img" | "iframe" | "embed" | "object" | "video" | "audio" | "svg" | "math" | "map" => {
            AsBlock
        }

        // Tabular
        "table" | "tbody" | "thead" | "tfoot" | "tr" => StepInside,
        "caption" | "td" | "th" => Internally,
        "colgroup" => Skip,

        // Forms
        "form" | "label" | "output" | "fieldset" | "legend" => Internally,
        "input" | "button" | "select" | "textarea" | "keygen" | "progress" | "meter" => AsBlock,
        "datalist" => Unknown,

        // Scripting
        "script" | "noscript" | "template" => Skip,

        _ => Unknown,
    }
}

// =============================================================================
// Tests
// =============================================================================
