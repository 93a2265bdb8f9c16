//! Diff configuration
//!
//! # Example
//!
//! ```
//! use tola_htmldiff::config::{AttrDiffConfig, DiffConfig};
//!
//! let config = DiffConfig::default()
//!     .with_attributes(AttrDiffConfig::none().with("a", ["href"]))
//!     .with_strict(true);
//! assert!(config.validate().is_ok());
//! ```

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{DiffError, DiffResult};
use crate::event::Tag;

/// Key matching every element in [`AttrDiffConfig`]
pub const ANY_ELEMENT: &str = "*";

// =============================================================================
// AttrDiffConfig
// =============================================================================

/// Which attributes are sub-diffed on otherwise unchanged elements.
///
/// Maps a tag name (or [`ANY_ELEMENT`]) to attribute names. The attributes
/// for a tag are the wildcard set followed by the tag's own set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrDiffConfig {
    by_tag: FxHashMap<Tag, Vec<CompactString>>,
}

impl AttrDiffConfig {
    /// No attribute is diffed; any attribute change replaces the element.
    pub fn none() -> Self {
        Self {
            by_tag: FxHashMap::default(),
        }
    }

    /// Add attribute names for a tag (or `"*"`).
    pub fn with<I, S>(mut self, tag: impl Into<Tag>, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        let entry = self.by_tag.entry(tag.into()).or_default();
        for attr in attrs {
            let attr = attr.into();
            if !entry.contains(&attr) {
                entry.push(attr);
            }
        }
        self
    }

    /// Attribute names eligible for diffing on `tag`, in a stable order.
    pub fn attributes_for(&self, tag: &str) -> SmallVec<[&str; 4]> {
        let mut names: SmallVec<[&str; 4]> = SmallVec::new();
        let sets = [self.by_tag.get(ANY_ELEMENT), self.by_tag.get(tag)];
        for name in sets.into_iter().flatten().flatten() {
            if !names.contains(&name.as_str()) {
                names.push(name.as_str());
            }
        }
        names
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_tag.values().all(Vec::is_empty)
    }
}

impl Default for AttrDiffConfig {
    /// `style` everywhere, `class` on `span`/`p`, cell spans on `td`/`th`.
    fn default() -> Self {
        Self::none()
            .with(ANY_ELEMENT, ["style"])
            .with("span", ["class"])
            .with("p", ["class"])
            .with("td", ["colspan", "rowspan"])
            .with("th", ["colspan", "rowspan"])
    }
}

// =============================================================================
// MarkerNames
// =============================================================================

/// Element names used for the emitted markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerNames {
    pub insert: Tag,
    pub delete: Tag,
    /// `class` value of formatting markers
    pub formatting_class: CompactString,
}

impl Default for MarkerNames {
    fn default() -> Self {
        Self {
            insert: Tag::const_new("ins"),
            delete: Tag::const_new("del"),
            formatting_class: CompactString::const_new("formatting"),
        }
    }
}

impl MarkerNames {
    /// Check if `tag` is one of the marker elements.
    #[inline]
    pub fn is_marker(&self, tag: &str) -> bool {
        self.insert == tag || self.delete == tag
    }
}

// =============================================================================
// DiffConfig
// =============================================================================

/// Configuration for one diff invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffConfig {
    /// Attribute sub-diffing rules
    pub attributes: AttrDiffConfig,
    /// Marker element names
    pub markers: MarkerNames,
    /// Treat whitespace-only text tokens as junk during alignment.
    /// Default: true
    pub junk_whitespace: bool,
    /// Ignore very frequent tokens as alignment anchors in long documents.
    /// Default: true
    pub autojunk: bool,
    /// Escalate structural faults (unmatched close, underflow) to errors.
    /// Default: false
    pub strict: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            attributes: AttrDiffConfig::default(),
            markers: MarkerNames::default(),
            junk_whitespace: true,
            autojunk: true,
            strict: false,
        }
    }
}

impl DiffConfig {
    /// Exact alignment: no junk heuristics, no attribute sub-diffing.
    pub fn exact() -> Self {
        Self {
            attributes: AttrDiffConfig::none(),
            junk_whitespace: false,
            autojunk: false,
            ..Self::default()
        }
    }

    pub fn with_attributes(mut self, attributes: AttrDiffConfig) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_markers(mut self, markers: MarkerNames) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_junk_whitespace(mut self, enabled: bool) -> Self {
        self.junk_whitespace = enabled;
        self
    }

    pub fn with_autojunk(mut self, enabled: bool) -> Self {
        self.autojunk = enabled;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Reject configurations that would emit unusable markers.
    pub fn validate(&self) -> DiffResult<()> {
        let MarkerNames { insert, delete, .. } = &self.markers;
        if insert.is_empty() || delete.is_empty() {
            return Err(DiffError::config("marker element names must not be empty"));
        }
        if insert == delete {
            return Err(DiffError::config(format!(
                "insert and delete markers must differ, both are <{insert}>"
            )));
        }
        for name in [insert, delete] {
            if name.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '/' | '"' | '\'' | '=')) {
                return Err(DiffError::config(format!("`{name}` is not a valid element name")));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
