//! Prelude module for common imports.
//!
//! ```
//! use tola_htmldiff::prelude::*;
//! ```

// Events and trees
pub use crate::event::{Event, Tag};
pub use crate::node::{Children, Element, Node, Text};

// Attributes
pub use crate::attr::{Attrs, AttrsExt};

// Configuration
pub use crate::config::{AttrDiffConfig, DiffConfig, MarkerNames};

// Diffing
pub use crate::algo::{DiffUnit, Operation};
pub use crate::{diff, diff_with_config, DiffOutput, DiffStats, HtmlDiff};

#[cfg(feature = "parallel")]
pub use crate::diff_batch;

// Diagnostics and errors
pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use crate::error::{DiffError, DiffResult};

// Span
pub use crate::span::SourceSpan;

// Render
pub use crate::render::render_html;
