//! HTML rendering for event streams
//!
//! Serializes a (marked) event stream back to markup. Text is escaped except
//! inside raw-text elements (`script`, `style`), void elements are written
//! as `<img ... />` and their closing events are dropped.

use crate::attr::Attrs;
use crate::event::Event;

// =============================================================================
// Event Rendering
// =============================================================================

/// Render events to an HTML string.
pub fn render_html(events: &[Event]) -> String {
    let mut output = String::with_capacity(events.len() * 8);
    render_into(events, &mut output);
    output
}

/// Render events, appending to `output`.
pub fn render_into(events: &[Event], output: &mut String) {
    // Depth of open raw-text elements
    let mut raw = 0usize;

    for event in events {
        match event {
            Event::Open { tag, attrs, .. } => {
                output.push('<');
                output.push_str(tag);
                render_attrs(attrs, output);

                if is_void_element(tag) {
                    output.push_str(" />");
                    continue;
                }
                output.push('>');
                if is_raw_text_element(tag) {
                    raw += 1;
                }
            }
            Event::Close { tag, .. } => {
                if is_void_element(tag) {
                    continue;
                }
                if is_raw_text_element(tag) {
                    raw = raw.saturating_sub(1);
                }
                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            Event::Text { content, .. } => {
                if raw > 0 {
                    output.push_str(content);
                } else {
                    output.push_str(&escape_html(content));
                }
            }
        }
    }
}

/// Render attributes to HTML.
fn render_attrs(attrs: &Attrs, output: &mut String) {
    for (name, value) in attrs.iter() {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
        output.push_str(&escape_attr(value));
        output.push('"');
    }
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape attribute value special characters.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Check if element is a void element (self-closing).
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[inline]
fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

// =============================================================================
// Tests
// =============================================================================
