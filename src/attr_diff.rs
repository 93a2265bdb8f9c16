//! Attribute sub-diffing
//!
//! When an element keeps its tag but some configured attributes change, the
//! engine keeps the element unchanged and records the change in auxiliary
//! `x-diff-<attr>` attributes instead of replacing the element.
//!
//! # Encoding
//!
//! The difference is a list of lines, one per item:
//!
//! | Prefix | Meaning |
//! |--------|---------|
//! | `' '` | item present in both versions |
//! | `'-'` | item only in the old version |
//! | `'+'` | item only in the new version |
//!
//! Lines are joined with `\n` and base64 encoded (standard alphabet).
//!
//! How a value is split into items depends on the attribute:
//! `style` is a list of `;`-separated rules, `class` a list of
//! whitespace-separated tokens, anything else a single opaque value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::algo::{Operation, SequenceMatcher};
use crate::attr::{Attrs, AttrsExt};

/// Prefix of the auxiliary attributes holding encoded differences
pub const DIFF_ATTR_PREFIX: &str = "x-diff-";

// =============================================================================
// Strategy
// =============================================================================

/// How an attribute value is split before diffing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrStrategy {
    /// Compare as one opaque value
    WholeValue,
    /// Whitespace-separated tokens (`class`)
    TokenList,
    /// Semicolon-separated rules (`style`)
    RuleList,
}

impl AttrStrategy {
    pub fn for_attr(name: &str) -> Self {
        match name {
            "style" => Self::RuleList,
            "class" => Self::TokenList,
            _ => Self::WholeValue,
        }
    }

    fn split<'a>(&self, value: &'a str) -> Vec<&'a str> {
        match self {
            Self::WholeValue => vec![value],
            Self::TokenList => value.split_whitespace().collect(),
            Self::RuleList => split_rules(value),
        }
    }
}

/// Split inline CSS on `;` outside quotes and parentheses.
///
/// Rules are trimmed and empty rules dropped.
pub fn split_rules(style: &str) -> Vec<&str> {
    let mut rules = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in style.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                rules.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    rules.push(&style[start..]);

    rules.into_iter().map(str::trim).filter(|r| !r.is_empty()).collect()
}

// =============================================================================
// Diffing
// =============================================================================

/// Line-level difference of two attribute values.
pub fn diff_values(strategy: AttrStrategy, old: &str, new: &str) -> Vec<String> {
    match strategy {
        AttrStrategy::WholeValue => whole_value_lines(old, new),
        _ => item_lines(&strategy.split(old), &strategy.split(new)),
    }
}

fn whole_value_lines(old: &str, new: &str) -> Vec<String> {
    if old == new {
        return vec![format!(" {new}")];
    }
    let mut lines = Vec::with_capacity(2);
    if !old.is_empty() {
        lines.push(format!("-{old}"));
    }
    if !new.is_empty() {
        lines.push(format!("+{new}"));
    }
    lines
}

fn item_lines(old: &[&str], new: &[&str]) -> Vec<String> {
    let mut lines = Vec::new();
    let matcher = SequenceMatcher::with_options(old, new, None, false);

    for opcode in matcher.opcodes() {
        let old_items = &old[opcode.old_start..opcode.old_end];
        let new_items = &new[opcode.new_start..opcode.new_end];
        match opcode.op {
            Operation::Equal => lines.extend(old_items.iter().map(|item| format!(" {item}"))),
            Operation::Delete => lines.extend(old_items.iter().map(|item| format!("-{item}"))),
            Operation::Insert => lines.extend(new_items.iter().map(|item| format!("+{item}"))),
            Operation::Replace => {
                for i in 0..old_items.len().max(new_items.len()) {
                    if let Some(item) = old_items.get(i) {
                        lines.push(format!("-{item}"));
                    }
                    if let Some(item) = new_items.get(i) {
                        lines.push(format!("+{item}"));
                    }
                }
            }
        }
    }
    lines
}

/// Encoded difference of one attribute, `None` if the values are equal.
///
/// A missing attribute is diffed as an empty value.
pub fn diff_attr(name: &str, old: Option<&str>, new: Option<&str>) -> Option<String> {
    let (old, new) = (old.unwrap_or(""), new.unwrap_or(""));
    if old == new {
        return None;
    }
    let lines = diff_values(AttrStrategy::for_attr(name), old, new);
    Some(STANDARD.encode(lines.join("\n")))
}

/// Annotate the new attribute list with `x-diff-*` entries for every listed
/// attribute whose value changed.
///
/// Returns `None` when none of the listed attributes changed.
pub fn annotate(old: &Attrs, new: &Attrs, names: &[&str]) -> Option<Attrs> {
    let mut annotated = new.clone();
    let mut changed = false;
    for &name in names {
        if let Some(encoded) = diff_attr(name, old.get_attr(name), new.get_attr(name)) {
            annotated.set_attr(format!("{DIFF_ATTR_PREFIX}{name}"), encoded);
            changed = true;
        }
    }
    changed.then_some(annotated)
}

/// Decode an `x-diff-*` value back into its lines.
pub fn decode(encoded: &str) -> Option<Vec<String>> {
    let bytes = STANDARD.decode(encoded).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    Some(text.split('\n').map(str::to_string).collect())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attrs {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_split_rules() {
        assert_eq!(split_rules("color: red; font-size: 10pt;"), ["color: red", "font-size: 10pt"]);
        assert_eq!(
            split_rules("background: url('a;b.png'); content: \"x;y\""),
            ["background: url('a;b.png')", "content: \"x;y\""]
        );
        assert_eq!(split_rules("a: rgb(1;2); b: c"), ["a: rgb(1;2)", "b: c"]);
        assert!(split_rules(" ; ;").is_empty());
    }

    #[test]
    fn test_whole_value_lines() {
        assert_eq!(diff_values(AttrStrategy::WholeValue, "2", "3"), ["-2", "+3"]);
        assert_eq!(diff_values(AttrStrategy::WholeValue, "", "3"), ["+3"]);
        assert_eq!(diff_values(AttrStrategy::WholeValue, "2", ""), ["-2"]);
        assert_eq!(diff_values(AttrStrategy::WholeValue, "2", "2"), [" 2"]);
    }

    #[test]
    fn test_token_list_lines() {
        assert_eq!(
            diff_values(AttrStrategy::TokenList, "a b c", "a c d"),
            [" a", "-b", " c", "+d"]
        );
    }

    #[test]
    fn test_rule_list_replace_interleaves() {
        assert_eq!(
            diff_values(AttrStrategy::RuleList, "color: red; margin: 0", "color: blue; margin: 0"),
            ["-color: red", "+color: blue", " margin: 0"]
        );
    }

    #[test]
    fn test_diff_attr_equal_is_none() {
        assert_eq!(diff_attr("style", Some("a: b"), Some("a: b")), None);
        assert_eq!(diff_attr("style", None, Some("")), None);
    }

    #[test]
    fn test_diff_attr_encoding() {
        let encoded = diff_attr("colspan", Some("2"), Some("3")).unwrap();
        assert_eq!(encoded, STANDARD.encode("-2\n+3"));
        assert_eq!(decode(&encoded).unwrap(), ["-2", "+3"]);
    }

    #[test]
    fn test_annotate() {
        let old = attrs(&[("class", "x"), ("style", "color: red")]);
        let new = attrs(&[("class", "x"), ("style", "color: blue")]);
        let annotated = annotate(&old, &new, &["style", "class"]).unwrap();
        assert_eq!(annotated.get_attr("style"), Some("color: blue"));
        assert!(annotated.has_attr("x-diff-style"));
        assert!(!annotated.has_attr("x-diff-class"));

        assert!(annotate(&new, &new, &["style"]).is_none());
    }
}
