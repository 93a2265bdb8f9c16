//! Marker elements
//!
//! Inserted and deleted runs are wrapped in marker elements (`<ins>` and
//! `<del>` by default). A run mixing unchanged content with changed
//! descendants gets a *formatting* marker instead:
//!
//! ```html
//! <del class="formatting" x-diff-node="em" x-diff-attrs="W10=">...</del>
//! ```
//!
//! `x-diff-node` names the innermost changed element and `x-diff-attrs`
//! holds its attributes as a base64 encoded JSON list of `[name, value]`
//! pairs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::algo::Operation;
use crate::attr::Attrs;
use crate::config::MarkerNames;
use crate::error::{DiffError, DiffResult};
use crate::event::{Event, Tag};

/// Attribute naming the changed element inside a formatting marker
pub const NODE_ATTR: &str = "x-diff-node";
/// Attribute holding the changed element's encoded attributes
pub const ATTRS_ATTR: &str = "x-diff-attrs";

/// Element name of the marker for `op`.
pub fn marker_tag(op: Operation, names: &MarkerNames) -> DiffResult<&Tag> {
    match op {
        Operation::Insert => Ok(&names.insert),
        Operation::Delete => Ok(&names.delete),
        Operation::Equal | Operation::Replace => Err(DiffError::UnsupportedMarker(op)),
    }
}

/// Opening event of a plain marker.
pub fn open_plain(op: Operation, names: &MarkerNames) -> DiffResult<Event> {
    Ok(Event::open(marker_tag(op, names)?.clone()))
}

/// Opening event of a formatting marker describing `tag` with `attrs`.
pub fn open_formatting(op: Operation, names: &MarkerNames, tag: &str, attrs: &Attrs) -> DiffResult<Event> {
    let marker = marker_tag(op, names)?.clone();
    let attrs = vec![
        ("class".to_string(), names.formatting_class.to_string()),
        (NODE_ATTR.to_string(), tag.to_string()),
        (ATTRS_ATTR.to_string(), encode_attrs(attrs)),
    ];
    Ok(Event::open_with(marker, attrs))
}

/// Closing event of either marker flavor.
pub fn close(op: Operation, names: &MarkerNames) -> DiffResult<Event> {
    Ok(Event::close(marker_tag(op, names)?.clone()))
}

/// Operation of a marker opening event, if `event` is one.
pub fn marker_op(event: &Event, names: &MarkerNames) -> Option<Operation> {
    match event.opened_tag()? {
        tag if *tag == names.insert => Some(Operation::Insert),
        tag if *tag == names.delete => Some(Operation::Delete),
        _ => None,
    }
}

/// Base64 of the JSON list `[[name, value], ...]`.
pub fn encode_attrs(attrs: &Attrs) -> String {
    let pairs: Vec<Value> = attrs
        .iter()
        .map(|(k, v)| Value::Array(vec![Value::from(k.as_str()), Value::from(v.as_str())]))
        .collect();
    STANDARD.encode(Value::Array(pairs).to_string())
}

/// Inverse of [`encode_attrs`].
pub fn decode_attrs(encoded: &str) -> Option<Attrs> {
    let bytes = STANDARD.decode(encoded).ok()?;
    let Value::Array(pairs) = serde_json::from_slice::<Value>(&bytes).ok()? else {
        return None;
    };
    pairs
        .into_iter()
        .map(|pair| match pair {
            Value::Array(kv) => match kv.as_slice() {
                [Value::String(k), Value::String(v)] => Some((k.clone(), v.clone())),
                _ => None,
            },
            _ => None,
        })
        .collect()
}
