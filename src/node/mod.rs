//! Node tree for building and inspecting event streams.
//!
//! Parsing markup is left to callers; this module offers a small owned tree
//! that flattens into the [`Event`] stream the differ consumes, and rebuilds
//! a tree from a balanced stream.
//!
//! ```
//! use tola_htmldiff::node::{Element, Node};
//!
//! let p = Element::new("p").text("A").child(Element::new("em").text("B"));
//! let events = Node::from(p).to_events();
//! assert_eq!(events.len(), 6);
//! ```

mod element;
mod text;

pub use element::Element;
pub use text::Text;

use smallvec::SmallVec;

use crate::event::{Event, Tag};

/// Node in a document tree - either Element or Text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Box<Element>),
    Text(Text),
}

impl Node {
    /// Flatten into a depth-first event stream.
    pub fn to_events(&self) -> Vec<Event> {
        let mut events = Vec::new();
        self.push_events(&mut events);
        events
    }

    fn push_events(&self, events: &mut Vec<Event>) {
        match self {
            Node::Text(text) => events.push(Event::text(text.content.clone()).with_span(text.span)),
            Node::Element(elem) => {
                events.push(Event::open_with(elem.tag.clone(), elem.attrs.clone()).with_span(elem.span));
                for child in &elem.children {
                    child.push_events(events);
                }
                events.push(Event::close(elem.tag.clone()).with_span(elem.span));
            }
        }
    }

    /// Rebuild nodes from a balanced event stream.
    ///
    /// Returns `None` if a close does not match the innermost open element
    /// or an element is left open.
    pub fn from_events(events: &[Event]) -> Option<Children> {
        let mut roots = Children::new();
        let mut open: Vec<Element> = Vec::new();

        for event in events {
            let node = match event {
                Event::Open { tag, attrs, span } => {
                    let mut elem = Element::new(tag.clone()).at(*span);
                    elem.attrs = attrs.clone();
                    open.push(elem);
                    continue;
                }
                Event::Close { tag, .. } => {
                    let elem = open.pop().filter(|elem| elem.tag == *tag)?;
                    Node::Element(Box::new(elem))
                }
                Event::Text { content, span } => Node::Text(Text {
                    content: content.clone(),
                    span: *span,
                }),
            };
            match open.last_mut() {
                Some(parent) => parent.children.push(node),
                None => roots.push(node),
            }
        }
        open.is_empty().then_some(roots)
    }
}

impl From<Element> for Node {
    fn from(elem: Element) -> Self {
        Node::Element(Box::new(elem))
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

/// Type alias for children collection.
pub type Children = SmallVec<[Node; 8]>;

/// Flatten a sequence of sibling nodes.
pub fn to_events<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<Event> {
    let mut events = Vec::new();
    for node in nodes {
        node.push_events(&mut events);
    }
    events
}

/// Check if an event stream is balanced.
pub fn is_balanced(events: &[Event]) -> bool {
    let mut stack: SmallVec<[&Tag; 16]> = SmallVec::new();
    for event in events {
        match event {
            Event::Open { tag, .. } => stack.push(tag),
            Event::Close { tag, .. } => {
                if stack.pop() != Some(tag) {
                    return false;
                }
            }
            Event::Text { .. } => {}
        }
    }
    stack.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_events() {
        let node = Node::from(Element::new("p").attr("id", "x").text("A"));
        assert_eq!(
            node.to_events(),
            vec![
                Event::open_with("p", vec![("id".into(), "x".into())]),
                Event::text("A"),
                Event::close("p"),
            ]
        );
    }

    #[test]
    fn test_from_events_round_trip() {
        let tree = Node::from(
            Element::new("div")
                .child(Element::new("p").text("one"))
                .child(Element::new("p").text("two")),
        );
        let events = tree.to_events();
        let rebuilt = Node::from_events(&events).unwrap();
        assert_eq!(rebuilt.len(), 1);
        assert_eq!(rebuilt[0], tree);
    }

    #[test]
    fn test_from_events_rejects_unbalanced() {
        assert!(Node::from_events(&[Event::open("p")]).is_none());
        assert!(Node::from_events(&[Event::open("p"), Event::close("b")]).is_none());
        assert!(Node::from_events(&[Event::close("p")]).is_none());
    }

    #[test]
    fn test_is_balanced() {
        let events = to_events(&[Node::from(Element::new("b").text("x")), Node::from(Text::new("y"))]);
        assert!(is_balanced(&events));
        assert!(!is_balanced(&events[..2]));
    }
}
