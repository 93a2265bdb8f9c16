//! Word-level normalisation of event streams
//!
//! Text leaves are split into maximal runs of non-whitespace and maximal runs
//! of whitespace so the aligner can diff text word by word:
//!
//! ```text
//! Text("the quick  fox")  ->  "the" " " "quick" "  " "fox"
//! ```
//!
//! Non-text events pass through unchanged. Tokenizing is idempotent and never
//! reorders events. Every token keeps the source span of the text it came from.

use crate::event::Event;

/// Split every `Text` event of a stream into word and whitespace tokens.
pub fn tokenize(events: &[Event]) -> Vec<Event> {
    let mut out = Vec::with_capacity(events.len() * 2);
    for event in events {
        match event {
            Event::Text { content, span } => {
                out.extend(split_words(content).map(|word| Event::Text {
                    content: word.to_owned(),
                    span: *span,
                }));
            }
            other => out.push(other.clone()),
        }
    }
    out
}

/// Split text into alternating runs of whitespace and non-whitespace.
///
/// Empty input yields nothing.
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let in_space = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_whitespace() != in_space)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (word, tail) = rest.split_at(end);
        rest = tail;
        Some(word)
    })
}

// =============================================================================
// Tests
// =============================================================================
