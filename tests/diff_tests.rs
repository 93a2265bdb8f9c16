//! End-to-end tests for marked diffs.
//!
//! Every scenario also checks that the output is properly nested.

use tola_htmldiff::attr_diff;
use tola_htmldiff::node::{self, Element, Node};
use tola_htmldiff::prelude::*;
use tola_htmldiff::tokenize::tokenize;

fn events(nodes: impl IntoIterator<Item = Element>) -> Vec<Event> {
    let nodes: Vec<Node> = nodes.into_iter().map(Node::from).collect();
    node::to_events(&nodes)
}

fn p(text: &str) -> Element {
    Element::new("p").text(text)
}

/// Diff two fragments and compare the rendered output.
#[track_caller]
fn assert_diff(old: &[Event], new: &[Event], expected: &str) -> DiffOutput {
    let output = diff(old, new).unwrap();
    let html = output.to_html();
    assert_eq!(html, expected, "\nOld: {}\nNew: {}", render_html(old), render_html(new));
    assert!(node::is_balanced(&output.events), "unbalanced output: {html}");
    output
}

// =============================================================================
// Text
// =============================================================================

#[test]
fn identical_documents_have_no_markers() {
    let doc = events([
        Element::new("div")
            .child(p("Hello  big world"))
            .child(Element::new("ul").child(Element::new("li").text("one"))),
    ]);
    let output = assert_diff(&doc, &doc, &render_html(&doc));
    assert_eq!(output.events, tokenize(&doc));
    assert!(!output.stats.has_changes());
    assert!(output.diagnostics.is_empty());
}

#[test]
fn word_replaced() {
    let output = assert_diff(
        &events([p("the quick fox")]),
        &events([p("the slow fox")]),
        "<p>the <del>quick</del><ins>slow</ins> fox</p>",
    );
    assert_eq!(output.stats.replaced, 1);
}

#[test]
fn words_prepended() {
    assert_diff(
        &events([p("awesome text")]),
        &events([p("My awesome text")]),
        "<p><ins>My </ins>awesome text</p>",
    );
}

#[test]
fn words_appended() {
    assert_diff(
        &events([p("awesome text")]),
        &events([p("awesome text here")]),
        "<p>awesome text<ins> here</ins></p>",
    );
}

// =============================================================================
// Elements
// =============================================================================

#[test]
fn element_inserted() {
    let output = assert_diff(
        &events([p("A")]),
        &events([p("A").child(Element::new("em").text("B"))]),
        "<p>A<ins><em>B</em></ins></p>",
    );
    assert_eq!(output.stats.inserted, 3);
    assert_eq!(output.stats.deleted, 0);
}

#[test]
fn element_deleted() {
    assert_diff(
        &events([p("A").child(Element::new("em").text("B"))]),
        &events([p("A")]),
        "<p>A<del><em>B</em></del></p>",
    );
}

#[test]
fn table_row_inserted() {
    let row = |text: &str| Element::new("tr").child(Element::new("td").text(text));
    assert_diff(
        &events([Element::new("table").child(row("a"))]),
        &events([Element::new("table").child(row("a")).child(row("b"))]),
        "<table><tr><td>a</td></tr><tr><td><ins>b</ins></td></tr></table>",
    );
}

#[test]
fn image_replaced_as_block() {
    let img = |src: &str| Element::new("p").child(Element::new("img").attr("src", src));
    assert_diff(
        &events([img("a")]),
        &events([img("b")]),
        "<p><del><img src=\"a\" /></del><ins><img src=\"b\" /></ins></p>",
    );
}

#[test]
fn script_is_never_marked() {
    let script = |body: &str| Element::new("div").child(Element::new("script").text(body));
    assert_diff(
        &events([script("a()")]),
        &events([script("b()")]),
        "<div><script>b()</script></div>",
    );
}

// =============================================================================
// Attributes
// =============================================================================

#[test]
fn style_change_is_annotated() {
    let styled = |style: &str| Element::new("p").attr("style", style).text("x");
    let output = diff(&events([styled("color:red")]), &events([styled("color:blue")])).unwrap();

    let open = &output.events[0];
    assert_eq!(open.tag().map(|t| t.as_str()), Some("p"));
    let attrs = open.attrs().unwrap();
    assert!(attrs.has_attr("style"));
    assert_eq!(attrs.get_attr("style"), Some("color:blue"));

    let encoded = attrs.get_attr("x-diff-style").unwrap();
    assert_eq!(attr_diff::decode(encoded).unwrap(), ["-color:red", "+color:blue"]);
    assert!(!output.to_html().contains("<ins>"));
}

#[test]
fn untracked_attribute_change_replaces_element() {
    let link = |href: &str| Element::new("p").child(Element::new("a").attr("href", href).text("go"));
    let output = diff(&events([link("/a")]), &events([link("/b")])).unwrap();
    let html = output.to_html();
    // the link text is unchanged, so the markers carry the formatting node
    assert!(html.contains("<del class=\"formatting\" x-diff-node=\"a\""), "{html}");
    assert!(html.contains("<ins class=\"formatting\" x-diff-node=\"a\""), "{html}");
    assert!(node::is_balanced(&output.events));
}

// =============================================================================
// Configuration and diagnostics
// =============================================================================

// =============================================================================
// Structure
// =============================================================================

const FORMATTING_P: &str = "class=\"formatting\" x-diff-node=\"p\" x-diff-attrs=\"W10=\"";

/// Diff, then check only the shape of the output.
#[track_caller]
fn assert_clean(old: &[Event], new: &[Event]) -> String {
    let output = diff(old, new).unwrap();
    let html = output.to_html();
    assert!(node::is_balanced(&output.events), "unbalanced output: {html}");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let mut depth = 0usize;
    for event in &output.events {
        match event.tag().map(|t| t.as_str()) {
            Some("ins" | "del") if event.is_open() => {
                assert_eq!(depth, 0, "nested markers: {html}");
                depth += 1;
            }
            Some("ins" | "del") => depth -= 1,
            _ => {}
        }
    }
    html
}

#[test]
fn paragraphs_merged() {
    let output = assert_diff(
        &events([p("a"), p("b")]),
        &events([p("a b")]),
        &format!("<del {FORMATTING_P}><p>a</p><p>b</p></del><ins {FORMATTING_P}><p>a b</p></ins>"),
    );
    assert!(output.diagnostics.is_empty());
}

#[test]
fn paragraph_split() {
    let output = assert_diff(
        &events([p("a b")]),
        &events([p("a"), p("b")]),
        &format!("<del {FORMATTING_P}><p>a b</p></del><ins {FORMATTING_P}><p>a</p><p>b</p></ins>"),
    );
    assert!(output.diagnostics.is_empty());
}

#[test]
fn element_replaced_by_script() {
    let output = assert_diff(
        &events([Element::new("b").text("d b")]),
        &events([Element::new("script").text("c")]),
        "<del><b>d b</b></del><ins><script>c</script></ins>",
    );
    assert!(output.diagnostics.is_empty());
}

#[test]
fn inserted_script_at_root_is_marked() {
    assert_diff(
        &[],
        &events([Element::new("script").text("x()")]),
        "<ins><script>x()</script></ins>",
    );
}

#[test]
fn inline_element_replaced_by_image() {
    let old = events([Element::new("p").child(Element::new("span").text("x")).text(" tail")]);
    let new = events([Element::new("p").child(Element::new("img").attr("src", "a")).text(" tail")]);
    assert_diff(
        &old,
        &new,
        "<p><del><span>x</span></del><ins><img src=\"a\" /></ins> tail</p>",
    );
}

#[test]
fn nested_span_restructured() {
    let span = |text: &str| Element::new("span").text(text);
    let old = events([Element::new("div").child(span("c a d")).child(span("a c"))]);
    let new = events([Element::new("div").child(Element::new("span").child(span("a c")).text("a c"))]);
    let html = assert_clean(&old, &new);
    assert!(html.contains("<del") && html.contains("<ins"), "{html}");
}

#[test]
fn nested_same_tag_block_replaced() {
    let pre = |inner: &str| Element::new("pre").text("x").child(Element::new("pre").text(inner));
    assert_diff(
        &events([pre("y")]),
        &events([pre("z")]),
        "<del><pre>x<pre>y</pre></pre></del><ins><pre>x<pre>z</pre></pre></ins>",
    );
}

#[test]
fn block_with_changes_inside_deleted_paragraph() {
    let old = events([Element::new("div").child(
        p("gone ").child(Element::new("pre").text("a")),
    )]);
    let new = events([Element::new("div").child(Element::new("pre").text("b"))]);
    let html = assert_clean(&old, &new);
    assert!(html.contains("gone"), "{html}");
    assert!(html.contains("<pre>b</pre>"), "{html}");
}

#[test]
fn custom_marker_names() {
    let markers = MarkerNames {
        insert: "added".into(),
        delete: "removed".into(),
        ..MarkerNames::default()
    };
    let config = DiffConfig::default().with_markers(markers);
    let output = diff_with_config(&events([p("a")]), &events([p("b")]), &config).unwrap();
    assert_eq!(output.to_html(), "<p><removed>a</removed><added>b</added></p>");
}

#[test]
fn stray_close_is_recovered_or_rejected() {
    let broken = vec![Event::open("p"), Event::text("a"), Event::close("em"), Event::close("p")];

    let output = diff(&broken, &broken).unwrap();
    assert!(output.diagnostics.has(DiagnosticKind::UnmatchedClose));
    assert_eq!(output.to_html(), "<p>a</p>");
    assert!(node::is_balanced(&output.events));

    let strict = DiffConfig::default().with_strict(true);
    let err = diff_with_config(&broken, &broken, &strict).unwrap_err();
    assert!(matches!(err, DiffError::Structural(_)));
}

#[test]
fn outputs_are_thread_safe() {
    static_assertions::assert_impl_all!(DiffOutput: Send, Sync);
    static_assertions::assert_impl_all!(DiffError: Send, Sync);
    static_assertions::assert_impl_all!(HtmlDiff: Send, Sync);
}
