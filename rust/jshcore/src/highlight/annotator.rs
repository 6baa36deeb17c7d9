//! DOM Annotator - realizes match spans as marker elements, in place
//!
//! Matching runs once over the whole text run of the target: every text node
//! in document order, marker text included, with a line break wherever a
//! non-marker element starts or ends. Splitting nodes and adding markers
//! never changes that run, so a second pass finds the same spans. Only spans
//! lying inside a single text node outside any marker are realized, which
//! makes annotating the same subtree twice leave it exactly as the first
//! pass did.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::split::split_span;
use crate::dom::{NodeKind, Page};
use crate::scanner::category::Category;
use crate::scanner::compiler::{phrase_regex, MatcherSet};
use crate::scanner::matcher::{find_spans, MatchSpan};

/// Elements whose text is never annotated
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "textarea"];

/// Outcome of one annotation pass
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnnotateReport {
    pub markers_added: usize,
    pub text_nodes_scanned: usize,
    /// Spans or targets abandoned because the page changed underneath
    pub skipped: usize,
}

impl AnnotateReport {
    pub fn merge(&mut self, other: AnnotateReport) {
        self.markers_added += other.markers_added;
        self.text_nodes_scanned += other.text_nodes_scanned;
        self.skipped += other.skipped;
    }
}

/// Text nodes under `root` that a pass may touch, in document order
pub fn annotatable_text_nodes<P: Page>(page: &P, root: &P::Node) -> Vec<P::Node> {
    let mut out = Vec::new();
    match page.node_kind(root) {
        NodeKind::Text => out.push(root.clone()),
        NodeKind::Element if is_skipped_element(page, root) => {}
        _ => collect_text_nodes(page, root, &mut out),
    }
    out
}

fn is_skipped_element<P: Page>(page: &P, node: &P::Node) -> bool {
    page.is_marker(node) || is_skipped_tag(page, node)
}

fn is_skipped_tag<P: Page>(page: &P, node: &P::Node) -> bool {
    page.tag_name(node)
        .map(|tag| SKIP_TAGS.contains(&tag.as_str()))
        .unwrap_or(false)
}

fn collect_text_nodes<P: Page>(page: &P, node: &P::Node, out: &mut Vec<P::Node>) {
    for child in page.children(node) {
        match page.node_kind(&child) {
            NodeKind::Text => out.push(child),
            NodeKind::Element if !is_skipped_element(page, &child) => {
                collect_text_nodes(page, &child, out)
            }
            _ => {}
        }
    }
}

// =============================================================================
// Text run
// =============================================================================

/// One text node's slice of a [`TextRun`]
struct RunPiece<N> {
    node: N,
    start: usize,
    end: usize,
    /// False for text already inside a marker
    editable: bool,
}

/// Concatenated text under one root plus the node each byte came from
struct TextRun<N> {
    text: String,
    pieces: Vec<RunPiece<N>>,
    pending_break: bool,
}

impl<N> TextRun<N> {
    fn new() -> Self {
        Self {
            text: String::new(),
            pieces: Vec::new(),
            pending_break: false,
        }
    }

    fn push(&mut self, node: N, data: &str, editable: bool) {
        if self.pending_break && !self.text.is_empty() {
            self.text.push('\n');
        }
        self.pending_break = false;
        let start = self.text.len();
        self.text.push_str(data);
        self.pieces.push(RunPiece {
            node,
            start,
            end: self.text.len(),
            editable,
        });
    }

    /// Element edge: the next piece starts on a new line
    fn boundary(&mut self) {
        self.pending_break = true;
    }

    /// Non-blank pieces a pass may mutate
    fn editable_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| p.editable && !self.text[p.start..p.end].trim().is_empty())
            .count()
    }

    /// Index of the editable piece holding all of `span`, and the span
    /// rebased onto that piece. `None` when the span crosses a node edge or
    /// falls inside an existing marker.
    fn locate(&self, span: &MatchSpan) -> Option<(usize, MatchSpan)> {
        let index = self
            .pieces
            .iter()
            .position(|p| p.start <= span.start && span.end <= p.end)?;
        let piece = &self.pieces[index];
        if !piece.editable {
            return None;
        }
        Some((
            index,
            MatchSpan::new(span.start - piece.start, span.end - piece.start, span.category),
        ))
    }
}

fn text_run<P: Page>(page: &P, root: &P::Node) -> TextRun<P::Node> {
    let mut run = TextRun::new();
    match page.node_kind(root) {
        NodeKind::Text => {
            if let Some(data) = page.text_data(root) {
                run.push(root.clone(), &data, true);
            }
        }
        NodeKind::Element if is_skipped_tag(page, root) => {}
        NodeKind::Element => collect_run(page, root, page.is_marker(root), &mut run),
        NodeKind::Other => collect_run(page, root, false, &mut run),
    }
    run
}

fn collect_run<P: Page>(page: &P, node: &P::Node, in_marker: bool, run: &mut TextRun<P::Node>) {
    for child in page.children(node) {
        match page.node_kind(&child) {
            NodeKind::Text => {
                if let Some(data) = page.text_data(&child) {
                    run.push(child, &data, !in_marker);
                }
            }
            NodeKind::Element if is_skipped_tag(page, &child) => run.boundary(),
            NodeKind::Element if page.is_marker(&child) => collect_run(page, &child, true, run),
            NodeKind::Element => {
                run.boundary();
                collect_run(page, &child, in_marker, run);
                run.boundary();
            }
            NodeKind::Other => {}
        }
    }
}

// =============================================================================
// Passes
// =============================================================================

/// Realize `spans` on one text node, last span first so earlier offsets stay
/// valid. Stops at the first failure (the node changed or went away).
fn apply_spans<P: Page>(page: &mut P, node: &P::Node, spans: &[MatchSpan], report: &mut AnnotateReport) {
    for (done, span) in spans.iter().rev().enumerate() {
        match split_span(page, node, span) {
            Ok(_) => report.markers_added += 1,
            Err(e) => {
                tracing::trace!(error = %e, "annotate: abandoning text node");
                report.skipped += spans.len() - done;
                return;
            }
        }
    }
}

/// Run the matching pipeline over `root` and wrap every accepted span.
///
/// Safe to call repeatedly on the same element. A detached root is a silent
/// skip.
pub fn annotate<P: Page>(
    page: &mut P,
    root: &P::Node,
    matchers: &MatcherSet,
    only: Option<&[Category]>,
) -> AnnotateReport {
    let mut report = AnnotateReport::default();
    if !page.is_connected(root) {
        report.skipped += 1;
        return report;
    }

    let run = text_run(page, root);
    report.text_nodes_scanned = run.editable_count();

    let mut per_piece: Vec<Vec<MatchSpan>> = vec![Vec::new(); run.pieces.len()];
    for span in find_spans(matchers, &run.text, only) {
        match run.locate(&span) {
            Some((index, local)) => per_piece[index].push(local),
            None => tracing::trace!(
                start = span.start,
                end = span.end,
                "annotate: span crosses a node edge or an existing marker"
            ),
        }
    }

    for (piece, spans) in run.pieces.iter().zip(per_piece) {
        if !spans.is_empty() {
            apply_spans(page, &piece.node, &spans, &mut report);
        }
    }

    report
}

/// Case-insensitive finder for one verbatim phrase
enum PhraseFinder {
    Ascii(AhoCorasick),
    Unicode(Regex),
}

impl PhraseFinder {
    fn new(phrase: &str) -> Result<Self, String> {
        if phrase.is_ascii() {
            AhoCorasickBuilder::new()
                .ascii_case_insensitive(true)
                .build([phrase])
                .map(PhraseFinder::Ascii)
                .map_err(|e| e.to_string())
        } else {
            phrase_regex(phrase)
                .map(PhraseFinder::Unicode)
                .map_err(|e| e.to_string())
        }
    }

    fn find(&self, text: &str) -> Vec<(usize, usize)> {
        match self {
            PhraseFinder::Ascii(automaton) => automaton.find_iter(text).map(|m| (m.start(), m.end())).collect(),
            PhraseFinder::Unicode(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
        }
    }
}

/// Wrap every case-insensitive occurrence of a literal phrase under `root`
/// in a marker of `category`.
pub fn mark_phrase<P: Page>(
    page: &mut P,
    root: &P::Node,
    phrase: &str,
    category: Category,
) -> AnnotateReport {
    let mut report = AnnotateReport::default();
    if phrase.is_empty() {
        return report;
    }
    if !page.is_connected(root) {
        report.skipped += 1;
        return report;
    }

    let finder = match PhraseFinder::new(phrase) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(phrase, error = %e, "mark_phrase: cannot build matcher");
            return report;
        }
    };

    for node in annotatable_text_nodes(page, root) {
        let text = match page.text_data(&node) {
            Some(t) => t,
            None => continue,
        };
        report.text_nodes_scanned += 1;

        let spans: Vec<MatchSpan> = finder
            .find(&text)
            .into_iter()
            .map(|(start, end)| MatchSpan::new(start, end, category))
            .collect();
        if !spans.is_empty() {
            apply_spans(page, &node, &spans, &mut report);
        }
    }

    report
}

/// `(category, text)` for every marker under `root`, in document order
pub fn collect_markers<P: Page>(page: &P, root: &P::Node) -> Vec<(Category, String)> {
    let mut out = Vec::new();
    collect_markers_into(page, root, &mut out);
    out
}

fn collect_markers_into<P: Page>(page: &P, node: &P::Node, out: &mut Vec<(Category, String)>) {
    for child in page.children(node) {
        if page.node_kind(&child) != NodeKind::Element {
            continue;
        }
        if page.is_marker(&child) {
            let category = page
                .attribute(&child, crate::scanner::category::MARK_ATTR)
                .and_then(|slug| Category::from_slug(&slug));
            if let Some(category) = category {
                out.push((category, page.rendered_text(&child)));
            }
        }
        collect_markers_into(page, &child, out);
    }
}
