//! Text node splitting
//!
//! Realizing a span is a three-way split of one text node: the node keeps
//! the text before the span, a new node holds the matched text and is
//! wrapped in a marker, another new node holds the rest. Nothing outside the
//! original parent is touched.

use crate::dom::{Marker, NodeKind, Page, PageError};
use crate::scanner::matcher::MatchSpan;

/// Pure view of a split: the three pieces of `text` around `span`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan<'a> {
    pub before: &'a str,
    pub matched: &'a str,
    pub after: &'a str,
}

/// Compute the split without touching any page.
///
/// Returns `None` for empty spans, spans past the end of the text, or
/// offsets that fall inside a multi-byte character.
pub fn plan_split<'a>(text: &'a str, span: &MatchSpan) -> Option<SplitPlan<'a>> {
    if span.is_empty() || span.end > text.len() {
        return None;
    }
    if !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
        return None;
    }
    Some(SplitPlan {
        before: &text[..span.start],
        matched: &text[span.start..span.end],
        after: &text[span.end..],
    })
}

/// Nodes produced by [`split_span`]
#[derive(Debug, Clone, PartialEq)]
pub struct SplitParts<N> {
    /// The original node, now holding only the text before the span
    pub before: Option<N>,
    /// Text node holding the matched text (child of `marker`)
    pub matched: N,
    pub marker: N,
    pub after: Option<N>,
}

/// Split `node` around `span` and wrap the matched piece in a marker.
///
/// The node must still be attached; a detached node yields
/// [`PageError::Detached`] before anything is mutated.
pub fn split_span<P: Page>(
    page: &mut P,
    node: &P::Node,
    span: &MatchSpan,
) -> Result<SplitParts<P::Node>, PageError> {
    if page.node_kind(node) != NodeKind::Text {
        return Err(PageError::NotText);
    }
    if !page.is_connected(node) {
        return Err(PageError::Detached);
    }
    let text = page.text_data(node).ok_or(PageError::NotText)?;
    let plan = plan_split(&text, span).ok_or(PageError::BadOffset(span.end))?;

    let after = if plan.after.is_empty() {
        None
    } else {
        Some(page.split_text(node, span.end)?)
    };

    let (before, matched) = if plan.before.is_empty() {
        (None, node.clone())
    } else {
        let matched = page.split_text(node, span.start)?;
        (Some(node.clone()), matched)
    };

    let marker = page.wrap(&matched, &Marker::for_category(span.category))?;

    Ok(SplitParts {
        before,
        matched,
        marker,
        after,
    })
}
