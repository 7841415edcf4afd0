//! Whitespace helpers for the mapper root.
//!
//! Whitespace-only text nodes carry layout and nothing else, so they can be
//! rewritten or dropped freely.

use crate::constants::BLANK_LINE;
use crate::error::Result;
use crate::node::{NodeInner, NodeRef};

/// Returns true if `node` is a text node holding only ASCII whitespace.
pub fn is_whitespace(node: &NodeRef) -> bool {
    node.borrow().is_whitespace()
}

/// Collapses adjacent whitespace-only children of `parent` into a single
/// blank-line separator.
///
/// Whenever a whitespace child is directly followed by another, the first is
/// rewritten to [`BLANK_LINE`] and the second is removed. Returns the number
/// of removed nodes.
pub fn collapse_blank_lines(parent: &NodeRef) -> Result<usize> {
    let children: Vec<NodeRef> = parent.borrow().children().to_vec();

    let mut redundant = Vec::new();
    for pair in children.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if is_whitespace(current) && is_whitespace(next) {
            if let Some(text) = current.borrow_mut().content_mut().as_text_mut() {
                text.set_text(BLANK_LINE);
            }
            redundant.push(next.clone());
        }
    }

    for node in &redundant {
        NodeInner::remove_child(parent, node)?;
    }
    Ok(redundant.len())
}
