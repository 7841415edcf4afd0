//! Index of root children by `id` attribute.

use rustc_hash::FxHashMap;

use crate::node::NodeRef;

/// Maps each `id` value to the children of a parent that carry it, in
/// document order.
///
/// Whitespace and children without an `id` are not indexed. A well-formed
/// mapper has one child per id, but duplicates are kept so that all of them
/// are replaced on regeneration.
#[derive(Debug, Default)]
pub struct IdIndex {
    by_id: FxHashMap<String, Vec<NodeRef>>,
}

impl IdIndex {
    /// Indexes the direct children of `parent`.
    pub fn build(parent: &NodeRef) -> Self {
        let mut by_id: FxHashMap<String, Vec<NodeRef>> = FxHashMap::default();
        for child in parent.borrow().children() {
            let borrowed = child.borrow();
            if borrowed.is_whitespace() {
                continue;
            }
            if let Some(id) = borrowed.id() {
                by_id.entry(id.to_string()).or_default().push(child.clone());
            }
        }
        IdIndex { by_id }
    }

    /// Returns the children carrying `id`, empty if none.
    pub fn get(&self, id: &str) -> &[NodeRef] {
        self.by_id.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if some child carries `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Returns the number of distinct ids.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if no child carries an id.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
