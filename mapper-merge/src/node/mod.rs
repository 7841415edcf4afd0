//! Node structures for XML tree representation.
//!
//! Documents are trees of reference-counted nodes. Each node owns its
//! children and keeps a weak back-reference to its parent together with its
//! position among siblings, so sibling navigation and in-place splicing are
//! cheap.
//!
//! Nodes are never shared between documents: moving content from one tree
//! into another goes through [`NodeInner::deep_copy`], which builds a
//! detached replica.

mod attributes;
mod xml_content;

pub use attributes::Attributes;
pub use xml_content::{
    XmlCData, XmlComment, XmlContent, XmlElement, XmlEntityRef, XmlProcessingInstruction, XmlText,
};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};

/// A reference-counted pointer to a node.
pub type NodeRef = Rc<RefCell<NodeInner>>;

/// A weak pointer to a node.
pub type WeakNodeRef = Weak<RefCell<NodeInner>>;

/// Creates a new detached node holding the given content.
pub fn new_node(content: XmlContent) -> NodeRef {
    Rc::new(RefCell::new(NodeInner::new(content)))
}

/// Creates a new detached element node.
pub fn new_element(name: impl Into<String>, attributes: Attributes) -> NodeRef {
    new_node(XmlContent::Element(XmlElement::new(name, attributes)))
}

/// Creates a new detached text node.
pub fn new_text(text: impl Into<String>) -> NodeRef {
    new_node(XmlContent::Text(XmlText::new(text)))
}

/// The inner data of a node in the document tree.
#[derive(Debug)]
pub struct NodeInner {
    /// Child nodes.
    children: Vec<NodeRef>,
    /// XML content of this node.
    content: XmlContent,
    /// Weak reference to parent node.
    parent: WeakNodeRef,
    /// Zero-based position among siblings, `None` while detached.
    child_pos: Option<usize>,
}

impl NodeInner {
    /// Creates detached node data with the given content.
    pub fn new(content: XmlContent) -> Self {
        NodeInner {
            children: Vec::new(),
            content,
            parent: Weak::new(),
            child_pos: None,
        }
    }

    /// Returns the content of this node.
    pub fn content(&self) -> &XmlContent {
        &self.content
    }

    /// Returns a mutable reference to the content.
    pub fn content_mut(&mut self) -> &mut XmlContent {
        &mut self.content
    }

    /// Returns the element content, if this is an element node.
    pub fn element(&self) -> Option<&XmlElement> {
        self.content.as_element()
    }

    /// Returns the element content mutably, if this is an element node.
    pub fn element_mut(&mut self) -> Option<&mut XmlElement> {
        self.content.as_element_mut()
    }

    /// Returns the `id` attribute of an element node.
    pub fn id(&self) -> Option<&str> {
        self.element().and_then(XmlElement::id)
    }

    /// Returns true for text nodes that hold only ASCII whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.content.is_whitespace()
    }

    /// Returns the DOM node name (tag name for elements).
    pub fn node_name(&self) -> &str {
        self.content.node_name()
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns the children as a slice.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Returns the first child.
    pub fn first_child(&self) -> Option<&NodeRef> {
        self.children.first()
    }

    /// Returns the parent, if this node is attached and the parent is alive.
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.upgrade()
    }

    /// Returns the position among siblings, `None` while detached.
    pub fn child_pos(&self) -> Option<usize> {
        self.child_pos
    }

    /// Concatenates the text and CDATA of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.content {
            XmlContent::Text(t) => out.push_str(t.text()),
            XmlContent::CData(c) => out.push_str(c.text()),
            _ => {
                for child in &self.children {
                    child.borrow().collect_text(out);
                }
            }
        }
    }

    fn renumber_from(&mut self, start: usize) {
        for (i, child) in self.children.iter().enumerate().skip(start) {
            child.borrow_mut().child_pos = Some(i);
        }
    }
}

/// Tree mutation and navigation. These work on the `NodeRef` wrapper because
/// they need to hand out weak parent references.
impl NodeInner {
    /// Appends a child, detaching it from any previous parent first.
    pub fn append_child(parent_ref: &NodeRef, child_ref: NodeRef) {
        Self::detach(&child_ref);
        {
            let mut child = child_ref.borrow_mut();
            child.parent = Rc::downgrade(parent_ref);
            child.child_pos = Some(parent_ref.borrow().children.len());
        }
        parent_ref.borrow_mut().children.push(child_ref);
    }

    /// Inserts a child before `anchor`, or appends it when `anchor` is `None`.
    ///
    /// Fails if `anchor` is not a child of `parent_ref`.
    pub fn insert_before(
        parent_ref: &NodeRef,
        child_ref: NodeRef,
        anchor: Option<&NodeRef>,
    ) -> Result<()> {
        let Some(anchor) = anchor else {
            Self::append_child(parent_ref, child_ref);
            return Ok(());
        };
        if !Self::is_child_of(anchor, parent_ref) {
            return Err(Error::Node(format!(
                "insert_before: <{}> is not a child of <{}>",
                anchor.borrow().node_name(),
                parent_ref.borrow().node_name()
            )));
        }

        Self::detach(&child_ref);
        // Looked up after detaching, which may have shifted the anchor.
        let index = anchor.borrow().child_pos.unwrap_or(0);
        child_ref.borrow_mut().parent = Rc::downgrade(parent_ref);
        let mut parent = parent_ref.borrow_mut();
        parent.children.insert(index, child_ref);
        parent.renumber_from(index);
        Ok(())
    }

    /// Removes `child_ref` from `parent_ref`, leaving it detached.
    pub fn remove_child(parent_ref: &NodeRef, child_ref: &NodeRef) -> Result<()> {
        if !Self::is_child_of(child_ref, parent_ref) {
            return Err(Error::Node(format!(
                "remove_child: <{}> is not a child of <{}>",
                child_ref.borrow().node_name(),
                parent_ref.borrow().node_name()
            )));
        }
        Self::detach(child_ref);
        Ok(())
    }

    /// Detaches a node from its parent. Does nothing for detached nodes.
    pub fn detach(node_ref: &NodeRef) {
        let (parent, pos) = {
            let node = node_ref.borrow();
            (node.parent.upgrade(), node.child_pos)
        };
        if let (Some(parent), Some(pos)) = (parent, pos) {
            let mut parent = parent.borrow_mut();
            if pos < parent.children.len() && Rc::ptr_eq(&parent.children[pos], node_ref) {
                parent.children.remove(pos);
                parent.renumber_from(pos);
            }
        }
        let mut node = node_ref.borrow_mut();
        node.parent = Weak::new();
        node.child_pos = None;
    }

    /// Returns true if `node_ref` is currently a direct child of `parent_ref`.
    pub fn is_child_of(node_ref: &NodeRef, parent_ref: &NodeRef) -> bool {
        let node = node_ref.borrow();
        match (node.parent.upgrade(), node.child_pos) {
            (Some(parent), Some(pos)) => {
                Rc::ptr_eq(&parent, parent_ref)
                    && parent
                        .borrow()
                        .children
                        .get(pos)
                        .is_some_and(|c| Rc::ptr_eq(c, node_ref))
            }
            _ => false,
        }
    }

    /// Builds a detached replica of a node and all its descendants.
    pub fn deep_copy(node_ref: &NodeRef) -> NodeRef {
        let node = node_ref.borrow();
        let copy = new_node(node.content.clone());
        for child in &node.children {
            Self::append_child(&copy, Self::deep_copy(child));
        }
        copy
    }

    /// Compares two subtrees by content, ignoring node identity.
    pub fn subtree_eq(a: &NodeRef, b: &NodeRef) -> bool {
        let a = a.borrow();
        let b = b.borrow();
        a.content == b.content
            && a.children.len() == b.children.len()
            && a
                .children
                .iter()
                .zip(&b.children)
                .all(|(x, y)| Self::subtree_eq(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elem(name: &str) -> NodeRef {
        new_element(name, Attributes::new())
    }

    fn names(parent: &NodeRef) -> Vec<String> {
        parent
            .borrow()
            .children()
            .iter()
            .map(|c| c.borrow().node_name().to_string())
            .collect()
    }

    #[test]
    fn test_append_child() {
        let parent = elem("mapper");
        let child1 = elem("select");
        let child2 = elem("insert");

        NodeInner::append_child(&parent, child1.clone());
        NodeInner::append_child(&parent, child2.clone());

        assert_eq!(parent.borrow().child_count(), 2);
        assert_eq!(child1.borrow().child_pos(), Some(0));
        assert_eq!(child2.borrow().child_pos(), Some(1));
        assert!(Rc::ptr_eq(&child1.borrow().parent().unwrap(), &parent));
    }

    #[test]
    fn test_insert_before() {
        let parent = elem("p");
        let a = elem("a");
        let c = elem("c");
        NodeInner::append_child(&parent, a.clone());
        NodeInner::append_child(&parent, c.clone());

        NodeInner::insert_before(&parent, elem("b"), Some(&c)).unwrap();
        NodeInner::insert_before(&parent, elem("z"), None).unwrap();

        assert_eq!(names(&parent), vec!["a", "b", "c", "z"]);
        assert_eq!(c.borrow().child_pos(), Some(2));
    }

    #[test]
    fn test_insert_before_fixed_anchor_keeps_order() {
        let parent = elem("p");
        let anchor = elem("user");
        NodeInner::append_child(&parent, anchor.clone());

        for name in ["x", "y", "z"] {
            NodeInner::insert_before(&parent, elem(name), Some(&anchor)).unwrap();
        }

        assert_eq!(names(&parent), vec!["x", "y", "z", "user"]);
    }

    #[test]
    fn test_insert_before_foreign_anchor_fails() {
        let parent = elem("p");
        let other = elem("q");
        let stranger = elem("s");
        NodeInner::append_child(&other, stranger.clone());

        let err = NodeInner::insert_before(&parent, elem("x"), Some(&stranger)).unwrap_err();
        assert!(matches!(err, Error::Node(_)));
        assert_eq!(parent.borrow().child_count(), 0);
    }

    #[test]
    fn test_remove_child() {
        let parent = elem("p");
        let a = elem("a");
        let b = elem("b");
        let c = elem("c");
        for n in [&a, &b, &c] {
            NodeInner::append_child(&parent, n.clone());
        }

        NodeInner::remove_child(&parent, &b).unwrap();

        assert_eq!(names(&parent), vec!["a", "c"]);
        assert_eq!(c.borrow().child_pos(), Some(1));
        assert!(b.borrow().parent().is_none());
        assert!(NodeInner::remove_child(&parent, &b).is_err());
    }

    #[test]
    fn test_append_moves_between_parents() {
        let first = elem("first");
        let second = elem("second");
        let child = elem("child");
        NodeInner::append_child(&first, child.clone());
        NodeInner::append_child(&second, child.clone());

        assert_eq!(first.borrow().child_count(), 0);
        assert_eq!(second.borrow().child_count(), 1);
        assert!(NodeInner::is_child_of(&child, &second));
    }

    #[test]
    fn test_deep_copy_is_detached_and_equal() {
        let parent = elem("mapper");
        let select = new_element(
            "select",
            [("id", "selectAll")].into_iter().collect::<Attributes>(),
        );
        NodeInner::append_child(&select, new_text("select * from t"));
        NodeInner::append_child(&parent, select.clone());

        let copy = NodeInner::deep_copy(&select);

        assert!(!Rc::ptr_eq(&copy, &select));
        assert!(copy.borrow().parent().is_none());
        assert!(NodeInner::subtree_eq(&copy, &select));
        assert!(!Rc::ptr_eq(
            &copy.borrow().children()[0],
            &select.borrow().children()[0]
        ));
        assert_eq!(copy.borrow().text_content(), "select * from t");
    }
}
