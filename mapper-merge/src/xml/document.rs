//! Parsed XML documents.

use crate::node::{NodeInner, NodeRef};

/// The `<?xml ...?>` declaration of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    /// Declared XML version.
    pub version: String,
    /// Declared encoding, if any.
    pub encoding: Option<String>,
    /// Declared standalone flag, if any.
    pub standalone: Option<String>,
}

/// A `<!DOCTYPE ...>` declaration.
///
/// Only the name is interpreted. The rest (public and system identifiers,
/// internal subset) is kept verbatim and never resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocType {
    name: String,
    raw: String,
}

impl DocType {
    /// Builds a doctype from the text between `<!DOCTYPE` and the closing `>`.
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.trim();
        let name = raw
            .split(|c: char| c.is_ascii_whitespace() || c == '[')
            .next()
            .unwrap_or_default();
        DocType {
            name: name.to_string(),
            raw: raw.to_string(),
        }
    }

    /// Returns the declared root element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declaration body as written.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// An XML document: exactly one root element plus the optional declaration,
/// doctype and top-level comments or processing instructions.
#[derive(Debug)]
pub struct Document {
    declaration: Option<XmlDeclaration>,
    doctype: Option<DocType>,
    /// Top-level nodes before the root element.
    prolog: Vec<NodeRef>,
    /// Number of prolog nodes written before the doctype.
    doctype_position: usize,
    root: NodeRef,
    /// Top-level nodes after the root element.
    epilog: Vec<NodeRef>,
}

impl Document {
    /// Creates a document around a root element.
    pub fn new(root: NodeRef) -> Self {
        Document {
            declaration: None,
            doctype: None,
            prolog: Vec::new(),
            doctype_position: 0,
            root,
            epilog: Vec::new(),
        }
    }

    /// Returns the root element.
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Returns the root element's tag name.
    pub fn root_name(&self) -> String {
        self.root.borrow().node_name().to_string()
    }

    /// Returns the doctype declaration, if any.
    pub fn doctype(&self) -> Option<&DocType> {
        self.doctype.as_ref()
    }

    /// Sets or clears the doctype declaration.
    pub fn set_doctype(&mut self, doctype: Option<DocType>) {
        self.doctype = doctype;
    }

    /// Returns the XML declaration, if any.
    pub fn declaration(&self) -> Option<&XmlDeclaration> {
        self.declaration.as_ref()
    }

    /// Sets or clears the XML declaration.
    pub fn set_declaration(&mut self, declaration: Option<XmlDeclaration>) {
        self.declaration = declaration;
    }

    /// Returns the top-level nodes that precede the root element.
    pub fn prolog(&self) -> &[NodeRef] {
        &self.prolog
    }

    /// Splits the prolog into the nodes written before the doctype and those
    /// written after it.
    pub fn prolog_around_doctype(&self) -> (&[NodeRef], &[NodeRef]) {
        self.prolog.split_at(self.doctype_position.min(self.prolog.len()))
    }

    /// Returns the top-level nodes that follow the root element.
    pub fn epilog(&self) -> &[NodeRef] {
        &self.epilog
    }

    pub(crate) fn push_prolog(&mut self, node: NodeRef) {
        self.prolog.push(node);
    }

    pub(crate) fn set_doctype_position(&mut self, position: usize) {
        self.doctype_position = position;
    }

    pub(crate) fn push_epilog(&mut self, node: NodeRef) {
        self.epilog.push(node);
    }

    /// Imports a node from another document: returns a detached deep copy
    /// that can be inserted anywhere in this document's tree.
    pub fn import_node(&self, node: &NodeRef) -> NodeRef {
        NodeInner::deep_copy(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctype_name() {
        let dt = DocType::from_raw(
            r#"mapper PUBLIC "-//mybatis.org//DTD Mapper 3.0//EN" "http://mybatis.org/dtd/mybatis-3-mapper.dtd""#,
        );
        assert_eq!(dt.name(), "mapper");
        assert!(dt.raw().ends_with("mybatis-3-mapper.dtd\""));
    }

    #[test]
    fn test_doctype_name_with_internal_subset() {
        let dt = DocType::from_raw(" mapper[<!ENTITY x \"y\">]");
        assert_eq!(dt.name(), "mapper");
        assert_eq!(dt.raw(), "mapper[<!ENTITY x \"y\">]");
    }
}
