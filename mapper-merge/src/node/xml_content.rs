//! XML content types for tree nodes.
//!
//! This module provides `XmlContent`, which represents the content of a single
//! DOM node: an element (tag with attributes), character data, a comment, a
//! processing instruction or an unexpanded entity reference.

use super::attributes::Attributes;
use crate::constants::ID_ATTRIBUTE;

/// Represents the content of an XML node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    /// An XML element with a qualified name and attributes.
    Element(XmlElement),
    /// XML text content.
    Text(XmlText),
    /// A CDATA section.
    CData(XmlCData),
    /// XML comment.
    Comment(XmlComment),
    /// XML processing instruction.
    ProcessingInstruction(XmlProcessingInstruction),
    /// A general entity reference that was left unexpanded.
    EntityRef(XmlEntityRef),
}

impl XmlContent {
    /// Returns the DOM node name: the tag for elements, the target for
    /// processing instructions, and a `#kind` name such as `#text` or
    /// `#comment` for everything else.
    pub fn node_name(&self) -> &str {
        match self {
            XmlContent::Element(e) => e.qname(),
            XmlContent::Text(_) => "#text",
            XmlContent::CData(_) => "#cdata-section",
            XmlContent::Comment(_) => "#comment",
            XmlContent::ProcessingInstruction(pi) => pi.target(),
            XmlContent::EntityRef(_) => "#entity-reference",
        }
    }

    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, XmlContent::Element(_))
    }

    /// Returns true if this is a text node holding only ASCII whitespace.
    ///
    /// CDATA sections never count as whitespace.
    pub fn is_whitespace(&self) -> bool {
        match self {
            XmlContent::Text(t) => t.is_whitespace(),
            _ => false,
        }
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a mutable reference to the element, if this is an element node.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a mutable reference to the text, if this is a text node.
    pub fn as_text_mut(&mut self) -> Option<&mut XmlText> {
        match self {
            XmlContent::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// An XML element with a qualified name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// The qualified name of the element (e.g. "select", "ns:element").
    name: String,
    /// Attributes in document order.
    attributes: Attributes,
}

impl XmlElement {
    /// Creates a new XML element with the given name and attributes.
    pub fn new(name: impl Into<String>, attributes: Attributes) -> Self {
        XmlElement {
            name: name.into(),
            attributes,
        }
    }

    /// Returns the qualified name of the element.
    pub fn qname(&self) -> &str {
        &self.name
    }

    /// Returns the attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns a mutable reference to the attributes.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Returns the value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    /// Returns the value of the `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attributes.get(ID_ATTRIBUTE)
    }
}

impl std::fmt::Display for XmlElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in self.attributes.iter() {
            write!(f, " {}=\"{}\"", name, value)?;
        }
        write!(f, ">")
    }
}

/// XML text content, stored unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlText {
    text: String,
}

impl XmlText {
    /// Creates a new text node from a string.
    pub fn new(text: impl Into<String>) -> Self {
        XmlText { text: text.into() }
    }

    /// Returns the text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the text content.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Appends to the text content.
    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Returns true if the text is empty after trimming ASCII whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.text.trim_matches(|c: char| c.is_ascii_whitespace()).is_empty()
    }
}

impl std::fmt::Display for XmlText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A CDATA section, stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlCData {
    text: String,
}

impl XmlCData {
    /// Creates a new CDATA section.
    pub fn new(text: impl Into<String>) -> Self {
        XmlCData { text: text.into() }
    }

    /// Returns the section contents (without the `<![CDATA[` and `]]>` markers).
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// XML comment content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlComment {
    /// The comment text (without the <!-- and --> markers).
    text: String,
}

impl XmlComment {
    /// Creates a new comment node from a string.
    pub fn new(text: impl Into<String>) -> Self {
        XmlComment { text: text.into() }
    }

    /// Returns the comment text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for XmlComment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<!--{}-->", self.text)
    }
}

/// XML processing instruction content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlProcessingInstruction {
    /// The target of the PI (e.g., "xml-stylesheet").
    target: String,
    /// The content/data of the PI (everything after the target).
    content: String,
}

impl XmlProcessingInstruction {
    /// Creates a new PI from target and content strings.
    pub fn new(target: impl Into<String>, content: impl Into<String>) -> Self {
        XmlProcessingInstruction {
            target: target.into(),
            content: content.into(),
        }
    }

    /// Returns the PI target.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the PI content.
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for XmlProcessingInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.content.is_empty() {
            write!(f, "<?{}?>", self.target)
        } else {
            write!(f, "<?{} {}?>", self.target, self.content)
        }
    }
}

/// A reference to a general entity declared in the doctype.
///
/// Entity declarations are never read, so the reference is kept as-is and
/// written back verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlEntityRef {
    name: String,
}

impl XmlEntityRef {
    /// Creates a reference to the named entity.
    pub fn new(name: impl Into<String>) -> Self {
        XmlEntityRef { name: name.into() }
    }

    /// Returns the entity name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for XmlEntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "&{};", self.name)
    }
}
