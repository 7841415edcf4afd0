//! XML parser that builds document trees.
//!
//! This parser uses quick-xml's streaming API. Character data is kept exactly
//! as written so that layout whitespace survives a parse/print cycle.
//!
//! No entity declaration is ever read: DTDs named by the doctype are not
//! fetched, and references to entities other than the five predefined ones
//! become [`XmlEntityRef`] nodes instead of being expanded.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use super::document::{DocType, Document, XmlDeclaration};
use crate::error::{Error, Result};
use crate::node::{
    new_node, new_text, Attributes, NodeInner, NodeRef, XmlCData, XmlComment, XmlContent,
    XmlElement, XmlEntityRef, XmlProcessingInstruction,
};

/// XML parser that builds document trees.
#[derive(Debug, Clone)]
pub struct XmlParser {
    /// Name used in error messages.
    source_name: String,
}

impl XmlParser {
    /// Creates a parser; `source_name` identifies the input in errors.
    pub fn new(source_name: impl Into<String>) -> Self {
        XmlParser {
            source_name: source_name.into(),
        }
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<Document> {
        self.parse_reader(xml.as_bytes())
    }

    /// Parses XML from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let file = File::open(path).map_err(|e| Error::io(&self.source_name, e))?;
        self.parse_reader(BufReader::new(file))
    }

    /// Parses XML from any buffered source.
    pub fn parse_reader<R: BufRead>(&self, source: R) -> Result<Document> {
        let mut reader = Reader::from_reader(source);
        // Layout whitespace is content for the merger
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        let mut builder = TreeBuilder::default();
        let mut buf = Vec::new();

        loop {
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => return Err(self.xml_error(e, reader.error_position())),
            };
            match event {
                Event::Start(ref e) => {
                    let element = self.parse_element(e, &reader)?;
                    builder
                        .open(new_node(XmlContent::Element(element)))
                        .map_err(|msg| self.parse_error(msg))?;
                }
                Event::End(_) => builder.close(),
                Event::Empty(ref e) => {
                    let element = self.parse_element(e, &reader)?;
                    builder
                        .push(new_node(XmlContent::Element(element)))
                        .map_err(|msg| self.parse_error(msg))?;
                }
                Event::Text(ref e) => {
                    let raw = std::str::from_utf8(e.as_ref()).map_err(|e| self.parse_error(e))?;
                    let text = unescape(raw).map_err(|e| self.parse_error(e))?;
                    builder.text(&text).map_err(|msg| self.parse_error(msg))?;
                }
                Event::CData(ref e) => {
                    let text = std::str::from_utf8(e.as_ref()).map_err(|e| self.parse_error(e))?;
                    builder
                        .push(new_node(XmlContent::CData(XmlCData::new(text))))
                        .map_err(|msg| self.parse_error(msg))?;
                }
                Event::Comment(ref e) => {
                    let text = std::str::from_utf8(e.as_ref()).map_err(|e| self.parse_error(e))?;
                    builder
                        .push(new_node(XmlContent::Comment(XmlComment::new(text))))
                        .map_err(|msg| self.parse_error(msg))?;
                }
                Event::PI(ref e) => {
                    let target =
                        std::str::from_utf8(e.target()).map_err(|e| self.parse_error(e))?;
                    let content =
                        std::str::from_utf8(e.content()).map_err(|e| self.parse_error(e))?;
                    let pi = XmlProcessingInstruction::new(target, content.trim_start());
                    builder
                        .push(new_node(XmlContent::ProcessingInstruction(pi)))
                        .map_err(|msg| self.parse_error(msg))?;
                }
                Event::GeneralRef(ref e) => {
                    let name = std::str::from_utf8(e).map_err(|e| self.parse_error(e))?;
                    self.entity_ref(&mut builder, name)?;
                }
                Event::Decl(ref e) => {
                    let version = e.version().map_err(|e| self.parse_error(e))?;
                    let encoding = e
                        .encoding()
                        .transpose()
                        .map_err(|e| self.parse_error(e))?;
                    let standalone = e
                        .standalone()
                        .transpose()
                        .map_err(|e| self.parse_error(e))?;
                    builder.declaration = Some(XmlDeclaration {
                        version: String::from_utf8_lossy(&version).into_owned(),
                        encoding: encoding.map(|v| String::from_utf8_lossy(&v).into_owned()),
                        standalone: standalone.map(|v| String::from_utf8_lossy(&v).into_owned()),
                    });
                }
                Event::DocType(ref e) => {
                    let raw = reader
                        .decoder()
                        .decode(e.as_ref())
                        .map_err(|e| self.parse_error(e))?;
                    let doctype = DocType::from_raw(&raw);
                    trace!(source = %self.source_name, name = doctype.name(), "doctype");
                    builder.doctype = Some(doctype);
                    builder.doctype_position = builder.prolog.len();
                }
                Event::Eof => break,
            }
            buf.clear();
        }

        builder.finish().map_err(|msg| self.parse_error(msg))
    }

    /// Resolves a general entity reference without reading any declaration.
    fn entity_ref(&self, builder: &mut TreeBuilder, name: &str) -> Result<()> {
        let resolved = if name.starts_with('#') {
            let reference = format!("&{};", name);
            Some(
                unescape(&reference)
                    .map_err(|e| self.parse_error(e))?
                    .into_owned(),
            )
        } else {
            resolve_predefined_entity(name).map(str::to_string)
        };

        let outcome = match resolved {
            Some(text) => builder.text(&text),
            None => builder.push(new_node(XmlContent::EntityRef(XmlEntityRef::new(name)))),
        };
        outcome.map_err(|msg| self.parse_error(msg))
    }

    /// Parses an element's name and attributes.
    fn parse_element<R: BufRead>(&self, e: &BytesStart, reader: &Reader<R>) -> Result<XmlElement> {
        let name = reader
            .decoder()
            .decode(e.name().as_ref())
            .map_err(|e| self.parse_error(e))?
            .to_string();

        let mut attributes = Attributes::new();
        for attr_result in e.attributes() {
            let attr =
                attr_result.map_err(|e| self.parse_error(format!("attribute error: {}", e)))?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(|e| self.parse_error(e))?
                .to_string();
            // Only predefined and character references resolve; a custom entity is a parse error.
            let value = attr
                .unescape_value()
                .map_err(|e| self.parse_error(e))?
                .to_string();
            attributes.set(key, value);
        }

        Ok(XmlElement::new(name, attributes))
    }

    fn parse_error(&self, message: impl Display) -> Error {
        Error::parse(&self.source_name, message.to_string())
    }

    fn xml_error(&self, err: quick_xml::Error, position: impl Display) -> Error {
        match err {
            quick_xml::Error::Io(io) => Error::io(
                &self.source_name,
                std::io::Error::new(io.kind(), io.to_string()),
            ),
            other => self.parse_error(format!("{} at byte {}", other, position)),
        }
    }
}

/// Assembles the document from the event stream.
#[derive(Default)]
struct TreeBuilder {
    declaration: Option<XmlDeclaration>,
    doctype: Option<DocType>,
    doctype_position: usize,
    prolog: Vec<NodeRef>,
    epilog: Vec<NodeRef>,
    root: Option<NodeRef>,
    /// Currently open elements, root first.
    stack: Vec<NodeRef>,
}

impl TreeBuilder {
    /// Adds a start tag and makes it the current element.
    fn open(&mut self, node: NodeRef) -> std::result::Result<(), String> {
        self.push(node.clone())?;
        self.stack.push(node);
        Ok(())
    }

    fn close(&mut self) {
        self.stack.pop();
    }

    /// Attaches a node to the current element or to the document level.
    fn push(&mut self, node: NodeRef) -> std::result::Result<(), String> {
        if let Some(parent) = self.stack.last() {
            NodeInner::append_child(parent, node);
            return Ok(());
        }

        let (is_element, is_misc, name) = {
            let inner = node.borrow();
            let content = inner.content();
            (
                content.is_element(),
                matches!(
                    content,
                    XmlContent::Comment(_) | XmlContent::ProcessingInstruction(_)
                ),
                content.node_name().to_string(),
            )
        };

        if is_element {
            if self.root.is_some() {
                return Err(format!("unexpected second root element <{}>", name));
            }
            self.root = Some(node);
        } else if is_misc {
            if self.root.is_some() {
                self.epilog.push(node);
            } else {
                self.prolog.push(node);
            }
        } else {
            return Err(format!("{} is not allowed outside the root element", name));
        }
        Ok(())
    }

    /// Adds character data, joining it with a directly preceding text node.
    fn text(&mut self, text: &str) -> std::result::Result<(), String> {
        let Some(parent) = self.stack.last() else {
            if text.trim_matches(|c: char| c.is_ascii_whitespace()).is_empty() {
                return Ok(());
            }
            return Err("text is not allowed outside the root element".to_string());
        };

        let last = parent.borrow().children().last().cloned();
        if let Some(last) = last {
            let mut last = last.borrow_mut();
            if let Some(existing) = last.content_mut().as_text_mut() {
                existing.push_str(text);
                return Ok(());
            }
        }
        NodeInner::append_child(parent, new_text(text));
        Ok(())
    }

    fn finish(self) -> std::result::Result<Document, String> {
        if let Some(open) = self.stack.last() {
            return Err(format!("unclosed element <{}>", open.borrow().node_name()));
        }
        let root = self
            .root
            .ok_or_else(|| "document has no root element".to_string())?;

        let mut doc = Document::new(root);
        doc.set_declaration(self.declaration);
        doc.set_doctype(self.doctype);
        doc.set_doctype_position(self.doctype_position);
        for node in self.prolog {
            doc.push_prolog(node);
        }
        for node in self.epilog {
            doc.push_epilog(node);
        }
        Ok(doc)
    }
}

/// Name used for `path` in errors: its file name, or the whole path if it
/// has none.
pub(crate) fn source_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parses XML from a file, naming it by its file name in errors.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    XmlParser::new(source_name_of(path)).parse_file(path)
}

/// Parses XML from a string.
pub fn parse_str(xml: &str) -> Result<Document> {
    XmlParser::new("<string>").parse_str(xml)
}
