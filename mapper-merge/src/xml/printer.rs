//! XML printer that outputs document trees.
//!
//! Layout lives in the tree itself as whitespace text nodes, so the printer
//! adds line breaks only at document level: after the declaration, the
//! doctype, each top-level comment or processing instruction, and the root
//! element. Inside the root every node is written exactly as stored.

use std::io::Write;

use quick_xml::escape::{escape, partial_escape};

use super::document::Document;
use crate::constants::{DEFAULT_XML_VERSION, OUTPUT_ENCODING};
use crate::node::{NodeRef, XmlContent, XmlElement};

/// Options for XML printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPrinterOptions {
    /// Whether to write the `<?xml ...?>` declaration.
    pub declaration: bool,
    /// Whether childless elements are written as `<a></a>` instead of `<a />`.
    pub expand_empty_elements: bool,
}

impl Default for XmlPrinterOptions {
    fn default() -> Self {
        XmlPrinterOptions {
            declaration: true,
            expand_empty_elements: false,
        }
    }
}

/// XML printer that outputs document trees.
pub struct XmlPrinter<W: Write> {
    writer: W,
    options: XmlPrinterOptions,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a new XML printer.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, XmlPrinterOptions::default())
    }

    /// Creates a new XML printer with the given options.
    pub fn with_options(writer: W, options: XmlPrinterOptions) -> Self {
        XmlPrinter { writer, options }
    }

    /// Prints a whole document.
    pub fn print(&mut self, doc: &Document) -> std::io::Result<()> {
        if self.options.declaration {
            let version = doc
                .declaration()
                .map_or(DEFAULT_XML_VERSION, |d| d.version.as_str());
            write!(
                self.writer,
                "<?xml version=\"{}\" encoding=\"{}\"",
                version, OUTPUT_ENCODING
            )?;
            if let Some(standalone) = doc.declaration().and_then(|d| d.standalone.as_deref()) {
                write!(self.writer, " standalone=\"{}\"", standalone)?;
            }
            writeln!(self.writer, "?>")?;
        }

        let (before_doctype, after_doctype) = doc.prolog_around_doctype();
        for node in before_doctype {
            self.print_node(node)?;
            writeln!(self.writer)?;
        }

        if let Some(doctype) = doc.doctype() {
            writeln!(self.writer, "<!DOCTYPE {}>", doctype.raw())?;
        }

        for node in after_doctype {
            self.print_node(node)?;
            writeln!(self.writer)?;
        }

        self.print_node(doc.root())?;
        writeln!(self.writer)?;

        for node in doc.epilog() {
            self.print_node(node)?;
            writeln!(self.writer)?;
        }

        self.writer.flush()
    }

    /// Prints a single node and its descendants.
    pub fn print_node(&mut self, node: &NodeRef) -> std::io::Result<()> {
        let borrowed = node.borrow();

        match borrowed.content() {
            XmlContent::Element(element) => {
                self.start_element(element)?;
                if borrowed.child_count() == 0 && !self.options.expand_empty_elements {
                    return write!(self.writer, " />");
                }
                write!(self.writer, ">")?;
                for child in borrowed.children() {
                    self.print_node(child)?;
                }
                write!(self.writer, "</{}>", element.qname())
            }
            XmlContent::Text(text) => write!(self.writer, "{}", partial_escape(text.text())),
            XmlContent::CData(cdata) => write!(self.writer, "<![CDATA[{}]]>", cdata.text()),
            XmlContent::Comment(comment) => write!(self.writer, "{}", comment),
            XmlContent::ProcessingInstruction(pi) => write!(self.writer, "{}", pi),
            XmlContent::EntityRef(entity) => write!(self.writer, "{}", entity),
        }
    }

    fn start_element(&mut self, element: &XmlElement) -> std::io::Result<()> {
        write!(self.writer, "<{}", element.qname())?;
        for (name, value) in element.attributes().iter() {
            write!(self.writer, " {}=\"{}\"", name, escape(value))?;
        }
        Ok(())
    }
}

/// Prints a document to a string with default options.
pub fn print_to_string(doc: &Document) -> std::io::Result<String> {
    print_to_string_with(doc, XmlPrinterOptions::default())
}

/// Prints a document to a string with the given options.
pub fn print_to_string_with(doc: &Document, options: XmlPrinterOptions) -> std::io::Result<String> {
    let mut output = Vec::new();
    {
        let mut printer = XmlPrinter::with_options(&mut output, options);
        printer.print(doc)?;
    }
    Ok(String::from_utf8_lossy(&output).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    const MAPPER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE mapper PUBLIC "-//mybatis.org//DTD Mapper 3.0//EN" "http://mybatis.org/dtd/mybatis-3-mapper.dtd">
<mapper namespace="com.example.UserMapper">
  <resultMap id="BaseResultMap" type="User">
    <id column="id" property="id" />
  </resultMap>
  <select id="count" resultType="int">
    select count(*) from user where age &gt; 18
  </select>
</mapper>
"#;

    #[test]
    fn test_round_trip_preserves_layout() {
        let doc = parse_str(MAPPER).unwrap();
        let output = print_to_string(&doc).unwrap();
        assert_eq!(output, MAPPER);
    }

    #[test]
    fn test_prolog_keeps_place_around_doctype() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- license -->\n<!DOCTYPE mapper>\n<!-- notes -->\n<mapper />\n";
        let doc = parse_str(xml).unwrap();

        let (before, after) = doc.prolog_around_doctype();
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 1);
        assert_eq!(print_to_string(&doc).unwrap(), xml);
    }

    #[test]
    fn test_double_round_trip() {
        let xml = "<a x=\"1\"><!--c--><b/>text<![CDATA[<raw>]]><?pi data?></a>";
        let output1 = print_to_string(&parse_str(xml).unwrap()).unwrap();
        let output2 = print_to_string(&parse_str(&output1).unwrap()).unwrap();
        assert_eq!(output1, output2);
        assert!(output1.contains("<![CDATA[<raw>]]>"));
        assert!(output1.contains("<?pi data?>"));
        assert!(output1.contains("<!--c-->"));
    }

    #[test]
    fn test_declaration_defaults() {
        let doc = parse_str("<mapper/>").unwrap();
        let output = print_to_string(&doc).unwrap();
        assert_eq!(
            output,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<mapper />\n"
        );
    }

    #[test]
    fn test_options() {
        let doc = parse_str("<mapper><sql id=\"cols\"/></mapper>").unwrap();
        let options = XmlPrinterOptions {
            declaration: false,
            expand_empty_elements: true,
        };
        let output = print_to_string_with(&doc, options).unwrap();
        assert_eq!(output, "<mapper><sql id=\"cols\"></sql></mapper>\n");
    }

    #[test]
    fn test_entity_encoding() {
        let doc = parse_str(r#"<root attr="&amp;&lt;&quot;">&amp;&lt;&gt;</root>"#).unwrap();
        let output = print_to_string(&doc).unwrap();
        assert!(output.contains(r#"attr="&amp;&lt;&quot;""#));
        assert!(output.contains("&amp;&lt;&gt;"));
    }

    #[test]
    fn test_unexpanded_entity_written_back() {
        let xml = "<!DOCTYPE mapper [<!ENTITY cols \"a, b\">]>\n<mapper>&cols;</mapper>";
        let output = print_to_string(&parse_str(xml).unwrap()).unwrap();
        assert!(output.contains("<!DOCTYPE mapper [<!ENTITY cols \"a, b\">]>"));
        assert!(output.contains("<mapper>&cols;</mapper>"));
    }
}
