//! xml-mapper-merge - regeneration merge for SQL mapper XML files
//!
//! This library merges a freshly generated mapper document into the mapper
//! file already on disk, so that running a code generator again refreshes
//! the generated statements without destroying the hand-written ones.
//!
//! # Overview
//!
//! Children of the mapper root are matched by their `id` attribute:
//!
//! - a generated child whose `id` exists replaces the old element, taking
//!   over any attributes the user added to it
//! - a generated child with a new `id` is inserted
//! - an existing child whose `id` is not generated any more is kept as-is
//!
//! Regenerated and inserted statements come first, in generated order,
//! followed by everything that was preserved.
//!
//! Documents are parsed without ever fetching a DTD or expanding external
//! entities, so merging works offline and is safe on untrusted input.
//!
//! # Example
//!
//! ```
//! let header = r#"<!DOCTYPE mapper PUBLIC "-//mybatis.org//DTD Mapper 3.0//EN" "http://mybatis.org/dtd/mybatis-3-mapper.dtd">"#;
//! let existing = format!(
//!     "{header}\n<mapper namespace=\"Old\">\n  <select id=\"findAll\">SELECT 2</select>\n</mapper>"
//! );
//! let generated = format!(
//!     "{header}\n<mapper namespace=\"New\">\n  <select id=\"findAll\">SELECT 1</select>\n</mapper>"
//! );
//!
//! let merged = xml_mapper_merge::merge_str(&generated, &existing, "UserMapper.xml").unwrap();
//! assert!(merged.contains(r#"<mapper namespace="New">"#));
//! assert!(merged.contains("SELECT 1"));
//! ```

pub mod constants;
pub mod error;
pub mod merge;
pub mod node;
pub mod xml;

// Re-export commonly used types
pub use constants::*;
pub use error::{Error, Result};
pub use node::{
    new_element, new_node, new_text, Attributes, NodeInner, NodeRef, WeakNodeRef, XmlContent,
    XmlElement, XmlText,
};
pub use xml::{
    parse_file, parse_str, DocType, Document, XmlDeclaration, XmlParser, XmlPrinter,
    XmlPrinterOptions,
};

// Re-export merge types
pub use merge::{
    check_doctype, is_generated_node, merge, merge_str, EditEntry, EditLog, EditType,
    LegacyMarkers, MergeOptions, MergeOutput, Merger,
};
