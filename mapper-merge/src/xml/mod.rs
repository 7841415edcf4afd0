//! XML parsing and output.
//!
//! This module provides the document model along with an XXE-safe parser and
//! a printer that writes a document back with its original layout.

mod document;
mod parser;
mod printer;

pub use document::{DocType, Document, XmlDeclaration};
pub(crate) use parser::source_name_of;
pub use parser::{parse_file, parse_str, XmlParser};
pub use printer::{print_to_string, print_to_string_with, XmlPrinter, XmlPrinterOptions};
