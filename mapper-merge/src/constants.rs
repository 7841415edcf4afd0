//! Constants used throughout the merger.

/// Attribute that identifies a regenerated statement under the mapper root.
pub const ID_ATTRIBUTE: &str = "id";

/// Data written into the first of two adjacent whitespace-only nodes when
/// runs of blank lines are collapsed.
pub const BLANK_LINE: &str = "  \n\n  ";

/// `id` prefixes used by generator versions that predate id-based
/// regeneration.
pub const OLD_XML_ELEMENT_PREFIXES: &[&str] = &["ibatorgenerated_", "abatorgenerated_"];

/// Tags placed in the leading comment of generated elements by older
/// generator versions.
pub const OLD_ELEMENT_TAGS: &[&str] = &[
    "@ibatorgenerated",
    "@abatorgenerated",
    "@mbggenerated",
    "@mbg.generated",
];

/// XML version written when the existing document carries no declaration.
pub const DEFAULT_XML_VERSION: &str = "1.0";

/// Encoding of every rendered document.
pub const OUTPUT_ENCODING: &str = "UTF-8";
