//! Edit logging for the mapper merge.
//!
//! This module records what the merge did to each child of the mapper root:
//! which statements were regenerated or newly inserted, which user attributes
//! were carried forward, and which existing statements were kept as
//! user-authored.

use std::io::Write;

use quick_xml::escape::escape;

/// Types of edit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditType {
    /// An existing element was replaced by its regenerated counterpart.
    Regenerate,
    /// A generated element had no existing counterpart.
    Insert,
    /// A user-added attribute was copied onto a regenerated element.
    MigrateAttribute,
    /// An existing element was kept because the generator no longer emits it.
    Preserve,
}

impl EditType {
    /// Returns the XML tag name for this edit type.
    pub fn tag_name(&self) -> &'static str {
        match self {
            EditType::Regenerate => "regenerate",
            EditType::Insert => "insert",
            EditType::MigrateAttribute => "migrate",
            EditType::Preserve => "preserve",
        }
    }
}

/// A single edit operation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEntry {
    /// The type of edit operation.
    pub edit_type: EditType,
    /// The `id` of the affected element.
    pub id: String,
    /// Tag name of the affected element.
    pub tag: String,
    /// Migrated attribute name, for [`EditType::MigrateAttribute`].
    pub attribute: Option<String>,
    /// For [`EditType::Preserve`]: the element carries legacy generator
    /// markers and is probably stale generated output.
    pub legacy_generated: bool,
}

/// Log of edit operations performed during a merge, in the order they
/// happened.
#[derive(Debug, Default, Clone)]
pub struct EditLog {
    edits: Vec<EditEntry>,
}

impl EditLog {
    /// Creates a new empty edit log.
    pub fn new() -> Self {
        EditLog { edits: Vec::new() }
    }

    fn push(&mut self, edit_type: EditType, id: &str, tag: &str) -> &mut EditEntry {
        self.edits.push(EditEntry {
            edit_type,
            id: id.to_string(),
            tag: tag.to_string(),
            attribute: None,
            legacy_generated: false,
        });
        let last = self.edits.len() - 1;
        &mut self.edits[last]
    }

    /// Records the replacement of an existing element.
    pub fn regenerate(&mut self, id: &str, tag: &str) {
        self.push(EditType::Regenerate, id, tag);
    }

    /// Records a generated element without an existing counterpart.
    pub fn insert(&mut self, id: &str, tag: &str) {
        self.push(EditType::Insert, id, tag);
    }

    /// Records an attribute carried over onto a regenerated element.
    pub fn migrate_attribute(&mut self, id: &str, tag: &str, attribute: &str) {
        self.push(EditType::MigrateAttribute, id, tag).attribute = Some(attribute.to_string());
    }

    /// Records an existing element kept as user-authored.
    pub fn preserve(&mut self, id: &str, tag: &str, legacy_generated: bool) {
        self.push(EditType::Preserve, id, tag).legacy_generated = legacy_generated;
    }

    /// Returns all entries.
    pub fn edits(&self) -> &[EditEntry] {
        &self.edits
    }

    /// Returns the entries of one type.
    pub fn of_type(&self, edit_type: EditType) -> impl Iterator<Item = &EditEntry> {
        self.edits.iter().filter(move |e| e.edit_type == edit_type)
    }

    /// Returns the number of entries of one type.
    pub fn count(&self, edit_type: EditType) -> usize {
        self.of_type(edit_type).count()
    }

    /// Returns the ids of preserved elements that look like stale legacy
    /// generator output.
    pub fn stale_legacy_ids(&self) -> Vec<&str> {
        self.of_type(EditType::Preserve)
            .filter(|e| e.legacy_generated)
            .map(|e| e.id.as_str())
            .collect()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Returns a one-line summary of the log.
    pub fn summary(&self) -> String {
        format!(
            "{} regenerated, {} inserted, {} preserved, {} attributes migrated",
            self.count(EditType::Regenerate),
            self.count(EditType::Insert),
            self.count(EditType::Preserve),
            self.count(EditType::MigrateAttribute)
        )
    }

    /// Writes the log as XML.
    pub fn write_xml<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(writer, "<editlog>")?;
        for entry in &self.edits {
            write!(
                writer,
                "  <{} id=\"{}\" tag=\"{}\"",
                entry.edit_type.tag_name(),
                escape(&entry.id),
                escape(&entry.tag)
            )?;
            if let Some(attribute) = &entry.attribute {
                write!(writer, " attribute=\"{}\"", escape(attribute))?;
            }
            if entry.legacy_generated {
                write!(writer, " legacy=\"true\"")?;
            }
            writeln!(writer, " />")?;
        }
        writeln!(writer, "</editlog>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_summary() {
        let mut log = EditLog::new();
        log.regenerate("insert", "insert");
        log.migrate_attribute("insert", "insert", "useGeneratedKeys");
        log.insert("selectAll", "select");
        log.preserve("findByName", "select", false);
        log.preserve("ibatorgenerated_count", "select", true);

        assert_eq!(log.count(EditType::Preserve), 2);
        assert_eq!(log.stale_legacy_ids(), vec!["ibatorgenerated_count"]);
        assert_eq!(
            log.summary(),
            "1 regenerated, 1 inserted, 2 preserved, 1 attributes migrated"
        );
    }

    #[test]
    fn test_write_xml() {
        let mut log = EditLog::new();
        log.migrate_attribute("save", "insert", "keyColumn");
        log.preserve("a&b", "sql", true);

        let mut out = Vec::new();
        log.write_xml(&mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.contains(r#"<migrate id="save" tag="insert" attribute="keyColumn" />"#));
        assert!(xml.contains(r#"<preserve id="a&amp;b" tag="sql" legacy="true" />"#));
        assert!(xml.trim_end().ends_with("</editlog>"));
    }

    #[test]
    fn test_empty_log() {
        let log = EditLog::new();
        assert!(log.is_empty());
        assert_eq!(log.edits().len(), 0);
    }
}
