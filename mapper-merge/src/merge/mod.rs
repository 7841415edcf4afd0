//! Regeneration merge for mapper files.
//!
//! This module merges a freshly generated mapper document into the existing
//! one so that hand-written statements survive regeneration.
//!
//! # Algorithm Overview
//!
//! The existing document is edited in place and carries the result:
//! 1. Check that both doctypes name the same root element
//! 2. Replace the existing root attributes with the generated ones
//! 3. Index the existing root children by `id`
//! 4. For each generated child, find its existing counterparts, mark them for
//!    deletion and carry their extra attributes forward
//! 5. Delete the marked children
//! 6. Import the generated children in front of the remaining ones
//! 7. Collapse runs of blank lines at root level
//!
//! Element bodies are never compared: a regenerated statement replaces the
//! old one wholesale, including any edits made to its SQL.

mod edit_log;
mod id_index;
mod legacy;
mod whitespace;

pub use edit_log::{EditEntry, EditLog, EditType};
pub use id_index::IdIndex;
pub use legacy::{is_generated_node, LegacyMarkers};
pub use whitespace::{collapse_blank_lines, is_whitespace};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::node::{NodeInner, NodeRef};
use crate::xml::{print_to_string_with, source_name_of, Document, XmlParser, XmlPrinterOptions};

/// Options for a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// How the merged document is rendered.
    pub printer: XmlPrinterOptions,
    /// Markers used to flag preserved elements written by older generators.
    pub legacy: LegacyMarkers,
}

/// Result of a merge: the rendered document plus what was done.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// The merged document.
    pub text: String,
    /// The edits applied to the existing document.
    pub log: EditLog,
}

/// Merges generated mapper documents into existing ones.
///
/// A `Merger` holds only its options; every call parses, merges and renders
/// independently.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    options: MergeOptions,
}

/// A generated child and the existing children it replaces.
struct Regeneration {
    id: String,
    replaced: Vec<NodeRef>,
}

impl Merger {
    /// Creates a merger with the given options.
    pub fn new(options: MergeOptions) -> Self {
        Merger { options }
    }

    /// Returns the merge options.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merges the generated document read from `new_source` into the existing
    /// one read from `existing_source` and returns the rendered result.
    ///
    /// `existing_name` identifies the existing file in error messages.
    pub fn merge<N: BufRead, E: BufRead>(
        &self,
        new_source: N,
        existing_source: E,
        existing_name: &str,
    ) -> Result<String> {
        self.merge_with_log(new_source, existing_source, existing_name)
            .map(|output| output.text)
    }

    /// Like [`Merger::merge`], but also returns the edit log.
    pub fn merge_with_log<N: BufRead, E: BufRead>(
        &self,
        new_source: N,
        existing_source: E,
        existing_name: &str,
    ) -> Result<MergeOutput> {
        debug!(file = existing_name, "merging generated mapper");

        let mut existing = XmlParser::new(existing_name).parse_reader(existing_source)?;
        let generated = XmlParser::new(generated_source_name(existing_name))
            .parse_reader(new_source)?;

        check_doctype(&existing, &generated, existing_name)?;

        let log = self.merge_documents(&mut existing, &generated)?;

        let text = print_to_string_with(&existing, self.options.printer.clone())
            .map_err(|e| Error::io(existing_name, e))?;

        info!(file = existing_name, "{}", log.summary());
        Ok(MergeOutput { text, log })
    }

    /// Merges two in-memory documents.
    pub fn merge_str(
        &self,
        new_xml: &str,
        existing_xml: &str,
        existing_name: &str,
    ) -> Result<String> {
        self.merge(new_xml.as_bytes(), existing_xml.as_bytes(), existing_name)
    }

    /// Merges generated content into the file at `existing_path`.
    ///
    /// The file is read as UTF-8 and is not modified; writing the result back
    /// is up to the caller.
    pub fn merge_file<P: AsRef<Path>>(&self, new_xml: &str, existing_path: P) -> Result<String> {
        self.merge_file_with_log(new_xml, existing_path)
            .map(|output| output.text)
    }

    /// Like [`Merger::merge_file`], but also returns the edit log.
    pub fn merge_file_with_log<P: AsRef<Path>>(
        &self,
        new_xml: &str,
        existing_path: P,
    ) -> Result<MergeOutput> {
        let path = existing_path.as_ref();
        let name = source_name_of(path);
        let file = File::open(path).map_err(|e| Error::io(&name, e))?;
        self.merge_with_log(new_xml.as_bytes(), BufReader::new(file), &name)
    }

    /// Merges `generated` into `existing` in place.
    ///
    /// The doctype check is the caller's business here. If the generated
    /// document has a child without an `id`, this fails before `existing`
    /// is touched.
    pub fn merge_documents(
        &self,
        existing: &mut Document,
        generated: &Document,
    ) -> Result<EditLog> {
        let existing_root = existing.root().clone();
        let generated_root = generated.root().clone();
        let mut log = EditLog::new();

        let index = IdIndex::build(&existing_root);
        let generated_children: Vec<NodeRef> = generated_root.borrow().children().to_vec();
        let plan = plan_regenerations(&generated_children, &index)?;
        trace!(
            existing_ids = index.len(),
            generated = generated_children.len(),
            "planned regeneration"
        );

        replace_root_attributes(&existing_root, &generated_root);

        for regeneration in plan.iter().flatten() {
            for old in &regeneration.replaced {
                // A repeated id in the generated document points at nodes
                // that are already gone.
                if NodeInner::is_child_of(old, &existing_root) {
                    NodeInner::remove_child(&existing_root, old)?;
                }
            }
        }

        self.log_preserved(&existing_root, &mut log);

        // Fixed anchor: generated children keep their order and all land in
        // front of the preserved ones.
        let anchor = existing_root.borrow().first_child().cloned();
        let last = generated_children.len().saturating_sub(1);
        for (i, child) in generated_children.iter().enumerate() {
            if i == last && is_whitespace(child) {
                break;
            }

            let imported = existing.import_node(child);
            if let Some(regeneration) = &plan[i] {
                let tag = imported.borrow().node_name().to_string();
                if regeneration.replaced.is_empty() {
                    debug!(id = %regeneration.id, tag = %tag, "inserted");
                    log.insert(&regeneration.id, &tag);
                } else {
                    debug!(id = %regeneration.id, tag = %tag, "regenerated");
                    log.regenerate(&regeneration.id, &tag);
                    for old in &regeneration.replaced {
                        for name in migrate_attributes(old, &imported) {
                            debug!(id = %regeneration.id, attribute = %name, "migrated attribute");
                            log.migrate_attribute(&regeneration.id, &tag, &name);
                        }
                    }
                }
            }
            NodeInner::insert_before(&existing_root, imported, anchor.as_ref())?;
        }

        let collapsed = collapse_blank_lines(&existing_root)?;
        trace!(collapsed, "collapsed blank lines");

        Ok(log)
    }

    fn log_preserved(&self, existing_root: &NodeRef, log: &mut EditLog) {
        for child in existing_root.borrow().children() {
            let legacy = self.options.legacy.is_generated(child);
            let borrowed = child.borrow();
            if let Some(id) = borrowed.id() {
                log.preserve(id, borrowed.node_name(), legacy);
            }
        }
    }
}

/// Name used in errors about the generated document.
fn generated_source_name(existing_name: &str) -> String {
    format!("{} (generated)", existing_name)
}

/// Fails unless both documents declare a doctype with the same name.
pub fn check_doctype(existing: &Document, generated: &Document, existing_name: &str) -> Result<()> {
    let existing_type = existing.doctype().map(|d| d.name());
    let generated_type = generated.doctype().map(|d| d.name());
    match (existing_type, generated_type) {
        (Some(a), Some(b)) if a == b => Ok(()),
        _ => Err(Error::DoctypeMismatch {
            name: existing_name.to_string(),
            existing: existing_type.map(str::to_string),
            generated: generated_type.map(str::to_string),
        }),
    }
}

/// Resolves every non-whitespace generated child to its `id` and the
/// existing children it replaces. The result is parallel to `children`:
/// whitespace positions hold `None`.
fn plan_regenerations(children: &[NodeRef], index: &IdIndex) -> Result<Vec<Option<Regeneration>>> {
    children
        .iter()
        .map(|child| {
            let borrowed = child.borrow();
            if borrowed.is_whitespace() {
                return Ok(None);
            }
            let id = borrowed.id().ok_or_else(|| Error::MissingId {
                tag: borrowed.node_name().to_string(),
            })?;
            Ok(Some(Regeneration {
                id: id.to_string(),
                replaced: index.get(id).to_vec(),
            }))
        })
        .collect()
}

/// Removes every attribute of `existing_root` and copies over those of
/// `generated_root` in order.
fn replace_root_attributes(existing_root: &NodeRef, generated_root: &NodeRef) {
    let generated = generated_root
        .borrow()
        .element()
        .map(|e| e.attributes().clone())
        .unwrap_or_default();

    let mut root = existing_root.borrow_mut();
    let Some(element) = root.element_mut() else {
        return;
    };
    let names: Vec<String> = element.attributes().names().map(str::to_string).collect();
    for name in names.iter().rev() {
        element.attributes_mut().remove(name);
    }
    for (name, value) in generated.iter() {
        element.attributes_mut().set(name, value);
    }
}

/// Copies attributes of `old` that `new` lacks onto `new`. Attributes both
/// carry keep the value of `new`. Returns the copied names.
fn migrate_attributes(old: &NodeRef, new: &NodeRef) -> Vec<String> {
    let old = old.borrow();
    let Some(old_element) = old.element() else {
        return Vec::new();
    };
    let mut new = new.borrow_mut();
    let Some(new_element) = new.element_mut() else {
        return Vec::new();
    };

    let mut migrated = Vec::new();
    for (name, value) in old_element.attributes().iter() {
        if !new_element.attributes().contains(name) {
            new_element.attributes_mut().set(name, value);
            migrated.push(name.to_string());
        }
    }
    migrated
}

/// Merges with default options. See [`Merger::merge`].
pub fn merge<N: BufRead, E: BufRead>(
    new_source: N,
    existing_source: E,
    existing_name: &str,
) -> Result<String> {
    Merger::default().merge(new_source, existing_source, existing_name)
}

/// Merges two in-memory documents with default options.
pub fn merge_str(new_xml: &str, existing_xml: &str, existing_name: &str) -> Result<String> {
    Merger::default().merge_str(new_xml, existing_xml, existing_name)
}
