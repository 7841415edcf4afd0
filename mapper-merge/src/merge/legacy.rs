//! Detection of elements written by older generator versions.
//!
//! Before regeneration was keyed on `id`, generated statements were marked
//! either by an `id` prefix or by a leading comment carrying a marker tag.
//! Merging no longer depends on these markers; they are used to flag
//! preserved elements that are probably stale generator output.

use crate::constants::{OLD_ELEMENT_TAGS, OLD_XML_ELEMENT_PREFIXES};
use crate::node::{NodeRef, XmlContent};

/// Marker sets that identify legacy generated elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyMarkers {
    /// `id` prefixes of legacy generated elements.
    pub id_prefixes: Vec<String>,
    /// Tags searched for in the leading comment of an element.
    pub comment_tags: Vec<String>,
}

impl Default for LegacyMarkers {
    fn default() -> Self {
        LegacyMarkers {
            id_prefixes: OLD_XML_ELEMENT_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            comment_tags: OLD_ELEMENT_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl LegacyMarkers {
    /// Marker sets that match nothing.
    pub fn none() -> Self {
        LegacyMarkers {
            id_prefixes: Vec::new(),
            comment_tags: Vec::new(),
        }
    }

    /// Returns true if `node` is an element produced by an older generator.
    pub fn is_generated(&self, node: &NodeRef) -> bool {
        is_generated_node(node, self)
    }
}

/// Returns true if `node` is an element whose `id` starts with a legacy
/// prefix, or whose first non-whitespace child is a comment containing a
/// legacy tag.
pub fn is_generated_node(node: &NodeRef, markers: &LegacyMarkers) -> bool {
    let borrowed = node.borrow();
    let Some(element) = borrowed.element() else {
        return false;
    };

    if let Some(id) = element.id() {
        if markers
            .id_prefixes
            .iter()
            .any(|prefix| id.starts_with(prefix.as_str()))
        {
            return true;
        }
    }

    let first = borrowed
        .children()
        .iter()
        .find(|child| !child.borrow().is_whitespace());
    first.is_some_and(|child| match child.borrow().content() {
        XmlContent::Comment(comment) => markers
            .comment_tags
            .iter()
            .any(|tag| comment.text().contains(tag.as_str())),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    fn first_element(xml: &str) -> NodeRef {
        let doc = parse_str(xml).unwrap();
        let root = doc.root().borrow();
        root.children()
            .iter()
            .find(|c| c.borrow().content().is_element())
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_legacy_id_prefix() {
        let node = first_element(
            r#"<mapper><select id="ibatorgenerated_selectByExample"/></mapper>"#,
        );
        assert!(is_generated_node(&node, &LegacyMarkers::default()));
        assert!(!is_generated_node(&node, &LegacyMarkers::none()));
    }

    #[test]
    fn test_legacy_comment_tag() {
        let node = first_element(
            "<mapper><select id=\"selectAll\">\n    <!--\n      WARNING - @mbg.generated\n    -->\n    select 1\n  </select></mapper>",
        );
        assert!(LegacyMarkers::default().is_generated(&node));
    }

    #[test]
    fn test_comment_must_come_first() {
        let node = first_element(
            "<mapper><select id=\"custom\">select 1 <!-- @mbg.generated --></select></mapper>",
        );
        assert!(!LegacyMarkers::default().is_generated(&node));
    }

    #[test]
    fn test_plain_user_element() {
        let node = first_element(
            "<mapper><select id=\"findActive\"><!-- hand written -->select 1</select></mapper>",
        );
        assert!(!LegacyMarkers::default().is_generated(&node));
    }

    #[test]
    fn test_non_element_is_never_generated() {
        let doc = parse_str("<mapper><!-- @mbg.generated --></mapper>").unwrap();
        let comment = doc.root().borrow().children()[0].clone();
        assert!(!LegacyMarkers::default().is_generated(&comment));
    }
}
