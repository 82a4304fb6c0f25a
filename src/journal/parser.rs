//! Journal document parsing.
//!
//! A journal is an XML document per cycle: the root's children are run
//! elements, each run's children are metadata fields with namespaced tags.
//! The index document (`journal_main.xml`) is a sibling format whose root
//! children carry the cycle file name in a `name` attribute.
//!
//! Parsing is strictly order-preserving: records follow document order and
//! so do the fields inside each record. The field *set* is whatever the
//! source document contains; well-formed journals repeat one set across
//! every record, but nothing here assumes that.

use crate::error::Result;
use roxmltree::{Document, Node};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One run's metadata: an ordered field-name to value mapping.
///
/// Keys are the namespace-stripped tag names; values are the
/// whitespace-trimmed element text, or `None` for an element with no text
/// node. Serializes as a JSON object preserving insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalRecord {
    fields: Vec<(String, Option<String>)>,
}

impl JournalRecord {
    /// Value of the first field with the given name, if present and non-null.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Field entries in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn push(&mut self, key: String, value: Option<String>) {
        self.fields.push((key, value));
    }
}

impl Serialize for JournalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Parse one cycle's journal document into ordered records.
///
/// One record per top-level child of the root, one field per grandchild.
/// The namespace prefix is stripped from each tag to form the field key and
/// the text value is whitespace-trimmed; an element without a text node
/// keeps a null value rather than being dropped.
pub fn parse_cycle_document(xml: &str) -> Result<Vec<JournalRecord>> {
    let doc = Document::parse(xml)?;
    let mut records = Vec::new();
    for run in doc.root_element().children().filter(Node::is_element) {
        let mut record = JournalRecord::default();
        for field in run.children().filter(Node::is_element) {
            let key = field.tag_name().name().to_string();
            let value = field.text().map(|text| text.trim().to_string());
            record.push(key, value);
        }
        records.push(record);
    }
    Ok(records)
}

/// Parse the instrument index document into the ordered public cycle list.
///
/// Each direct child of the root exposes the cycle file name in its `name`
/// attribute; children without one are skipped. The first entry is the
/// index's bootstrap record, not a real cycle; callers iterating run data
/// exclude it (see `journal::search`).
pub fn parse_cycle_list(xml: &str) -> Result<Vec<String>> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .root_element()
        .children()
        .filter(Node::is_element)
        .filter_map(|node| node.attribute("name").map(str::to_string))
        .collect())
}
