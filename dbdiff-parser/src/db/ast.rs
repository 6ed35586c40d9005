//! Document model
//!
//!     A parsed db file is a [Document]: the records of the file in declaration order. A
//!     [Record] keeps its fields, infos and aliases in the order they were written. Names are
//!     expected to be unique within their scope but nothing enforces it; consumers resolve
//!     duplicates by taking the first match.
//!
//!     Values are built once by the parser and never mutated afterwards.

use serde::Serialize;

/// A `(name, value)` pair, used for both fields and infos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub value: String,
}

impl Entry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Entry {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<(String, String)> for Entry {
    fn from((name, value): (String, String)) -> Self {
        Entry { name, value }
    }
}

impl<'a> From<(&'a str, &'a str)> for Entry {
    fn from((name, value): (&'a str, &'a str)) -> Self {
        Entry::new(name, value)
    }
}

/// A named configuration entry of a given type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    pub record_type: String,
    pub fields: Vec<Entry>,
    pub infos: Vec<Entry>,
    pub aliases: Vec<String>,
}

impl Record {
    /// A record with no fields, infos or aliases.
    pub fn new(record_type: impl Into<String>, name: impl Into<String>) -> Self {
        Record {
            name: name.into(),
            record_type: record_type.into(),
            fields: Vec::new(),
            infos: Vec::new(),
            aliases: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(Entry::new(name, value));
        self
    }

    pub fn with_info(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.infos.push(Entry::new(name, value));
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// The first field called `name`.
    pub fn field(&self, name: &str) -> Option<&Entry> {
        self.fields.iter().find(|entry| entry.name == name)
    }

    /// The first info called `name`.
    pub fn info(&self, name: &str) -> Option<&Entry> {
        self.infos.iter().find(|entry| entry.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.infos.is_empty() && self.aliases.is_empty()
    }
}

/// The ordered records of one db file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    records: Vec<Record>,
}

impl Document {
    pub fn new(records: Vec<Record>) -> Self {
        Document { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first record called `name`.
    pub fn find(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.name == name)
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl From<Vec<Record>> for Document {
    fn from(records: Vec<Record>) -> Self {
        Document::new(records)
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for Document {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl FromIterator<Record> for Document {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Document::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builders_keep_order() {
        let record = Record::new("ai", "$(P)TEMP")
            .with_field("SCAN", "1 second")
            .with_field("PINI", "YES")
            .with_info("alarm", "TEMP_01")
            .with_alias("$(P)T");

        assert_eq!(record.record_type, "ai");
        assert_eq!(
            record.fields,
            vec![Entry::new("SCAN", "1 second"), Entry::new("PINI", "YES")]
        );
        assert_eq!(record.infos, vec![Entry::new("alarm", "TEMP_01")]);
        assert_eq!(record.aliases, vec!["$(P)T".to_string()]);
        assert!(!record.is_empty());
    }

    #[test]
    fn test_lookups_return_first_match() {
        let record = Record::new("ao", "R")
            .with_field("VAL", "1")
            .with_field("VAL", "2");
        assert_eq!(record.field("VAL").map(|e| e.value.as_str()), Some("1"));
        assert!(record.field("EGU").is_none());

        let doc = Document::new(vec![Record::new("ai", "A"), Record::new("bi", "A")]);
        assert_eq!(doc.find("A").map(|r| r.record_type.as_str()), Some("ai"));
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::default();
        assert!(doc.is_empty());
        assert_eq!(doc.iter().count(), 0);
    }
}
