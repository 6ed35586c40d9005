//! API diff between two versions of a db file.
//!
//!     Only regressions are reported: records and fields that disappeared, and fields whose
//!     value changed. Anything that exists only in the new document is an addition and is not
//!     reported, so an empty result means "nothing that used to work has broken".
//!
//!     Records are matched by name and fields by field name, each time taking the first match
//!     in the new document's declaration order. Both scans are linear; db files hold tens of
//!     records, not thousands.
//!
//!     Infos and aliases are not compared.

use crate::db::ast::{Document, Record};
use serde::Serialize;
use std::fmt;

/// One detected difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    RecordRemoved {
        record: String,
    },
    FieldRemoved {
        record: String,
        field: String,
    },
    FieldChanged {
        record: String,
        field: String,
        old_value: String,
        new_value: String,
    },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::RecordRemoved { record } => write!(f, "Record removed: {}", record),
            Change::FieldRemoved { record, field } => {
                write!(f, "Field removed from record '{}': {}", record, field)
            }
            Change::FieldChanged {
                record,
                field,
                old_value,
                new_value,
            } => write!(
                f,
                "Field '{}' in record '{}' changed from '{}' to '{}'",
                field, record, old_value, new_value
            ),
        }
    }
}

/// Differences between two documents, in the old document's order.
pub fn diff_documents(old: &Document, new: &Document) -> Vec<Change> {
    let mut changes = Vec::new();
    for old_record in old {
        match new.iter().find(|record| record.name == old_record.name) {
            Some(new_record) => changes.extend(diff_records(old_record, new_record)),
            None => changes.push(Change::RecordRemoved {
                record: old_record.name.clone(),
            }),
        }
    }
    changes
}

/// Field level differences between two records assumed to be the same record.
pub fn diff_records(old: &Record, new: &Record) -> Vec<Change> {
    let mut changes = Vec::new();
    for old_field in &old.fields {
        match new.fields.iter().find(|field| field.name == old_field.name) {
            Some(new_field) if new_field.value != old_field.value => {
                changes.push(Change::FieldChanged {
                    record: old.name.clone(),
                    field: old_field.name.clone(),
                    old_value: old_field.value.clone(),
                    new_value: new_field.value.clone(),
                })
            }
            Some(_) => {}
            None => changes.push(Change::FieldRemoved {
                record: old.name.clone(),
                field: old_field.name.clone(),
            }),
        }
    }
    changes
}

/// Human readable differences between two documents.
pub fn diff(old: &Document, new: &Document) -> Vec<String> {
    diff_documents(old, new)
        .iter()
        .map(ToString::to_string)
        .collect()
}
