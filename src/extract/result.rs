use serde::Serialize;
use std::collections::BTreeMap;

/// One extracted value; `None` serializes as JSON `null`.
pub type FieldValue = Option<String>;

/// Field name to value. Always holds every field the schema declares.
pub type Record = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtractionResult {
    Single(Record),
    List { items: Vec<Record> },
}

impl ExtractionResult {
    pub fn as_single(&self) -> Option<&Record> {
        match self {
            ExtractionResult::Single(record) => Some(record),
            ExtractionResult::List { .. } => None,
        }
    }

    pub fn items(&self) -> Option<&[Record]> {
        match self {
            ExtractionResult::List { items } => Some(items),
            ExtractionResult::Single(_) => None,
        }
    }
}

/// A selector the query engine rejected, reported instead of failing the
/// request. `field` is `"list"` for the container selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiagnostic {
    pub field: String,
    pub selector: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub result: ExtractionResult,
    pub diagnostics: Vec<FieldDiagnostic>,
}
