use super::Document;
use serde::Serialize;
use std::collections::BTreeMap;

/// Document-level scalars, computed once per fetched page and passed
/// through to the response untouched.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub url: String,
    pub status_code: u16,
    pub title: Option<String>,
    pub markdown: String,
    pub metadata: BTreeMap<String, String>,
}

impl Page {
    pub fn from_document(document: &Document, url: impl Into<String>, status_code: u16) -> Self {
        Self {
            url: url.into(),
            status_code,
            title: document.title(),
            markdown: document.markdown(),
            metadata: document.metadata(),
        }
    }
}
