//! Schema-driven structured extraction.
//!
//! A schema names output fields and, for each, a selector plus an optional
//! attribute. Without a list selector the fields resolve once against the
//! document root; with one, they resolve once per matched container. A
//! field whose selector matches nothing, or whose attribute is missing,
//! becomes `null` without affecting any other field or item.

mod engine;
mod result;
mod schema;

pub use engine::{Extractor, SelectorPolicy, LIST_FIELD};
pub use result::{Extraction, ExtractionResult, FieldDiagnostic, FieldValue, Record};
pub use schema::{ExtractionSchema, FieldRule, FieldRuleInput, SchemaInput};
