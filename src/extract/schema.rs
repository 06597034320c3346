use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How to derive one output value from the first node a selector matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    selector: String,
    #[serde(rename = "attr", skip_serializing_if = "Option::is_none")]
    attribute: Option<String>,
}

impl FieldRule {
    pub fn new(selector: impl Into<String>, attribute: Option<String>) -> Self {
        Self {
            selector: selector.into(),
            attribute,
        }
    }

    /// Rule that yields the matched node's text.
    pub fn text(selector: impl Into<String>) -> Self {
        Self::new(selector, None)
    }

    /// Rule that yields the named attribute of the matched node.
    pub fn attr(selector: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::new(selector, Some(attribute.into()))
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }
}

/// A field as callers may write it: a full rule object, or a bare selector
/// string as shorthand for a text rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldRuleInput {
    Selector(String),
    Rule {
        selector: String,
        #[serde(default)]
        attr: Option<String>,
    },
}

impl FieldRuleInput {
    /// Converts either form to a `FieldRule`. Selector and attribute name
    /// are trimmed of surrounding whitespace.
    pub fn normalize(self) -> FieldRule {
        match self {
            FieldRuleInput::Selector(selector) => FieldRule::text(selector.trim()),
            FieldRuleInput::Rule { selector, attr } => {
                FieldRule::new(selector.trim(), attr.map(|a| a.trim().to_string()))
            }
        }
    }
}

/// Wire shape of a schema: `{ "list": "...", "fields": { name: rule } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchemaInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<String>,
    #[serde(default)]
    pub fields: Option<BTreeMap<String, FieldRuleInput>>,
}

/// A validated extraction request. List mode when `list_selector` is set,
/// single mode otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSchema {
    list_selector: Option<String>,
    fields: BTreeMap<String, FieldRule>,
}

impl ExtractionSchema {
    pub fn new(
        list_selector: Option<String>,
        fields: BTreeMap<String, FieldRule>,
    ) -> Result<Self, SchemaError> {
        if let Some(list) = &list_selector {
            if list.trim().is_empty() {
                return Err(SchemaError::EmptyListSelector);
            }
        }

        for (name, rule) in &fields {
            if name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if rule.selector().trim().is_empty() {
                return Err(SchemaError::EmptySelector(name.clone()));
            }
            if matches!(rule.attribute(), Some(attr) if attr.trim().is_empty()) {
                return Err(SchemaError::EmptyAttribute(name.clone()));
            }
        }

        Ok(Self {
            list_selector,
            fields,
        })
    }

    pub fn single(fields: BTreeMap<String, FieldRule>) -> Result<Self, SchemaError> {
        Self::new(None, fields)
    }

    pub fn list(
        list_selector: impl Into<String>,
        fields: BTreeMap<String, FieldRule>,
    ) -> Result<Self, SchemaError> {
        Self::new(Some(list_selector.into()), fields)
    }

    pub fn list_selector(&self) -> Option<&str> {
        self.list_selector.as_deref()
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldRule> {
        &self.fields
    }
}

impl TryFrom<SchemaInput> for ExtractionSchema {
    type Error = SchemaError;

    fn try_from(input: SchemaInput) -> Result<Self, Self::Error> {
        let fields = input
            .fields
            .ok_or(SchemaError::MissingFields)?
            .into_iter()
            .map(|(name, rule)| (name, rule.normalize()))
            .collect();

        Self::new(input.list.map(|l| l.trim().to_string()), fields)
    }
}
