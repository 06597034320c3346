use super::result::{Extraction, ExtractionResult, FieldDiagnostic, FieldValue, Record};
use super::schema::{ExtractionSchema, FieldRule};
use crate::document::Node;
use crate::error::{ExtractError, SelectorError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Diagnostic field name used for the container selector.
pub const LIST_FIELD: &str = "list";

/// What to do with a selector the query engine cannot parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorPolicy {
    /// Treat it like a miss: null value plus a diagnostic.
    #[default]
    Lenient,
    /// Fail the whole extraction.
    Strict,
}

/// Applies an `ExtractionSchema` to any `Node` tree. Holds no per-request
/// state, so one instance can serve concurrent requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    policy: SelectorPolicy,
}

impl Extractor {
    pub fn new(policy: SelectorPolicy) -> Self {
        Self { policy }
    }

    pub fn extract<N: Node>(
        &self,
        root: &N,
        schema: &ExtractionSchema,
    ) -> Result<Extraction, ExtractError> {
        let mut diagnostics = Vec::new();

        let result = match schema.list_selector() {
            None => {
                ExtractionResult::Single(self.resolve_record(root, schema.fields(), &mut diagnostics)?)
            }
            Some(list_selector) => {
                let containers = match root.select_all(list_selector) {
                    Ok(containers) => containers,
                    Err(source) => {
                        if self.policy == SelectorPolicy::Strict {
                            return Err(ExtractError::InvalidListSelector(source));
                        }
                        report(&mut diagnostics, LIST_FIELD, source);
                        Vec::new()
                    }
                };
                debug!(
                    "[extract] List selector {:?} matched {} containers",
                    list_selector,
                    containers.len()
                );
                self.check_selectors(root, schema.fields(), &mut diagnostics)?;

                let mut items = Vec::with_capacity(containers.len());
                for container in &containers {
                    items.push(self.resolve_record(container, schema.fields(), &mut diagnostics)?);
                }
                ExtractionResult::List { items }
            }
        };

        Ok(Extraction {
            result,
            diagnostics,
        })
    }

    /// Resolves every field against one context node. The returned record
    /// always contains every key of `fields`.
    pub fn extract_record<N: Node>(
        &self,
        context: &N,
        fields: &BTreeMap<String, FieldRule>,
    ) -> Result<(Record, Vec<FieldDiagnostic>), ExtractError> {
        let mut diagnostics = Vec::new();
        let record = self.resolve_record(context, fields, &mut diagnostics)?;
        Ok((record, diagnostics))
    }

    // Syntax errors must surface even when no container matched.
    fn check_selectors<N: Node>(
        &self,
        root: &N,
        fields: &BTreeMap<String, FieldRule>,
        diagnostics: &mut Vec<FieldDiagnostic>,
    ) -> Result<(), ExtractError> {
        for (name, rule) in fields {
            let Err(source) = root.select_one(rule.selector()) else {
                continue;
            };
            if self.policy == SelectorPolicy::Strict {
                return Err(ExtractError::InvalidSelector {
                    field: name.clone(),
                    source,
                });
            }
            report(diagnostics, name, source);
        }

        Ok(())
    }

    fn resolve_record<N: Node>(
        &self,
        context: &N,
        fields: &BTreeMap<String, FieldRule>,
        diagnostics: &mut Vec<FieldDiagnostic>,
    ) -> Result<Record, ExtractError> {
        let mut record = Record::new();

        for (name, rule) in fields {
            let value = match resolve_field(context, rule) {
                Ok(value) => value,
                Err(source) if self.policy == SelectorPolicy::Strict => {
                    return Err(ExtractError::InvalidSelector {
                        field: name.clone(),
                        source,
                    });
                }
                Err(source) => {
                    report(diagnostics, name, source);
                    None
                }
            };
            record.insert(name.clone(), value);
        }

        Ok(record)
    }
}

fn resolve_field<N: Node>(context: &N, rule: &FieldRule) -> Result<FieldValue, SelectorError> {
    let Some(node) = context.select_one(rule.selector())? else {
        return Ok(None);
    };

    Ok(match rule.attribute() {
        Some(name) => node.attribute(name),
        None => Some(node.text()),
    })
}

// A syntax error repeats for every container; report each field once.
fn report(diagnostics: &mut Vec<FieldDiagnostic>, field: &str, source: SelectorError) {
    if diagnostics.iter().any(|d| d.field == field) {
        return;
    }

    warn!(
        field = field,
        selector = %source.selector,
        "[extract] Selector rejected, field resolves to null: {}",
        source.message
    );
    diagnostics.push(FieldDiagnostic {
        field: field.to_string(),
        selector: source.selector,
        message: source.message,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Minimal in-memory tree: selectors are bare tag names, and anything
    /// containing `[` is a syntax error.
    #[derive(Debug, Clone)]
    struct FakeNode {
        tag: &'static str,
        text: &'static str,
        attrs: Vec<(&'static str, &'static str)>,
        children: Vec<FakeNode>,
    }

    impl FakeNode {
        fn new(tag: &'static str, text: &'static str) -> Self {
            Self {
                tag,
                text,
                attrs: Vec::new(),
                children: Vec::new(),
            }
        }

        fn attr(mut self, name: &'static str, value: &'static str) -> Self {
            self.attrs.push((name, value));
            self
        }

        fn child(mut self, child: FakeNode) -> Self {
            self.children.push(child);
            self
        }

        fn descendants(&self, out: &mut Vec<FakeNode>) {
            for child in &self.children {
                out.push(child.clone());
                child.descendants(out);
            }
        }
    }

    impl Node for FakeNode {
        fn select_all(&self, selector: &str) -> Result<Vec<Self>, SelectorError> {
            if selector.contains('[') {
                return Err(SelectorError {
                    selector: selector.to_string(),
                    message: "unexpected end of input".to_string(),
                });
            }
            let mut all = Vec::new();
            self.descendants(&mut all);
            Ok(all.into_iter().filter(|n| n.tag == selector).collect())
        }

        fn select_one(&self, selector: &str) -> Result<Option<Self>, SelectorError> {
            Ok(self.select_all(selector)?.into_iter().next())
        }

        fn text(&self) -> String {
            self.text.to_string()
        }

        fn attribute(&self, name: &str) -> Option<String> {
            self.attrs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    fn item(name: &'static str, href: &'static str) -> FakeNode {
        FakeNode::new("item", "")
            .child(FakeNode::new("name", name))
            .child(FakeNode::new("a", "link").attr("href", href))
    }

    fn tree() -> FakeNode {
        FakeNode::new("root", "")
            .child(FakeNode::new("title", "Catalog"))
            .child(item("X1", "/X1"))
            .child(item("X2", "/X2"))
            .child(item("X3", "/X3"))
    }

    fn fields(rules: &[(&str, FieldRule)]) -> BTreeMap<String, FieldRule> {
        rules
            .iter()
            .map(|(name, rule)| (name.to_string(), rule.clone()))
            .collect()
    }

    fn record(values: &[(&str, Option<&str>)]) -> Record {
        values
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(String::from)))
            .collect()
    }

    #[test]
    fn single_mode_resolves_against_root() {
        let schema = ExtractionSchema::single(fields(&[
            ("title", FieldRule::text("title")),
            ("first_link", FieldRule::attr("a", "href")),
        ]))
        .unwrap();

        let extraction = Extractor::default().extract(&tree(), &schema).unwrap();
        assert_eq!(
            extraction.result,
            ExtractionResult::Single(record(&[
                ("title", Some("Catalog")),
                ("first_link", Some("/X1")),
            ]))
        );
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn every_declared_field_is_present() {
        let schema = ExtractionSchema::single(fields(&[
            ("a", FieldRule::text("title")),
            ("b", FieldRule::text("missing")),
            ("c", FieldRule::attr("title", "lang")),
        ]))
        .unwrap();

        let extraction = Extractor::default().extract(&tree(), &schema).unwrap();
        let single = extraction.result.as_single().unwrap();
        assert_eq!(single.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(single["a"].as_deref(), Some("Catalog"));
        assert_eq!(single["b"], None);
        assert_eq!(single["c"], None);
    }

    #[test]
    fn list_mode_preserves_container_order() {
        let schema = ExtractionSchema::list(
            "item",
            fields(&[("name", FieldRule::text("name")), ("link", FieldRule::attr("a", "href"))]),
        )
        .unwrap();

        let extraction = Extractor::default().extract(&tree(), &schema).unwrap();
        assert_eq!(
            extraction.result.items().unwrap(),
            &[
                record(&[("name", Some("X1")), ("link", Some("/X1"))]),
                record(&[("name", Some("X2")), ("link", Some("/X2"))]),
                record(&[("name", Some("X3")), ("link", Some("/X3"))]),
            ]
        );
    }

    #[test]
    fn list_mode_without_containers_is_empty() {
        let schema =
            ExtractionSchema::list("row", fields(&[("name", FieldRule::text("name"))])).unwrap();

        let extraction = Extractor::default().extract(&tree(), &schema).unwrap();
        assert_eq!(extraction.result, ExtractionResult::List { items: vec![] });
    }

    #[test]
    fn empty_fields_yield_empty_records() {
        let schema = ExtractionSchema::list("item", BTreeMap::new()).unwrap();

        let extraction = Extractor::default().extract(&tree(), &schema).unwrap();
        assert_eq!(
            extraction.result.items().unwrap(),
            &[Record::new(), Record::new(), Record::new()]
        );
    }

    #[test]
    fn lenient_policy_isolates_bad_selector() {
        let schema = ExtractionSchema::list(
            "item",
            fields(&[("name", FieldRule::text("name")), ("broken", FieldRule::text("a["))]),
        )
        .unwrap();

        let extraction = Extractor::default().extract(&tree(), &schema).unwrap();
        let items = extraction.result.items().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|r| r["broken"].is_none()));
        assert_eq!(items[2]["name"].as_deref(), Some("X3"));

        assert_eq!(
            extraction.diagnostics,
            vec![FieldDiagnostic {
                field: "broken".to_string(),
                selector: "a[".to_string(),
                message: "unexpected end of input".to_string(),
            }]
        );
    }

    #[test]
    fn strict_policy_fails_on_bad_field_selector() {
        let schema =
            ExtractionSchema::single(fields(&[("broken", FieldRule::text("a["))])).unwrap();

        let err = Extractor::new(SelectorPolicy::Strict)
            .extract(&tree(), &schema)
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidSelector { ref field, .. } if field == "broken"));
    }

    #[test]
    fn bad_list_selector_depends_on_policy() {
        let schema =
            ExtractionSchema::list("item[", fields(&[("name", FieldRule::text("name"))])).unwrap();

        let lenient = Extractor::default().extract(&tree(), &schema).unwrap();
        assert_eq!(lenient.result, ExtractionResult::List { items: vec![] });
        assert_eq!(lenient.diagnostics[0].field, LIST_FIELD);

        let strict = Extractor::new(SelectorPolicy::Strict).extract(&tree(), &schema);
        assert!(matches!(strict, Err(ExtractError::InvalidListSelector(_))));
    }

    #[test]
    fn bad_field_selector_is_caught_without_containers() {
        let schema =
            ExtractionSchema::list("row", fields(&[("broken", FieldRule::text("a["))])).unwrap();

        let lenient = Extractor::default().extract(&tree(), &schema).unwrap();
        assert_eq!(lenient.result, ExtractionResult::List { items: vec![] });
        assert_eq!(lenient.diagnostics.len(), 1);
        assert_eq!(lenient.diagnostics[0].field, "broken");

        let strict = Extractor::new(SelectorPolicy::Strict).extract(&tree(), &schema);
        assert!(matches!(
            strict,
            Err(ExtractError::InvalidSelector { ref field, .. }) if field == "broken"
        ));
    }

    #[test]
    fn extract_record_uses_given_context() {
        let container = item("Solo", "/solo");
        let (record, diagnostics) = Extractor::default()
            .extract_record(&container, &fields(&[("name", FieldRule::text("name"))]))
            .unwrap();

        assert_eq!(record["name"].as_deref(), Some("Solo"));
        assert!(diagnostics.is_empty());
    }
}
