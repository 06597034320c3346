use crate::error::SelectorError;
use scraper::{ElementRef, Html, Selector};

/// Query capability the extractor is written against. One implementation
/// per document-tree technology.
pub trait Node: Sized {
    /// All matches below this node, in document order. Zero matches is `Ok(vec![])`.
    fn select_all(&self, selector: &str) -> Result<Vec<Self>, SelectorError>;

    /// First match below this node in document order.
    fn select_one(&self, selector: &str) -> Result<Option<Self>, SelectorError>;

    /// Inner text with whitespace runs collapsed to single spaces and trimmed.
    fn text(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;
}

/// `Node` over a parsed HTML tree: either the document itself or one
/// element inside it.
#[derive(Debug, Clone, Copy)]
pub struct HtmlNode<'a> {
    scope: Scope<'a>,
}

#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    // Queries match every element, `<html>` included.
    Document(&'a Html),
    Element(ElementRef<'a>),
}

impl<'a> HtmlNode<'a> {
    pub fn new(element: ElementRef<'a>) -> Self {
        Self {
            scope: Scope::Element(element),
        }
    }

    pub fn document(html: &'a Html) -> Self {
        Self {
            scope: Scope::Document(html),
        }
    }
}

fn compile(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl<'a> Node for HtmlNode<'a> {
    fn select_all(&self, selector: &str) -> Result<Vec<Self>, SelectorError> {
        let selector = compile(selector)?;
        Ok(match self.scope {
            Scope::Document(html) => html.select(&selector).map(HtmlNode::new).collect(),
            Scope::Element(element) => element.select(&selector).map(HtmlNode::new).collect(),
        })
    }

    fn select_one(&self, selector: &str) -> Result<Option<Self>, SelectorError> {
        let selector = compile(selector)?;
        Ok(match self.scope {
            Scope::Document(html) => html.select(&selector).next().map(HtmlNode::new),
            Scope::Element(element) => element.select(&selector).next().map(HtmlNode::new),
        })
    }

    fn text(&self) -> String {
        let element = match self.scope {
            Scope::Document(html) => html.root_element(),
            Scope::Element(element) => element,
        };
        normalize_whitespace(&element.text().collect::<String>())
    }

    /// The document scope has no attributes of its own.
    fn attribute(&self, name: &str) -> Option<String> {
        match self.scope {
            Scope::Document(_) => None,
            Scope::Element(element) => element.value().attr(name).map(String::from),
        }
    }
}
