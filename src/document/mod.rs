mod node;
mod page;

pub use node::{HtmlNode, Node};
pub use page::Page;

use node::normalize_whitespace;

use crate::log_debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::Url;

static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// A parsed page. Immutable once built; every query borrows from it.
pub struct Document {
    html: Html,
    url: Option<Url>,
}

impl Document {
    pub fn parse(html: &str, url: &str) -> Self {
        let base = Url::parse(url).ok();
        if base.is_none() {
            log_debug!("[document] Base URL {:?} did not parse, links stay relative", url);
        }

        Self {
            html: Html::parse_document(html),
            url: base,
        }
    }

    /// The document node, used as the context for top-level queries. Its
    /// selectors can match `<html>` itself.
    pub fn root(&self) -> HtmlNode<'_> {
        HtmlNode::document(&self.html)
    }

    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").unwrap();
        self.html
            .select(&selector)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .or_else(|| {
                self.meta_content("meta[property='og:title']")
                    .map(|t| normalize_whitespace(&t))
                    .filter(|t| !t.is_empty())
            })
    }

    /// Visible body text with whitespace collapsed.
    pub fn text(&self) -> String {
        let selector = Selector::parse("body").unwrap();
        let scope = self
            .html
            .select(&selector)
            .next()
            .unwrap_or_else(|| self.html.root_element());

        let parts: Vec<&str> = scope
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let parent = node.parent().and_then(ElementRef::wrap)?;
                match parent.value().name() {
                    "script" | "style" | "noscript" | "template" => None,
                    _ => Some(&**text),
                }
            })
            .collect();

        normalize_whitespace(&parts.join(" "))
    }

    /// Body converted to Markdown. Scripts and styles are dropped and runs of
    /// blank lines are capped at one.
    pub fn markdown(&self) -> String {
        let selector = Selector::parse("body").unwrap();
        let source = match self.html.select(&selector).next() {
            Some(body) => body.html(),
            None => self.html.root_element().html(),
        };

        let converter = htmd::HtmlToMarkdown::builder()
            .skip_tags(vec!["script", "style", "noscript", "template"])
            .build();

        // Fall back to plain text rather than raw markup.
        let markdown = converter.convert(&source).unwrap_or_else(|_| self.text());
        BLANK_LINES
            .replace_all(&markdown, "\n\n")
            .trim()
            .to_string()
    }

    /// `<meta>` name/property/itemprop → content pairs, first occurrence
    /// wins, plus `charset`, `lang` and an absolute `canonical` when present.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();

        let meta = Selector::parse("meta").unwrap();
        for el in self.html.select(&meta) {
            let attrs = el.value();

            if let Some(charset) = attrs.attr("charset") {
                metadata
                    .entry("charset".to_string())
                    .or_insert_with(|| charset.trim().to_string());
                continue;
            }

            let key = attrs
                .attr("name")
                .or_else(|| attrs.attr("property"))
                .or_else(|| attrs.attr("itemprop"))
                .map(str::trim)
                .filter(|k| !k.is_empty());

            if let (Some(key), Some(content)) = (key, attrs.attr("content")) {
                metadata
                    .entry(key.to_string())
                    .or_insert_with(|| content.trim().to_string());
            }
        }

        let html_lang = Selector::parse("html[lang]").unwrap();
        if let Some(lang) = self
            .html
            .select(&html_lang)
            .next()
            .and_then(|el| el.value().attr("lang"))
            .map(str::trim)
            .filter(|l| !l.is_empty())
        {
            metadata.insert("lang".to_string(), lang.to_string());
        }

        if let Some(canonical) = self.canonical_url() {
            metadata.insert("canonical".to_string(), canonical);
        }

        metadata
    }

    fn canonical_url(&self) -> Option<String> {
        let selector = Selector::parse("link[rel='canonical'][href]").unwrap();
        let href = self
            .html
            .select(&selector)
            .next()?
            .value()
            .attr("href")?
            .trim();

        if href.is_empty() {
            return None;
        }

        match &self.url {
            Some(base) => base.join(href).ok().map(|u| u.to_string()),
            None => Some(href.to_string()),
        }
    }

    fn meta_content(&self, css: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        self.html
            .select(&selector)
            .next()?
            .value()
            .attr("content")
            .map(String::from)
    }
}
