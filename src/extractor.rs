//! HTML extraction for the documentation site.
//!
//! Both extraction paths walk an ordered chain of CSS selectors and stop at
//! the first one that produces something. Site templates drift between
//! releases, so the chains come from [`DocsConfig`] rather than code.

use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::config::DocsConfig;
use crate::section::DocSection;

pub const INDEX_SECTION_ID: &str = "index";

const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

#[derive(Debug)]
pub struct SectionExtractor {
    base_url: Url,
    path_prefix: String,
    page_extension: String,
    index_selectors: Vec<Selector>,
    content_selectors: Vec<Selector>,
    link_selector: Selector,
    body_selector: Selector,
}

impl SectionExtractor {
    pub fn new(base_url: Url, config: &DocsConfig) -> Self {
        Self {
            base_url,
            path_prefix: config.path_prefix.clone(),
            page_extension: config.page_extension.clone(),
            index_selectors: compile_selectors(&config.index_selectors),
            content_selectors: compile_selectors(&config.content_selectors),
            link_selector: fixed_selector("a[href]"),
            body_selector: fixed_selector("body"),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Discovers section stubs on the index page.
    ///
    /// The first selector that matches at least one link decides the whole
    /// result. Never returns an empty list: when nothing usable is found a
    /// single `index` stub pointing at the base URL is returned.
    pub fn parse_index(&self, html: &str) -> Vec<DocSection> {
        let document = Html::parse_document(html);

        let links = self
            .index_selectors
            .iter()
            .map(|selector| self.links_for(&document, selector))
            .find(|links| !links.is_empty())
            .unwrap_or_default();

        let mut seen_urls = HashSet::new();
        let sections: Vec<DocSection> = links
            .into_iter()
            .filter_map(|link| self.stub_from_link(link))
            .filter(|section| seen_urls.insert(section.url.clone()))
            .collect();

        if sections.is_empty() {
            tracing::warn!(
                "No section links found on {}, falling back to the index page",
                self.base_url
            );
            return vec![DocSection::stub(
                INDEX_SECTION_ID,
                INDEX_SECTION_ID,
                self.base_url.as_str(),
            )];
        }

        tracing::debug!("Discovered {} sections on {}", sections.len(), self.base_url);
        sections
    }

    /// Extracts the readable body of a section page.
    ///
    /// Uses the first content selector whose visible text is non-empty and
    /// falls back to the whole `<body>`. Never fails.
    pub fn extract_content(&self, html: &str) -> String {
        let document = Html::parse_document(html);

        let matched = self.content_selectors.iter().find_map(|selector| {
            document
                .select(selector)
                .next()
                .map(visible_text)
                .filter(|text| !text.is_empty())
        });

        matched.unwrap_or_else(|| {
            let body = document
                .select(&self.body_selector)
                .next()
                .unwrap_or_else(|| document.root_element());
            visible_text(body)
        })
    }

    fn links_for<'a>(&self, document: &'a Html, selector: &Selector) -> Vec<ElementRef<'a>> {
        document
            .select(selector)
            .flat_map(|element| {
                if element.value().name() == "a" {
                    vec![element]
                } else {
                    element.select(&self.link_selector).collect()
                }
            })
            .filter(|element| element.value().attr("href").is_some())
            .collect()
    }

    fn stub_from_link(&self, link: ElementRef<'_>) -> Option<DocSection> {
        let href = link.value().attr("href")?.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let mut url = self.base_url.join(href).ok()?;
        if url.origin() != self.base_url.origin() {
            tracing::debug!("Skipping external link {}", href);
            return None;
        }
        url.set_fragment(None);

        let id = self.section_id(&url);
        let title = collapse_whitespace(&link.text().join(" "));
        let title = if title.is_empty() { id.clone() } else { title };

        Some(DocSection::stub(id, title, url.as_str()))
    }

    /// `/whistle/rules.html` -> `rules`, `/whistle/` -> `index`.
    pub fn section_id(&self, url: &Url) -> String {
        let path = url.path();
        let relative = path
            .strip_prefix(self.path_prefix.as_str())
            .unwrap_or(path)
            .trim_matches('/');
        let relative = relative
            .strip_suffix(self.page_extension.as_str())
            .unwrap_or(relative)
            .trim_end_matches('/');

        if relative.is_empty() {
            INDEX_SECTION_ID.to_string()
        } else {
            relative.to_string()
        }
    }
}

fn compile_selectors(raw: &[String]) -> Vec<Selector> {
    raw.iter()
        .filter_map(|css| match Selector::parse(css) {
            Ok(selector) => Some(selector),
            Err(e) => {
                tracing::warn!("Ignoring invalid selector {:?}: {:?}", css, e);
                None
            }
        })
        .collect()
}

fn fixed_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|_| unreachable!("static selector {css} is valid"))
}

/// Text of `element` minus script/style content, one trimmed line per
/// source line with inner whitespace collapsed and blank lines dropped.
fn visible_text(element: ElementRef<'_>) -> String {
    let raw = element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            });
            (!hidden).then_some(&**text)
        })
        .join(" ");

    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}
